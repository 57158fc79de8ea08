//! Validation of "resolve gap" requests against a gap's field config, and
//! serialization of structured answers into the single response text that
//! reconciliation stores.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use notewell_core::models::field::{FieldKind, GapFieldConfig, GapResponseValue};

use crate::error::ValidationError;

/// Body of a resolve-gap call. Exactly one of the two forms is expected;
/// when both are given the structured form wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolveGapRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_responses: Option<HashMap<String, GapResponseValue>>,
}

impl ResolveGapRequest {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            user_response: Some(response.into()),
            field_responses: None,
        }
    }

    pub fn fields(values: HashMap<String, GapResponseValue>) -> Self {
        Self {
            user_response: None,
            field_responses: Some(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedResolution {
    pub gap_id: Uuid,
    pub user_response: String,
}

/// Validate a resolve request for `gap_id`. `fields` is the gap's field
/// config, if it has one.
pub fn validate_resolve_gap_request(
    gap_id: Uuid,
    request: &ResolveGapRequest,
    fields: Option<&[GapFieldConfig]>,
) -> Result<ValidatedResolution, ValidationError> {
    if gap_id.is_nil() {
        return Err(ValidationError::field("gap_id", "gap id must not be nil"));
    }

    let user_response = match (&request.field_responses, fields) {
        (Some(values), Some(fields)) if !fields.is_empty() => {
            validate_field_responses(fields, values)?;
            serialize_field_responses(fields, values)
        }
        (Some(_), _) => {
            return Err(ValidationError::field(
                "field_responses",
                "this gap has no structured fields; send user_response instead",
            ));
        }
        (None, _) => request
            .user_response
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    };

    if user_response.trim().is_empty() {
        return Err(ValidationError::field("user_response", "response must not be empty"));
    }

    Ok(ValidatedResolution {
        gap_id,
        user_response,
    })
}

/// Check every value against its field: known id, matching type, allowed
/// options, required fields present.
pub fn validate_field_responses(
    fields: &[GapFieldConfig],
    values: &HashMap<String, GapResponseValue>,
) -> Result<(), ValidationError> {
    let known: HashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();
    let mut unknown: Vec<&str> = values
        .keys()
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect();
    unknown.sort_unstable();
    if let Some(id) = unknown.first() {
        return Err(ValidationError::field(*id, format!("unknown field '{id}'")));
    }

    for field in fields {
        match values.get(&field.id) {
            Some(value) if !value.is_blank() => validate_value(field, value)?,
            _ if field.required => {
                return Err(ValidationError::field(
                    &field.id,
                    format!("{} is required", field.label),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Validate one non-blank value against its field.
pub fn validate_value(
    field: &GapFieldConfig,
    value: &GapResponseValue,
) -> Result<(), ValidationError> {
    let mismatch = || {
        ValidationError::field(
            &field.id,
            format!(
                "{} expects a {} value, got {}",
                field.label,
                field.field_type(),
                value.kind_name()
            ),
        )
    };

    match (&field.kind, value) {
        (FieldKind::Text | FieldKind::Textarea, GapResponseValue::Text(_)) => Ok(()),
        (FieldKind::Select { options }, GapResponseValue::Text(choice)) => {
            if options.iter().any(|o| &o.value == choice) {
                Ok(())
            } else {
                Err(ValidationError::field(
                    &field.id,
                    format!("'{choice}' is not an option of {}", field.label),
                ))
            }
        }
        (FieldKind::Multiselect { options }, GapResponseValue::List(choices)) => {
            let mut seen = HashSet::new();
            for choice in choices {
                if !options.iter().any(|o| &o.value == choice) {
                    return Err(ValidationError::field(
                        &field.id,
                        format!("'{choice}' is not an option of {}", field.label),
                    ));
                }
                if !seen.insert(choice.as_str()) {
                    return Err(ValidationError::field(
                        &field.id,
                        format!("'{choice}' selected more than once"),
                    ));
                }
            }
            Ok(())
        }
        (FieldKind::Checkbox, GapResponseValue::Flag(_)) => Ok(()),
        (FieldKind::Date, GapResponseValue::Text(date)) => date
            .trim()
            .parse::<jiff::civil::Date>()
            .map(|_| ())
            .map_err(|_| {
                ValidationError::field(
                    &field.id,
                    format!("{} must be an ISO date (YYYY-MM-DD), got '{date}'", field.label),
                )
            }),
        (FieldKind::Number, GapResponseValue::Number(n)) => {
            if n.is_finite() {
                Ok(())
            } else {
                Err(ValidationError::field(
                    &field.id,
                    format!("{} must be a finite number", field.label),
                ))
            }
        }
        _ => Err(mismatch()),
    }
}

/// Render structured answers as "Label: value" lines in field order. Blank
/// optional fields are skipped; choice values render as their labels.
pub fn serialize_field_responses(
    fields: &[GapFieldConfig],
    values: &HashMap<String, GapResponseValue>,
) -> String {
    fields
        .iter()
        .filter_map(|field| {
            let value = values.get(&field.id).filter(|v| !v.is_blank())?;
            Some(format!("{}: {}", field.label, render_value(field, value)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_value(field: &GapFieldConfig, value: &GapResponseValue) -> String {
    match value {
        GapResponseValue::Text(s) => field
            .option_label(s)
            .map(str::to_string)
            .unwrap_or_else(|| s.trim().to_string()),
        GapResponseValue::List(items) => items
            .iter()
            .map(|v| field.option_label(v).unwrap_or(v).to_string())
            .collect::<Vec<_>>()
            .join(", "),
        GapResponseValue::Flag(true) => "Yes".to_string(),
        GapResponseValue::Flag(false) => "No".to_string(),
        GapResponseValue::Number(n) => n.to_string(),
    }
}
