//! Declarative form fields used to collect structured gap responses.
//!
//! A single generic renderer interprets these; nothing in the system branches
//! on note type to build a response form.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Multiselect,
    Checkbox,
    Date,
    Number,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::Number => "number",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Field type plus the data only some types carry. Options exist exactly for
/// the choice types.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Textarea,
    Select { options: Vec<FieldOption> },
    Multiselect { options: Vec<FieldOption> },
    Checkbox,
    Date,
    Number,
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text => FieldType::Text,
            FieldKind::Textarea => FieldType::Textarea,
            FieldKind::Select { .. } => FieldType::Select,
            FieldKind::Multiselect { .. } => FieldType::Multiselect,
            FieldKind::Checkbox => FieldType::Checkbox,
            FieldKind::Date => FieldType::Date,
            FieldKind::Number => FieldType::Number,
        }
    }

    pub fn options(&self) -> Option<&[FieldOption]> {
        match self {
            FieldKind::Select { options } | FieldKind::Multiselect { options } => Some(options),
            _ => None,
        }
    }
}

/// One form field of a gap response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldConfigWire", into = "FieldConfigWire")]
pub struct GapFieldConfig {
    pub id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub required: bool,
    pub kind: FieldKind,
}

impl GapFieldConfig {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            placeholder: None,
            help_text: None,
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Look up the display label for an option value.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.kind
            .options()?
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

/// The wire shape of [`GapFieldConfig`]. Deserialized input is checked
/// against the options invariant before it becomes a `GapFieldConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, rename = "GapFieldConfig")]
pub struct FieldConfigWire {
    pub id: String,
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

impl TryFrom<FieldConfigWire> for GapFieldConfig {
    type Error = CoreError;

    fn try_from(wire: FieldConfigWire) -> Result<Self, Self::Error> {
        let invalid = |message: String| CoreError::InvalidFieldConfig {
            field_id: wire.id.clone(),
            message,
        };

        if wire.id.trim().is_empty() {
            return Err(invalid("field id must not be empty".to_string()));
        }
        if wire.label.trim().is_empty() {
            return Err(invalid("label must not be empty".to_string()));
        }

        let choice = matches!(wire.field_type, FieldType::Select | FieldType::Multiselect);
        let options = match (choice, wire.options.clone()) {
            (true, Some(options)) if !options.is_empty() => Some(options),
            (true, _) => {
                return Err(invalid(format!(
                    "{} fields require a non-empty options list",
                    wire.field_type
                )));
            }
            (false, Some(_)) => {
                return Err(invalid(format!(
                    "{} fields must not declare options",
                    wire.field_type
                )));
            }
            (false, None) => None,
        };

        if let Some(options) = &options {
            let mut seen = HashSet::new();
            for option in options {
                if option.value.trim().is_empty() {
                    return Err(invalid("option values must not be empty".to_string()));
                }
                if !seen.insert(option.value.as_str()) {
                    return Err(invalid(format!("duplicate option value '{}'", option.value)));
                }
            }
        }

        let kind = match (wire.field_type, options) {
            (FieldType::Text, _) => FieldKind::Text,
            (FieldType::Textarea, _) => FieldKind::Textarea,
            (FieldType::Select, Some(options)) => FieldKind::Select { options },
            (FieldType::Multiselect, Some(options)) => FieldKind::Multiselect { options },
            (FieldType::Checkbox, _) => FieldKind::Checkbox,
            (FieldType::Date, _) => FieldKind::Date,
            (FieldType::Number, _) => FieldKind::Number,
            (field_type, None) => {
                return Err(invalid(format!("{field_type} fields require options")));
            }
        };

        Ok(GapFieldConfig {
            id: wire.id,
            label: wire.label,
            placeholder: wire.placeholder,
            help_text: wire.help_text,
            required: wire.required,
            kind,
        })
    }
}

impl From<GapFieldConfig> for FieldConfigWire {
    fn from(config: GapFieldConfig) -> Self {
        let field_type = config.field_type();
        let options = match config.kind {
            FieldKind::Select { options } | FieldKind::Multiselect { options } => Some(options),
            _ => None,
        };
        FieldConfigWire {
            id: config.id,
            field_type,
            label: config.label,
            placeholder: config.placeholder,
            help_text: config.help_text,
            required: config.required,
            options,
        }
    }
}

/// Check a list of field configs as a whole: ids are unique.
pub fn validate_field_configs(fields: &[GapFieldConfig]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.id.as_str()) {
            return Err(CoreError::InvalidFieldConfig {
                field_id: field.id.clone(),
                message: "duplicate field id".to_string(),
            });
        }
    }
    Ok(())
}

/// A typed response value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum GapResponseValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl GapResponseValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            GapResponseValue::Flag(_) => "boolean",
            GapResponseValue::Number(_) => "number",
            GapResponseValue::Text(_) => "string",
            GapResponseValue::List(_) => "string array",
        }
    }

    /// Whether the value counts as "not filled in" for required checks.
    /// An unchecked checkbox is a real answer.
    pub fn is_blank(&self) -> bool {
        match self {
            GapResponseValue::Flag(_) | GapResponseValue::Number(_) => false,
            GapResponseValue::Text(s) => s.trim().is_empty(),
            GapResponseValue::List(items) => items.is_empty(),
        }
    }
}
