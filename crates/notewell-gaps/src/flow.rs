//! Headless model of the interactive gap prompt.
//!
//! A frontend drives one `PromptFlow` per session: it renders [`PromptFlow::form`]
//! with a single generic renderer, feeds edits through
//! [`PromptFlow::set_value`], and sends each [`PromptSubmission`] to the
//! resolve-gap endpoint. One gap is active at a time. Submissions are
//! independent: cancelling keeps whatever was already submitted.

use std::collections::HashMap;

use uuid::Uuid;

use notewell_core::models::field::{FieldKind, GapFieldConfig, GapResponseValue};
use notewell_core::models::gap::Gap;
use notewell_storage::store::sort_gaps;

use crate::error::ValidationError;
use crate::response::{
    ResolveGapRequest, serialize_field_responses, validate_field_responses, validate_value,
};

/// Id of the single textarea rendered for gaps without a field config.
pub const RESPONSE_FIELD_ID: &str = "response";

#[derive(Debug, Clone, PartialEq)]
pub struct PromptSubmission {
    pub gap_id: Uuid,
    pub user_response: String,
}

impl PromptSubmission {
    pub fn into_request(self) -> ResolveGapRequest {
        ResolveGapRequest::text(self.user_response)
    }
}

#[derive(Debug, Clone)]
struct PromptStep {
    gap: Gap,
    fields: Vec<GapFieldConfig>,
    values: HashMap<String, GapResponseValue>,
    submitted: bool,
}

impl PromptStep {
    fn new(gap: Gap) -> Self {
        let fields = match &gap.field_config {
            Some(fields) if !fields.is_empty() => fields.clone(),
            _ => vec![
                GapFieldConfig::new(RESPONSE_FIELD_ID, gap.question.clone(), FieldKind::Textarea)
                    .required(),
            ],
        };
        Self {
            gap,
            fields,
            values: HashMap::new(),
            submitted: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptFlow {
    steps: Vec<PromptStep>,
    /// `steps.len()` once every gap has been submitted.
    current: usize,
}

impl PromptFlow {
    /// Unresolved gaps, most urgent first.
    pub fn new(gaps: Vec<Gap>) -> Self {
        let mut gaps: Vec<Gap> = gaps.into_iter().filter(|g| !g.is_resolved).collect();
        sort_gaps(&mut gaps);
        Self {
            steps: gaps.into_iter().map(PromptStep::new).collect(),
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Zero-based index of the active gap.
    pub fn position(&self) -> Option<usize> {
        (self.current < self.steps.len()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Gap> {
        self.steps.get(self.current).map(|s| &s.gap)
    }

    /// Fields to render for the active gap.
    pub fn form(&self) -> Option<&[GapFieldConfig]> {
        self.steps.get(self.current).map(|s| s.fields.as_slice())
    }

    pub fn value(&self, field_id: &str) -> Option<&GapResponseValue> {
        self.steps.get(self.current)?.values.get(field_id)
    }

    /// Record an edit on the active gap. Non-blank values are checked
    /// against the field right away; a rejected value is not stored.
    pub fn set_value(
        &mut self,
        field_id: &str,
        value: GapResponseValue,
    ) -> Result<(), ValidationError> {
        let step = self
            .steps
            .get_mut(self.current)
            .ok_or_else(|| ValidationError::new("no active gap"))?;
        if step.submitted {
            return Err(ValidationError::new("this gap has already been submitted"));
        }

        let field = step
            .fields
            .iter()
            .find(|f| f.id == field_id)
            .ok_or_else(|| {
                ValidationError::field(field_id, format!("unknown field '{field_id}'"))
            })?;

        if value.is_blank() {
            step.values.remove(field_id);
            return Ok(());
        }

        validate_value(field, &value)?;
        step.values.insert(field_id.to_string(), value);
        Ok(())
    }

    /// Ids of required fields of the active gap still unfilled.
    pub fn missing_required(&self) -> Vec<&str> {
        let Some(step) = self.steps.get(self.current) else {
            return Vec::new();
        };
        step.fields
            .iter()
            .filter(|f| f.required && step.values.get(&f.id).is_none_or(|v| v.is_blank()))
            .map(|f| f.id.as_str())
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        self.steps
            .get(self.current)
            .is_some_and(|s| !s.submitted && self.missing_required().is_empty())
    }

    /// Validate and serialize the active gap's answers, then move to the
    /// next gap still waiting for a response.
    pub fn submit(&mut self) -> Result<PromptSubmission, ValidationError> {
        let step = self
            .steps
            .get(self.current)
            .ok_or_else(|| ValidationError::new("no active gap"))?;
        if step.submitted {
            return Err(ValidationError::new("this gap has already been submitted"));
        }

        validate_field_responses(&step.fields, &step.values)?;
        let user_response = serialize_response(step);
        if user_response.trim().is_empty() {
            return Err(ValidationError::field(RESPONSE_FIELD_ID, "response must not be empty"));
        }

        let submission = PromptSubmission {
            gap_id: step.gap.id,
            user_response,
        };

        self.steps[self.current].submitted = true;
        self.current = self.next_open().unwrap_or(self.steps.len());
        Ok(submission)
    }

    /// Step back to the previous gap. Returns false at the first gap.
    pub fn back(&mut self) -> bool {
        if self.current == 0 || self.steps.is_empty() {
            return false;
        }
        self.current = self.current.min(self.steps.len()) - 1;
        true
    }

    /// Step forward to the next gap. Blocked until the active gap has been
    /// submitted.
    pub fn forward(&mut self) -> Result<(), ValidationError> {
        let step = self
            .steps
            .get(self.current)
            .ok_or_else(|| ValidationError::new("no active gap"))?;
        if !step.submitted {
            let missing = self.missing_required();
            return Err(match missing.first() {
                Some(id) => ValidationError::field(*id, "required field is not filled in"),
                None => ValidationError::new("submit this gap before moving on"),
            });
        }
        self.current += 1;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.submitted)
    }

    /// Abandon the flow. Returns the gaps already submitted; those stay
    /// resolved.
    pub fn cancel(self) -> Vec<Uuid> {
        self.steps
            .into_iter()
            .filter(|s| s.submitted)
            .map(|s| s.gap.id)
            .collect()
    }

    /// First unsubmitted step after the current one, wrapping to earlier
    /// steps skipped by navigating back.
    fn next_open(&self) -> Option<usize> {
        let after = (self.current + 1..self.steps.len()).find(|&i| !self.steps[i].submitted);
        after.or_else(|| (0..self.current).find(|&i| !self.steps[i].submitted))
    }
}

fn serialize_response(step: &PromptStep) -> String {
    let default_form = step.fields.len() == 1 && step.fields[0].id == RESPONSE_FIELD_ID;
    match step.values.get(RESPONSE_FIELD_ID) {
        Some(GapResponseValue::Text(text)) if default_form => text.trim().to_string(),
        _ => serialize_field_responses(&step.fields, &step.values),
    }
}
