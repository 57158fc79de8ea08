//! Human-facing text and default response forms for detected gaps.
//!
//! Questions are assembled from the section name and the kind of deficiency.
//! Routing them through a language model is left to the caller.

use notewell_core::models::field::{FieldKind, FieldOption, GapFieldConfig};
use notewell_core::models::gap::GapKind;

use crate::descriptor::SectionDescriptor;
use crate::scoring::SectionScore;

pub const DETAILS_FIELD_ID: &str = "details";
pub const TOPICS_FIELD_ID: &str = "addressed_topics";

pub fn describe(kind: GapKind, score: &SectionScore, confidence: Option<f64>) -> String {
    match kind {
        GapKind::Missing => format!("{} section has no content", score.section_name),
        GapKind::Incomplete => {
            let mut parts = Vec::new();
            if score.is_too_short() {
                parts.push(format!(
                    "content is too short ({} of {} characters)",
                    score.content_length, score.min_length
                ));
            }
            if !score.missing_keywords.is_empty() {
                parts.push(format!(
                    "expected topics not covered: {}",
                    score.missing_keywords.join(", ")
                ));
            }
            format!("{} section is incomplete: {}", score.section_name, parts.join("; "))
        }
        GapKind::LowConfidence => match confidence {
            Some(c) => format!(
                "{} section needs review (mapping confidence {:.0}%, score {})",
                score.section_name, c, score.score
            ),
            None => format!("{} section needs review", score.section_name),
        },
    }
}

pub fn question(kind: GapKind, score: &SectionScore) -> String {
    let name = &score.section_name;
    match kind {
        GapKind::Missing => {
            format!("The {name} section has no content. What should be documented for {name}?")
        }
        GapKind::Incomplete => {
            let mut q = format!(
                "The {name} section looks incomplete. Can you add more detail about {name}?"
            );
            if !score.missing_keywords.is_empty() {
                q.push_str(&format!(
                    " In particular, please address: {}.",
                    score.missing_keywords.join(", ")
                ));
            }
            q
        }
        GapKind::LowConfidence => format!(
            "Please confirm or correct the {name} section. Is anything missing or inaccurate?"
        ),
    }
}

/// The form for a gap: the template's own fields when it defines any,
/// otherwise a details box plus a checklist of uncovered topics for
/// incomplete sections. `None` means the single default textarea.
pub fn field_config(
    descriptor: &SectionDescriptor,
    kind: GapKind,
    score: &SectionScore,
) -> Option<Vec<GapFieldConfig>> {
    if let Some(fields) = &descriptor.response_fields
        && !fields.is_empty()
    {
        return Some(fields.clone());
    }

    if kind != GapKind::Incomplete || score.missing_keywords.is_empty() {
        return None;
    }

    let options = score
        .missing_keywords
        .iter()
        .map(|k| FieldOption::new(k.clone(), title_case(k)))
        .collect();

    Some(vec![
        GapFieldConfig::new(
            DETAILS_FIELD_ID,
            format!("Additional {} details", descriptor.name),
            FieldKind::Textarea,
        )
        .required()
        .with_placeholder(format!("Describe what was covered in {}", descriptor.name)),
        GapFieldConfig::new(
            TOPICS_FIELD_ID,
            "Topics addressed in session",
            FieldKind::Multiselect { options },
        )
        .with_help_text("Select every topic your details above cover"),
    ])
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
