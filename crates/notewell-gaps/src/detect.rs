//! Gap detection engine.
//!
//! Scores every template section of a session, flags the ones with
//! unacceptable gaps, and emits priority-ordered [`Gap`] records with a
//! question and optional response form for each. Deterministic: the same
//! input always yields the same gaps, scores, and ordering (ids and
//! timestamps aside).

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use notewell_core::models::field::validate_field_configs;
use notewell_core::models::gap::{Gap, GapKind, Severity};
use notewell_core::models::section::MappedSectionContent;
use notewell_core::models::template::TemplateSectionInfo;
use notewell_storage::store::sort_gaps;

use crate::config::DetectionConfig;
use crate::descriptor::{SectionDescriptor, normalize_key};
use crate::error::DetectionError;
use crate::prompts;
use crate::scoring::{SectionScore, completeness_score, score_section};

/// Priority of a required section with no content.
pub const PRIORITY_REQUIRED_MISSING: u32 = 1;
/// Priority of a required section with a low score or a review flag.
pub const PRIORITY_REQUIRED: u32 = 2;
/// Priority of any optional section.
pub const PRIORITY_OPTIONAL: u32 = 3;

#[derive(Debug, Clone)]
pub struct DetectionInput {
    pub session_id: Uuid,
    pub mapped_sections: Vec<MappedSectionContent>,
    pub template_sections: Vec<TemplateSectionInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn from_gaps<'a>(gaps: impl IntoIterator<Item = &'a Gap>) -> Self {
        let mut counts = Self::default();
        for gap in gaps {
            counts.record(gap.severity);
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DetectionMetrics {
    pub sections_analyzed: usize,
    pub sections_missing: usize,
    /// Keys of mapped sections the template does not define. Not scored.
    pub unmatched_sections: Vec<String>,
    pub gaps_by_severity: SeverityCounts,
    pub processing_time_ms: u64,
    pub analyzed_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DetectionResult {
    pub session_id: Uuid,
    /// Priority-ordered, not yet persisted.
    pub gaps: Vec<Gap>,
    pub completeness_score: u8,
    pub section_scores: Vec<SectionScore>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub metrics: DetectionMetrics,
}

/// The public envelope of a detection run: always a value, never a panic.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DetectionResult>,
}

impl From<Result<DetectionResult, DetectionError>> for DetectionResponse {
    fn from(outcome: Result<DetectionResult, DetectionError>) -> Self {
        match outcome {
            Ok(result) => DetectionResponse {
                success: true,
                error: None,
                result: Some(result),
            },
            Err(e) => DetectionResponse {
                success: false,
                error: Some(e.to_string()),
                result: None,
            },
        }
    }
}

/// Run detection and fold any failure, including an unexpected panic, into
/// the response envelope.
pub fn detect_gaps_response(input: &DetectionInput, config: &DetectionConfig) -> DetectionResponse {
    detect_gaps_guarded(input, config).into()
}

/// [`detect_gaps`] behind an unwind boundary. This is the entry point the
/// service uses; a fault inside the engine comes back as
/// [`DetectionError::Internal`].
pub fn detect_gaps_guarded(
    input: &DetectionInput,
    config: &DetectionConfig,
) -> Result<DetectionResult, DetectionError> {
    run_guarded(|| detect_gaps(input, config))
}

/// Run `f`, turning a panic into [`DetectionError::Internal`].
pub fn run_guarded<T>(f: impl FnOnce() -> Result<T, DetectionError>) -> Result<T, DetectionError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown fault".to_string());
        error!(error = %message, "gap detection panicked");
        Err(DetectionError::Internal(message))
    })
}

pub fn detect_gaps(
    input: &DetectionInput,
    config: &DetectionConfig,
) -> Result<DetectionResult, DetectionError> {
    let started = Instant::now();
    config.validate()?;

    if input.mapped_sections.is_empty() {
        warn!(session_id = %input.session_id, "gap detection requested without mapped content");
        return Err(DetectionError::NoContent);
    }

    let mapped = index_mapped_sections(input)?;

    let mut descriptors: Vec<SectionDescriptor> = input
        .template_sections
        .iter()
        .map(|s| SectionDescriptor::from_template(s, config))
        .collect();
    descriptors.sort_by_key(|d| d.display_order);

    let mut seen = HashSet::new();
    for descriptor in &descriptors {
        if !seen.insert(descriptor.key.as_str()) {
            return Err(DetectionError::InvalidInput(format!(
                "template defines section '{}' more than once",
                descriptor.key
            )));
        }
        if let Some(fields) = &descriptor.response_fields {
            validate_field_configs(fields)
                .map_err(|e| DetectionError::InvalidInput(e.to_string()))?;
        }
    }

    let now = jiff::Timestamp::now();
    let mut scores = Vec::with_capacity(descriptors.len());
    let mut gaps = Vec::new();

    for descriptor in &descriptors {
        let content = mapped.get(descriptor.key.as_str()).copied();
        let score = score_section(descriptor, content, config);

        if let Some(gap) = evaluate(input.session_id, descriptor, content, &score, config, now) {
            gaps.push(gap);
        }
        scores.push(score);
    }

    sort_gaps(&mut gaps);

    let mut unmatched: Vec<&MappedSectionContent> = mapped
        .iter()
        .filter(|(key, _)| !seen.contains(key.as_str()))
        .map(|(_, section)| *section)
        .collect();
    unmatched.sort_by_key(|s| s.display_order);
    let unmatched_sections: Vec<String> =
        unmatched.iter().map(|s| s.section_key.clone()).collect();

    let completeness = completeness_score(&scores, config);
    let summary = summarize(gaps.len(), scores.len());
    let recommendations = recommend(&gaps, completeness, config);

    let metrics = DetectionMetrics {
        sections_analyzed: scores.len(),
        sections_missing: scores.iter().filter(|s| !s.has_content).count(),
        unmatched_sections,
        gaps_by_severity: SeverityCounts::from_gaps(&gaps),
        processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        analyzed_at: now,
    };

    info!(
        session_id = %input.session_id,
        gaps = gaps.len(),
        completeness,
        sections = scores.len(),
        "gap detection complete"
    );

    Ok(DetectionResult {
        session_id: input.session_id,
        gaps,
        completeness_score: completeness,
        section_scores: scores,
        summary,
        recommendations,
        metrics,
    })
}

fn index_mapped_sections(
    input: &DetectionInput,
) -> Result<HashMap<String, &MappedSectionContent>, DetectionError> {
    let mut mapped = HashMap::with_capacity(input.mapped_sections.len());

    for section in &input.mapped_sections {
        if section.session_id != input.session_id {
            return Err(DetectionError::InvalidInput(format!(
                "mapped section {} belongs to session {}, not {}",
                section.id, section.session_id, input.session_id
            )));
        }
        if !section.confidence.is_finite() || !(0.0..=100.0).contains(&section.confidence) {
            return Err(DetectionError::InvalidInput(format!(
                "mapped section '{}' has confidence {} outside 0–100",
                section.section_key, section.confidence
            )));
        }
        if mapped
            .insert(normalize_key(&section.section_key), section)
            .is_some()
        {
            return Err(DetectionError::InvalidInput(format!(
                "section '{}' is mapped more than once",
                section.section_key
            )));
        }
    }

    Ok(mapped)
}

/// Decide whether a scored section is a gap and build it if so.
fn evaluate(
    session_id: Uuid,
    descriptor: &SectionDescriptor,
    content: Option<&MappedSectionContent>,
    score: &SectionScore,
    config: &DetectionConfig,
    now: jiff::Timestamp,
) -> Option<Gap> {
    let missing = !score.has_content;
    let flagged_by_mapping = content.is_some_and(|c| c.needs_review);
    let below_threshold = f64::from(score.score) < config.review_threshold;

    if !(below_threshold || flagged_by_mapping || (descriptor.required && missing)) {
        return None;
    }

    let kind = if missing {
        GapKind::Missing
    } else if score.is_too_short() || !score.missing_keywords.is_empty() {
        GapKind::Incomplete
    } else {
        GapKind::LowConfidence
    };

    let severity = if descriptor.required && missing {
        Severity::Critical
    } else if f64::from(score.score) < config.critical_threshold {
        Severity::High
    } else if below_threshold {
        Severity::Medium
    } else {
        Severity::Low
    };

    let priority = match (descriptor.required, missing) {
        (true, true) => PRIORITY_REQUIRED_MISSING,
        (true, false) => PRIORITY_REQUIRED,
        (false, _) => PRIORITY_OPTIONAL,
    };

    Some(Gap {
        id: Uuid::new_v4(),
        session_id,
        section_content_id: content.map(|c| c.id),
        section_key: descriptor.key.clone(),
        section_name: descriptor.name.clone(),
        kind,
        severity,
        description: prompts::describe(kind, score, content.map(|c| c.confidence)),
        question: prompts::question(kind, score),
        field_config: prompts::field_config(descriptor, kind, score),
        priority,
        display_order: descriptor.display_order,
        score: score.score,
        is_resolved: false,
        user_response: None,
        resolved_at: None,
        created_at: now,
    })
}

fn summarize(flagged: usize, total: usize) -> String {
    match (flagged, total) {
        (_, 0) => "Template defines no sections to evaluate".to_string(),
        (0, total) => format!("All {total} sections meet documentation requirements"),
        (1, total) => format!("1 of {total} sections needs attention"),
        (flagged, total) => format!("{flagged} of {total} sections need attention"),
    }
}

fn section_names(gaps: &[Gap], pred: impl Fn(&Gap) -> bool) -> Vec<&str> {
    gaps.iter()
        .filter(|g| pred(g))
        .map(|g| g.section_name.as_str())
        .collect()
}

fn recommend(gaps: &[Gap], completeness: u8, config: &DetectionConfig) -> Vec<String> {
    let mut recommendations = Vec::new();

    let required_missing = section_names(gaps, |g| g.priority == PRIORITY_REQUIRED_MISSING);
    if !required_missing.is_empty() {
        recommendations.push(format!(
            "Document the missing required sections: {}",
            required_missing.join(", ")
        ));
    }

    let optional_missing =
        section_names(gaps, |g| g.kind == GapKind::Missing && g.priority == PRIORITY_OPTIONAL);
    if !optional_missing.is_empty() {
        recommendations.push(format!(
            "Consider adding content for optional sections: {}",
            optional_missing.join(", ")
        ));
    }

    let incomplete = section_names(gaps, |g| g.kind == GapKind::Incomplete);
    if !incomplete.is_empty() {
        recommendations.push(format!("Expand incomplete sections: {}", incomplete.join(", ")));
    }

    let low_confidence = section_names(gaps, |g| g.kind == GapKind::LowConfidence);
    if !low_confidence.is_empty() {
        recommendations.push(format!(
            "Review low-confidence sections: {}",
            low_confidence.join(", ")
        ));
    }

    if f64::from(completeness) < config.critical_threshold {
        recommendations.push(
            "Overall completeness is low; consider re-running content mapping on the full session transcript"
                .to_string(),
        );
    }

    if gaps.is_empty() {
        recommendations.push("Documentation is ready for note generation".to_string());
    }

    recommendations
}
