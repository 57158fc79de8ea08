use serde::{Deserialize, Serialize};
use ts_rs::TS;

use notewell_core::models::section::MappedSectionContent;

use crate::config::DetectionConfig;
use crate::descriptor::SectionDescriptor;

/// Score of one template section for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionScore {
    pub section_key: String,
    pub section_name: String,
    pub is_required: bool,
    /// 0–100.
    pub score: u8,
    pub content_length: u32,
    pub min_length: u32,
    /// Fraction of expected keywords found, 0–1.
    pub keyword_coverage: f64,
    pub missing_keywords: Vec<String>,
    pub has_content: bool,
}

impl SectionScore {
    pub fn is_too_short(&self) -> bool {
        self.has_content && self.content_length < self.min_length
    }
}

/// Score a section's content against its descriptor. `content` is `None`
/// when the template section has no mapped row.
///
/// The keyword term is blended into the confidence baseline, then the
/// length factor multiplies the result so very short content stays low no
/// matter how many keywords it mentions.
pub fn score_section(
    descriptor: &SectionDescriptor,
    content: Option<&MappedSectionContent>,
    config: &DetectionConfig,
) -> SectionScore {
    let text = content.map(|c| c.scored_content().trim()).unwrap_or("");
    let length = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let (coverage, missing_keywords) = keyword_coverage(text, &descriptor.keywords);

    let score = if text.is_empty() {
        0.0
    } else {
        let baseline = content.map(|c| c.confidence).unwrap_or(0.0).clamp(0.0, 100.0);
        let blended =
            baseline * (1.0 - config.keyword_weight) + coverage * 100.0 * config.keyword_weight;
        let length_factor = if descriptor.min_length == 0 {
            1.0
        } else {
            (f64::from(length) / f64::from(descriptor.min_length)).min(1.0)
        };
        blended * length_factor
    };

    SectionScore {
        section_key: descriptor.key.clone(),
        section_name: descriptor.name.clone(),
        is_required: descriptor.required,
        score: score.clamp(0.0, 100.0).round() as u8,
        content_length: length,
        min_length: descriptor.min_length,
        keyword_coverage: coverage,
        missing_keywords,
        has_content: !text.is_empty(),
    }
}

/// Case-insensitive substring coverage. Keywords are expected lowercased.
/// A section with no expected keywords is fully covered.
pub fn keyword_coverage(text: &str, keywords: &[String]) -> (f64, Vec<String>) {
    if keywords.is_empty() {
        return (1.0, Vec::new());
    }

    let haystack = text.to_lowercase();
    let missing: Vec<String> = keywords
        .iter()
        .filter(|k| !haystack.contains(k.as_str()))
        .cloned()
        .collect();

    let found = keywords.len() - missing.len();
    (found as f64 / keywords.len() as f64, missing)
}

/// Weighted average of section scores; required sections weigh
/// `required_weight`, optional ones 1.
pub fn completeness_score(scores: &[SectionScore], config: &DetectionConfig) -> u8 {
    let (weighted, total) = scores.iter().fold((0.0, 0.0), |(sum, weight), s| {
        let w = if s.is_required {
            config.required_weight
        } else {
            1.0
        };
        (sum + f64::from(s.score) * w, weight + w)
    });

    // Nothing expected means nothing is missing
    if total == 0.0 {
        return 100;
    }
    (weighted / total).clamp(0.0, 100.0).round() as u8
}
