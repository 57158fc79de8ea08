//! Normalizes template section definitions into what the detection engine
//! consumes.

use notewell_core::models::field::GapFieldConfig;
use notewell_core::models::template::TemplateSectionInfo;

use crate::config::DetectionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SectionDescriptor {
    /// Trimmed, lowercased key used to match mapped content.
    pub key: String,
    pub name: String,
    pub required: bool,
    pub min_length: u32,
    /// Lowercased, deduplicated, in first-seen order.
    pub keywords: Vec<String>,
    pub display_order: u32,
    pub response_fields: Option<Vec<GapFieldConfig>>,
}

impl SectionDescriptor {
    pub fn from_template(section: &TemplateSectionInfo, config: &DetectionConfig) -> Self {
        let hints = section.mapping_info.as_ref();

        let hinted_keywords = hints
            .and_then(|m| m.get("keywords").or_else(|| m.get("expected_keywords")))
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str());

        let mut keywords: Vec<String> = Vec::new();
        for keyword in section.keywords.iter().map(String::as_str).chain(hinted_keywords) {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        let hinted_min_length = hints
            .and_then(|m| m.get("min_length"))
            .and_then(|v| v.as_u64())
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX));

        let name = if section.name.trim().is_empty() {
            section.key.trim().to_string()
        } else {
            section.name.trim().to_string()
        };

        Self {
            key: normalize_key(&section.key),
            name,
            required: section.is_required,
            min_length: hinted_min_length
                .or(section.min_length)
                .unwrap_or(config.default_min_length),
            keywords,
            display_order: section.display_order,
            response_fields: section.response_fields.clone(),
        }
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
