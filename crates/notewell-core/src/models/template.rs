use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::field::{FieldConfigWire, GapFieldConfig};

/// One section of a note template, as loaded from the template subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateSectionInfo {
    pub id: Uuid,
    /// Stable machine name used to match mapped content (e.g. "subjective").
    pub key: String,
    /// Display name (e.g. "Subjective").
    pub name: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub display_order: u32,
    /// Template-authored mapping hints. Recognized keys: `keywords` or
    /// `expected_keywords` (string array) and `min_length` (integer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_info: Option<serde_json::Value>,
    /// Form used to collect responses for this section's gaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<Vec<FieldConfigWire>>")]
    pub response_fields: Option<Vec<GapFieldConfig>>,
}
