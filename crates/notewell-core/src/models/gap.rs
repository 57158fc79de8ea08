use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::field::{FieldConfigWire, GapFieldConfig};

/// One detected documentation deficiency for one section.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Gap {
    pub id: Uuid,
    pub session_id: Uuid,
    /// The mapped section row this gap belongs to. `None` when the template
    /// section has no mapped content at all.
    pub section_content_id: Option<Uuid>,
    pub section_key: String,
    pub section_name: String,
    pub kind: GapKind,
    pub severity: Severity,
    /// Machine-assessed description of what is missing.
    pub description: String,
    /// The primary question put to the practitioner.
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<Vec<FieldConfigWire>>")]
    pub field_config: Option<Vec<GapFieldConfig>>,
    /// Lower is more urgent.
    pub priority: u32,
    /// Template display order of the section; orders gaps within a priority.
    #[serde(default)]
    pub display_order: u32,
    /// Section score at detection time, 0–100.
    pub score: u8,
    pub is_resolved: bool,
    pub user_response: Option<String>,
    pub resolved_at: Option<jiff::Timestamp>,
    pub created_at: jiff::Timestamp,
}

impl Gap {
    pub fn resolve(&mut self, response: String, at: jiff::Timestamp) {
        self.is_resolved = true;
        self.user_response = Some(response);
        self.resolved_at = Some(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GapKind {
    /// No content at all.
    Missing,
    /// Content exists but is too short or misses expected topics.
    Incomplete,
    /// Content looks complete but the mapping step was unsure of it.
    LowConfidence,
}

impl GapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GapKind::Missing => "missing",
            GapKind::Incomplete => "incomplete",
            GapKind::LowConfidence => "low_confidence",
        }
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}
