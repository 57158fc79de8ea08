use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Delimiter placed in front of user-supplied text appended to a section's
/// final content.
pub const ADDITIONAL_INFO_HEADER: &str = "[Additional Information]";

/// Section content already assigned to a template section by the upstream
/// mapping step.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MappedSectionContent {
    pub id: Uuid,
    pub session_id: Uuid,
    pub section_key: String,
    pub section_name: String,
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub processed_content: Option<String>,
    #[serde(default)]
    pub user_provided_content: Option<String>,
    #[serde(default)]
    pub final_content: Option<String>,
    /// Mapping confidence, 0–100.
    pub confidence: f64,
    #[serde(default)]
    pub needs_review: bool,
    pub display_order: u32,
}

impl MappedSectionContent {
    /// The text the engine scores: processed content when present and
    /// non-blank, else the raw transcription.
    pub fn scored_content(&self) -> &str {
        match self.processed_content.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => &self.raw_content,
        }
    }

    /// The best available content for the final note, most refined first.
    pub fn best_content(&self) -> &str {
        [self.final_content.as_deref(), self.processed_content.as_deref()]
            .into_iter()
            .flatten()
            .find(|c| !c.trim().is_empty())
            .unwrap_or(self.raw_content.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.scored_content().trim().is_empty()
    }

    /// Whether `response` is already the latest block of user-provided
    /// content, i.e. an earlier attempt at the same resolution got this far.
    pub fn has_user_response(&self, response: &str) -> bool {
        let response = response.trim();
        match self.user_provided_content.as_deref() {
            Some(prior) if !response.is_empty() => {
                prior == response || prior.ends_with(&format!("\n{response}"))
            }
            _ => false,
        }
    }

    /// Layer a user response on top of the existing content.
    ///
    /// Never overwrites: the response is appended to `user_provided_content`
    /// and as a delimited block to `final_content`, then `needs_review` is
    /// cleared.
    pub fn apply_user_response(&mut self, response: &str) -> SectionUpdate {
        let response = response.trim();

        let user_provided = match self.user_provided_content.as_deref() {
            Some(prior) if !prior.trim().is_empty() => format!("{prior}\n{response}"),
            _ => response.to_string(),
        };

        let base = self.best_content().trim_end();
        let final_content = if base.trim().is_empty() {
            format!("{ADDITIONAL_INFO_HEADER}\n{response}")
        } else {
            format!("{base}\n\n{ADDITIONAL_INFO_HEADER}\n{response}")
        };

        self.user_provided_content = Some(user_provided);
        self.final_content = Some(final_content);
        self.needs_review = false;

        SectionUpdate {
            user_provided_content: self.user_provided_content.clone(),
            final_content: self.final_content.clone(),
            needs_review: self.needs_review,
        }
    }
}

/// The mutable subset of a section written back by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionUpdate {
    pub user_provided_content: Option<String>,
    pub final_content: Option<String>,
    pub needs_review: bool,
}

impl SectionUpdate {
    pub fn apply_to(&self, section: &mut MappedSectionContent) {
        section.user_provided_content = self.user_provided_content.clone();
        section.final_content = self.final_content.clone();
        section.needs_review = self.needs_review;
    }
}
