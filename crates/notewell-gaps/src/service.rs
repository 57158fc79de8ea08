//! Orchestration of detection, persistence, reconciliation, and session
//! status for the surrounding application.
//!
//! A `GapService` is constructed once with its collaborator stores and
//! handed to request handlers. It holds no per-session state of its own;
//! callers serialize detection runs per session.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use notewell_core::models::gap::{Gap, Severity};
use notewell_core::models::session::{Session, SessionStatus};
use notewell_storage::{GapStore, SectionStore, SessionStore, TemplateStore};

use crate::config::{DetectionConfig, DetectionOverrides};
use crate::descriptor::{SectionDescriptor, normalize_key};
use crate::detect::{DetectionInput, DetectionResult, SeverityCounts, detect_gaps_guarded};
use crate::error::{ServiceError, ValidationError};
use crate::note::{GeneratedNote, NoteGenerator, NoteSection};
use crate::response::{ResolveGapRequest, validate_resolve_gap_request};

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GapQuery {
    #[serde(default)]
    pub include_resolved: bool,
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Case-insensitive substring match against the gap description.
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GapSummary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Unresolved gaps only.
    pub by_severity: SeverityCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GapListing {
    pub gaps: Vec<Gap>,
    /// Covers the session's whole gap set, not just the filtered list.
    pub summary: GapSummary,
    pub session_status: SessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolveOutcome {
    pub gap: Gap,
    pub all_gaps_resolved: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DismissOutcome {
    pub deleted: bool,
    pub all_gaps_resolved: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Readiness {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub unresolved_gaps: usize,
    pub ready_for_generation: bool,
}

pub struct GapService {
    sessions: Arc<dyn SessionStore>,
    sections: Arc<dyn SectionStore>,
    templates: Arc<dyn TemplateStore>,
    gaps: Arc<dyn GapStore>,
    config: DetectionConfig,
}

impl GapService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        sections: Arc<dyn SectionStore>,
        templates: Arc<dyn TemplateStore>,
        gaps: Arc<dyn GapStore>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            sessions,
            sections,
            templates,
            gaps,
            config,
        }
    }

    /// Build a service whose collaborators are all served by one store.
    pub fn from_store<S>(store: Arc<S>, config: DetectionConfig) -> Self
    where
        S: SessionStore + SectionStore + TemplateStore + GapStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store, config)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run detection for a session, replace its unresolved gaps, and advance
    /// its status: `gaps_detected` when anything was found, `completing`
    /// otherwise.
    pub async fn analyze_gaps(
        &self,
        session_id: Uuid,
        overrides: &DetectionOverrides,
    ) -> Result<DetectionResult, ServiceError> {
        let session = self.load_session(session_id).await?;
        if !session.status.accepts_detection() {
            return Err(ValidationError::new(format!(
                "session is {}; gap analysis requires mapped content",
                session.status
            ))
            .into());
        }

        let mapped_sections = self.sections.get_mapped_sections(session_id).await?;
        if mapped_sections.is_empty() {
            warn!(session_id = %session_id, "no mapped sections to analyze");
            return Err(ServiceError::NoContent);
        }

        let template_sections = self
            .templates
            .get_template_sections(session.template_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("template", session.template_id))?;

        let config = self.config.with_overrides(overrides);
        let input = DetectionInput {
            session_id,
            mapped_sections,
            template_sections,
        };
        let result = detect_gaps_guarded(&input, &config)?;

        self.gaps
            .replace_unresolved_gaps(session_id, result.gaps.clone())
            .await?;

        let target = if result.gaps.is_empty() {
            SessionStatus::Completing
        } else {
            SessionStatus::GapsDetected
        };
        self.advance(&session, target).await?;

        info!(
            session_id = %session_id,
            gaps = result.gaps.len(),
            completeness = result.completeness_score,
            "gap analysis persisted"
        );
        Ok(result)
    }

    pub async fn list_gaps(
        &self,
        session_id: Uuid,
        query: &GapQuery,
    ) -> Result<GapListing, ServiceError> {
        let session = self.load_session(session_id).await?;
        let all = self.gaps.list_gaps(session_id, true).await?;

        let resolved = all.iter().filter(|g| g.is_resolved).count();
        let summary = GapSummary {
            total: all.len(),
            resolved,
            unresolved: all.len() - resolved,
            by_severity: SeverityCounts::from_gaps(all.iter().filter(|g| !g.is_resolved)),
        };

        let needle = query
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let gaps = all
            .into_iter()
            .filter(|g| query.include_resolved || !g.is_resolved)
            .filter(|g| query.severity.is_none_or(|s| g.severity == s))
            .filter(|g| {
                needle
                    .as_deref()
                    .is_none_or(|n| g.description.to_lowercase().contains(n))
            })
            .collect();

        Ok(GapListing {
            gaps,
            summary,
            session_status: session.status,
        })
    }

    /// Accept a response for a gap and layer it onto the owning section.
    ///
    /// Safe to retry: the section is written before the gap, the merge is
    /// skipped when the section already ends with this response, and
    /// repeating the same response for an already-resolved gap finishes the
    /// remaining steps instead of failing.
    pub async fn resolve_gap(
        &self,
        gap_id: Uuid,
        request: &ResolveGapRequest,
    ) -> Result<ResolveOutcome, ServiceError> {
        let gap = self
            .gaps
            .get_gap(gap_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("gap", gap_id))?;

        let validated = validate_resolve_gap_request(gap_id, request, gap.field_config.as_deref())?;

        let retry = gap.is_resolved
            && gap.user_response.as_deref() == Some(validated.user_response.as_str());
        if gap.is_resolved && !retry {
            return Err(ValidationError::field("gap_id", "gap is already resolved").into());
        }

        if let Some(section_id) = gap.section_content_id {
            let mut section = self
                .sections
                .get_mapped_sections(gap.session_id)
                .await?
                .into_iter()
                .find(|s| s.id == section_id)
                .ok_or_else(|| ServiceError::not_found("section", section_id))?;

            if section.has_user_response(&validated.user_response) {
                debug!(gap_id = %gap_id, section_id = %section_id, "response already merged");
            } else {
                let update = section.apply_user_response(&validated.user_response);
                self.sections
                    .update_section_content(section_id, update)
                    .await?;
            }
        }

        let resolved = if retry {
            gap
        } else {
            self.gaps
                .resolve_gap(gap_id, validated.user_response.clone(), jiff::Timestamp::now())
                .await?
        };

        let session_id = resolved.session_id;
        let remaining = self.recheck(session_id).await?;
        info!(gap_id = %gap_id, session_id = %session_id, remaining, retry, "gap resolved");

        let message = if remaining == 0 {
            "All gaps resolved. The session is ready for note generation.".to_string()
        } else {
            format!("Gap resolved. {} remaining.", remaining_label(remaining))
        };

        Ok(ResolveOutcome {
            gap: resolved,
            all_gaps_resolved: remaining == 0,
            message,
        })
    }

    /// Remove a gap as not applicable.
    pub async fn dismiss_gap(&self, gap_id: Uuid) -> Result<DismissOutcome, ServiceError> {
        let gap = self
            .gaps
            .get_gap(gap_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("gap", gap_id))?;

        if gap.is_resolved {
            return Err(ValidationError::field(
                "gap_id",
                "resolved gaps are kept for history and cannot be dismissed",
            )
            .into());
        }

        let deleted = self.gaps.delete_gap(gap_id).await?;
        let remaining = self.recheck(gap.session_id).await?;
        info!(gap_id = %gap_id, session_id = %gap.session_id, remaining, "gap dismissed");

        let message = if remaining == 0 {
            "Gap dismissed. All gaps resolved; the session is ready for note generation."
                .to_string()
        } else {
            format!("Gap dismissed. {} remaining.", remaining_label(remaining))
        };

        Ok(DismissOutcome {
            deleted,
            all_gaps_resolved: remaining == 0,
            message,
        })
    }

    pub async fn readiness(&self, session_id: Uuid) -> Result<Readiness, ServiceError> {
        let session = self.load_session(session_id).await?;
        let unresolved = self.gaps.list_gaps(session_id, false).await?.len();
        Ok(Readiness {
            session_id,
            status: session.status,
            unresolved_gaps: unresolved,
            ready_for_generation: session.status == SessionStatus::Completing && unresolved == 0,
        })
    }

    /// Hand the completed sections to note generation and close the session.
    /// A generator failure moves the session to `failed`.
    pub async fn finalize(
        &self,
        session_id: Uuid,
        generator: &dyn NoteGenerator,
    ) -> Result<GeneratedNote, ServiceError> {
        let readiness = self.readiness(session_id).await?;
        if !readiness.ready_for_generation {
            return Err(ValidationError::new(format!(
                "session is not ready for note generation (status {}, {} unresolved gaps)",
                readiness.status, readiness.unresolved_gaps
            ))
            .into());
        }

        let session = self.load_session(session_id).await?;
        let sections = self.compose_note_sections(&session).await?;

        match generator.generate(session_id, sections).await {
            Ok(note) => {
                self.advance(&session, SessionStatus::Completed).await?;
                info!(session_id = %session_id, "note generated");
                Ok(note)
            }
            Err(message) => {
                self.advance(&session, SessionStatus::Failed).await?;
                warn!(session_id = %session_id, error = %message, "note generation failed");
                Err(ServiceError::Generation(message))
            }
        }
    }

    /// Ordered note sections: template order first, then mapped sections
    /// the template does not define. A template section with no mapped row
    /// takes the responses of its resolved gaps.
    pub async fn compose_note_sections(
        &self,
        session: &Session,
    ) -> Result<Vec<NoteSection>, ServiceError> {
        let mapped = self.sections.get_mapped_sections(session.id).await?;
        let template = self
            .templates
            .get_template_sections(session.template_id)
            .await?
            .unwrap_or_default();
        let gaps = self.gaps.list_gaps(session.id, true).await?;

        let mut descriptors: Vec<SectionDescriptor> = template
            .iter()
            .map(|t| SectionDescriptor::from_template(t, &self.config))
            .collect();
        descriptors.sort_by_key(|d| d.display_order);

        let mut note = Vec::new();
        for descriptor in &descriptors {
            let content = match mapped
                .iter()
                .find(|m| normalize_key(&m.section_key) == descriptor.key)
            {
                Some(section) => section.best_content().trim().to_string(),
                None => gaps
                    .iter()
                    .filter(|g| g.is_resolved && g.section_key == descriptor.key)
                    .filter_map(|g| g.user_response.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            if !content.trim().is_empty() {
                note.push(NoteSection {
                    section_key: descriptor.key.clone(),
                    section_name: descriptor.name.clone(),
                    content,
                    display_order: descriptor.display_order,
                });
            }
        }

        for section in &mapped {
            let key = normalize_key(&section.section_key);
            if descriptors.iter().any(|d| d.key == key) {
                continue;
            }
            let content = section.best_content().trim();
            if !content.is_empty() {
                note.push(NoteSection {
                    section_key: key,
                    section_name: section.section_name.clone(),
                    content: content.to_string(),
                    display_order: section.display_order,
                });
            }
        }

        Ok(note)
    }

    async fn load_session(&self, session_id: Uuid) -> Result<Session, ServiceError> {
        self.sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id))
    }

    /// Count unresolved gaps; when none remain, move a `gaps_detected`
    /// session on to `completing`.
    async fn recheck(&self, session_id: Uuid) -> Result<usize, ServiceError> {
        let remaining = self.gaps.list_gaps(session_id, false).await?.len();
        if remaining == 0 {
            let session = self.load_session(session_id).await?;
            if session.status == SessionStatus::GapsDetected {
                self.advance(&session, SessionStatus::Completing).await?;
            }
        }
        Ok(remaining)
    }

    async fn advance(&self, session: &Session, to: SessionStatus) -> Result<(), ServiceError> {
        if session.status == to {
            return Ok(());
        }
        let next = session.status.transition(to)?;
        self.sessions.update_session_status(session.id, next).await?;
        info!(
            session_id = %session.id,
            from = %session.status,
            to = %next,
            "session status changed"
        );
        Ok(())
    }
}

fn remaining_label(remaining: usize) -> String {
    if remaining == 1 {
        "1 gap".to_string()
    } else {
        format!("{remaining} gaps")
    }
}
