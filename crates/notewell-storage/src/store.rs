use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use notewell_core::models::gap::Gap;
use notewell_core::models::section::{MappedSectionContent, SectionUpdate};
use notewell_core::models::session::{Session, SessionStatus};
use notewell_core::models::template::TemplateSectionInfo;

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sessions are owned by the application; the gap engine reads them and
/// advances their status.
pub trait SessionStore: Send + Sync {
    /// None = no such session.
    fn get_session(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Session>, StorageError>>;

    fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> BoxFuture<'_, Result<(), StorageError>>;
}

/// Mapped section content, one row per section per session.
pub trait SectionStore: Send + Sync {
    /// Sections of a session ordered by display order. Empty when the mapping
    /// step has not produced anything yet.
    fn get_mapped_sections(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<MappedSectionContent>, StorageError>>;

    fn update_section_content(
        &self,
        id: Uuid,
        update: SectionUpdate,
    ) -> BoxFuture<'_, Result<(), StorageError>>;
}

pub trait TemplateStore: Send + Sync {
    /// Sections of a template ordered by display order. None = unknown
    /// template.
    fn get_template_sections(
        &self,
        template_id: Uuid,
    ) -> BoxFuture<'_, Result<Option<Vec<TemplateSectionInfo>>, StorageError>>;
}

pub trait GapStore: Send + Sync {
    /// Gaps of a session ordered by priority, template display order within
    /// a priority. Resolved gaps only when `include_resolved` is set.
    fn list_gaps(
        &self,
        session_id: Uuid,
        include_resolved: bool,
    ) -> BoxFuture<'_, Result<Vec<Gap>, StorageError>>;

    fn get_gap(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Gap>, StorageError>>;

    /// Delete every unresolved gap of the session and insert `gaps`.
    /// Resolved gaps are kept.
    fn replace_unresolved_gaps(
        &self,
        session_id: Uuid,
        gaps: Vec<Gap>,
    ) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Mark a gap resolved with the given response and return the stored row.
    fn resolve_gap(
        &self,
        id: Uuid,
        response: String,
        resolved_at: jiff::Timestamp,
    ) -> BoxFuture<'_, Result<Gap, StorageError>>;

    /// Physically remove a gap. Returns whether a row was removed.
    fn delete_gap(&self, id: Uuid) -> BoxFuture<'_, Result<bool, StorageError>>;
}

/// Most urgent first, template order within a priority. Shared by every
/// store implementation and the detection engine.
pub fn sort_gaps(gaps: &mut [Gap]) {
    gaps.sort_by_key(|g| (g.priority, g.display_order));
}
