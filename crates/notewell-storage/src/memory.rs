//! In-memory store. Used by tests and local development; every collaborator
//! interface is served from one mutex-guarded state.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use notewell_core::models::gap::Gap;
use notewell_core::models::section::{MappedSectionContent, SectionUpdate};
use notewell_core::models::session::{Session, SessionStatus};
use notewell_core::models::template::TemplateSectionInfo;

use crate::error::StorageError;
use crate::store::{BoxFuture, GapStore, SectionStore, SessionStore, TemplateStore, sort_gaps};

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<Uuid, Session>,
    sections: Vec<MappedSectionContent>,
    templates: HashMap<Uuid, Vec<TemplateSectionInfo>>,
    /// Insertion order is preserved so ties in priority keep detection order.
    gaps: Vec<Gap>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_session(&self, session: Session) {
        self.state.lock().await.sessions.insert(session.id, session);
    }

    pub async fn insert_sections(&self, sections: Vec<MappedSectionContent>) {
        self.state.lock().await.sections.extend(sections);
    }

    pub async fn insert_template(&self, template_id: Uuid, sections: Vec<TemplateSectionInfo>) {
        self.state.lock().await.templates.insert(template_id, sections);
    }

    pub async fn session(&self, id: Uuid) -> Option<Session> {
        self.state.lock().await.sessions.get(&id).cloned()
    }

    pub async fn sections_of(&self, session_id: Uuid) -> Vec<MappedSectionContent> {
        self.state
            .lock()
            .await
            .sections
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect()
    }
}

impl SessionStore for MemoryStore {
    fn get_session(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Session>, StorageError>> {
        Box::pin(async move { Ok(self.state.lock().await.sessions.get(&id).cloned()) })
    }

    fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let session = state
                .sessions
                .get_mut(&id)
                .ok_or_else(|| StorageError::not_found("session", id))?;
            session.status = status;
            session.updated_at = jiff::Timestamp::now();
            Ok(())
        })
    }
}

impl SectionStore for MemoryStore {
    fn get_mapped_sections(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<MappedSectionContent>, StorageError>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut sections: Vec<_> = state
                .sections
                .iter()
                .filter(|s| s.session_id == session_id)
                .cloned()
                .collect();
            sections.sort_by_key(|s| s.display_order);
            Ok(sections)
        })
    }

    fn update_section_content(
        &self,
        id: Uuid,
        update: SectionUpdate,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let section = state
                .sections
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StorageError::not_found("section", id))?;
            update.apply_to(section);
            Ok(())
        })
    }
}

impl TemplateStore for MemoryStore {
    fn get_template_sections(
        &self,
        template_id: Uuid,
    ) -> BoxFuture<'_, Result<Option<Vec<TemplateSectionInfo>>, StorageError>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.templates.get(&template_id).map(|sections| {
                let mut sections = sections.clone();
                sections.sort_by_key(|s| s.display_order);
                sections
            }))
        })
    }
}

impl GapStore for MemoryStore {
    fn list_gaps(
        &self,
        session_id: Uuid,
        include_resolved: bool,
    ) -> BoxFuture<'_, Result<Vec<Gap>, StorageError>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut gaps: Vec<_> = state
                .gaps
                .iter()
                .filter(|g| g.session_id == session_id && (include_resolved || !g.is_resolved))
                .cloned()
                .collect();
            sort_gaps(&mut gaps);
            Ok(gaps)
        })
    }

    fn get_gap(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Gap>, StorageError>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.gaps.iter().find(|g| g.id == id).cloned())
        })
    }

    fn replace_unresolved_gaps(
        &self,
        session_id: Uuid,
        gaps: Vec<Gap>,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            if let Some(foreign) = gaps.iter().find(|g| g.session_id != session_id) {
                return Err(StorageError::InvalidRecord(format!(
                    "gap {} belongs to session {}, not {session_id}",
                    foreign.id, foreign.session_id
                )));
            }

            let mut state = self.state.lock().await;
            state
                .gaps
                .retain(|g| g.session_id != session_id || g.is_resolved);
            state.gaps.extend(gaps);
            Ok(())
        })
    }

    fn resolve_gap(
        &self,
        id: Uuid,
        response: String,
        resolved_at: jiff::Timestamp,
    ) -> BoxFuture<'_, Result<Gap, StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let gap = state
                .gaps
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| StorageError::not_found("gap", id))?;
            gap.resolve(response, resolved_at);
            Ok(gap.clone())
        })
    }

    fn delete_gap(&self, id: Uuid) -> BoxFuture<'_, Result<bool, StorageError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let before = state.gaps.len();
            state.gaps.retain(|g| g.id != id);
            Ok(state.gaps.len() < before)
        })
    }
}
