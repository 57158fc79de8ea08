#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use notewell_core::models::section::MappedSectionContent;
use notewell_core::models::session::{Session, SessionStatus};
use notewell_core::models::template::TemplateSectionInfo;
use notewell_gaps::{DetectionConfig, GapService};
use notewell_storage::memory::MemoryStore;

pub const SUBJECTIVE_TEXT: &str =
    "Client reports improved sleep and reduced anxiety at work since the last session.";
pub const PLAN_TEXT: &str = "Follow up.";

pub fn template_section(
    key: &str,
    name: &str,
    required: bool,
    min_length: u32,
    order: u32,
) -> TemplateSectionInfo {
    TemplateSectionInfo {
        id: Uuid::new_v4(),
        key: key.to_string(),
        name: name.to_string(),
        is_required: required,
        min_length: Some(min_length),
        keywords: Vec::new(),
        display_order: order,
        mapping_info: None,
        response_fields: None,
    }
}

pub fn mapped_section(
    session_id: Uuid,
    key: &str,
    name: &str,
    content: &str,
    confidence: f64,
    order: u32,
) -> MappedSectionContent {
    MappedSectionContent {
        id: Uuid::new_v4(),
        session_id,
        section_key: key.to_string(),
        section_name: name.to_string(),
        raw_content: content.to_string(),
        processed_content: Some(content.to_string()),
        user_provided_content: None,
        final_content: None,
        confidence,
        needs_review: false,
        display_order: order,
    }
}

/// Subjective (required, min 50), Objective (required, min 50), Plan
/// (optional, min 20).
pub fn soap_template() -> Vec<TemplateSectionInfo> {
    vec![
        template_section("subjective", "Subjective", true, 50, 1),
        template_section("objective", "Objective", true, 50, 2),
        template_section("plan", "Plan", false, 20, 3),
    ]
}

/// Subjective well documented, Objective empty, Plan too short.
pub fn soap_sections(session_id: Uuid) -> Vec<MappedSectionContent> {
    vec![
        mapped_section(session_id, "subjective", "Subjective", SUBJECTIVE_TEXT, 90.0, 1),
        mapped_section(session_id, "objective", "Objective", "", 0.0, 2),
        mapped_section(session_id, "plan", "Plan", PLAN_TEXT, 90.0, 3),
    ]
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub service: GapService,
    pub session_id: Uuid,
}

impl Fixture {
    pub async fn section(&self, key: &str) -> MappedSectionContent {
        let sections = self.store.sections_of(self.session_id).await;
        sections
            .into_iter()
            .find(|s| s.section_key == key)
            .expect("section exists")
    }

    pub async fn status(&self) -> SessionStatus {
        self.store
            .session(self.session_id)
            .await
            .expect("session exists")
            .status
    }
}

/// A session in `mapping` status with the given template and content.
pub async fn fixture_with(
    template: Vec<TemplateSectionInfo>,
    sections: impl FnOnce(Uuid) -> Vec<MappedSectionContent>,
) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let session_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();
    let now = jiff::Timestamp::now();

    store
        .insert_session(Session {
            id: session_id,
            status: SessionStatus::Mapping,
            template_id,
            created_at: now,
            updated_at: now,
        })
        .await;
    store.insert_template(template_id, template).await;
    store.insert_sections(sections(session_id)).await;

    let service = GapService::from_store(store.clone(), DetectionConfig::default());
    Fixture {
        store,
        service,
        session_id,
    }
}

pub async fn soap_fixture() -> Fixture {
    fixture_with(soap_template(), soap_sections).await
}
