use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use notewell_storage::BoxFuture;

/// One completed section handed to note generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NoteSection {
    pub section_key: String,
    pub section_name: String,
    pub content: String,
    pub display_order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeneratedNote {
    pub session_id: Uuid,
    pub content: String,
    pub generated_at: jiff::Timestamp,
}

/// The external note-generation/formatting service.
pub trait NoteGenerator: Send + Sync {
    fn generate(
        &self,
        session_id: Uuid,
        sections: Vec<NoteSection>,
    ) -> BoxFuture<'_, Result<GeneratedNote, String>>;
}
