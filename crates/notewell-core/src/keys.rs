//! Object key conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of session, template, and gap objects in the Notewell bucket.

use uuid::Uuid;

pub fn session(id: Uuid) -> String {
    format!("sessions/{id}/session.json")
}

pub fn session_sections(id: Uuid) -> String {
    format!("sessions/{id}/sections.json")
}

pub fn session_gaps(id: Uuid) -> String {
    format!("sessions/{id}/gaps.json")
}

/// Pointer from a gap id to its owning session, so a gap can be addressed
/// without knowing the session.
pub fn gap_pointer(id: Uuid) -> String {
    format!("gaps/{id}.json")
}

/// Pointer from a section row id to its owning session.
pub fn section_pointer(id: Uuid) -> String {
    format!("sections/{id}.json")
}

pub fn template_sections(id: Uuid) -> String {
    format!("templates/{id}/sections.json")
}
