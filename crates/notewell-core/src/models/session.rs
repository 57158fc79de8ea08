use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

/// One recording/documentation encounter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub id: Uuid,
    pub status: SessionStatus,
    pub template_id: Uuid,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionStatus {
    Pending,
    Transcribing,
    Transcribed,
    Mapping,
    GapsDetected,
    Completing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 8] = [
        SessionStatus::Pending,
        SessionStatus::Transcribing,
        SessionStatus::Transcribed,
        SessionStatus::Mapping,
        SessionStatus::GapsDetected,
        SessionStatus::Completing,
        SessionStatus::Completed,
        SessionStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Transcribing => "transcribing",
            SessionStatus::Transcribed => "transcribed",
            SessionStatus::Mapping => "mapping",
            SessionStatus::GapsDetected => "gaps_detected",
            SessionStatus::Completing => "completing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// Whether gap analysis may run against a session in this status.
    pub fn accepts_detection(self) -> bool {
        matches!(
            self,
            SessionStatus::Mapping | SessionStatus::GapsDetected | SessionStatus::Completing
        )
    }

    pub fn can_transition(self, to: SessionStatus) -> bool {
        use SessionStatus::*;

        match (self, to) {
            // Terminal states never move
            (Completed | Failed, _) => false,

            // Same state is a no-op
            (a, b) if a == b => true,

            // Unrecoverable error from any live state
            (_, Failed) => true,

            (Pending, Transcribing) => true,
            (Transcribing, Transcribed) => true,
            (Transcribed, Mapping) => true,

            // Detection either finds gaps or finds the session ready
            (Mapping, GapsDetected) => true,
            (Mapping, Completing) => true,

            (GapsDetected, Completing) => true,

            // Re-detection after new content arrived
            (Completing, GapsDetected) => true,

            (Completing, Completed) => true,

            _ => false,
        }
    }

    /// Validate and return the target status.
    pub fn transition(self, to: SessionStatus) -> Result<SessionStatus, CoreError> {
        if !self.can_transition(to) {
            return Err(CoreError::InvalidTransition { from: self, to });
        }
        Ok(to)
    }

    pub fn valid_next_states(self) -> Vec<SessionStatus> {
        Self::ALL
            .into_iter()
            .filter(|&s| s != self && self.can_transition(s))
            .collect()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
