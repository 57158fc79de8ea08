//! notewell-core
//!
//! Pure domain types, the session state machine, and storage key conventions.
//! No AWS SDK dependency; this is the shared vocabulary of the Notewell system.

pub mod error;
pub mod keys;
pub mod models;
