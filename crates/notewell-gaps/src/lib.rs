//! notewell-gaps
//!
//! Gap detection and note completion. Scores mapped section content against
//! template requirements, emits prioritized gaps with response forms,
//! validates and merges practitioner responses, and decides when a session
//! is ready for note generation. Pure logic apart from the collaborator
//! stores injected into [`service::GapService`].

pub mod config;
pub mod descriptor;
pub mod detect;
pub mod error;
pub mod flow;
pub mod note;
pub mod prompts;
pub mod response;
pub mod scoring;
pub mod service;

pub use config::{DetectionConfig, DetectionOverrides};
pub use detect::{DetectionInput, DetectionResponse, DetectionResult, detect_gaps};
pub use service::GapService;
