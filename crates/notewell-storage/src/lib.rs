//! notewell-storage
//!
//! Collaborator store interfaces consumed by the gap engine, plus two
//! implementations: an in-memory store and an S3-backed JSON store.

pub mod error;
pub mod memory;
pub mod s3;
pub mod store;

pub use store::{BoxFuture, GapStore, SectionStore, SessionStore, TemplateStore};
