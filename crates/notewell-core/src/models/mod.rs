pub mod field;
pub mod gap;
pub mod section;
pub mod session;
pub mod template;
