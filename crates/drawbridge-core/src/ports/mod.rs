//! Port definitions (hexagonal architecture)
//!
//! Traits that adapter crates implement:
//! - [`object_store`] - remote S3-compatible store operations
//! - [`secret_store`] - OS credential storage
//! - [`local_cache`] - local cache filesystem
//! - [`target_list`] - persisted list of configured target names
//! - [`frontend`] - UI-facing collaborators (credential prompt, editor
//!   visibility, refresh notifications)

pub mod frontend;
pub mod local_cache;
pub mod object_store;
pub mod secret_store;
pub mod target_list;
