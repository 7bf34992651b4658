//! Drawbridge Sync - local cache synchronization and the watch loop
//!
//! Keeps local working copies of remote artifacts fresh in both
//! directions:
//!
//! - [`cache_sync`] - resolve (download-if-stale), push (upload with
//!   freshness metadata), create, and delete operations
//! - [`watch`] - the concurrent watch set of locally-open artifacts
//! - [`engine`] - periodic prune and sync passes over the watch set,
//!   started and shut down as a unit
//! - [`filesystem`] - async filesystem adapter behind the local-cache port
//!
//! All remote access goes through the session held by
//! [`drawbridge_store::session::Session`]; nothing here talks to the
//! network directly.

pub mod cache_sync;
pub mod engine;
pub mod filesystem;
pub mod watch;
