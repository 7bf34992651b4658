//! Domain module - pure business logic
//!
//! Contains the logical namespace tree, validated newtypes, credentials,
//! and the error taxonomy. Nothing in this module performs I/O.

pub mod credentials;
pub mod errors;
pub mod newtypes;
pub mod node;
