//! Drawbridge Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Directory`, `FileNode`, `LogicalNode`, `TargetCredentials`
//! - **Newtypes** - `TargetName`, `BucketName`, `ObjectKey` with construction-time validation
//! - **Port definitions** - Traits for adapters: `IObjectStore`, `ISecretStore`,
//!   `ILocalCache`, `ICredentialPrompt`, `IEditorVisibility`, `IRefreshSink`
//! - **Error taxonomy** - `DomainError` (validation) and `EngineError` (operational)
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement: the object
//! store and secret store are implemented by `drawbridge-store`, the local
//! cache filesystem by `drawbridge-sync`, and the UI-facing ports (credential
//! prompt, editor visibility, refresh) by the embedding application.

pub mod config;
pub mod domain;
pub mod ports;
