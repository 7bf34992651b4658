//! Drawbridge Store - remote-store adapters and services
//!
//! Provides:
//! - Per-target credential custody and connection lifecycle
//! - Session state (current target, current bucket)
//! - Bucket-level operations including purge-then-delete
//! - Namespace listing (flat keys -> logical tree)
//!
//! ## Modules
//!
//! - [`registry`] - target registry: secrets, settings cache, connection cache
//! - [`session`] - current target/bucket selection state
//! - [`buckets`] - bucket catalog operations
//! - [`namespace`] - prefix+delimiter listing into `LogicalNode` children
//! - [`s3`] - `IObjectStore`/`IStoreConnector` adapters over the AWS SDK
//! - [`secrets`] - `ISecretStore` adapter over the OS keyring
//! - [`targets`] - YAML-file `ITargetListRepository` adapter

pub mod buckets;
pub mod namespace;
pub mod registry;
pub mod s3;
pub mod secrets;
pub mod session;
pub mod targets;
