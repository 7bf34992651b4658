//! Domain and engine error types
//!
//! Two layers, following the propagation policy in the engine:
//!
//! - [`DomainError`] - validation failures from newtype/entity construction.
//!   Cloneable, comparable, string payloads only.
//! - [`EngineError`] - operational failures from public engine operations.
//!   Carries the underlying adapter error as a source. Every public
//!   operation converts its failures into one of these at its boundary;
//!   a single failed operation never aborts the session.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid target name
    #[error("Invalid target name: {0}")]
    InvalidTargetName(String),

    /// Invalid bucket name
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    /// Invalid object key format or content
    #[error("Invalid object key: {0}")]
    InvalidObjectKey(String),

    /// Invalid node name (empty or containing the key delimiter)
    #[error("Invalid node name: {0}")]
    InvalidNodeName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors surfaced by engine operations
///
/// Recovery expectations per variant:
/// - `Configuration` - re-prompt for credentials; never fatal.
/// - `NoTargetSelected` / `NoBucketSelected` - precondition violation;
///   surfaced as a user-visible notice, not a crash.
/// - `Remote` - store call failed; reported with the operation name and
///   retried only implicitly on the next periodic cycle.
/// - `Local` - filesystem call failed; reported, and never undoes an
///   already-completed remote operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Credentials for a target are missing or incomplete
    #[error("Target '{0}' is not configured")]
    Configuration(String),

    /// An operation requiring a current target was invoked without one
    #[error("No target selected")]
    NoTargetSelected,

    /// An operation requiring a current bucket was invoked without one
    #[error("No bucket selected")]
    NoBucketSelected,

    /// A remote store call failed
    #[error("Remote operation '{operation}' failed")]
    Remote {
        /// Name of the failing store operation (e.g. "put_object")
        operation: String,
        /// Underlying adapter error
        #[source]
        source: anyhow::Error,
    },

    /// A local filesystem call failed
    #[error("Local I/O failed for {path}")]
    Local {
        /// Path the failing call was operating on
        path: PathBuf,
        /// Underlying adapter error
        #[source]
        source: anyhow::Error,
    },

    /// A domain-level validation error
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    /// Wraps an adapter error as a remote-operation failure
    pub fn remote(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Remote {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Wraps an adapter error as a local I/O failure
    pub fn local(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::Local {
            path: path.into(),
            source: source.into(),
        }
    }
}
