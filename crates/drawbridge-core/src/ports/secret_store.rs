//! Secret store port (driven/secondary port)
//!
//! Interface for the OS credential store used for per-target secrets.
//! The production adapter wraps the system keyring; tests use an
//! in-memory map.
//!
//! ## Design Notes
//!
//! - `get` returns `Ok(None)` for an absent secret; only infrastructure
//!   failures (keyring daemon unreachable, permission denied) are errors.
//! - `delete` of an absent secret is a no-op, so target removal is
//!   idempotent.
//! - Calls are synchronous: OS keyrings expose blocking APIs and the
//!   values are tiny.

/// Port trait for secret storage
///
/// Keys are composed as `<target>/<field>` by the registry; the store
/// treats them as opaque.
pub trait ISecretStore: Send + Sync {
    /// Reads a secret, `None` if absent
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes (or overwrites) a secret
    fn store(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Deletes a secret; absent secrets are ignored
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}
