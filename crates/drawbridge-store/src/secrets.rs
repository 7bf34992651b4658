//! OS keyring adapter for the secret store port
//!
//! Stores each per-target credential field as its own keyring entry under
//! a single service name. A missing entry reads as `None` and deletes as a
//! no-op; only infrastructure failures (keyring daemon unreachable) become
//! errors.

use anyhow::{Context, Result};
use tracing::debug;

use drawbridge_core::ports::secret_store::ISecretStore;

/// Keyring service name for drawbridge secrets
const KEYRING_SERVICE: &str = "drawbridge";

/// Secret store backed by the system keyring
///
/// Uses the `keyring` crate to store values in the OS credential store
/// (e.g. GNOME Keyring, KDE Wallet, macOS Keychain). The composed
/// `<target>/<field>` key is used as the keyring username.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Creates a store using the default service name
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Creates a store with a custom service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ISecretStore for KeyringSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!(key, "No secret stored");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store secret in keyring")?;
        debug!(key, "Stored secret");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
