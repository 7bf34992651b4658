//! Per-target credentials
//!
//! The three secret fields a target needs to reach its endpoint. Stored
//! only in the secret store and the registry's in-memory settings cache;
//! the `Debug` impl redacts the secret key so credentials can never leak
//! through logging or error formatting.

use std::fmt;

/// Credentials and endpoint for one configured target
#[derive(Clone, PartialEq, Eq)]
pub struct TargetCredentials {
    /// Access key identifier
    pub access_key_id: String,
    /// Secret access key (never logged)
    pub secret_access_key: String,
    /// Endpoint host, e.g. `http://localhost:9000`
    pub host: String,
}

impl TargetCredentials {
    /// Creates a credential set from its three fields
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            host: host.into(),
        }
    }

    /// Whether all three fields are present
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.host.is_empty()
    }
}

impl fmt::Debug for TargetCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}
