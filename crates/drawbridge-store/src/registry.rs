//! Target registry - credential custody and connection lifecycle
//!
//! Owns the persisted list of configured targets, an in-memory settings
//! cache (loaded lazily from the secret store), and a per-target cache of
//! lazily-built store connections.
//!
//! ## Lifecycle rules
//!
//! - `add` appends the name optimistically, then prompts; a cancelled
//!   prompt rolls the append back, so the operation is atomic from the
//!   caller's point of view.
//! - `edit` rewrites secrets and invalidates the cached connection on
//!   success only; the next use rebuilds it with fresh credentials.
//! - `remove` drops the name, both caches, and all three secrets.
//! - Connections are one per target, long-lived, never shared across
//!   targets, and never closed forcibly - invalidation just drops the
//!   cache entry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use drawbridge_core::domain::credentials::TargetCredentials;
use drawbridge_core::domain::errors::{DomainError, EngineError};
use drawbridge_core::domain::newtypes::TargetName;
use drawbridge_core::ports::frontend::ICredentialPrompt;
use drawbridge_core::ports::object_store::{IObjectStore, IStoreConnector};
use drawbridge_core::ports::secret_store::ISecretStore;
use drawbridge_core::ports::target_list::ITargetListRepository;

/// Secret-store field suffix for the access key id
const FIELD_ACCESS_KEY_ID: &str = "access-key-id";
/// Secret-store field suffix for the secret access key
const FIELD_SECRET_ACCESS_KEY: &str = "secret-access-key";
/// Secret-store field suffix for the endpoint host
const FIELD_HOST: &str = "host";

fn secret_key(target: &TargetName, field: &str) -> String {
    format!("{}/{}", target.as_str(), field)
}

/// Registry of configured remote targets
pub struct TargetRegistry {
    secrets: Arc<dyn ISecretStore>,
    connector: Arc<dyn IStoreConnector>,
    repository: Arc<dyn ITargetListRepository>,
    targets: Vec<TargetName>,
    /// Credentials loaded from the secret store, cached per target
    settings: HashMap<TargetName, TargetCredentials>,
    /// Lazily-built store connections, cached per target
    connections: HashMap<TargetName, Arc<dyn IObjectStore>>,
}

impl TargetRegistry {
    /// Creates a registry, loading the persisted target list
    pub fn new(
        secrets: Arc<dyn ISecretStore>,
        connector: Arc<dyn IStoreConnector>,
        repository: Arc<dyn ITargetListRepository>,
    ) -> Result<Self, EngineError> {
        let targets = repository
            .load()
            .map_err(|e| EngineError::remote("load_target_list", e))?;
        debug!(count = targets.len(), "Loaded target list");
        Ok(Self {
            secrets,
            connector,
            repository,
            targets,
            settings: HashMap::new(),
            connections: HashMap::new(),
        })
    }

    /// The configured target names, in persisted order
    #[must_use]
    pub fn targets(&self) -> &[TargetName] {
        &self.targets
    }

    /// Whether a target with this name is configured
    #[must_use]
    pub fn contains(&self, name: &TargetName) -> bool {
        self.targets.contains(name)
    }

    // ========================================================================
    // verify / connect
    // ========================================================================

    /// Verifies that all three credential fields exist for a target
    ///
    /// Lazily loads them from the secret store into the settings cache.
    /// Returns `false` - never an error - if any field is absent or the
    /// secret store is unreachable: callers must treat `false` as "not
    /// configured" and prompt, never assume a partial configuration is
    /// usable. Partial loads are not cached.
    pub fn verify(&mut self, name: &TargetName) -> bool {
        if self.settings.contains_key(name) {
            return true;
        }

        let loaded = (|| -> anyhow::Result<Option<TargetCredentials>> {
            let access_key_id = self.secrets.get(&secret_key(name, FIELD_ACCESS_KEY_ID))?;
            let secret_access_key = self
                .secrets
                .get(&secret_key(name, FIELD_SECRET_ACCESS_KEY))?;
            let host = self.secrets.get(&secret_key(name, FIELD_HOST))?;
            Ok(
                match (access_key_id, secret_access_key, host) {
                    (Some(ak), Some(sk), Some(host)) => {
                        Some(TargetCredentials::new(ak, sk, host))
                    }
                    _ => None,
                },
            )
        })();

        match loaded {
            Ok(Some(credentials)) => {
                self.settings.insert(name.clone(), credentials);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(target = %name, error = %e, "Secret store unavailable during verify");
                false
            }
        }
    }

    /// Returns the store connection for a target, building it if needed
    ///
    /// # Errors
    /// `EngineError::Configuration` if the target's credentials are missing
    /// or incomplete; `EngineError::Remote` if the connection cannot be
    /// built.
    pub fn connect(&mut self, name: &TargetName) -> Result<Arc<dyn IObjectStore>, EngineError> {
        if !self.verify(name) {
            return Err(EngineError::Configuration(name.to_string()));
        }

        if let Some(connection) = self.connections.get(name) {
            return Ok(connection.clone());
        }

        // verify() just populated the settings cache
        let credentials = self
            .settings
            .get(name)
            .ok_or_else(|| EngineError::Configuration(name.to_string()))?;

        let connection = self
            .connector
            .connect(credentials)
            .map_err(|e| EngineError::remote("connect", e))?;

        info!(target = %name, "Built store connection");
        self.connections.insert(name.clone(), connection.clone());
        Ok(connection)
    }

    // ========================================================================
    // add / edit / remove
    // ========================================================================

    /// Adds a target, prompting for its credentials
    ///
    /// The name is appended to the persisted list optimistically before
    /// prompting; a cancelled prompt rolls the append back and writes no
    /// secrets. Afterward either a fully-configured target exists or none
    /// was added.
    ///
    /// # Returns
    /// `true` if the target was added, `false` if the user cancelled
    pub async fn add(
        &mut self,
        name: &TargetName,
        prompt: &dyn ICredentialPrompt,
    ) -> Result<bool, EngineError> {
        if self.contains(name) {
            return Err(DomainError::ValidationFailed(format!(
                "Target already exists: {name}"
            ))
            .into());
        }

        self.targets.push(name.clone());
        self.persist_targets()?;

        let Some(credentials) = prompt.prompt(name, None).await else {
            info!(target = %name, "Credential entry cancelled, rolling back add");
            self.targets.retain(|t| t != name);
            self.persist_targets()?;
            return Ok(false);
        };

        if let Err(e) = self.write_secrets(name, &credentials) {
            // Keep the atomic contract: a half-written target is worse
            // than none, so roll back the list append too.
            self.targets.retain(|t| t != name);
            self.persist_targets().ok();
            self.purge_secrets(name);
            return Err(EngineError::remote("store_credentials", e));
        }

        self.settings.insert(name.clone(), credentials);
        info!(target = %name, "Target added");
        Ok(true)
    }

    /// Edits a target's credentials, prompting with existing values
    ///
    /// On success the settings cache is refreshed and any live connection
    /// is invalidated so the next use rebuilds it. A cancelled prompt
    /// changes nothing.
    ///
    /// # Returns
    /// `true` if the credentials were updated, `false` if the user cancelled
    pub async fn edit(
        &mut self,
        name: &TargetName,
        prompt: &dyn ICredentialPrompt,
    ) -> Result<bool, EngineError> {
        if !self.contains(name) {
            return Err(DomainError::ValidationFailed(format!(
                "Unknown target: {name}"
            ))
            .into());
        }

        // Best effort pre-fill; an unverifiable target just prompts blank.
        self.verify(name);
        let existing = self.settings.get(name).cloned();

        let Some(credentials) = prompt.prompt(name, existing.as_ref()).await else {
            debug!(target = %name, "Credential edit cancelled");
            return Ok(false);
        };

        self.write_secrets(name, &credentials)
            .map_err(|e| EngineError::remote("store_credentials", e))?;

        self.settings.insert(name.clone(), credentials);
        self.connections.remove(name);
        info!(target = %name, "Target credentials updated, connection invalidated");
        Ok(true)
    }

    /// Removes a target, its secrets, and its cached state
    pub fn remove(&mut self, name: &TargetName) -> Result<(), EngineError> {
        if !self.contains(name) {
            return Err(DomainError::ValidationFailed(format!(
                "Unknown target: {name}"
            ))
            .into());
        }

        self.targets.retain(|t| t != name);
        self.persist_targets()?;

        self.settings.remove(name);
        self.connections.remove(name);
        self.purge_secrets(name);

        info!(target = %name, "Target removed");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn persist_targets(&self) -> Result<(), EngineError> {
        self.repository
            .save(&self.targets)
            .map_err(|e| EngineError::remote("save_target_list", e))
    }

    fn write_secrets(
        &self,
        name: &TargetName,
        credentials: &TargetCredentials,
    ) -> anyhow::Result<()> {
        self.secrets.store(
            &secret_key(name, FIELD_ACCESS_KEY_ID),
            &credentials.access_key_id,
        )?;
        self.secrets.store(
            &secret_key(name, FIELD_SECRET_ACCESS_KEY),
            &credentials.secret_access_key,
        )?;
        self.secrets
            .store(&secret_key(name, FIELD_HOST), &credentials.host)?;
        Ok(())
    }

    fn purge_secrets(&self, name: &TargetName) {
        for field in [FIELD_ACCESS_KEY_ID, FIELD_SECRET_ACCESS_KEY, FIELD_HOST] {
            if let Err(e) = self.secrets.delete(&secret_key(name, field)) {
                warn!(target = %name, field, error = %e, "Failed to delete secret");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
