//! Session state - the current target and bucket selection
//!
//! A `Session` is the single mutable root the rest of the engine works
//! through: it owns the [`TargetRegistry`] and the current target/bucket
//! selection, and fires the refresh sink after every state change. The
//! engine holds it behind `Arc<tokio::sync::RwLock<Session>>`; nothing
//! here is static.

use std::sync::Arc;

use tracing::info;

use drawbridge_core::domain::errors::EngineError;
use drawbridge_core::domain::newtypes::{BucketName, TargetName};
use drawbridge_core::ports::frontend::{ICredentialPrompt, IRefreshSink};
use drawbridge_core::ports::object_store::IObjectStore;

use crate::registry::TargetRegistry;

/// Mutable session state: registry plus the current selection
pub struct Session {
    registry: TargetRegistry,
    current_target: Option<TargetName>,
    current_bucket: Option<BucketName>,
    /// Bumped on every selection change; observers compare it to detect
    /// switches without holding the lock
    selection_epoch: u64,
    refresh: Arc<dyn IRefreshSink>,
}

impl Session {
    /// Creates a session with nothing selected
    pub fn new(registry: TargetRegistry, refresh: Arc<dyn IRefreshSink>) -> Self {
        Self {
            registry,
            current_target: None,
            current_bucket: None,
            selection_epoch: 0,
            refresh,
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// The currently selected target, if any
    #[must_use]
    pub fn current_target(&self) -> Option<&TargetName> {
        self.current_target.as_ref()
    }

    /// The currently selected bucket, if any
    #[must_use]
    pub fn current_bucket(&self) -> Option<&BucketName> {
        self.current_bucket.as_ref()
    }

    /// The configured target names
    #[must_use]
    pub fn targets(&self) -> &[TargetName] {
        self.registry.targets()
    }

    /// Monotonic counter of selection changes
    ///
    /// Anything keyed by the current selection (the watch set above all)
    /// is stale once this value moves.
    #[must_use]
    pub fn selection_epoch(&self) -> u64 {
        self.selection_epoch
    }

    /// Selects a target, clearing any bucket selection
    ///
    /// The bucket namespace is per-target, so a stale bucket selection
    /// must never survive a target switch.
    pub fn select_target(&mut self, name: &TargetName) -> Result<(), EngineError> {
        if !self.registry.contains(name) {
            return Err(EngineError::Configuration(name.to_string()));
        }
        info!(target = %name, "Target selected");
        self.current_target = Some(name.clone());
        self.current_bucket = None;
        self.selection_epoch += 1;
        self.refresh.refresh();
        Ok(())
    }

    /// Selects a bucket within the current target
    pub fn select_bucket(&mut self, bucket: &BucketName) -> Result<(), EngineError> {
        if self.current_target.is_none() {
            return Err(EngineError::NoTargetSelected);
        }
        info!(bucket = %bucket, "Bucket selected");
        self.current_bucket = Some(bucket.clone());
        self.selection_epoch += 1;
        self.refresh.refresh();
        Ok(())
    }

    /// Clears the bucket selection
    pub fn clear_bucket(&mut self) {
        if self.current_bucket.take().is_some() {
            self.selection_epoch += 1;
            self.refresh.refresh();
        }
    }

    // ========================================================================
    // Connection resolution
    // ========================================================================

    /// The store connection for the current target
    ///
    /// # Errors
    /// `NoTargetSelected` with no selection; registry errors otherwise.
    pub fn connection(&mut self) -> Result<Arc<dyn IObjectStore>, EngineError> {
        let target = self
            .current_target
            .clone()
            .ok_or(EngineError::NoTargetSelected)?;
        self.registry.connect(&target)
    }

    /// The full current context: target, bucket, and connection
    ///
    /// # Errors
    /// `NoTargetSelected` / `NoBucketSelected` if the selection is
    /// incomplete.
    pub fn current_context(
        &mut self,
    ) -> Result<(TargetName, BucketName, Arc<dyn IObjectStore>), EngineError> {
        let target = self
            .current_target
            .clone()
            .ok_or(EngineError::NoTargetSelected)?;
        let bucket = self
            .current_bucket
            .clone()
            .ok_or(EngineError::NoBucketSelected)?;
        let connection = self.registry.connect(&target)?;
        Ok((target, bucket, connection))
    }

    // ========================================================================
    // Target lifecycle (registry pass-through + selection upkeep)
    // ========================================================================

    /// Adds a target; see [`TargetRegistry::add`]
    pub async fn add_target(
        &mut self,
        name: &TargetName,
        prompt: &dyn ICredentialPrompt,
    ) -> Result<bool, EngineError> {
        let added = self.registry.add(name, prompt).await?;
        if added {
            self.refresh.refresh();
        }
        Ok(added)
    }

    /// Edits a target's credentials; see [`TargetRegistry::edit`]
    pub async fn edit_target(
        &mut self,
        name: &TargetName,
        prompt: &dyn ICredentialPrompt,
    ) -> Result<bool, EngineError> {
        let updated = self.registry.edit(name, prompt).await?;
        if updated {
            self.refresh.refresh();
        }
        Ok(updated)
    }

    /// Removes a target; a removed current target falls back to the first
    /// remaining one (or none), and the bucket selection clears with it
    pub fn remove_target(&mut self, name: &TargetName) -> Result<(), EngineError> {
        self.registry.remove(name)?;

        if self.current_target.as_ref() == Some(name) {
            self.current_target = self.registry.targets().first().cloned();
            self.current_bucket = None;
            self.selection_epoch += 1;
            info!(
                fallback = self
                    .current_target
                    .as_ref()
                    .map_or("<none>", TargetName::as_str),
                "Current target removed, selection moved"
            );
        }
        self.refresh.refresh();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
