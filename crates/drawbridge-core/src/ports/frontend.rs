//! Frontend ports (driving-side collaborators)
//!
//! The engine never renders anything itself; these traits are the whole of
//! its contract with the presentation layer:
//!
//! - [`ICredentialPrompt`] - modal credential entry for target add/edit
//! - [`IEditorVisibility`] - which artifacts currently have an open editor
//!   (consumed by the prune cycle)
//! - [`IRefreshSink`] - fired after any state-changing operation so
//!   dependent views can re-render
//!
//! ## Design Notes
//!
//! - `prompt` returning `None` means the user cancelled; the caller must
//!   roll back any optimistic state change.
//! - `refresh` is fire-and-forget and must not block; implementations
//!   should hand off to their own event loop.

use std::collections::HashSet;

use crate::domain::credentials::TargetCredentials;
use crate::domain::newtypes::TargetName;

/// Port trait for the credential-entry surface
#[async_trait::async_trait]
pub trait ICredentialPrompt: Send + Sync {
    /// Prompts the user for a target's credentials
    ///
    /// # Arguments
    /// * `target` - the target being configured
    /// * `existing` - current values to pre-fill when editing
    ///
    /// # Returns
    /// `Some(credentials)` on confirm, `None` on cancel
    async fn prompt(
        &self,
        target: &TargetName,
        existing: Option<&TargetCredentials>,
    ) -> Option<TargetCredentials>;
}

/// Port trait for observing open-editor state
pub trait IEditorVisibility: Send + Sync {
    /// Identities (resolved local cache paths) of all artifacts currently
    /// open in an editor
    fn open_artifact_ids(&self) -> HashSet<String>;
}

/// Port trait for refresh notifications
pub trait IRefreshSink: Send + Sync {
    /// Signals that engine state changed and views should re-render
    fn refresh(&self);
}

/// A refresh sink that drops every notification
///
/// Useful as a default for headless embedding and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRefreshSink;

impl IRefreshSink for NullRefreshSink {
    fn refresh(&self) {}
}
