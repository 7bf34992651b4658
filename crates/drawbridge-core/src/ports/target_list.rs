//! Target list repository port (driven/secondary port)
//!
//! Persistence for the ordered list of configured target names. Only the
//! names are persisted here; credentials live in the secret store.

use crate::domain::newtypes::TargetName;

/// Port trait for persisting the target list
pub trait ITargetListRepository: Send + Sync {
    /// Loads the persisted list (empty if nothing was ever saved)
    fn load(&self) -> anyhow::Result<Vec<TargetName>>;

    /// Saves the full list, replacing the previous contents
    fn save(&self, targets: &[TargetName]) -> anyhow::Result<()>;
}
