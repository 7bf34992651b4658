//! YAML-file adapter for the target list repository port
//!
//! The persisted state is just the ordered list of target names; a flat
//! YAML sequence next to the configuration file covers it.

use std::path::PathBuf;

use anyhow::{Context, Result};

use drawbridge_core::domain::newtypes::TargetName;
use drawbridge_core::ports::target_list::ITargetListRepository;

/// Target list persisted as a YAML sequence of names
pub struct YamlTargetListRepository {
    path: PathBuf,
}

impl YamlTargetListRepository {
    /// Creates a repository at the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform-appropriate default path for the target list file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drawbridge/targets.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("drawbridge")
            .join("targets.yaml")
    }
}

impl ITargetListRepository for YamlTargetListRepository {
    fn load(&self) -> Result<Vec<TargetName>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let names: Vec<String> =
            serde_yaml::from_str(&content).context("Failed to parse target list")?;
        names
            .into_iter()
            .map(|name| TargetName::new(name).map_err(anyhow::Error::from))
            .collect()
    }

    fn save(&self, targets: &[TargetName]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let names: Vec<&str> = targets.iter().map(TargetName::as_str).collect();
        let content = serde_yaml::to_string(&names).context("Failed to serialize target list")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
