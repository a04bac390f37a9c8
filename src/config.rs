//! Engine configuration
//!
//! Loaded from a TOML file under the platform config directory, with every
//! field optional and defaulted. The config resolves into a policy set via
//! the named presets; hosts that need finer control build a `PolicySet`
//! directly.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::{AgentError, Result};
use crate::policy::{presets, PolicySet};

fn default_preset() -> String {
    "conservative".to_string()
}

fn default_max_parallel() -> usize {
    crate::agent::DEFAULT_MAX_PARALLEL_TOOLS
}

/// Engine-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Policy preset name: fast_fail, conservative, or persistent
    #[serde(default = "default_preset")]
    pub policy_preset: String,

    /// Cap on concurrently executing tools within one parallel batch
    #[serde(default = "default_max_parallel")]
    pub max_parallel_tools: usize,

    /// Directory for the file-backed job store; unset means in-memory only
    #[serde(default)]
    pub job_storage_dir: Option<PathBuf>,

    /// Override the preset's checkpoint cadence (0 disables checkpointing)
    #[serde(default)]
    pub checkpoint_interval: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy_preset: default_preset(),
            max_parallel_tools: default_max_parallel(),
            job_storage_dir: None,
            checkpoint_interval: None,
        }
    }
}

impl EngineConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| AgentError::Config("no config directory on this platform".to_string()))?;
        Ok(base.join("overseer").join("config.toml"))
    }

    /// Load from the given path, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
            .map_err(AgentError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to the given path, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self)
            .context("Failed to serialize config")
            .map_err(AgentError::from)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if presets::by_name(&self.policy_preset).is_none() {
            return Err(AgentError::Config(format!(
                "unknown policy preset '{}'",
                self.policy_preset
            )));
        }
        if self.max_parallel_tools == 0 {
            return Err(AgentError::Config(
                "max_parallel_tools must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured preset into a policy set, applying the
    /// checkpoint override when set
    pub fn policy_set(&self) -> Result<PolicySet> {
        let mut set = presets::by_name(&self.policy_preset).ok_or_else(|| {
            AgentError::Config(format!("unknown policy preset '{}'", self.policy_preset))
        })?;
        if let Some(interval) = self.checkpoint_interval {
            set.checkpoint.checkpoint_after_iterations = interval;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.policy_preset, "conservative");
        assert!(config.policy_set().is_ok());
        assert!(config.job_storage_dir.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.policy_preset, "conservative");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EngineConfig::default();
        config.policy_preset = "fast_fail".to_string();
        config.max_parallel_tools = 2;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.policy_preset, "fast_fail");
        assert_eq!(loaded.max_parallel_tools, 2);
    }

    #[test]
    fn test_checkpoint_override_applies() {
        let mut config = EngineConfig::default();
        config.checkpoint_interval = Some(7);
        let set = config.policy_set().unwrap();
        assert_eq!(set.checkpoint.checkpoint_after_iterations, 7);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "policy_preset = \"reckless\"").unwrap();

        assert!(matches!(
            EngineConfig::load(&path),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_parallel_tools = 0").unwrap();

        assert!(matches!(
            EngineConfig::load(&path),
            Err(AgentError::Config(_))
        ));
    }
}
