//! Configuration Management
//!
//! Handles persistent configuration storage for gcpimport.

use crate::resource::{DiscoveryConfig, Scheduling, DEFAULT_IGNORE_KEYS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Last used project ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Families to discover; empty means all
    #[serde(default)]
    pub families: Vec<String>,
    /// Attribute keys stripped before output; `None` uses the defaults
    #[serde(default)]
    pub ignore_keys: Option<Vec<String>>,
    /// Run collectors concurrently
    #[serde(default)]
    pub concurrent: bool,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcpimport").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective ignore keys (config > defaults)
    pub fn effective_ignore_keys(&self) -> Vec<String> {
        self.ignore_keys
            .clone()
            .unwrap_or_else(|| DEFAULT_IGNORE_KEYS.iter().map(|k| k.to_string()).collect())
    }

    /// Build the discovery inputs for `project`
    pub fn discovery_config(&self, project: &str) -> DiscoveryConfig {
        let scheduling = if self.concurrent {
            Scheduling::Concurrent
        } else {
            Scheduling::Sequential
        };

        DiscoveryConfig::new(project)
            .with_families(self.families.clone())
            .with_ignore_keys(self.effective_ignore_keys())
            .with_scheduling(scheduling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gcpimport-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("config.json");
        let config = Config {
            project_id: Some("my-project".to_string()),
            families: vec!["cloudsql".to_string()],
            ignore_keys: Some(vec!["etag".to_string()]),
            concurrent: true,
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_or_invalid_falls_back() {
        assert_eq!(Config::load_from(&temp_path("missing.json")), Config::default());

        let path = temp_path("invalid.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_cli_project_wins() {
        let config = Config {
            project_id: Some("from-config".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.effective_project(Some("from-cli-1")),
            Some("from-cli-1".to_string())
        );
        assert_eq!(config.effective_project(None), Some("from-config".to_string()));
    }

    #[test]
    fn test_discovery_config() {
        let config = Config {
            families: vec!["monitoring".to_string()],
            concurrent: true,
            ..Config::default()
        };
        let discovery = config.discovery_config("my-project");

        assert_eq!(discovery.scope, "my-project");
        assert_eq!(discovery.families, vec!["monitoring".to_string()]);
        assert_eq!(discovery.scheduling, Scheduling::Concurrent);
        assert!(discovery.ignore_keys.contains("self_link"));
    }
}
