use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::read_to_string;
use tracing::debug;

use crate::constants::{DEFAULT_HYPERVISOR, DEFAULT_NEIGHBOR_INTERFACE, VMCTL_CONFIG_ENV};

/// Optional tunables read from `config.toml`. The registry root is not part of
/// this file, it always comes from `VMCTLDIR`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "hypervisor")]
    pub hypervisor: String,

    #[serde(rename = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    #[serde(rename = "neighbor-interface")]
    pub neighbor_interface: Option<String>,

    #[serde(rename = "ssh-options")]
    pub ssh_options: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hypervisor: DEFAULT_HYPERVISOR.to_string(),
            cache_dir: None,
            neighbor_interface: default_neighbor_interface(),
            ssh_options: [
                "-o",
                "GlobalKnownHostsFile=/dev/null",
                "-o",
                "UserKnownHostsFile=/dev/null",
                "-o",
                "StrictHostKeyChecking=no",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// The vmnet bridge only exists on macOS; elsewhere the whole neighbor table
/// is read unless an interface is configured.
fn default_neighbor_interface() -> Option<String> {
    if cfg!(target_os = "macos") {
        Some(DEFAULT_NEIGHBOR_INTERFACE.to_string())
    } else {
        None
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "vmctl", "vmctl")
}

fn resolve_settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(VMCTL_CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Settings {
    pub async fn load() -> Result<Self> {
        let Some(path) = resolve_settings_path() else {
            debug!("No config dir available, using default settings");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let settings_str = read_to_string(&path)
            .await
            .with_context(|| format!("failed to read settings from {}", path.display()))?;

        Self::from_toml(&settings_str)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn from_toml(settings_str: &str) -> Result<Self> {
        Ok(toml::from_str(settings_str)?)
    }

    /// Directory holding downloaded provider assets, shared by every vm.
    pub fn cache_root(&self) -> PathBuf {
        if let Some(cache_dir) = &self.cache_dir {
            return cache_dir.clone();
        }

        match project_dirs() {
            Some(dirs) => dirs.cache_dir().to_path_buf(),
            None => std::env::temp_dir().join("vmctl"),
        }
    }
}
