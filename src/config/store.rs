// ABOUTME: Deployment configuration store: one directory per deployment.
// ABOUTME: Reads/writes the var file and derives server IP and state presence from tfstate.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::FeatureConfig;
use crate::error::{Error, Result};
use crate::types::DeploymentName;

pub const CONFIG_FILENAME: &str = "terraform.tfvars.json";
pub const STATE_FILENAME: &str = "terraform.tfstate";
pub const INVENTORY_FILENAME: &str = "inventory.ini";
pub const SUMMARY_FILENAME: &str = "installation-summary.txt";
const PRIVATE_KEY_FILENAME: &str = "id_ed25519";
const IP_OUTPUT: &str = "server_ip";

/// Access to the persisted configuration and infrastructure record of deployments.
///
/// Writes are whole-record overwrites. Callers assume a single operator drives a
/// given deployment at a time; no locking is performed.
pub trait ConfigStore {
    /// Whether a deployment with this name has been created.
    fn exists(&self, name: &DeploymentName) -> bool;

    /// All deployments, sorted by name.
    fn list(&self) -> Result<Vec<DeploymentName>>;

    /// Read the feature configuration. `Ok(None)` when the deployment has none.
    fn read(&self, name: &DeploymentName) -> Result<Option<FeatureConfig>>;

    /// Overwrite the feature configuration.
    fn write(&self, name: &DeploymentName, config: &FeatureConfig) -> Result<()>;

    /// Public address recorded in the infrastructure state, if provisioned.
    fn ip(&self, name: &DeploymentName) -> Option<IpAddr>;

    /// Whether an infrastructure state record exists (possibly from a partial apply).
    fn has_persisted_state(&self, name: &DeploymentName) -> bool;

    fn deployment_dir(&self, name: &DeploymentName) -> PathBuf;

    /// File the operator edits to change the deployment's configuration.
    fn config_path(&self, name: &DeploymentName) -> PathBuf {
        self.deployment_dir(name).join(CONFIG_FILENAME)
    }

    fn private_key_path(&self, name: &DeploymentName) -> Option<PathBuf> {
        let path = self.deployment_dir(name).join(PRIVATE_KEY_FILENAME);
        path.is_file().then_some(path)
    }

    /// Remove every local record of the deployment.
    fn delete(&self, name: &DeploymentName) -> Result<()>;
}

/// Filesystem-backed store rooted at the project's deployments directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    root: PathBuf,
}

impl FsConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn state_path(&self, name: &DeploymentName) -> PathBuf {
        self.deployment_dir(name).join(STATE_FILENAME)
    }

    /// When the infrastructure state was last written.
    pub fn state_updated_at(&self, name: &DeploymentName) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(self.state_path(name))
            .and_then(|m| m.modified())
            .ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}

#[derive(Debug, Deserialize)]
struct StateFile {
    #[serde(default)]
    outputs: HashMap<String, StateOutput>,
}

#[derive(Debug, Deserialize)]
struct StateOutput {
    value: serde_json::Value,
}

/// Extract the server IP output from a tfstate document.
fn ip_from_state(content: &str) -> Option<IpAddr> {
    let state: StateFile = match serde_json::from_str(content) {
        Ok(state) => state,
        Err(e) => {
            tracing::debug!("unreadable state file: {}", e);
            return None;
        }
    };
    state
        .outputs
        .get(IP_OUTPUT)
        .and_then(|o| o.value.as_str())
        .and_then(|s| s.trim().parse().ok())
}

impl ConfigStore for FsConfigStore {
    fn exists(&self, name: &DeploymentName) -> bool {
        self.config_path(name).is_file()
    }

    fn list(&self) -> Result<Vec<DeploymentName>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Ok(name) = DeploymentName::new(&file_name) else {
                continue;
            };
            if self.exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &DeploymentName) -> Result<Option<FeatureConfig>> {
        let content = match std::fs::read_to_string(self.config_path(name)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config = FeatureConfig::from_json(&content).map_err(|e| {
            Error::InvalidConfig(format!("{}: {}", self.config_path(name).display(), e))
        })?;
        Ok(Some(config))
    }

    fn write(&self, name: &DeploymentName, config: &FeatureConfig) -> Result<()> {
        let dir = self.deployment_dir(name);
        std::fs::create_dir_all(&dir)?;

        // Write-then-rename so a crash never leaves a truncated var file.
        let path = self.config_path(name);
        let tmp = dir.join(format!("{CONFIG_FILENAME}.tmp"));
        std::fs::write(&tmp, config.to_json()?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn ip(&self, name: &DeploymentName) -> Option<IpAddr> {
        let content = std::fs::read_to_string(self.state_path(name)).ok()?;
        ip_from_state(&content)
    }

    fn has_persisted_state(&self, name: &DeploymentName) -> bool {
        self.state_path(name).is_file()
    }

    fn deployment_dir(&self, name: &DeploymentName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn delete(&self, name: &DeploymentName) -> Result<()> {
        let dir = self.deployment_dir(name);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_from_state_reads_server_ip_output() {
        let state = r#"{"version":4,"outputs":{"server_ip":{"value":"203.0.113.9","type":"string"}}}"#;
        assert_eq!(ip_from_state(state), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn ip_from_state_ignores_missing_or_empty_output() {
        assert_eq!(ip_from_state(r#"{"version":4,"outputs":{}}"#), None);
        assert_eq!(
            ip_from_state(r#"{"outputs":{"server_ip":{"value":""}}}"#),
            None
        );
        assert_eq!(ip_from_state("not json"), None);
    }
}
