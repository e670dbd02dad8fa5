// ABOUTME: Ansible backend for installing and checking software on deployment servers.
// ABOUTME: Runs the main, validation, and tagged update playbooks against the deployment inventory.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use super::process::run_inherited;
use super::{BackendError, ConfigurationBackend};
use crate::config::{ConfigStore, FsConfigStore, INVENTORY_FILENAME};
use crate::types::DeploymentName;

const PLAYBOOK: &str = "playbook.yml";
const VALIDATE_PLAYBOOK: &str = "validate.yml";
const UPDATE_PLAYBOOK: &str = "update.yml";

#[derive(Debug, Clone)]
pub struct AnsibleBackend {
    command: PathBuf,
    ansible_dir: PathBuf,
    store: FsConfigStore,
}

impl AnsibleBackend {
    pub fn new(command: PathBuf, ansible_dir: PathBuf, store: FsConfigStore) -> Self {
        Self {
            command,
            ansible_dir,
            store,
        }
    }

    fn inventory(&self, name: &DeploymentName) -> Result<PathBuf, BackendError> {
        let path = self.store.deployment_dir(name).join(INVENTORY_FILENAME);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BackendError::MissingInventory(path))
        }
    }

    /// Playbook invocation with the shared arguments. Host keys are not checked;
    /// servers are recreated often enough that stale keys are expected.
    fn command(&self, name: &DeploymentName) -> Result<Command, BackendError> {
        let inventory = self.inventory(name)?;
        let deploy_dir = self.store.deployment_dir(name);

        let mut command = Command::new(&self.command);
        command
            .current_dir(&self.ansible_dir)
            .env("ANSIBLE_HOST_KEY_CHECKING", "False")
            .arg("-i")
            .arg(inventory)
            .arg("-v")
            .arg("-e")
            .arg(format!("local_deployment_dir={}", deploy_dir.display()));
        Ok(command)
    }

    async fn run(&self, name: &DeploymentName, playbook: &str) -> Result<bool, BackendError> {
        let mut command = self.command(name)?;
        command.arg(playbook);
        tracing::info!("ansible {} for {}", playbook, name);
        run_inherited(command).await
    }
}

#[async_trait]
impl ConfigurationBackend for AnsibleBackend {
    async fn run_playbook(&self, name: &DeploymentName) -> Result<bool, BackendError> {
        self.run(name, PLAYBOOK).await
    }

    async fn run_validate(&self, name: &DeploymentName) -> Result<bool, BackendError> {
        self.run(name, VALIDATE_PLAYBOOK).await
    }

    async fn run_update(
        &self,
        name: &DeploymentName,
        tags: &[String],
    ) -> Result<bool, BackendError> {
        let mut command = self.command(name)?;
        if !tags.is_empty() {
            command.arg("--tags").arg(tags.join(","));
        }
        command.arg(UPDATE_PLAYBOOK);
        tracing::info!("ansible {} for {} (tags: {:?})", UPDATE_PLAYBOOK, name, tags);
        run_inherited(command).await
    }
}
