// ABOUTME: Collaborator contracts for the external provisioning tools.
// ABOUTME: Defines ProvisioningBackend (OpenTofu/Terraform) and ConfigurationBackend (Ansible).

mod ansible;
mod process;
mod tofu;
mod tools;

pub use ansible::AnsibleBackend;
pub use tofu::TofuBackend;
pub use tools::Toolchain;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::types::DeploymentName;

/// Result of an infrastructure apply. `output` holds the captured tool output
/// so failures can be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub success: bool,
    pub output: String,
}

impl ApplyReport {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            output: String::new(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Infrastructure-as-code tool driving the cloud resources of a deployment.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Prepare the working directory (providers, modules). `Ok(false)` on non-zero exit.
    async fn init(&self, name: &DeploymentName) -> Result<bool, BackendError>;

    /// Create or update the infrastructure.
    async fn apply(&self, name: &DeploymentName) -> Result<ApplyReport, BackendError>;

    /// Tear the infrastructure down. Succeeds trivially when nothing was created.
    async fn destroy(&self, name: &DeploymentName) -> Result<bool, BackendError>;
}

/// Configuration-management tool that installs software on the server.
#[async_trait]
pub trait ConfigurationBackend: Send + Sync {
    /// Run the main provisioning playbook.
    async fn run_playbook(&self, name: &DeploymentName) -> Result<bool, BackendError>;

    /// Run the post-deployment health checks.
    async fn run_validate(&self, name: &DeploymentName) -> Result<bool, BackendError>;

    /// Run the update playbook restricted to `tags`.
    async fn run_update(&self, name: &DeploymentName, tags: &[String])
    -> Result<bool, BackendError>;
}

/// Errors invoking an external provisioning tool.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no configuration found for deployment '{0}'")]
    MissingConfig(String),

    #[error("unreadable configuration for deployment '{name}': {reason}")]
    Config { name: String, reason: String },

    #[error("inventory not found: {0} (has the server been provisioned?)")]
    MissingInventory(PathBuf),
}
