// ABOUTME: Application-wide error types for roughneck.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::providers::CatalogError;
use crate::provision::BackendError;
use crate::types::DeploymentNameError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required tools: {}", .0.join(", "))]
    ToolUnavailable(Vec<String>),

    #[error("deployment '{0}' not found")]
    DeploymentNotFound(String),

    #[error("deployment already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("no deployments found")]
    NoDeployments,

    #[error("no deployed servers found")]
    NoDeployedServers,

    #[error("invalid deployment name: {0}")]
    InvalidName(#[from] DeploymentNameError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cancelled by operator")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_unavailable_lists_every_missing_tool() {
        let err = Error::ToolUnavailable(vec![
            "tofu or terraform".to_string(),
            "ansible-playbook".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required tools: tofu or terraform, ansible-playbook"
        );
    }
}
