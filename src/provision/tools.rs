// ABOUTME: Discovery of the external tools the deployment engine drives.
// ABOUTME: Prefers OpenTofu over Terraform and reports every missing tool at once.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Resolved paths of the required external tools.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub terraform: PathBuf,
    pub ansible: PathBuf,
}

impl Toolchain {
    /// Locate the tools on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ToolUnavailable` naming every tool that could not be found.
    pub fn detect() -> Result<Self> {
        Self::detect_with(|program| which::which(program).ok())
    }

    pub fn detect_with(lookup: impl Fn(&str) -> Option<PathBuf>) -> Result<Self> {
        let terraform = lookup("tofu").or_else(|| lookup("terraform"));
        let ansible = lookup("ansible-playbook");

        match (terraform, ansible) {
            (Some(terraform), Some(ansible)) => Ok(Toolchain { terraform, ansible }),
            (terraform, ansible) => {
                let mut missing = Vec::new();
                if terraform.is_none() {
                    missing.push("tofu or terraform".to_string());
                }
                if ansible.is_none() {
                    missing.push("ansible-playbook".to_string());
                }
                Err(Error::ToolUnavailable(missing))
            }
        }
    }
}
