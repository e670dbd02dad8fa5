// ABOUTME: Shared command context: settings, deployment store, output, and prompts.
// ABOUTME: Also resolves the deployment a command acts on, prompting when none was given.

use roughneck::config::{ConfigStore, FsConfigStore, Settings};
use roughneck::error::{Error, Result};
use roughneck::output::{Output, OutputMode};
use roughneck::prompt::{Choice, TerminalInteraction, UserInteraction};
use roughneck::provision::{AnsibleBackend, TofuBackend, Toolchain};
use roughneck::types::DeploymentName;
use std::env;

pub struct Context {
    pub settings: Settings,
    pub store: FsConfigStore,
    pub output: Output,
    pub ui: TerminalInteraction,
}

impl Context {
    pub fn load(mode: OutputMode) -> Result<Self> {
        let cwd = env::current_dir()?;
        let settings = Settings::discover(&cwd)?;
        let store = FsConfigStore::new(settings.deployments_path());
        let ui = TerminalInteraction::new(settings.editor_command());

        Ok(Self {
            settings,
            store,
            output: Output::new(mode),
            ui,
        })
    }

    pub fn tofu(&self, tools: &Toolchain) -> TofuBackend {
        TofuBackend::new(
            tools.terraform.clone(),
            self.settings.terraform_path(),
            self.store.clone(),
        )
    }

    pub fn ansible(&self, tools: &Toolchain) -> AnsibleBackend {
        AnsibleBackend::new(
            tools.ansible.clone(),
            self.settings.ansible_path(),
            self.store.clone(),
        )
    }

    /// The deployment named on the command line, or one picked by the operator.
    /// With `require_ip`, only deployments with provisioned servers qualify.
    pub fn select_deployment(
        &self,
        name: Option<String>,
        action: &str,
        require_ip: bool,
    ) -> Result<DeploymentName> {
        if let Some(name) = name {
            let name = DeploymentName::new(&name)?;
            if !self.store.exists(&name) {
                return Err(Error::DeploymentNotFound(name.to_string()));
            }
            if require_ip && self.store.ip(&name).is_none() {
                return Err(Error::NoDeployedServers);
            }
            return Ok(name);
        }

        let mut candidates = self.store.list()?;
        if require_ip {
            candidates.retain(|n| self.store.ip(n).is_some());
        }
        if candidates.is_empty() {
            self.output.info("Create one with: roughneck new <name>");
            return Err(if require_ip {
                Error::NoDeployedServers
            } else {
                Error::NoDeployments
            });
        }

        let choices: Vec<Choice> = candidates
            .iter()
            .map(|n| Choice::new(n.as_str(), n.as_str()))
            .collect();
        let selected = self
            .ui
            .select(&format!("Select deployment to {action}:"), &choices)
            .ok_or(Error::Cancelled)?;
        Ok(DeploymentName::new(&selected)?)
    }
}
