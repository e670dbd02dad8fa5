// ABOUTME: Top-level deployment driver: resolve, run stages, recover, finish.
// ABOUTME: An explicit state loop; pausing is always safe because resolution restarts from scratch.

use std::net::IpAddr;
use std::path::Path;

use super::executor::{StageExecutor, WaitPolicy};
use super::recovery::{RecoveryAction, RecoveryMatch, classify, menu, menu_prompt};
use super::reselect::reselect_resource_type;
use super::resolver::{DeploymentSnapshot, resolve};
use super::{DeploymentOutcome, PauseReason, Stage};
use crate::config::{ConfigStore, FeatureConfig, SUMMARY_FILENAME};
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::probe::{ConnectivityProbe, ssh_command};
use crate::prompt::UserInteraction;
use crate::provision::{ConfigurationBackend, ProvisioningBackend};
use crate::providers::ResourceCatalog;
use crate::types::DeploymentName;

const CODE_SERVER_PORT: u16 = 10000;
const AUTOCODER_PORT: u16 = 10001;

/// Everything the engine drives. All of it is external to the engine.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub store: &'a dyn ConfigStore,
    pub provisioner: &'a dyn ProvisioningBackend,
    pub configurator: &'a dyn ConfigurationBackend,
    pub probe: &'a dyn ConnectivityProbe,
    pub catalog: &'a dyn ResourceCatalog,
    pub ui: &'a dyn UserInteraction,
}

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Resolving,
    Running { index: usize },
    Paused(PauseReason),
    Completed,
}

pub struct Orchestrator<'a> {
    collaborators: Collaborators<'a>,
    output: &'a Output,
    wait: WaitPolicy,
    diagnostics: Diagnostics,
}

impl<'a> Orchestrator<'a> {
    pub fn new(collaborators: Collaborators<'a>, output: &'a Output, wait: WaitPolicy) -> Self {
        Self {
            collaborators,
            output,
            wait,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Warnings collected during the run.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Drive `name` from its current persisted state to completion, or until paused.
    pub async fn run_deployment(&mut self, name: &DeploymentName) -> DeploymentOutcome {
        let Collaborators {
            store,
            provisioner,
            configurator,
            probe,
            ..
        } = self.collaborators;
        let output = self.output;
        let executor =
            StageExecutor::new(store, provisioner, configurator, probe, self.wait, output);

        let mut stages: Vec<Stage> = Vec::new();
        let mut state = RunState::Resolving;

        loop {
            tracing::debug!("{}: {:?}", name, state);
            state = match state {
                RunState::Resolving => {
                    let snapshot = DeploymentSnapshot::capture(name, store, probe).await;
                    let resolved = resolve(&snapshot);
                    self.announce(&snapshot, resolved.head);
                    stages = resolved.into_iter().collect();
                    RunState::Running { index: 0 }
                }
                RunState::Running { index } => match stages.get(index) {
                    Some(&stage) => {
                        let outcome = executor.execute(stage, name).await;
                        if outcome.success {
                            self.after_success(name, stage, index)
                        } else {
                            let text = outcome.error_text().to_string();
                            self.after_failure(name, stage, index, &text).await
                        }
                    }
                    None => RunState::Completed,
                },
                RunState::Paused(reason) => {
                    output.info(&format!(
                        "Deployment paused. Run 'roughneck deploy {name}' to resume."
                    ));
                    return DeploymentOutcome::Paused(reason);
                }
                RunState::Completed => {
                    self.print_summary(name);
                    let validated = self.validate(name).await;
                    return DeploymentOutcome::Completed { validated };
                }
            };
        }
    }

    fn announce(&self, snapshot: &DeploymentSnapshot, first: Stage) {
        let ip = snapshot
            .ip
            .map(|ip| ip.to_string())
            .unwrap_or_default();
        match first {
            Stage::Configure => self.output.info(&format!(
                "Server {ip} already running, skipping to configuration..."
            )),
            Stage::ConnectWait => self.output.info(&format!(
                "Server {ip} exists but not reachable, waiting for SSH..."
            )),
            Stage::Apply => self
                .output
                .info("Partial state found, resuming terraform apply..."),
            Stage::Init => self.output.header("Provisioning Infrastructure"),
        }
    }

    fn after_success(&mut self, name: &DeploymentName, stage: Stage, index: usize) -> RunState {
        match stage {
            Stage::Apply => {
                self.output.success("Infrastructure provisioned");
                if !self.dns_gate(name) {
                    return RunState::Paused(PauseReason::DnsPending);
                }
            }
            Stage::Configure => self.output.success("Server configured"),
            Stage::Init | Stage::ConnectWait => {}
        }
        RunState::Running { index: index + 1 }
    }

    async fn after_failure(
        &mut self,
        name: &DeploymentName,
        stage: Stage,
        index: usize,
        text: &str,
    ) -> RunState {
        self.output.error(&format!("{} failed", stage.title()));

        let found = classify(stage, text);
        let actions = menu(stage, found.is_some());
        let action = self
            .collaborators
            .ui
            .choose_action(&menu_prompt(stage), &actions)
            .filter(|a| actions.contains(a))
            .unwrap_or(RecoveryAction::Abort);
        tracing::info!("{} failed for {}, operator chose {}", stage, name, action.as_str());

        match action {
            RecoveryAction::Retry => RunState::Running { index },
            RecoveryAction::Reselect => {
                if let Some(found) = found {
                    self.reselect(name, &found).await;
                }
                RunState::Running { index }
            }
            RecoveryAction::Edit => {
                self.edit(name);
                RunState::Running { index }
            }
            RecoveryAction::Skip => RunState::Running { index: index + 1 },
            RecoveryAction::Abort => RunState::Paused(PauseReason::OperatorAbort),
        }
    }

    async fn reselect(&mut self, name: &DeploymentName, found: &RecoveryMatch) {
        let Collaborators {
            store, catalog, ui, ..
        } = self.collaborators;
        match reselect_resource_type(name, found, store, catalog, ui, self.output).await {
            Ok(selected) => self
                .output
                .success(&format!("Updated server type to: {selected}")),
            Err(e) => self.warn(Warning::reselection(e.to_string())),
        }
    }

    fn edit(&mut self, name: &DeploymentName) {
        let path = self.collaborators.store.config_path(name);
        if !self.collaborators.ui.edit_file(&path) {
            self.warn(Warning::editor(format!(
                "could not open editor; edit manually: {}",
                path.display()
            )));
        }
    }

    /// Block until the operator confirms the domain's A record. `false` pauses the run.
    fn dns_gate(&mut self, name: &DeploymentName) -> bool {
        let store = self.collaborators.store;
        let config = self.read_config(name);
        let Some(domain) = config.as_ref().and_then(FeatureConfig::tls_domain) else {
            return true;
        };
        let Some(ip) = store.ip(name) else {
            return true;
        };

        self.output.header("DNS Configuration Required");
        self.output.line(&format!("  Server IP: {ip}"));
        self.output.line(&format!("  Domain:    {domain}"));
        self.output.line("");
        self.output.line("  Configure your DNS:");
        self.output.line(&format!("    {domain}  →  A record  →  {ip}"));
        self.output.line("");

        self.collaborators
            .ui
            .confirm("DNS configured and propagated?", false)
    }

    fn print_summary(&mut self, name: &DeploymentName) {
        let store = self.collaborators.store;
        let config = self.read_config(name);
        let ip = store.ip(name);
        let key = store.private_key_path(name);
        let summary = store.deployment_dir(name).join(SUMMARY_FILENAME);

        self.output.header("Deployment Complete");
        for line in summary_lines(
            config.as_ref(),
            ip,
            key.as_deref(),
            summary.is_file().then_some(summary.as_path()),
        ) {
            self.output.line(&line);
        }
    }

    async fn validate(&mut self, name: &DeploymentName) -> bool {
        self.output.header("Validating Deployment");
        self.output.info("Running health checks...");

        let result = self.collaborators.configurator.run_validate(name).await;
        match result {
            Ok(true) => {
                self.output.success("All validations passed");
                true
            }
            Ok(false) => {
                self.warn(Warning::validation(
                    "Some validations failed - deployment may need attention",
                ));
                false
            }
            Err(e) => {
                self.warn(Warning::validation(format!("validation could not run: {e}")));
                false
            }
        }
    }

    fn read_config(&mut self, name: &DeploymentName) -> Option<FeatureConfig> {
        match self.collaborators.store.read(name) {
            Ok(config) => config,
            Err(e) => {
                self.warn(Warning::config_read(e.to_string()));
                None
            }
        }
    }

    fn warn(&mut self, warning: Warning) {
        self.output.warning(&warning.message);
        self.diagnostics.warn(warning);
    }
}

/// Connection details shown once a deployment completes.
pub fn summary_lines(
    config: Option<&FeatureConfig>,
    ip: Option<IpAddr>,
    key: Option<&Path>,
    summary_file: Option<&Path>,
) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(ip) = ip {
        let user = config.map_or("root", FeatureConfig::ssh_user);
        lines.push(format!("  SSH:         {}", ssh_command(user, ip, key)));
    }

    match (config.and_then(FeatureConfig::tls_domain), ip) {
        (Some(domain), _) => {
            lines.push(format!("  Code-server: https://{domain}  (Let's Encrypt)"));
        }
        (None, Some(ip)) => {
            lines.push(format!(
                "  Code-server: https://{ip}:{CODE_SERVER_PORT}  (self-signed cert)"
            ));
        }
        (None, None) => {}
    }

    if let (Some(config), Some(ip)) = (config, ip)
        && config.enable_autocoder
    {
        lines.push(format!(
            "  AutoCoder:   http://{ip}:{AUTOCODER_PORT}  (basic auth)"
        ));
    }

    if let Some(path) = summary_file {
        lines.push(String::new());
        lines.push(format!("  Full details: {}", path.display()));
    }
    lines
}
