// ABOUTME: Runs a single stage through its collaborator and normalizes the result.
// ABOUTME: Includes the bounded SSH polling loop used by ConnectWait.

use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

use super::{Stage, StageOutcome};
use crate::config::{ConfigStore, SshSettings};
use crate::output::Output;
use crate::probe::ConnectivityProbe;
use crate::provision::{BackendError, ConfigurationBackend, ProvisioningBackend};
use crate::types::DeploymentName;

/// How long and how often to probe a new server for SSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn from_settings(settings: &SshSettings) -> Self {
        Self {
            timeout: settings.wait_timeout,
            interval: settings.poll_interval,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_settings(&SshSettings::default())
    }
}

/// Dispatches stages to the provisioning, configuration, and connectivity collaborators.
pub struct StageExecutor<'a> {
    store: &'a dyn ConfigStore,
    provisioner: &'a dyn ProvisioningBackend,
    configurator: &'a dyn ConfigurationBackend,
    probe: &'a dyn ConnectivityProbe,
    wait: WaitPolicy,
    output: &'a Output,
}

fn from_status(result: Result<bool, BackendError>) -> StageOutcome {
    match result {
        Ok(true) => StageOutcome::succeeded(),
        Ok(false) => StageOutcome::failed_silently(),
        Err(e) => StageOutcome::failed(e.to_string()),
    }
}

impl<'a> StageExecutor<'a> {
    pub fn new(
        store: &'a dyn ConfigStore,
        provisioner: &'a dyn ProvisioningBackend,
        configurator: &'a dyn ConfigurationBackend,
        probe: &'a dyn ConnectivityProbe,
        wait: WaitPolicy,
        output: &'a Output,
    ) -> Self {
        Self {
            store,
            provisioner,
            configurator,
            probe,
            wait,
            output,
        }
    }

    pub async fn execute(&self, stage: Stage, name: &DeploymentName) -> StageOutcome {
        tracing::info!("running stage {} for {}", stage, name);
        match stage {
            Stage::Init => {
                self.output.info("Initializing Terraform...");
                from_status(self.provisioner.init(name).await)
            }
            Stage::Apply => {
                self.output.info("Applying Terraform configuration...");
                match self.provisioner.apply(name).await {
                    Ok(report) if report.success => StageOutcome::succeeded(),
                    Ok(report) => StageOutcome::failed(report.output),
                    Err(e) => StageOutcome::failed(e.to_string()),
                }
            }
            Stage::ConnectWait => match self.store.ip(name) {
                Some(ip) => {
                    self.output.info(&format!("Waiting for SSH on {ip}..."));
                    self.wait_for_ssh(ip).await
                }
                None => {
                    tracing::debug!("no address recorded for {}, nothing to wait for", name);
                    StageOutcome::succeeded()
                }
            },
            Stage::Configure => {
                self.output.info("Running Ansible playbook...");
                from_status(self.configurator.run_playbook(name).await)
            }
        }
    }

    async fn wait_for_ssh(&self, ip: IpAddr) -> StageOutcome {
        self.probe.forget_host_key(ip).await;

        let start = Instant::now();
        while start.elapsed() < self.wait.timeout {
            if self.probe.is_reachable(ip).await {
                return StageOutcome::succeeded();
            }
            tracing::debug!("{} not reachable yet, retrying in {:?}", ip, self.wait.interval);
            tokio::time::sleep(self.wait.interval).await;
        }

        StageOutcome::failed(format!(
            "SSH on {} not reachable after {}s",
            ip,
            self.wait.timeout.as_secs()
        ))
    }
}
