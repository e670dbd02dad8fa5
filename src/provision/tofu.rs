// ABOUTME: OpenTofu/Terraform backend for provisioning deployment infrastructure.
// ABOUTME: Runs init, apply, and destroy with per-deployment var files, state, and credentials.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::process::{run_inherited, run_streaming};
use super::{ApplyReport, BackendError, ProvisioningBackend};
use crate::config::{ConfigStore, FeatureConfig, FsConfigStore, ProviderKind};
use crate::types::DeploymentName;

/// Drives the `tofu` (or `terraform`) binary against a deployment directory.
#[derive(Debug, Clone)]
pub struct TofuBackend {
    command: PathBuf,
    terraform_dir: PathBuf,
    store: FsConfigStore,
}

impl TofuBackend {
    pub fn new(command: PathBuf, terraform_dir: PathBuf, store: FsConfigStore) -> Self {
        Self {
            command,
            terraform_dir,
            store,
        }
    }

    fn config(&self, name: &DeploymentName) -> Result<FeatureConfig, BackendError> {
        self.store
            .read(name)
            .map_err(|e| BackendError::Config {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| BackendError::MissingConfig(name.to_string()))
    }

    /// Provider module directory: the deployment's isolated copy when present,
    /// else the shared one.
    fn provider_dir(&self, name: &DeploymentName, provider: ProviderKind) -> PathBuf {
        let isolated = self
            .store
            .deployment_dir(name)
            .join("terraform")
            .join("providers")
            .join(provider.as_str());
        if isolated.is_dir() {
            return isolated;
        }
        self.terraform_dir.join("providers").join(provider.as_str())
    }

    /// Give the deployment its own copy of the shared provider module, so later
    /// edits to the shared module leave existing deployments alone.
    /// Returns `None` when there is no shared module to copy.
    pub fn isolate_modules(
        &self,
        name: &DeploymentName,
        provider: ProviderKind,
    ) -> std::io::Result<Option<PathBuf>> {
        let shared = self.terraform_dir.join("providers").join(provider.as_str());
        if !shared.is_dir() {
            return Ok(None);
        }
        let target = self
            .store
            .deployment_dir(name)
            .join("terraform")
            .join("providers")
            .join(provider.as_str());
        copy_module(&shared, &target)?;
        Ok(Some(target))
    }

    fn base_command(&self, cwd: &Path, config: &FeatureConfig) -> Command {
        let mut command = Command::new(&self.command);
        command
            .current_dir(cwd)
            .envs(config.provider.credential_env());
        command
    }

    /// `apply`/`destroy` arguments pointing at the deployment's var file and state.
    fn plan_args(&self, name: &DeploymentName) -> Vec<String> {
        let deploy_dir = self.store.deployment_dir(name);
        vec![
            "-auto-approve".to_string(),
            format!("-var-file={}", self.store.config_path(name).display()),
            format!("-var=deployment_dir={}", deploy_dir.display()),
            format!("-state={}", self.store.state_path(name).display()),
        ]
    }

    async fn run_init(&self, cwd: &Path, config: &FeatureConfig) -> Result<bool, BackendError> {
        let mut command = self.base_command(cwd, config);
        command.arg("init").arg("-input=false");
        run_inherited(command).await
    }
}

/// Recursive copy that leaves out tool caches and state.
fn copy_module(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let skip = file_name.to_str().is_some_and(|n| {
            n == ".terraform" || n.ends_with(".tfstate") || n.ends_with(".tfstate.backup")
        });
        if skip {
            continue;
        }

        let source = entry.path();
        let dest = to.join(&file_name);
        if entry.file_type()?.is_dir() {
            copy_module(&source, &dest)?;
        } else {
            std::fs::copy(&source, &dest)?;
        }
    }
    Ok(())
}

#[async_trait]
impl ProvisioningBackend for TofuBackend {
    async fn init(&self, name: &DeploymentName) -> Result<bool, BackendError> {
        let config = self.config(name)?;
        let cwd = self.provider_dir(name, config.provider.kind());
        tracing::info!("terraform init for {} in {}", name, cwd.display());
        self.run_init(&cwd, &config).await
    }

    async fn apply(&self, name: &DeploymentName) -> Result<ApplyReport, BackendError> {
        let config = self.config(name)?;
        let cwd = self.provider_dir(name, config.provider.kind());
        tracing::info!("terraform apply for {} in {}", name, cwd.display());

        let mut command = self.base_command(&cwd, &config);
        command.arg("apply").arg("-input=false").args(self.plan_args(name));

        let (success, output) = run_streaming(command).await?;
        if success {
            Ok(ApplyReport::succeeded())
        } else {
            Ok(ApplyReport::failed(output))
        }
    }

    async fn destroy(&self, name: &DeploymentName) -> Result<bool, BackendError> {
        if !self.store.has_persisted_state(name) {
            tracing::info!("no state for {}, nothing to destroy", name);
            return Ok(true);
        }

        let config = self.config(name)?;
        let cwd = self.provider_dir(name, config.provider.kind());

        // Modules may have been cleared by deployments on other providers.
        if !self.run_init(&cwd, &config).await? {
            return Ok(false);
        }

        let mut command = self.base_command(&cwd, &config);
        command.arg("destroy").args(self.plan_args(name));
        run_inherited(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend(dir: &TempDir) -> TofuBackend {
        TofuBackend::new(
            PathBuf::from("tofu"),
            dir.path().join("terraform"),
            FsConfigStore::new(dir.path().join("deployments")),
        )
    }

    #[test]
    fn provider_dir_prefers_isolated_copy() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let name = DeploymentName::new("dev").unwrap();

        let shared = dir.path().join("terraform/providers/hetzner");
        assert_eq!(backend.provider_dir(&name, ProviderKind::Hetzner), shared);

        let isolated = dir.path().join("deployments/dev/terraform/providers/hetzner");
        std::fs::create_dir_all(&isolated).unwrap();
        assert_eq!(backend.provider_dir(&name, ProviderKind::Hetzner), isolated);
    }

    #[test]
    fn isolate_copies_module_without_caches() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let name = DeploymentName::new("dev").unwrap();

        assert_eq!(backend.isolate_modules(&name, ProviderKind::Aws).unwrap(), None);

        let shared = dir.path().join("terraform/providers/aws");
        std::fs::create_dir_all(shared.join(".terraform/plugins")).unwrap();
        std::fs::create_dir_all(shared.join("modules/net")).unwrap();
        std::fs::write(shared.join("main.tf"), "# main").unwrap();
        std::fs::write(shared.join("modules/net/vpc.tf"), "# vpc").unwrap();
        std::fs::write(shared.join("terraform.tfstate"), "{}").unwrap();

        let target = backend
            .isolate_modules(&name, ProviderKind::Aws)
            .unwrap()
            .unwrap();
        assert!(target.join("main.tf").is_file());
        assert!(target.join("modules/net/vpc.tf").is_file());
        assert!(!target.join(".terraform").exists());
        assert!(!target.join("terraform.tfstate").exists());
        assert_eq!(backend.provider_dir(&name, ProviderKind::Aws), target);
    }

    #[test]
    fn plan_args_reference_deployment_files() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let name = DeploymentName::new("dev").unwrap();

        let args = backend.plan_args(&name);
        assert_eq!(args[0], "-auto-approve");
        assert!(args[1].ends_with("deployments/dev/terraform.tfvars.json"));
        assert!(args[3].ends_with("deployments/dev/terraform.tfstate"));
    }

    #[tokio::test]
    async fn destroy_without_state_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let name = DeploymentName::new("dev").unwrap();

        assert!(backend.destroy(&name).await.unwrap());
    }

    #[tokio::test]
    async fn init_without_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let name = DeploymentName::new("dev").unwrap();

        let err = backend.init(&name).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingConfig(_)));
    }
}
