// ABOUTME: Project settings (roughneck.yml) and per-deployment configuration.
// ABOUTME: Handles YAML discovery, defaults, and resolution of project-relative paths.

mod feature;
mod hetzner;
mod init;
mod ssh;
mod store;

pub use feature::{
    AwsConfig, DigitalOceanConfig, DnsProvider, FeatureConfig, HetznerConfig, ProviderConfig,
    ProviderKind, TlsMode, UnknownDnsProvider, UnknownProvider, UnknownTlsMode,
};
pub use hetzner::HetznerSettings;
pub use init::{TemplateRequest, init_deployment};
pub use ssh::SshSettings;
pub use store::{
    CONFIG_FILENAME as DEPLOYMENT_CONFIG_FILENAME, ConfigStore, FsConfigStore, INVENTORY_FILENAME,
    STATE_FILENAME, SUMMARY_FILENAME,
};

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "roughneck.yml";
pub const CONFIG_FILENAME_ALT: &str = "roughneck.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".roughneck/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Project root all relative paths resolve against. Set on load.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default = "default_deployments_dir")]
    pub deployments_dir: PathBuf,

    #[serde(default = "default_terraform_dir")]
    pub terraform_dir: PathBuf,

    #[serde(default = "default_ansible_dir")]
    pub ansible_dir: PathBuf,

    #[serde(default)]
    pub editor: Option<String>,

    #[serde(default)]
    pub ssh: SshSettings,

    #[serde(default)]
    pub hetzner: HetznerSettings,
}

fn default_deployments_dir() -> PathBuf {
    PathBuf::from("deployments")
}

fn default_terraform_dir() -> PathBuf {
    PathBuf::from("terraform")
}

fn default_ansible_dir() -> PathBuf {
    PathBuf::from("ansible")
}

impl Settings {
    /// Settings with every default, rooted at `root`.
    pub fn defaults(root: &Path) -> Self {
        Settings {
            root: root.to_path_buf(),
            deployments_dir: default_deployments_dir(),
            terraform_dir: default_terraform_dir(),
            ansible_dir: default_ansible_dir(),
            editor: None,
            ssh: SshSettings::default(),
            hetzner: HetznerSettings::default(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid "all defaults" settings file.
        if yaml.trim().is_empty() {
            return Ok(Self::defaults(Path::new("")));
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_yaml(&content)?;
        settings.root = root.to_path_buf();
        Ok(settings)
    }

    /// Look for a settings file in `dir`; fall back to defaults when none exists.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading settings from {}", path.display());
                return Self::load(path, dir);
            }
        }

        Ok(Self::defaults(dir))
    }

    pub fn deployments_path(&self) -> PathBuf {
        self.root.join(&self.deployments_dir)
    }

    pub fn terraform_path(&self) -> PathBuf {
        self.root.join(&self.terraform_dir)
    }

    pub fn ansible_path(&self) -> PathBuf {
        self.root.join(&self.ansible_dir)
    }

    /// Editor command: settings, then `$EDITOR`, then `$VISUAL`, then `nano`.
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "nano".to_string())
    }
}
