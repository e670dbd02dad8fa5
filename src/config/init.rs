// ABOUTME: Config scaffolding for new deployments.
// ABOUTME: Writes a template var file with provider defaults and env-supplied credentials.

use std::net::IpAddr;

use crate::error::{Error, Result};
use crate::types::DeploymentName;

use super::{ConfigStore, DnsProvider, FeatureConfig, ProviderKind, TlsMode};

/// Options for a new deployment's starting configuration.
#[derive(Debug, Clone)]
pub struct TemplateRequest {
    pub provider: ProviderKind,
    pub ssh_public_key_path: Option<String>,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub tls_mode: Option<TlsMode>,
    /// Defaults to the cloud provider's own DNS service when a domain is set.
    pub dns_provider: Option<DnsProvider>,
    pub firewall_allowed_ips: Vec<String>,
    pub k9s: bool,
    pub autocoder: bool,
    pub gastown: bool,
    pub beads: bool,
    pub systemd_services: bool,
    pub glm: bool,
}

impl TemplateRequest {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            ssh_public_key_path: None,
            domain: None,
            email: None,
            tls_mode: None,
            dns_provider: None,
            firewall_allowed_ips: vec![],
            k9s: false,
            autocoder: false,
            gastown: false,
            beads: false,
            systemd_services: false,
            glm: false,
        }
    }

    fn build(&self, name: &DeploymentName) -> Result<FeatureConfig> {
        let mut config = FeatureConfig::template(self.provider);
        config.provider.fill_credentials_from_env();
        config.project_name = name.to_string();

        if let Some(path) = &self.ssh_public_key_path {
            config.ssh_public_key_path = path.trim().to_string();
        }

        if let Some(domain) = &self.domain {
            config.enable_letsencrypt = true;
            config.domain_name = Some(domain.clone());
            config.letsencrypt_email = self.email.clone();
            config.tls_mode = self.tls_mode.unwrap_or_default();
            config.dns_provider = Some(
                self.dns_provider
                    .unwrap_or_else(|| DnsProvider::native_for(self.provider)),
            );
            config.fill_dns_credentials_from_env();
        }

        config.enable_k9s = self.k9s;
        config.enable_autocoder = self.autocoder;
        config.enable_gastown = self.gastown;
        // Beads and the systemd units are part of the Gas Town stack.
        config.enable_beads = self.gastown && self.beads;
        config.enable_systemd_services = self.gastown && self.systemd_services;

        if self.glm {
            config.enable_glm = true;
            config.zai_key = std::env::var("ZAI_API_KEY").unwrap_or_default();
        }

        if !self.firewall_allowed_ips.is_empty() {
            config.enable_firewall = true;
            config.firewall_allowed_ips = self
                .firewall_allowed_ips
                .iter()
                .map(|ip| normalize_cidr(ip))
                .collect::<Result<_>>()?;
        }

        Ok(config)
    }
}

/// Bare addresses become single-host CIDRs (`/32` for IPv4, `/128` for IPv6).
fn normalize_cidr(entry: &str) -> Result<String> {
    let entry = entry.trim();
    let (addr, prefix) = match entry.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (entry, None),
    };
    let invalid = || Error::InvalidConfig(format!("invalid firewall address: '{entry}'"));

    let ip: IpAddr = addr.parse().map_err(|_| invalid())?;
    let max = if ip.is_ipv4() { 32 } else { 128 };
    let prefix = match prefix {
        Some(p) => p.parse::<u8>().ok().filter(|p| *p <= max).ok_or_else(invalid)?,
        None => max,
    };
    Ok(format!("{ip}/{prefix}"))
}

/// Create a deployment's configuration. Refuses to overwrite an existing one.
pub fn init_deployment(
    store: &dyn ConfigStore,
    name: &DeploymentName,
    request: &TemplateRequest,
) -> Result<FeatureConfig> {
    if store.exists(name) {
        return Err(Error::AlreadyExists(store.config_path(name)));
    }

    let config = request.build(name)?;
    store.write(name, &config)?;
    Ok(config)
}
