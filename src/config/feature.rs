// ABOUTME: Per-deployment feature configuration, persisted as a Terraform JSON var file.
// ABOUTME: Provider selection, TLS/domain settings, and feature toggles.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cloud providers a deployment can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Hetzner,
    Aws,
    DigitalOcean,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Hetzner => "hetzner",
            ProviderKind::Aws => "aws",
            ProviderKind::DigitalOcean => "digitalocean",
        }
    }

    /// Whether resource types can be listed programmatically for reselection.
    pub fn supports_reselection(&self) -> bool {
        matches!(self, ProviderKind::Hetzner)
    }

    /// Var file keys written by this provider's settings, tag included.
    fn var_names(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Hetzner => &[
                "provider_name",
                "hetzner_token",
                "hetzner_location",
                "hetzner_server_type",
            ],
            ProviderKind::Aws => &[
                "provider_name",
                "aws_access_key",
                "aws_secret_key",
                "aws_region",
                "aws_instance_type",
            ],
            ProviderKind::DigitalOcean => &[
                "provider_name",
                "digitalocean_token",
                "digitalocean_region",
                "digitalocean_size",
            ],
        }
    }

    /// Login user of the provider's stock images.
    pub fn default_ssh_user(&self) -> &'static str {
        match self {
            ProviderKind::Aws => "ubuntu",
            ProviderKind::Hetzner | ProviderKind::DigitalOcean => "root",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown provider '{0}' (expected hetzner, aws, or digitalocean)")]
pub struct UnknownProvider(String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hetzner" => Ok(ProviderKind::Hetzner),
            "aws" => Ok(ProviderKind::Aws),
            "digitalocean" | "do" => Ok(ProviderKind::DigitalOcean),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// How Let's Encrypt certificates are issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// One certificate per service subdomain.
    #[default]
    Http01,
    /// A single wildcard certificate; needs DNS API access.
    Dns01,
}

#[derive(Debug, Error)]
#[error("unknown TLS mode '{0}' (expected http01 or dns01)")]
pub struct UnknownTlsMode(String);

impl FromStr for TlsMode {
    type Err = UnknownTlsMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http01" | "http-01" => Ok(TlsMode::Http01),
            "dns01" | "dns-01" => Ok(TlsMode::Dns01),
            _ => Err(UnknownTlsMode(s.to_string())),
        }
    }
}

/// Where the deployment's DNS records are managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsProvider {
    Cloudflare,
    Route53,
    DigitalOcean,
    Hetzner,
}

impl DnsProvider {
    /// The cloud provider's own DNS service.
    pub fn native_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Hetzner => DnsProvider::Hetzner,
            ProviderKind::Aws => DnsProvider::Route53,
            ProviderKind::DigitalOcean => DnsProvider::DigitalOcean,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown DNS provider '{0}' (expected cloudflare, route53, digitalocean, or hetzner)")]
pub struct UnknownDnsProvider(String);

impl FromStr for DnsProvider {
    type Err = UnknownDnsProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(DnsProvider::Cloudflare),
            "route53" => Ok(DnsProvider::Route53),
            "digitalocean" | "do" => Ok(DnsProvider::DigitalOcean),
            "hetzner" => Ok(DnsProvider::Hetzner),
            _ => Err(UnknownDnsProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HetznerConfig {
    #[serde(rename = "hetzner_token", default)]
    pub token: String,
    #[serde(rename = "hetzner_location")]
    pub location: String,
    #[serde(rename = "hetzner_server_type")]
    pub server_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(rename = "aws_access_key", default)]
    pub access_key: String,
    #[serde(rename = "aws_secret_key", default)]
    pub secret_key: String,
    #[serde(rename = "aws_region")]
    pub region: String,
    #[serde(rename = "aws_instance_type")]
    pub instance_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalOceanConfig {
    #[serde(rename = "digitalocean_token", default)]
    pub token: String,
    #[serde(rename = "digitalocean_region")]
    pub region: String,
    #[serde(rename = "digitalocean_size")]
    pub size: String,
}

/// Provider-specific settings, tagged by `provider_name` in the var file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider_name")]
pub enum ProviderConfig {
    #[serde(rename = "hetzner")]
    Hetzner(HetznerConfig),
    #[serde(rename = "aws")]
    Aws(AwsConfig),
    #[serde(rename = "digitalocean")]
    DigitalOcean(DigitalOceanConfig),
}

impl ProviderConfig {
    /// Starting values for a new deployment. Credentials are left empty.
    pub fn template(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Hetzner => ProviderConfig::Hetzner(HetznerConfig {
                token: String::new(),
                location: "fsn1".to_string(),
                server_type: "cx32".to_string(),
            }),
            ProviderKind::Aws => ProviderConfig::Aws(AwsConfig {
                access_key: String::new(),
                secret_key: String::new(),
                region: "us-east-1".to_string(),
                instance_type: "t3.medium".to_string(),
            }),
            ProviderKind::DigitalOcean => ProviderConfig::DigitalOcean(DigitalOceanConfig {
                token: String::new(),
                region: "nyc1".to_string(),
                size: "s-2vcpu-4gb".to_string(),
            }),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Hetzner(_) => ProviderKind::Hetzner,
            ProviderConfig::Aws(_) => ProviderKind::Aws,
            ProviderConfig::DigitalOcean(_) => ProviderKind::DigitalOcean,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ProviderConfig::Hetzner(c) => &c.location,
            ProviderConfig::Aws(c) => &c.region,
            ProviderConfig::DigitalOcean(c) => &c.region,
        }
    }

    pub fn resource_type(&self) -> &str {
        match self {
            ProviderConfig::Hetzner(c) => &c.server_type,
            ProviderConfig::Aws(c) => &c.instance_type,
            ProviderConfig::DigitalOcean(c) => &c.size,
        }
    }

    pub fn set_resource_type(&mut self, resource_type: impl Into<String>) {
        let resource_type = resource_type.into();
        match self {
            ProviderConfig::Hetzner(c) => c.server_type = resource_type,
            ProviderConfig::Aws(c) => c.instance_type = resource_type,
            ProviderConfig::DigitalOcean(c) => c.size = resource_type,
        }
    }

    /// Bearer token for the provider's REST API, if it uses one and it is set.
    pub fn api_token(&self) -> Option<&str> {
        let token = match self {
            ProviderConfig::Hetzner(c) => &c.token,
            ProviderConfig::DigitalOcean(c) => &c.token,
            ProviderConfig::Aws(_) => return None,
        };
        Some(token.as_str()).filter(|t| !t.is_empty())
    }

    /// Environment variables the provider's Terraform plugin reads credentials from.
    pub fn credential_env(&self) -> Vec<(&'static str, String)> {
        let vars = match self {
            ProviderConfig::Hetzner(c) => vec![("HCLOUD_TOKEN", c.token.clone())],
            ProviderConfig::Aws(c) => vec![
                ("AWS_ACCESS_KEY_ID", c.access_key.clone()),
                ("AWS_SECRET_ACCESS_KEY", c.secret_key.clone()),
            ],
            ProviderConfig::DigitalOcean(c) => vec![("DIGITALOCEAN_TOKEN", c.token.clone())],
        };
        vars.into_iter().filter(|(_, v)| !v.is_empty()).collect()
    }

    /// Fill empty credentials from the environment variables of `credential_env`.
    pub fn fill_credentials_from_env(&mut self) {
        fn fill(slot: &mut String, var: &str) {
            if slot.is_empty()
                && let Ok(value) = std::env::var(var)
            {
                *slot = value;
            }
        }

        match self {
            ProviderConfig::Hetzner(c) => fill(&mut c.token, "HCLOUD_TOKEN"),
            ProviderConfig::Aws(c) => {
                fill(&mut c.access_key, "AWS_ACCESS_KEY_ID");
                fill(&mut c.secret_key, "AWS_SECRET_ACCESS_KEY");
            }
            ProviderConfig::DigitalOcean(c) => fill(&mut c.token, "DIGITALOCEAN_TOKEN"),
        }
    }
}

/// Var file keys the model does not know about, kept so a rewrite never drops
/// variables an operator added by hand.
///
/// The active provider's keys are removed on read: the flattened provider
/// settings already own them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UnmodelledVars(Map<String, Value>);

impl<'de> Deserialize<'de> for UnmodelledVars {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut vars = Map::deserialize(deserializer)?;
        let kind = vars
            .get("provider_name")
            .and_then(Value::as_str)
            .and_then(|p| p.parse::<ProviderKind>().ok());
        if let Some(kind) = kind {
            for key in kind.var_names() {
                vars.remove(*key);
            }
        }
        Ok(UnmodelledVars(vars))
    }
}

impl Serialize for UnmodelledVars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_name: String,

    /// Operator-supplied public key. Empty means a key pair is generated.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssh_public_key_path: String,

    #[serde(default)]
    pub enable_firewall: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub firewall_allowed_ips: Vec<String>,

    #[serde(default)]
    pub enable_k9s: bool,

    #[serde(default)]
    pub enable_autocoder: bool,

    #[serde(default)]
    pub enable_gastown: bool,

    #[serde(default)]
    pub enable_beads: bool,

    #[serde(default)]
    pub enable_systemd_services: bool,

    #[serde(default)]
    pub enable_glm: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zai_key: String,

    #[serde(default)]
    pub enable_letsencrypt: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letsencrypt_email: Option<String>,

    #[serde(default)]
    pub tls_mode: TlsMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_provider: Option<DnsProvider>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cloudflare_api_token: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hetzner_dns_token: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digitalocean_dns_token: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub route53_access_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub route53_secret_key: String,

    #[serde(flatten)]
    unmodelled: UnmodelledVars,
}

impl FeatureConfig {
    pub fn template(kind: ProviderKind) -> Self {
        FeatureConfig {
            provider: ProviderConfig::template(kind),
            project_name: String::new(),
            ssh_public_key_path: String::new(),
            enable_firewall: false,
            firewall_allowed_ips: vec![],
            enable_k9s: false,
            enable_autocoder: false,
            enable_gastown: false,
            enable_beads: false,
            enable_systemd_services: false,
            enable_glm: false,
            zai_key: String::new(),
            enable_letsencrypt: false,
            domain_name: None,
            letsencrypt_email: None,
            tls_mode: TlsMode::default(),
            dns_provider: None,
            cloudflare_api_token: String::new(),
            hetzner_dns_token: String::new(),
            digitalocean_dns_token: String::new(),
            route53_access_key: String::new(),
            route53_secret_key: String::new(),
            unmodelled: UnmodelledVars::default(),
        }
    }

    /// A var file entry this model does not know about.
    pub fn unmodelled_var(&self, key: &str) -> Option<&Value> {
        self.unmodelled.0.get(key)
    }

    /// Fill empty DNS credentials, reusing the cloud credentials when the DNS
    /// provider is the cloud provider's own service.
    pub fn fill_dns_credentials_from_env(&mut self) {
        fn fill(slot: &mut String, value: Option<String>) {
            if slot.is_empty()
                && let Some(value) = value.filter(|v| !v.is_empty())
            {
                *slot = value;
            }
        }
        let env = |var: &str| std::env::var(var).ok();

        match (self.dns_provider, &self.provider) {
            (None, _) => {}
            (Some(DnsProvider::Cloudflare), _) => {
                fill(&mut self.cloudflare_api_token, env("CLOUDFLARE_API_TOKEN"))
            }
            (Some(DnsProvider::Hetzner), _) => {
                fill(&mut self.hetzner_dns_token, env("HETZNER_DNS_TOKEN"))
            }
            (Some(DnsProvider::DigitalOcean), ProviderConfig::DigitalOcean(c)) => {
                fill(&mut self.digitalocean_dns_token, Some(c.token.clone()))
            }
            (Some(DnsProvider::DigitalOcean), _) => {
                fill(&mut self.digitalocean_dns_token, env("DIGITALOCEAN_TOKEN"))
            }
            (Some(DnsProvider::Route53), ProviderConfig::Aws(c)) => {
                fill(&mut self.route53_access_key, Some(c.access_key.clone()));
                fill(&mut self.route53_secret_key, Some(c.secret_key.clone()));
            }
            (Some(DnsProvider::Route53), _) => {
                fill(&mut self.route53_access_key, env("AWS_ACCESS_KEY_ID"));
                fill(&mut self.route53_secret_key, env("AWS_SECRET_ACCESS_KEY"));
            }
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Domain to request a Let's Encrypt certificate for, when TLS-via-domain is on.
    pub fn tls_domain(&self) -> Option<&str> {
        if !self.enable_letsencrypt {
            return None;
        }
        self.domain_name
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn ssh_user(&self) -> &'static str {
        self.provider.kind().default_ssh_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_hetzner_var_file() {
        let json = r#"{
            "provider_name": "hetzner",
            "hetzner_token": "secret",
            "hetzner_location": "hel1",
            "hetzner_server_type": "cpx31",
            "enable_letsencrypt": true,
            "domain_name": "dev.example.com"
        }"#;
        let config = FeatureConfig::from_json(json).unwrap();
        assert_eq!(config.provider.kind(), ProviderKind::Hetzner);
        assert_eq!(config.provider.location(), "hel1");
        assert_eq!(config.provider.resource_type(), "cpx31");
        assert_eq!(config.provider.api_token(), Some("secret"));
        assert_eq!(config.tls_domain(), Some("dev.example.com"));
        assert!(!config.enable_autocoder);
    }

    #[test]
    fn serializes_provider_tag_inline() {
        let config = FeatureConfig::template(ProviderKind::DigitalOcean);
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(value["provider_name"], "digitalocean");
        assert_eq!(value["digitalocean_region"], "nyc1");
        assert!(value.get("domain_name").is_none());
    }

    #[test]
    fn tls_domain_requires_flag_and_non_empty_domain() {
        let mut config = FeatureConfig::template(ProviderKind::Hetzner);
        config.domain_name = Some("dev.example.com".to_string());
        assert_eq!(config.tls_domain(), None);

        config.enable_letsencrypt = true;
        assert_eq!(config.tls_domain(), Some("dev.example.com"));

        config.domain_name = Some("  ".to_string());
        assert_eq!(config.tls_domain(), None);
    }

    #[test]
    fn set_resource_type_updates_active_provider() {
        let mut provider = ProviderConfig::template(ProviderKind::Hetzner);
        provider.set_resource_type("cpx41");
        assert_eq!(provider.resource_type(), "cpx41");

        let mut provider = ProviderConfig::template(ProviderKind::Aws);
        provider.set_resource_type("t3.large");
        assert_eq!(provider.resource_type(), "t3.large");
    }

    #[test]
    fn only_hetzner_supports_reselection() {
        assert!(ProviderKind::Hetzner.supports_reselection());
        assert!(!ProviderKind::Aws.supports_reselection());
        assert!(!ProviderKind::DigitalOcean.supports_reselection());
    }

    #[test]
    fn credential_env_skips_empty_values() {
        let provider = ProviderConfig::template(ProviderKind::Aws);
        assert!(provider.credential_env().is_empty());

        let provider = ProviderConfig::Hetzner(HetznerConfig {
            token: "abc".to_string(),
            location: "fsn1".to_string(),
            server_type: "cx32".to_string(),
        });
        assert_eq!(
            provider.credential_env(),
            vec![("HCLOUD_TOKEN", "abc".to_string())]
        );
    }

    #[test]
    fn aws_has_no_api_token_and_ubuntu_user() {
        let config = FeatureConfig::template(ProviderKind::Aws);
        assert_eq!(config.provider.api_token(), None);
        assert_eq!(config.ssh_user(), "ubuntu");
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("Hetzner".parse::<ProviderKind>().unwrap(), ProviderKind::Hetzner);
        assert_eq!("do".parse::<ProviderKind>().unwrap(), ProviderKind::DigitalOcean);
        assert!("gcp".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn unknown_keys_survive_a_rewrite() {
        let json = r#"{
            "provider_name": "hetzner",
            "hetzner_token": "secret",
            "hetzner_location": "hel1",
            "hetzner_server_type": "cpx31",
            "ssh_public_key_path": "~/.ssh/id_ed25519.pub",
            "enable_gastown": true,
            "custom_volume_size": 50,
            "aws_region": "eu-west-1"
        }"#;
        let mut config = FeatureConfig::from_json(json).unwrap();
        config.provider.set_resource_type("cpx41");

        let written: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(written["custom_volume_size"], 50);
        assert_eq!(written["aws_region"], "eu-west-1");
        assert_eq!(written["ssh_public_key_path"], "~/.ssh/id_ed25519.pub");
        assert_eq!(written["enable_gastown"], true);
        assert_eq!(written["hetzner_server_type"], "cpx41");
    }

    #[test]
    fn provider_keys_are_not_duplicated_as_unmodelled() {
        let json = r#"{"provider_name": "aws", "aws_region": "us-east-1",
            "aws_instance_type": "t3.medium", "extra": "x"}"#;
        let config = FeatureConfig::from_json(json).unwrap();
        assert_eq!(config.unmodelled_var("aws_region"), None);
        assert_eq!(config.unmodelled_var("provider_name"), None);
        assert_eq!(config.unmodelled_var("extra"), Some(&Value::from("x")));

        let text = config.to_json().unwrap();
        assert_eq!(text.matches("\"aws_region\"").count(), 1);
        assert_eq!(FeatureConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn tls_and_dns_settings_use_lowercase_names() {
        let mut config = FeatureConfig::template(ProviderKind::Hetzner);
        config.tls_mode = TlsMode::Dns01;
        config.dns_provider = Some(DnsProvider::DigitalOcean);

        let value: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(value["tls_mode"], "dns01");
        assert_eq!(value["dns_provider"], "digitalocean");
        assert!(value.get("cloudflare_api_token").is_none());
    }

    #[test]
    fn dns_credentials_reuse_cloud_credentials_for_native_dns() {
        let mut config = FeatureConfig::template(ProviderKind::Aws);
        if let ProviderConfig::Aws(c) = &mut config.provider {
            c.access_key = "AKIA".to_string();
            c.secret_key = "shh".to_string();
        }
        config.dns_provider = Some(DnsProvider::Route53);
        config.fill_dns_credentials_from_env();

        assert_eq!(config.route53_access_key, "AKIA");
        assert_eq!(config.route53_secret_key, "shh");
    }

    #[test]
    fn tls_mode_and_dns_provider_parse() {
        assert_eq!("DNS01".parse::<TlsMode>().unwrap(), TlsMode::Dns01);
        assert_eq!("http-01".parse::<TlsMode>().unwrap(), TlsMode::Http01);
        assert!("tls-alpn".parse::<TlsMode>().is_err());
        assert_eq!("route53".parse::<DnsProvider>().unwrap(), DnsProvider::Route53);
        assert_eq!(DnsProvider::native_for(ProviderKind::Hetzner), DnsProvider::Hetzner);
        assert!("gandi".parse::<DnsProvider>().is_err());
    }
}
