// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use roughneck::config::{DnsProvider, ProviderKind, TemplateRequest, TlsMode};
use roughneck::output::OutputMode;

#[derive(Parser)]
#[command(name = "roughneck")]
#[command(about = "Provision and manage short-lived cloud development boxes")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results, warnings and errors
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit progress as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Args)]
pub struct NewArgs {
    /// Deployment name (lowercase letters, digits, hyphens)
    pub name: String,

    /// Cloud provider: hetzner, aws, or digitalocean
    #[arg(short, long, default_value = "hetzner", value_parser = parse_provider)]
    pub provider: ProviderKind,

    /// Public key to install instead of generating a key pair
    #[arg(long, value_name = "PATH")]
    pub ssh_key: Option<String>,

    /// Domain for a Let's Encrypt certificate
    #[arg(long)]
    pub domain: Option<String>,

    /// Contact email for Let's Encrypt
    #[arg(long, requires = "domain")]
    pub email: Option<String>,

    /// Certificate mode: http01 (per subdomain) or dns01 (wildcard)
    #[arg(long, requires = "domain", value_parser = parse_tls_mode)]
    pub tls_mode: Option<TlsMode>,

    /// DNS provider: cloudflare, route53, digitalocean, or hetzner [default: the cloud provider's]
    #[arg(long, requires = "domain", value_parser = parse_dns_provider)]
    pub dns_provider: Option<DnsProvider>,

    /// Restrict inbound traffic to these IPs or CIDRs (repeatable)
    #[arg(long = "firewall", value_name = "IP")]
    pub firewall: Vec<String>,

    /// Install k9s
    #[arg(long)]
    pub k9s: bool,

    /// Enable the AutoCoder service
    #[arg(long)]
    pub autocoder: bool,

    /// Install the Gas Town tools
    #[arg(long)]
    pub gastown: bool,

    /// Install the beads CLI (with --gastown)
    #[arg(long, requires = "gastown")]
    pub beads: bool,

    /// Install the Gas Town systemd services (with --gastown)
    #[arg(long, requires = "gastown")]
    pub systemd_services: bool,

    /// Enable the GLM/ZAI Claude integration (key read from ZAI_API_KEY)
    #[arg(long)]
    pub glm: bool,
}

impl NewArgs {
    pub fn template_request(&self) -> TemplateRequest {
        let mut request = TemplateRequest::new(self.provider);
        request.ssh_public_key_path = self.ssh_key.clone();
        request.domain = self.domain.clone();
        request.email = self.email.clone();
        request.tls_mode = self.tls_mode;
        request.dns_provider = self.dns_provider;
        request.firewall_allowed_ips = self.firewall.clone();
        request.k9s = self.k9s;
        request.autocoder = self.autocoder;
        request.gastown = self.gastown;
        request.beads = self.beads;
        request.systemd_services = self.systemd_services;
        request.glm = self.glm;
        request
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new deployment configuration, then offer to deploy it
    New(NewArgs),

    /// Provision and configure a deployment, resuming where it left off
    Deploy {
        /// Deployment name (prompted when omitted)
        name: Option<String>,
    },

    /// Destroy a deployment's infrastructure and local files
    Destroy {
        name: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List deployments (a JSON array with --json)
    List,

    /// Edit a deployment's configuration
    Edit { name: Option<String> },

    /// Re-run the configuration playbook on a deployed server
    Provision { name: Option<String> },

    /// Run the update playbook on a deployed server
    Update {
        name: Option<String>,

        /// Playbook tags to run, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "apt,ai_clis")]
        tags: Vec<String>,
    },

    /// Run health checks on a deployed server
    Validate { name: Option<String> },

    /// Open an SSH session to a deployed server
    Ssh { name: Option<String> },
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse().map_err(|e: roughneck::config::UnknownProvider| e.to_string())
}

fn parse_tls_mode(s: &str) -> Result<TlsMode, String> {
    s.parse().map_err(|e: roughneck::config::UnknownTlsMode| e.to_string())
}

fn parse_dns_provider(s: &str) -> Result<DnsProvider, String> {
    s.parse()
        .map_err(|e: roughneck::config::UnknownDnsProvider| e.to_string())
}
