// ABOUTME: SSH reachability settings.
// ABOUTME: Port, per-probe timeout, and the bounded polling window for new servers.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct SshSettings {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Total time to wait for a new server to accept SSH connections.
    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub wait_timeout: Duration,

    /// Delay between reachability probes while waiting.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Connect timeout for a single probe.
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(150)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for SshSettings {
    fn default() -> Self {
        SshSettings {
            port: default_port(),
            wait_timeout: default_wait_timeout(),
            poll_interval: default_poll_interval(),
            probe_timeout: default_probe_timeout(),
        }
    }
}
