// ABOUTME: Hetzner Cloud API settings.
// ABOUTME: Base URL and request timeout for the server type catalog.

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.hetzner.cloud/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct HetznerSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for HetznerSettings {
    fn default() -> Self {
        HetznerSettings {
            api_url: default_api_url(),
            request_timeout: default_request_timeout(),
        }
    }
}
