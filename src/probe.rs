// ABOUTME: SSH connectivity checks and session helpers for deployed servers.
// ABOUTME: TCP reachability probe, known_hosts cleanup, and ssh command rendering.

use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;

use crate::config::SshSettings;
use crate::error::{Error, Result};

/// Network reachability of a deployment's SSH endpoint.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Whether the SSH port accepts TCP connections. Never errors; failure is `false`.
    async fn is_reachable(&self, ip: IpAddr) -> bool;

    /// Drop any cached host key for `ip`. Providers reuse addresses, so a stale
    /// key would otherwise block the first connection.
    async fn forget_host_key(&self, _ip: IpAddr) {}
}

/// Probes by opening a TCP connection to the SSH port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn from_settings(settings: &SshSettings) -> Self {
        Self::new(settings.port, settings.probe_timeout)
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn is_reachable(&self, ip: IpAddr) -> bool {
        let addr = SocketAddr::new(ip, self.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("{} not reachable: {}", addr, e);
                false
            }
            Err(_) => {
                tracing::debug!("{} timed out after {:?}", addr, self.timeout);
                false
            }
        }
    }

    async fn forget_host_key(&self, ip: IpAddr) {
        let result = Command::new("ssh-keygen")
            .arg("-R")
            .arg(ip.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = result {
            tracing::warn!("could not remove host key for {}: {}", ip, e);
        }
    }
}

/// Command line an operator can paste to reach the server.
pub fn ssh_command(user: &str, ip: IpAddr, key: Option<&Path>) -> String {
    match key {
        Some(key) => format!("ssh -i {} {}@{}", key.display(), user, ip),
        None => format!("ssh {user}@{ip}"),
    }
}

/// Open an interactive SSH session and wait for it to end. Returns the session's exit code.
pub async fn open_session(user: &str, ip: IpAddr, key: Option<&Path>) -> Result<i32> {
    let mut command = Command::new("ssh");
    if let Some(key) = key {
        command.arg("-i").arg(key);
    }
    command
        .arg("-o")
        .arg("StrictHostKeyChecking=accept-new")
        .arg(format!("{user}@{ip}"));

    let status = command.status().await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ToolUnavailable(vec!["ssh".to_string()]),
        _ => Error::Io(e),
    })?;
    Ok(status.code().unwrap_or(1))
}
