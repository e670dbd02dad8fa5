// ABOUTME: List command implementation.
// ABOUTME: Shows each deployment's provider, address, status, and last infrastructure change.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::Context;
use roughneck::config::ConfigStore;
use roughneck::error::Result;
use roughneck::output::OutputMode;

#[derive(Debug, Serialize)]
struct DeploymentRow {
    name: String,
    provider: String,
    ip: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

pub fn list(ctx: &Context) -> Result<i32> {
    let rows: Vec<DeploymentRow> = ctx
        .store
        .list()?
        .into_iter()
        .map(|name| {
            let provider = match ctx.store.read(&name) {
                Ok(Some(config)) => config.provider.kind().to_string(),
                Ok(None) | Err(_) => "unknown".to_string(),
            };
            let ip = ctx.store.ip(&name).map(|ip| ip.to_string());
            DeploymentRow {
                status: if ip.is_some() { "deployed" } else { "configured" },
                updated_at: ctx.store.state_updated_at(&name),
                name: name.to_string(),
                provider,
                ip,
            }
        })
        .collect();

    if ctx.output.mode() == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(0);
    }

    ctx.output.header("Deployments");
    if rows.is_empty() {
        ctx.output.line("  No deployments found.");
        ctx.output.info("Create one with: roughneck new <name>");
        return Ok(0);
    }

    ctx.output.line(&format!(
        "  {:<24} {:<13} {:<16} {:<11} {}",
        "NAME", "PROVIDER", "IP", "STATUS", "UPDATED"
    ));
    for row in &rows {
        let updated = row
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        ctx.output.line(&format!(
            "  {:<24} {:<13} {:<16} {:<11} {}",
            row.name,
            row.provider,
            row.ip.as_deref().unwrap_or("-"),
            row.status,
            updated
        ));
    }
    Ok(0)
}
