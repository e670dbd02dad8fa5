// ABOUTME: Management commands for existing deployments: edit, provision, update, validate, ssh.
// ABOUTME: Each runs a single collaborator operation outside the deploy stage loop.

use super::context::Context;
use roughneck::config::ConfigStore;
use roughneck::error::{Error, Result};
use roughneck::probe;
use roughneck::prompt::UserInteraction;
use roughneck::provision::{ConfigurationBackend, Toolchain};

pub async fn edit(ctx: &mut Context, name: Option<String>) -> Result<i32> {
    let name = ctx.select_deployment(name, "edit", false)?;
    let path = ctx.store.config_path(&name);
    ctx.output.info(&format!("Editing {}", path.display()));

    if !ctx.ui.edit_file(&path) {
        ctx.output.warning(&format!(
            "could not open editor; edit manually: {}",
            path.display()
        ));
        return Ok(1);
    }

    // Catch syntax errors now rather than halfway through a deploy.
    if let Err(e) = ctx.store.read(&name) {
        ctx.output.error(&e.to_string());
        return Ok(1);
    }
    ctx.output.success("Configuration saved");

    if ctx.ui.confirm("Deploy now?", false) {
        let tools = Toolchain::detect()?;
        return super::deploy::run(ctx, &tools, &name).await;
    }
    Ok(0)
}

pub async fn provision(ctx: &Context, name: Option<String>) -> Result<i32> {
    let tools = Toolchain::detect()?;
    let name = ctx.select_deployment(name, "provision", true)?;

    ctx.output.header(&format!("Provisioning: {name}"));
    if let Some(ip) = ctx.store.ip(&name) {
        ctx.output.info(&format!("Re-running ansible on {ip}..."));
    }

    if ctx.ansible(&tools).run_playbook(&name).await? {
        ctx.output.success("Provisioning complete");
        Ok(0)
    } else {
        ctx.output.error("Provisioning failed");
        Ok(1)
    }
}

pub async fn update(ctx: &Context, name: Option<String>, tags: &[String]) -> Result<i32> {
    let tools = Toolchain::detect()?;
    let name = ctx.select_deployment(name, "update", true)?;

    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        ctx.output.info("Nothing selected to update");
        return Ok(0);
    }

    ctx.output.header(&format!("Updating: {name}"));
    if ctx.ansible(&tools).run_update(&name, &tags).await? {
        ctx.output.success("Update complete");
        Ok(0)
    } else {
        ctx.output.error("Update failed");
        Ok(1)
    }
}

pub async fn validate(ctx: &Context, name: Option<String>) -> Result<i32> {
    let tools = Toolchain::detect()?;
    let name = ctx.select_deployment(name, "validate", true)?;

    ctx.output.header(&format!("Validating: {name}"));
    ctx.output.info("Running health checks...");

    if ctx.ansible(&tools).run_validate(&name).await? {
        ctx.output.success("All validations passed");
        Ok(0)
    } else {
        ctx.output.error("Validation failed - see details above");
        Ok(1)
    }
}

pub async fn ssh(ctx: &Context, name: Option<String>) -> Result<i32> {
    let name = ctx.select_deployment(name, "connect to", true)?;
    let ip = ctx.store.ip(&name).ok_or(Error::NoDeployedServers)?;
    let user = match ctx.store.read(&name)? {
        Some(config) => config.ssh_user(),
        None => return Err(Error::DeploymentNotFound(name.to_string())),
    };
    let key = ctx.store.private_key_path(&name);

    tracing::debug!("{}", probe::ssh_command(user, ip, key.as_deref()));
    probe::open_session(user, ip, key.as_deref()).await
}
