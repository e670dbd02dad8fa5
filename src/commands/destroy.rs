// ABOUTME: Destroy command implementation.
// ABOUTME: Tears down infrastructure after a typed-name confirmation, then removes local files.

use super::context::Context;
use roughneck::config::ConfigStore;
use roughneck::error::Result;
use roughneck::provision::{ProvisioningBackend, Toolchain};

pub async fn destroy(ctx: &Context, name: Option<String>, force: bool) -> Result<i32> {
    let tools = Toolchain::detect()?;
    let name = ctx.select_deployment(name, "destroy", false)?;

    ctx.output.header(&format!("Destroy: {name}"));
    if let Ok(Some(config)) = ctx.store.read(&name) {
        ctx.output
            .line(&format!("  Provider:  {}", config.provider.kind()));
    }
    if let Some(ip) = ctx.store.ip(&name) {
        ctx.output.line(&format!("  Server IP: {ip}"));
    }
    ctx.output
        .warning("This will permanently destroy all infrastructure!");

    if !force {
        let typed = ctx
            .ui
            .ask(&format!("Type '{name}' to confirm: "))
            .unwrap_or_default();
        if typed != name.as_str() {
            ctx.output.error("Name does not match. Aborted.");
            return Ok(0);
        }
    }

    ctx.output.header("Destroying Infrastructure");
    if !ctx.tofu(&tools).destroy(&name).await? {
        ctx.output.error("Terraform destroy failed");
        return Ok(1);
    }

    ctx.store.delete(&name)?;
    ctx.output.success(&format!("Deployment '{name}' destroyed"));
    Ok(0)
}
