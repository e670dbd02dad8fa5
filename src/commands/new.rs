// ABOUTME: New command implementation.
// ABOUTME: Scaffolds a deployment's configuration and Terraform modules, then offers to deploy it.

use super::context::Context;
use roughneck::config::{ConfigStore, TemplateRequest, init_deployment};
use roughneck::error::Result;
use roughneck::prompt::UserInteraction;
use roughneck::provision::Toolchain;
use roughneck::types::DeploymentName;

pub async fn new(ctx: &mut Context, name: &str, request: &TemplateRequest) -> Result<i32> {
    let name = DeploymentName::new(name)?;
    let tools = Toolchain::detect()?;

    let config = init_deployment(&ctx.store, &name, request)?;
    ctx.output.success(&format!(
        "Configuration saved to {}",
        ctx.store.config_path(&name).display()
    ));

    match ctx.tofu(&tools).isolate_modules(&name, config.provider.kind())? {
        Some(path) => tracing::debug!("copied provider modules to {}", path.display()),
        None => ctx.output.warning(&format!(
            "no Terraform modules found for {} under {}",
            config.provider.kind(),
            ctx.settings.terraform_path().display()
        )),
    }

    if config.provider.credential_env().is_empty() {
        ctx.output
            .warning("no provider credentials set; add them before deploying");
    }
    if ctx.ui.confirm("Deploy now?", false) {
        return super::deploy::run(ctx, &tools, &name).await;
    }

    ctx.output
        .info(&format!("Review settings with: roughneck edit {name}"));
    ctx.output.info(&format!("Then deploy with: roughneck deploy {name}"));
    Ok(0)
}
