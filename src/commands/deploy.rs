// ABOUTME: Deploy command implementation.
// ABOUTME: Wires the real collaborators into the orchestrator and reports its outcome.

use super::context::Context;
use roughneck::deploy::{Collaborators, Orchestrator, WaitPolicy};
use roughneck::diagnostics::WarningKind;
use roughneck::error::Result;
use roughneck::probe::TcpProbe;
use roughneck::providers::HetznerCatalog;
use roughneck::provision::Toolchain;
use roughneck::types::DeploymentName;

pub async fn deploy(ctx: &mut Context, name: Option<String>) -> Result<i32> {
    // Fail fast on missing tools before touching any stage.
    let tools = Toolchain::detect()?;
    let name = ctx.select_deployment(name, "deploy", false)?;
    run(ctx, &tools, &name).await
}

/// Run the orchestrator for `name` and return the process exit code.
pub async fn run(ctx: &mut Context, tools: &Toolchain, name: &DeploymentName) -> Result<i32> {
    let provisioner = ctx.tofu(tools);
    let configurator = ctx.ansible(tools);
    let probe = TcpProbe::from_settings(&ctx.settings.ssh);
    let catalog = HetznerCatalog::new(&ctx.settings.hetzner)?;
    let wait = WaitPolicy::from_settings(&ctx.settings.ssh);

    ctx.output.start_timer();
    let collaborators = Collaborators {
        store: &ctx.store,
        provisioner: &provisioner,
        configurator: &configurator,
        probe: &probe,
        catalog: &catalog,
        ui: &ctx.ui,
    };
    let mut orchestrator = Orchestrator::new(collaborators, &ctx.output, wait);
    let outcome = orchestrator.run_deployment(name).await;

    let diagnostics = orchestrator.diagnostics();
    if diagnostics.has_warnings() {
        ctx.output.info(&format!(
            "{} warning(s) during this run",
            diagnostics.warnings().len()
        ));
    }
    if diagnostics.has_kind(WarningKind::Reselection) {
        ctx.output.info(&format!(
            "Pick a server type by hand with: roughneck edit {name}"
        ));
    }
    tracing::info!("deployment {} finished: {:?}", name, outcome);
    Ok(outcome.exit_code())
}
