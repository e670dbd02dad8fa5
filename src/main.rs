// ABOUTME: Entry point for the roughneck CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use roughneck::error::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let mut ctx = Context::load(cli.output_mode())?;

    match cli.command {
        Commands::New(args) => {
            commands::new(&mut ctx, &args.name, &args.template_request()).await
        }
        Commands::Deploy { name } => commands::deploy(&mut ctx, name).await,
        Commands::Destroy { name, force } => commands::destroy(&ctx, name, force).await,
        Commands::List => commands::list(&ctx),
        Commands::Edit { name } => commands::edit(&mut ctx, name).await,
        Commands::Provision { name } => commands::provision(&ctx, name).await,
        Commands::Update { name, tags } => commands::update(&ctx, name, &tags).await,
        Commands::Validate { name } => commands::validate(&ctx, name).await,
        Commands::Ssh { name } => commands::ssh(&ctx, name).await,
    }
}
