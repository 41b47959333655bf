//! AOI CLI: runs the mesh-authenticated API and inspects the local daemon.

mod cli;
mod commands;
mod table;

use crate::cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = aoi_kernel::config::load_config(cli.config.as_deref());
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Serve { listen } => commands::serve(config, listen).await,
        Commands::Status { json } => commands::status(&config, json).await,
        Commands::Peers => commands::peers(&config).await,
        Commands::Check {
            tags,
            resource,
            action,
        } => commands::check(&config, &tags, &resource, &action),
    }
}
