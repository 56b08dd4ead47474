mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use vox_core::bootstrap::build_orchestrator;
use vox_core::{Config, resolve_config_path};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let orchestrator = build_orchestrator(&config)
        .await
        .context("failed to initialise storage and embedding backends")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal, stopping after the current batch");
        on_signal.cancel();
    });

    let output = commands::run(&orchestrator, cli.command, &cancel).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output.json)?);
    } else {
        println!("{}", output.text.trim_end());
    }
    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
