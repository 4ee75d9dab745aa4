use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::init_logging;
use crate::config::{load_config, LoadedConfig};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    // Logging settings may come from the file, so it is read before the subscriber exists.
    let LoadedConfig {
        config,
        path,
        from_file,
    } = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, cli.debug, cli.json_logs || config.logging.json)?;

    info!("Starting tabpilot v{}", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!(path = %path.display(), "configuration loaded");
    } else {
        debug!(path = %path.display(), "no configuration file, using defaults");
    }

    let ctx = CliContext::new(config, path, from_file, cli.output);
    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {err:#}");
            Err(err)
        }
    }
}
