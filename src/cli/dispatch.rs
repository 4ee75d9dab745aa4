use anyhow::Result;

use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::policy::cmd_policy;
use super::tools::cmd_tools;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Tools(args) => cmd_tools(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Policy(args) => cmd_policy(args, ctx).await,
    }
}
