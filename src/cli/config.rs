use anyhow::Result;
use clap::{Args, Subcommand};

use super::context::CliContext;
use super::output::print_structured;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            if print_structured(ctx.output(), ctx.config())? {
                return Ok(());
            }
            let source = if ctx.config_from_file() {
                ctx.config_path().display().to_string()
            } else {
                format!("defaults; {} not found", ctx.config_path().display())
            };
            println!("Current configuration ({source}):");
            print!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Validate => {
            // Loading already validated the settings; building the engine checks the policy file.
            ctx.config().validate()?;
            ctx.detached_engine().await?;
            println!("Configuration is valid");
        }
    }
    Ok(())
}
