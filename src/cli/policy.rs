use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use permissions_broker::{origin_of, DecisionKind, PermissionAuthority, PermissionKind};
use serde::Serialize;

use super::context::CliContext;
use super::output::print_structured;

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum PolicyCommand {
    /// Show what the configured policy decides for a URL and permission category
    Check {
        /// Page URL
        url: String,
        /// One of: navigate, read_page_content, click, type, upload_image
        category: String,
    },
}

#[derive(Serialize)]
struct PolicyVerdict {
    origin: String,
    permission: PermissionKind,
    decision: &'static str,
}

pub async fn cmd_policy(args: PolicyArgs, ctx: &CliContext) -> Result<()> {
    match args.command {
        PolicyCommand::Check { url, category } => {
            let kind: PermissionKind = category.parse().map_err(|err: String| {
                let known: Vec<&str> = PermissionKind::ALL.iter().map(|k| k.label()).collect();
                anyhow!("{err} (expected one of: {})", known.join(", "))
            })?;
            let engine = ctx.detached_engine().await?;
            let check = engine.broker.check_permission(&url, kind, None).await?;
            let verdict = PolicyVerdict {
                origin: origin_of(&url),
                permission: kind,
                decision: decision_label(check.decision()),
            };
            if !print_structured(ctx.output(), &verdict)? {
                println!(
                    "{} on {}: {}",
                    verdict.permission, verdict.origin, verdict.decision
                );
            }
        }
    }
    Ok(())
}

fn decision_label(decision: DecisionKind) -> &'static str {
    match decision {
        DecisionKind::Allow => "allow",
        DecisionKind::Deny => "deny",
        DecisionKind::Prompt => "prompt",
    }
}
