use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::context::CliContext;
use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub command: ToolsCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ToolsCommand {
    /// List the registered tools
    List(ToolsListArgs),
    /// Print the JSON schema of one tool, or of every tool when NAME is omitted
    Schema(ToolsSchemaArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ToolsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ToolsSchemaArgs {
    /// Tool name
    pub name: Option<String>,
}

#[derive(Serialize)]
struct ToolSummary<'a> {
    name: &'a str,
    description: &'a str,
}

pub async fn cmd_tools(args: ToolsArgs, ctx: &CliContext) -> Result<()> {
    match args.command {
        ToolsCommand::List(list_args) => cmd_list(list_args, ctx).await,
        ToolsCommand::Schema(schema_args) => cmd_schema(schema_args, ctx).await,
    }
}

async fn cmd_list(args: ToolsListArgs, ctx: &CliContext) -> Result<()> {
    let engine = ctx.detached_engine().await?;
    let schemas = engine.registry().export_schemas();
    let summaries: Vec<ToolSummary<'_>> = schemas
        .iter()
        .map(|schema| ToolSummary {
            name: &schema.name,
            description: &schema.description,
        })
        .collect();

    let format = if args.json {
        OutputFormat::Json
    } else {
        ctx.output()
    };
    if print_structured(format, &summaries)? {
        return Ok(());
    }

    println!("{:<14} Description", "Name");
    println!("{}", "-".repeat(72));
    for summary in summaries {
        let first_line = summary.description.lines().next().unwrap_or_default();
        println!("{:<14} {}", summary.name, first_line);
    }
    Ok(())
}

async fn cmd_schema(args: ToolsSchemaArgs, ctx: &CliContext) -> Result<()> {
    let engine = ctx.detached_engine().await?;
    let registry = engine.registry();
    // Schemas are JSON by nature; `--output yaml` is the only alternative honored.
    let format = match ctx.output() {
        OutputFormat::Yaml => OutputFormat::Yaml,
        _ => OutputFormat::Json,
    };
    match args.name {
        Some(name) => {
            let schema = registry.schema(&name).ok_or_else(|| {
                anyhow!(
                    "unknown tool '{name}' (available: {})",
                    registry.names().join(", ")
                )
            })?;
            print_structured(format, &schema)?;
        }
        None => {
            print_structured(format, &registry.export_schemas())?;
        }
    }
    Ok(())
}
