use clap::Subcommand;

use super::config::ConfigArgs;
use super::policy::PolicyArgs;
use super::tools::ToolsArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Inspect the registered tools and their parameter schemas
    Tools(ToolsArgs),

    /// Show or validate the configuration
    Config(ConfigArgs),

    /// Evaluate the permission policy for a URL
    Policy(PolicyArgs),
}
