use std::path::{Path, PathBuf};

use anyhow::Result;

use super::output::OutputFormat;
use crate::config::Config;
use crate::engine::{BrowserPorts, Engine};

pub struct CliContext {
    config: Config,
    config_path: PathBuf,
    from_file: bool,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, from_file: bool, output: OutputFormat) -> Self {
        Self {
            config,
            config_path,
            from_file,
            output,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_from_file(&self) -> bool {
        self.from_file
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Engine without a browser; enough for schema export and policy evaluation.
    pub async fn detached_engine(&self) -> Result<Engine> {
        Engine::new(&self.config, BrowserPorts::detached()).await
    }
}
