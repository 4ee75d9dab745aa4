//! Configuration for the tabpilot CLI.
//!
//! Loaded from YAML. Lookup order: an explicit `--config` path,
//! `./config/tabpilot.yaml`, then `<config dir>/tabpilot/config.yaml`.
//! A missing file means defaults.

use std::env;
use std::path::{Path, PathBuf};

use action_primitives::ActionSettings;
use gif_recorder::EncodeOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

pub const POLICY_PATH_ENV: &str = "TABPILOT_POLICY_PATH";
pub const LOG_ENV: &str = "TABPILOT_LOG";

const LOCAL_CONFIG: &str = "config/tabpilot.yaml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub actions: ActionSettings,
    pub recording: RecordingConfig,
    pub permissions: PermissionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Frames kept per tab group before the oldest is evicted
    pub max_frames: usize,
    /// Encoder defaults applied when an export call leaves a toggle unset
    pub encode: EncodeOptions,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_frames: gif_recorder::MAX_FRAMES,
            encode: EncodeOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Policy file (YAML or JSON). Without one every category prompts.
    pub policy_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.actions
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("actions: {err}")))?;
        self.recording
            .encode
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("recording.encode: {err}")))?;
        if self.recording.max_frames == 0 {
            return Err(ConfigError::Invalid(
                "recording.max_frames must be positive".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        Ok(())
    }

    /// Apply `TABPILOT_POLICY_PATH` and `TABPILOT_LOG`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env(POLICY_PATH_ENV) {
            info!(path = %path, "policy path overridden from environment");
            self.permissions.policy_path = Some(PathBuf::from(path));
        }
        if let Some(level) = non_empty_env(LOG_ENV) {
            self.logging.level = level;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    /// False when the file was missing and defaults were used.
    pub from_file: bool,
}

/// Resolve the config path without touching the file.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("tabpilot").join("config.yaml"),
        None => local,
    }
}

pub async fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = resolve_config_path(explicit);
    let (mut config, from_file) = if path.exists() {
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config = parse_config_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "loaded configuration");
        (config, true)
    } else {
        if explicit.is_some() {
            return Err(ConfigError::Read {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        warn!(path = %path.display(), "config file not found, using defaults");
        (Config::default(), false)
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(LoadedConfig {
        config,
        path,
        from_file,
    })
}

pub fn parse_config_str(raw: &str) -> Result<Config, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(raw)
}
