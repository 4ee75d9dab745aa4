//! Policy definitions for the permissions broker.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static policy definition file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyFile {
    pub version: u32,
    pub defaults: PolicyTemplate,
    #[serde(default)]
    pub sites: Vec<SitePolicy>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyTemplate {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    /// Whether categories neither allowed nor denied should be put to the user.
    #[serde(default = "default_prompt")]
    pub prompt: bool,
    /// Lifetime of "always" grants; `session` or a humantime duration.
    pub ttl: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SitePolicy {
    pub match_pattern: String,
    pub allow: Option<Vec<String>>,
    pub deny: Option<Vec<String>>,
    pub prompt: Option<bool>,
    pub ttl: Option<String>,
    pub notes: Option<String>,
}

fn default_prompt() -> bool {
    true
}

/// Errors surfaced while loading policy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize policy: {0}")]
    Deserialize(String),
}

pub fn load_policy_from_reader<R: Read>(mut reader: R) -> Result<PolicyFile, ConfigError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_policy_str(&buf)
}

pub fn load_policy_from_path(path: impl AsRef<Path>) -> Result<PolicyFile, ConfigError> {
    let file = File::open(path.as_ref())?;
    load_policy_from_reader(file)
}

pub fn parse_policy_str(raw: &str) -> Result<PolicyFile, ConfigError> {
    match serde_json::from_str(raw) {
        Ok(policy) => Ok(policy),
        Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| {
            ConfigError::Deserialize(format!(
                "json error: {}; yaml error: {}",
                json_err, yaml_err
            ))
        }),
    }
}

/// Policy used when no file is configured: nothing is pre-granted, everything prompts.
pub fn default_policy_file() -> PolicyFile {
    PolicyFile {
        version: 1,
        defaults: PolicyTemplate {
            allow: vec![],
            deny: vec![],
            prompt: true,
            ttl: Some("session".into()),
        },
        sites: vec![],
    }
}
