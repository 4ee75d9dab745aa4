//! Named tools and their parameter schemas.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{DispatchError, RegistryError};
use crate::model::{ExecutionContext, PermissionGate, ToolOutcome};

/// A named operation the agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> RootSchema;

    /// Permission required before `execute`; `None` when the call is ungated.
    fn permission_gate(
        &self,
        params: &Value,
        ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError>;

    async fn execute(
        &self,
        params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError>;
}

/// Inline, draft 2019-09 schema for a parameter struct.
pub fn schema_for_params<T: JsonSchema>() -> RootSchema {
    SchemaSettings::draft2019_09()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator()
        .into_root_schema_for::<T>()
}

/// Deserialize coerced params into the tool's typed parameter struct.
pub fn parse_params<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T, DispatchError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    Ok(serde_json::from_value(params)?)
}

/// Exported description of one tool, shaped for an LLM tool-calling interface.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub(crate) struct RegisteredTool {
    pub(crate) tool: Arc<dyn Tool>,
    pub(crate) schema: Value,
}

/// Ordered tools with unique names.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut registered: Vec<RegisteredTool> = Vec::with_capacity(tools.len());
        for tool in tools {
            if registered.iter().any(|r| r.tool.name() == tool.name()) {
                return Err(RegistryError::DuplicateName(tool.name().to_string()));
            }
            let schema =
                serde_json::to_value(tool.parameters()).map_err(|err| RegistryError::Schema {
                    tool: tool.name().to_string(),
                    reason: err.to_string(),
                })?;
            registered.push(RegisteredTool { tool, schema });
        }
        Ok(Self { tools: registered })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entry(name).map(|entry| entry.tool.clone())
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|entry| entry.tool.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|entry| entry.tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schema(&self, name: &str) -> Option<ToolSchema> {
        self.entry(name).map(export)
    }

    pub fn export_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(export).collect()
    }
}

fn export(entry: &RegisteredTool) -> ToolSchema {
    ToolSchema {
        name: entry.tool.name().to_string(),
        description: entry.tool.description().to_string(),
        input_schema: entry.schema.clone(),
    }
}
