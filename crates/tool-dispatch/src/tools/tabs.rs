//! Tab tools. Both run without an active tab.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabpilot_core_types::{ActionResult, TabId, TabInfo};
use tracing::info;

use crate::context::{SessionContext, SessionContexts};
use crate::errors::DispatchError;
use crate::model::{ExecutionContext, PermissionGate, ToolOutcome};
use crate::ports::TabGroupProvider;
use crate::registry::{schema_for_params, Tool};

#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
struct NoParams {}

#[derive(Serialize)]
struct TabListing<'a> {
    current_tab_id: Option<TabId>,
    tabs: &'a [TabInfo],
}

pub struct TabsContextTool {
    tabs: Arc<dyn TabGroupProvider>,
}

impl TabsContextTool {
    pub fn new(tabs: Arc<dyn TabGroupProvider>) -> Self {
        Self { tabs }
    }
}

#[async_trait]
impl Tool for TabsContextTool {
    fn name(&self) -> &'static str {
        "tabs_context"
    }

    fn description(&self) -> &'static str {
        "List the tabs in this session's tab group."
    }

    fn parameters(&self) -> RootSchema {
        schema_for_params::<NoParams>()
    }

    fn permission_gate(
        &self,
        _params: &Value,
        _ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError> {
        Ok(None)
    }

    async fn execute(
        &self,
        _params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let Some(tab) = ctx.tab_id else {
            return Ok(ActionResult::ok(
                "No tab group exists for this session yet. Use tabs_create to open a tab.",
            )
            .into());
        };
        let tabs = self.tabs.list_tabs_with_metadata(tab).await?;
        let listing = TabListing {
            current_tab_id: Some(tab),
            tabs: &tabs,
        };
        let output = serde_json::to_string_pretty(&listing)
            .map_err(|err| DispatchError::Configuration(err.to_string()))?;
        Ok(ActionResult::ok(output).into())
    }
}

pub struct TabsCreateTool {
    tabs: Arc<dyn TabGroupProvider>,
    contexts: Arc<SessionContexts>,
}

impl TabsCreateTool {
    pub fn new(tabs: Arc<dyn TabGroupProvider>, contexts: Arc<SessionContexts>) -> Self {
        Self { tabs, contexts }
    }
}

#[async_trait]
impl Tool for TabsCreateTool {
    fn name(&self) -> &'static str {
        "tabs_create"
    }

    fn description(&self) -> &'static str {
        "Open a new tab in this session's tab group and make it the active tab."
    }

    fn parameters(&self) -> RootSchema {
        schema_for_params::<NoParams>()
    }

    fn permission_gate(
        &self,
        _params: &Value,
        _ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError> {
        Ok(None)
    }

    async fn execute(
        &self,
        _params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let (tab, group) = self.tabs.create_tab(ctx.tab_group_id).await?;
        self.contexts
            .set(ctx.session_id.clone(), SessionContext::new(tab.id, group));
        info!(tab = %tab.id, group = %group, session = %ctx.session_id, "tab created");
        Ok(ActionResult::ok(format!(
            "Created tab {} in group {} ({})",
            tab.id, group, tab.url
        ))
        .into())
    }
}
