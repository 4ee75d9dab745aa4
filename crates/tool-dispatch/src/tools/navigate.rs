use std::sync::Arc;

use action_primitives::{normalize_url, ActionPrimitives};
use async_trait::async_trait;
use gif_recorder::ActionInfo;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tabpilot_core_types::PermissionKind;

use crate::errors::DispatchError;
use crate::model::{ExecutionContext, PermissionGate, ToolOutcome};
use crate::registry::{parse_params, schema_for_params, Tool};
use crate::tools::action_ctx;

#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// URL to open, or `"back"` / `"forward"` to move through history
    pub url: String,
    /// Tab to navigate; defaults to the session's active tab
    pub tab_id: Option<i64>,
}

impl NavigateParams {
    fn is_history(&self) -> bool {
        matches!(
            self.url.trim().to_ascii_lowercase().as_str(),
            "back" | "forward"
        )
    }
}

pub struct NavigateTool {
    primitives: Arc<dyn ActionPrimitives>,
}

impl NavigateTool {
    pub fn new(primitives: Arc<dyn ActionPrimitives>) -> Self {
        Self { primitives }
    }
}

#[async_trait]
impl Tool for NavigateTool {
    fn name(&self) -> &'static str {
        "navigate"
    }

    fn description(&self) -> &'static str {
        "Navigate the active tab to a URL, or go back or forward in its history."
    }

    fn parameters(&self) -> RootSchema {
        schema_for_params::<NavigateParams>()
    }

    fn permission_gate(
        &self,
        params: &Value,
        _ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError> {
        let params: NavigateParams = parse_params(params)?;
        let gate = PermissionGate::new(PermissionKind::Navigate).with_verb("navigate");
        if params.is_history() {
            // History moves are checked against the current page.
            return Ok(Some(gate));
        }
        Ok(Some(gate.with_url(normalize_url(&params.url)?)))
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let params: NavigateParams = parse_params(&params)?;
        let action_ctx = action_ctx(ctx)?;
        let result = self.primitives.navigate(&action_ctx, &params.url).await?;
        let action = ActionInfo::new("navigate").with_text(Some(params.url));
        Ok(ToolOutcome::new(result).with_action(action))
    }
}
