use std::fmt;
use std::sync::Arc;

use gif_recorder::ActionInfo;
use permissions_broker::PermissionAuthority;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabpilot_core_types::{
    ActionResult, GroupId, PermissionKind, PromptActionData, SessionId, TabId, ToolUseId,
};

/// One invocation of a named tool as received from the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub raw_params: Value,
    #[serde(default)]
    pub tool_use_id: ToolUseId,
    pub session_id: SessionId,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, raw_params: Value, session_id: SessionId) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_params,
            tool_use_id: ToolUseId::new(),
            session_id,
        }
    }

    pub fn with_tool_use_id(mut self, tool_use_id: ToolUseId) -> Self {
        self.tool_use_id = tool_use_id;
        self
    }
}

/// Per-call view of the session, copied out of the session map before the tool runs.
#[derive(Clone)]
pub struct ExecutionContext {
    pub session_id: SessionId,
    pub tool_use_id: ToolUseId,
    pub tab_id: Option<TabId>,
    pub tab_group_id: Option<GroupId>,
    /// URL of `tab_id` at the time the call was resolved; empty without a tab.
    pub page_url: String,
    pub authority: Arc<dyn PermissionAuthority>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("session_id", &self.session_id)
            .field("tool_use_id", &self.tool_use_id)
            .field("tab_id", &self.tab_id)
            .field("tab_group_id", &self.tab_group_id)
            .field("page_url", &self.page_url)
            .finish()
    }
}

/// The permission a call needs before it may execute.
#[derive(Clone, Debug, PartialEq)]
pub struct PermissionGate {
    pub kind: PermissionKind,
    /// Checked instead of the tab URL when set (navigation targets).
    pub url: Option<String>,
    pub verb: Option<String>,
    pub prompt_data: Option<PromptActionData>,
    /// Attach a best-effort screenshot when prompting.
    pub wants_screenshot: bool,
}

impl PermissionGate {
    pub fn new(kind: PermissionKind) -> Self {
        Self {
            kind,
            url: None,
            verb: None,
            prompt_data: None,
            wants_screenshot: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(verb.into());
        self
    }

    pub fn with_prompt_data(mut self, data: PromptActionData) -> Self {
        self.prompt_data = Some(data);
        self
    }

    pub fn with_screenshot(mut self) -> Self {
        self.wants_screenshot = true;
        self
    }
}

/// What a tool hands back to the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutcome {
    pub result: ActionResult,
    /// Set for page actions that should leave a frame in an active recording.
    pub action: Option<ActionInfo>,
}

impl ToolOutcome {
    pub fn new(result: ActionResult) -> Self {
        Self {
            result,
            action: None,
        }
    }

    pub fn with_action(mut self, action: ActionInfo) -> Self {
        self.action = Some(action);
        self
    }
}

impl From<ActionResult> for ToolOutcome {
    fn from(result: ActionResult) -> Self {
        ToolOutcome::new(result)
    }
}
