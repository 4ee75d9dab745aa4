use action_primitives::ActionError;
use gif_recorder::ExportError;
use permissions_broker::BrokerError;
use tabpilot_core_types::{SurfaceError, TabId, ToolUseId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("no active tab for this session; create one with tabs_create")]
    NoActiveTab,
    #[error("tab {0} does not belong to this session's tab group")]
    TabNotInGroup(TabId),
    #[error("no tab group for this session; create a tab with tabs_create")]
    NoTabGroup,
    #[error(transparent)]
    Action(ActionError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Permission(#[from] BrokerError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("tool '{tool}' asked for permission again after approval (tool use {tool_use_id})")]
    ProtocolViolation { tool: String, tool_use_id: ToolUseId },
    #[error("handler misconfigured: {0}")]
    Configuration(String),
}

impl From<ActionError> for DispatchError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Validation(message) => DispatchError::InvalidParams(message),
            other => DispatchError::Action(other),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::InvalidParams(err.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is registered more than once")]
    DuplicateName(String),
    #[error("schema for tool '{tool}' could not be exported: {reason}")]
    Schema { tool: String, reason: String },
}
