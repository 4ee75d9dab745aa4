use serde::{Deserialize, Serialize};
use tabpilot_core_types::{ActionResult, PermissionKind, SessionId};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NeedsPermission,
    Exception,
    None,
}

/// One record per tool call outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallEvent {
    pub tool: String,
    pub session_id: SessionId,
    pub permission: Option<PermissionKind>,
    pub verb: Option<String>,
    pub domain: Option<String>,
    pub success: bool,
    pub failure_reason: FailureReason,
}

impl ToolCallEvent {
    pub fn new(tool: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            tool: tool.into(),
            session_id,
            permission: None,
            verb: None,
            domain: None,
            success: false,
            failure_reason: FailureReason::Exception,
        }
    }

    pub(crate) fn finish(&mut self, result: &ActionResult) {
        let (success, reason) = match result {
            ActionResult::Ok(_) => (true, FailureReason::None),
            ActionResult::PermissionRequired(_) => (false, FailureReason::NeedsPermission),
            ActionResult::Error { .. } => (false, FailureReason::Exception),
        };
        self.success = success;
        self.failure_reason = reason;
    }

    pub fn permission_label(&self) -> &'static str {
        self.permission.map(|kind| kind.label()).unwrap_or("none")
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &ToolCallEvent);
}

/// Emits analytics as structured log lines on the `tabpilot::analytics` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn record(&self, event: &ToolCallEvent) {
        info!(
            target: "tabpilot::analytics",
            tool = %event.tool,
            session = %event.session_id,
            permission = event.permission_label(),
            verb = event.verb.as_deref().unwrap_or(""),
            domain = event.domain.as_deref().unwrap_or(""),
            success = event.success,
            failure_reason = ?event.failure_reason,
            "tool call finished"
        );
    }
}
