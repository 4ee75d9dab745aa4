//! Ask once, retry once.
//!
//! A `PermissionRequired` result goes to the approval port. On approval the
//! grant is recorded with the authority and the identical call runs one more
//! time. A second prompt on that retry is a protocol violation.

use permissions_broker::GrantScope;
use tabpilot_core_types::ActionResult;
use tracing::{error, info, instrument};

use crate::errors::DispatchError;
use crate::handler::ToolCallHandler;
use crate::metrics;
use crate::model::ToolCall;
use crate::ports::{ApprovalDecision, ApprovalPort, ApprovalScope};

impl ToolCallHandler {
    /// Resolve a permission prompt through `approvals`, surfacing protocol violations.
    #[instrument(skip_all, fields(tool = %call.tool_name, tool_use_id = %call.tool_use_id))]
    pub async fn try_dispatch(
        &self,
        call: &ToolCall,
        approvals: &dyn ApprovalPort,
    ) -> Result<ActionResult, DispatchError> {
        let first = self.handle(call).await;
        let ActionResult::PermissionRequired(prompt) = first else {
            return Ok(first);
        };

        let scope = match approvals.request_approval(&prompt).await {
            ApprovalDecision::Denied => {
                info!(permission = %prompt.permission, "permission denied by user");
                return Ok(ActionResult::error(format!(
                    "Permission denied by user: {} on {}",
                    prompt.permission, prompt.url
                )));
            }
            ApprovalDecision::Approved(ApprovalScope::Once) => {
                GrantScope::Once(call.tool_use_id.clone())
            }
            ApprovalDecision::Approved(ApprovalScope::Always) => GrantScope::Always,
        };
        self.authority()
            .grant(&prompt.url, prompt.permission, scope)
            .await?;

        let retry = self.handle(call).await;
        if retry.is_permission_required() {
            metrics::record_protocol_violation();
            return Err(DispatchError::ProtocolViolation {
                tool: call.tool_name.clone(),
                tool_use_id: call.tool_use_id.clone(),
            });
        }
        Ok(retry)
    }

    /// As [`try_dispatch`](Self::try_dispatch), with every error turned into an `Error` result.
    pub async fn dispatch(&self, call: &ToolCall, approvals: &dyn ApprovalPort) -> ActionResult {
        match self.try_dispatch(call, approvals).await {
            Ok(result) => result,
            Err(err) => {
                error!(tool = %call.tool_name, error = %err, "dispatch failed");
                ActionResult::error(err.to_string())
            }
        }
    }
}
