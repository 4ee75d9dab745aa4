use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::{GroupId, PermissionPrompt, SurfaceError, TabId, TabInfo};

/// Tab and tab-group metadata for the browser the engine drives.
#[async_trait]
pub trait TabGroupProvider: Send + Sync {
    /// Tabs in the group of `reference_tab`, in display order.
    async fn list_tabs_with_metadata(
        &self,
        reference_tab: TabId,
    ) -> Result<Vec<TabInfo>, SurfaceError>;

    /// Open a tab in `group`, or in a fresh group when `None`.
    async fn create_tab(&self, group: Option<GroupId>) -> Result<(TabInfo, GroupId), SurfaceError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScope {
    Once,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "scope", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved(ApprovalScope),
    Denied,
}

/// External surface that shows a permission prompt and waits for the user.
///
/// No timeout is applied on this side; cancellation belongs to the implementation.
#[async_trait]
pub trait ApprovalPort: Send + Sync {
    async fn request_approval(&self, prompt: &PermissionPrompt) -> ApprovalDecision;
}
