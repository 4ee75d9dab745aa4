use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by an external collaborator (automation surface, tab provider, encoder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("{message}")]
    Message { message: String },
    #[error("tab {0} not found")]
    TabNotFound(TabId),
    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl SurfaceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlates a tool call with its eventual result and with once-only permission grants.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolUseId(pub String);

impl ToolUseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ToolUseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolUseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission categories an action can require.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Navigate,
    ReadPageContent,
    Click,
    Type,
    UploadImage,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 5] = [
        PermissionKind::Navigate,
        PermissionKind::ReadPageContent,
        PermissionKind::Click,
        PermissionKind::Type,
        PermissionKind::UploadImage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PermissionKind::Navigate => "navigate",
            PermissionKind::ReadPageContent => "read_page_content",
            PermissionKind::Click => "click",
            PermissionKind::Type => "type",
            PermissionKind::UploadImage => "upload_image",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PermissionKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        PermissionKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("unknown permission category '{raw}'"))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

/// Base64-encoded image with its raster format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub data: String,
    pub format: ImageFormat,
}

impl ImagePayload {
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            format: ImageFormat::Png,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub title: String,
    pub url: String,
}

/// Snapshot of the tab group attached to successful results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabContext {
    pub current_tab_id: Option<TabId>,
    pub executed_on_tab_id: Option<TabId>,
    pub available_tabs: Vec<TabInfo>,
    pub tab_count: usize,
}

impl TabContext {
    pub fn new(
        current_tab_id: Option<TabId>,
        executed_on_tab_id: Option<TabId>,
        available_tabs: Vec<TabInfo>,
    ) -> Self {
        let tab_count = available_tabs.len();
        Self {
            current_tab_id,
            executed_on_tab_id,
            available_tabs,
            tab_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_context: Option<TabContext>,
}

/// Data shown by the approval surface next to a permission prompt.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<ImagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_coordinate: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionPrompt {
    pub tool: String,
    pub url: String,
    pub tool_use_id: ToolUseId,
    pub permission: PermissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_data: Option<PromptActionData>,
}

/// Outcome of one tool call. Exactly one variant per call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionResult {
    Ok(ActionOutput),
    Error { error: String },
    PermissionRequired(PermissionPrompt),
}

impl ActionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        ActionResult::Ok(ActionOutput {
            output: output.into(),
            image: None,
            tab_context: None,
        })
    }

    pub fn ok_with_image(output: impl Into<String>, image: ImagePayload) -> Self {
        ActionResult::Ok(ActionOutput {
            output: output.into(),
            image: Some(image),
            tab_context: None,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ActionResult::Error {
            error: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ActionResult::Error { .. })
    }

    pub fn is_permission_required(&self) -> bool {
        matches!(self, ActionResult::PermissionRequired(_))
    }

    /// Attach tab context; only successful results carry it.
    pub fn with_tab_context(self, context: TabContext) -> Self {
        match self {
            ActionResult::Ok(mut output) => {
                output.tab_context = Some(context);
                ActionResult::Ok(output)
            }
            other => other,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ActionResult::Error { error } => Some(error.as_str()),
            _ => None,
        }
    }
}
