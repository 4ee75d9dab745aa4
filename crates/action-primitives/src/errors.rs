//! Error types for action primitives

use tabpilot_core_types::SurfaceError;
use thiserror::Error;

/// Failures raised by action handlers.
///
/// Outcomes the caller is expected to see (an unresolved element reference, a zoom
/// region outside the viewport) are returned as `ActionResult::Error` instead.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Missing or malformed parameter, raised before any side effect
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The automation surface rejected or failed the call
    #[error("Automation surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// A page script returned a value of the wrong shape
    #[error("Unexpected script result: {0}")]
    Script(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn validation(message: impl Into<String>) -> Self {
        ActionError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }
}
