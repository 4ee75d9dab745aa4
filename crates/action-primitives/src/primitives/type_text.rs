use tabpilot_core_types::ActionResult;
use tracing::debug;

use crate::{errors::ActionError, primitives::DefaultActionPrimitives, types::ActionCtx};

/// Type literal text into whatever currently has focus.
pub async fn execute_type_text(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    text: &str,
) -> Result<ActionResult, ActionError> {
    if text.is_empty() {
        return Err(ActionError::validation("text is required for type"));
    }
    debug!(tab = %ctx.tab_id, chars = text.chars().count(), "typing text");
    primitives.surface().type_text(ctx.tab_id, text).await?;
    Ok(ActionResult::ok(format!("Typed \"{text}\"")))
}
