use tabpilot_core_types::ActionResult;
use tracing::debug;

use crate::{
    errors::ActionError,
    primitives::{unresolved_reference, DefaultActionPrimitives},
    types::{ActionCtx, PointerEvent, Target},
};

/// Move the pointer over the target without pressing.
pub async fn execute_hover(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    target: &Target,
) -> Result<ActionResult, ActionError> {
    let Some(point) = primitives.resolve_target(ctx.tab_id, target).await? else {
        return Ok(match target {
            Target::Reference(reference) => unresolved_reference(reference),
            Target::Coordinate(point) => ActionResult::error(format!("Cannot hover at {point}")),
        });
    };

    debug!(tab = %ctx.tab_id, x = point.x, y = point.y, "hovering");
    primitives
        .surface()
        .dispatch_pointer(ctx.tab_id, PointerEvent::moved(point, None))
        .await?;
    Ok(ActionResult::ok(format!("Hovered at {point}")))
}
