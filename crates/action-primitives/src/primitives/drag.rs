use tabpilot_core_types::ActionResult;
use tracing::debug;

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    types::{ActionCtx, KeyMod, MouseBtn, Point, PointerEvent},
};

/// Drag with the left button from `start` to `end`; both are scaled independently.
pub async fn execute_drag(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    start: Point,
    end: Point,
) -> Result<ActionResult, ActionError> {
    let tab = ctx.tab_id;
    let from = primitives.scaled(tab, start);
    let to = primitives.scaled(tab, end);
    debug!(tab = %tab, %from, %to, "dispatching drag");

    let surface = primitives.surface();
    surface
        .dispatch_pointer(tab, PointerEvent::moved(from, None))
        .await?;
    surface
        .dispatch_pointer(
            tab,
            PointerEvent::pressed(from, MouseBtn::Left, 1, KeyMod::empty()),
        )
        .await?;
    surface
        .dispatch_pointer(tab, PointerEvent::moved(to, Some(MouseBtn::Left)))
        .await?;
    surface
        .dispatch_pointer(
            tab,
            PointerEvent::released(to, MouseBtn::Left, 1, KeyMod::empty()),
        )
        .await?;

    Ok(ActionResult::ok(format!("Dragged from {from} to {to}")))
}
