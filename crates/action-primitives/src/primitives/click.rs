//! Click family: left, right, double and triple clicks.

use tabpilot_core_types::ActionResult;
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    primitives::{unresolved_reference, DefaultActionPrimitives},
    types::{ActionCtx, ClickParams, PointerEvent, Target},
};

/// Execute a click
///
/// Steps:
/// 1. Resolve the target (reference first, scaled coordinate otherwise)
/// 2. Let the navigation guard intercept the click
/// 3. Move, then press/release once per click in the sequence
pub async fn execute_click(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    params: &ClickParams,
) -> Result<ActionResult, ActionError> {
    let tab = ctx.tab_id;
    let verb = params.kind.verb();

    let Some(point) = primitives.resolve_target(tab, &params.target).await? else {
        if let Target::Reference(reference) = &params.target {
            return Ok(unresolved_reference(reference));
        }
        return Err(ActionError::Internal("coordinate target did not resolve".into()));
    };

    if let Some(guard) = primitives.guard.as_ref() {
        if let Some(intercepted) = guard.check(tab, &ctx.page_url, verb).await {
            info!(tab = %tab, action = verb, "click intercepted by navigation guard");
            return Ok(intercepted);
        }
    }

    debug!(tab = %tab, action = verb, x = point.x, y = point.y, "dispatching click");
    let surface = primitives.surface();
    let button = params.kind.button();
    surface
        .dispatch_pointer(tab, PointerEvent::moved(point, None))
        .await?;
    for count in 1..=params.kind.click_count() {
        surface
            .dispatch_pointer(
                tab,
                PointerEvent::pressed(point, button, count, params.modifiers),
            )
            .await?;
        surface
            .dispatch_pointer(
                tab,
                PointerEvent::released(point, button, count, params.modifiers),
            )
            .await?;
    }

    let location = match &params.target {
        Target::Reference(reference) => format!("element {reference} at {point}"),
        Target::Coordinate(_) => format!("at {point}"),
    };
    Ok(ActionResult::ok(params.kind.describe(&location)))
}
