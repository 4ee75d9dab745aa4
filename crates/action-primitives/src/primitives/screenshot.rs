use tabpilot_core_types::ActionResult;
use tracing::debug;
use uuid::Uuid;

use crate::{
    coords::ScalingContext, errors::ActionError, primitives::DefaultActionPrimitives,
    types::ActionCtx,
};

/// Capture the viewport and remember its scaling context for later coordinates.
pub async fn execute_screenshot(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
) -> Result<ActionResult, ActionError> {
    let shot = primitives.surface().screenshot(ctx.tab_id).await?;
    if shot.width == 0 || shot.height == 0 {
        return Err(ActionError::Script("screenshot has no pixels".into()));
    }

    if let (Some(viewport_width), Some(viewport_height)) =
        (shot.viewport_width, shot.viewport_height)
    {
        primitives.scaling().record(
            ctx.tab_id,
            ScalingContext {
                viewport_width: f64::from(viewport_width),
                viewport_height: f64::from(viewport_height),
                screenshot_width: f64::from(shot.width),
                screenshot_height: f64::from(shot.height),
            },
        );
    }

    let id = Uuid::new_v4();
    debug!(tab = %ctx.tab_id, %id, width = shot.width, height = shot.height, "screenshot captured");
    let output = format!(
        "Successfully captured screenshot ({}x{}, {}) - ID: {}",
        shot.width,
        shot.height,
        shot.image.format.as_str(),
        id
    );
    Ok(ActionResult::ok_with_image(output, shot.image))
}
