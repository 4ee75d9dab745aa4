//! Zoom primitive - capture a viewport region at native resolution

use tabpilot_core_types::ActionResult;
use tracing::debug;

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    scripts,
    types::{ActionCtx, ClipRegion, Point},
};

pub async fn execute_zoom(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    region: [f64; 4],
) -> Result<ActionResult, ActionError> {
    validate_region(region)?;

    let tab = ctx.tab_id;
    let top_left = primitives.scaled(tab, Point::new(region[0], region[1]));
    let bottom_right = primitives.scaled(tab, Point::new(region[2], region[3]));

    let (viewport_width, viewport_height) = primitives
        .evaluate_point(tab, scripts::VIEWPORT_SIZE, "width", "height")
        .await?;
    if bottom_right.x > viewport_width || bottom_right.y > viewport_height {
        return Ok(ActionResult::error(format!(
            "Region {top_left} to {bottom_right} exceeds the viewport ({viewport_width}x{viewport_height})"
        )));
    }

    let clip = ClipRegion {
        x: top_left.x,
        y: top_left.y,
        width: bottom_right.x - top_left.x,
        height: bottom_right.y - top_left.y,
        scale: 1.0,
    };
    debug!(tab = %tab, ?clip, "capturing region");
    let image = primitives.surface().capture_region(tab, clip).await?;

    Ok(ActionResult::ok_with_image(
        format!(
            "Zoomed into region {top_left} to {bottom_right} ({}x{})",
            clip.width, clip.height
        ),
        image,
    ))
}

fn validate_region(region: [f64; 4]) -> Result<(), ActionError> {
    let [x0, y0, x1, y1] = region;
    if region.iter().any(|v| !v.is_finite()) {
        return Err(ActionError::validation("region values must be finite"));
    }
    if x0 < 0.0 || y0 < 0.0 {
        return Err(ActionError::validation(
            "region start coordinates must be non-negative",
        ));
    }
    if x1 <= x0 || y1 <= y0 {
        return Err(ActionError::validation(
            "region end must be greater than region start",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_shape_is_checked() {
        assert!(validate_region([10.0, 10.0, 5.0, 50.0]).is_err());
        assert!(validate_region([-1.0, 0.0, 5.0, 5.0]).is_err());
        assert!(validate_region([0.0, 10.0, 5.0, 10.0]).is_err());
        assert!(validate_region([0.0, 0.0, 5.0, 5.0]).is_ok());
    }
}
