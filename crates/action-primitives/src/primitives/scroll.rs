//! Scroll primitive - wheel scrolling with effectiveness check and script fallback

use tabpilot_core_types::{ActionResult, PermissionKind};
use tracing::{debug, info, warn};

use crate::{
    errors::ActionError,
    primitives::{unresolved_reference, DefaultActionPrimitives},
    scripts,
    types::{ActionCtx, Point, ScrollParams},
};

/// Execute scroll primitive
///
/// Steps:
/// 1. Validate the tick count and scale the anchor point
/// 2. Record the scroll position
/// 3. Active tab: wheel event bounded by the wheel timeout, then re-read the
///    position after the verify delay
/// 4. Inactive tab, failed wheel, or displacement within the threshold on
///    both axes: run the script fallback once
/// 5. Attach a screenshot when the caller may already read the page
pub async fn execute_scroll(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    params: &ScrollParams,
) -> Result<ActionResult, ActionError> {
    let settings = primitives.settings();
    let amount = params.amount.unwrap_or(settings.default_scroll_ticks);
    if !(1..=10).contains(&amount) {
        return Err(ActionError::validation(
            "scroll_amount must be between 1 and 10",
        ));
    }

    let tab = ctx.tab_id;
    let point = primitives.scaled(tab, params.coordinate);
    let distance = f64::from(amount) * f64::from(settings.scroll_tick_px);
    let (delta_x, delta_y) = params.direction.deltas(distance);

    let before = read_scroll_position(primitives, ctx).await?;
    let active = match primitives.surface().is_active_tab(tab).await {
        Ok(active) => active,
        Err(err) => {
            warn!(tab = %tab, error = %err, "active tab probe failed; using script scroll");
            false
        }
    };

    let needs_fallback = if active {
        !wheel_scroll_moved(primitives, ctx, point, delta_x, delta_y, before).await?
    } else {
        debug!(tab = %tab, "tab is not active; skipping wheel event");
        true
    };

    if needs_fallback {
        info!(tab = %tab, "falling back to script scroll");
        primitives
            .surface()
            .evaluate(
                tab,
                &scripts::scroll_fallback(point.x, point.y, delta_x, delta_y),
            )
            .await?;
    }

    let output = format!(
        "Scrolled {} by {} ticks at {}",
        params.direction.as_str(),
        amount,
        point
    );
    Ok(attach_screenshot_if_readable(primitives, ctx, output).await)
}

/// Returns `true` only when the wheel event moved the page past the threshold.
async fn wheel_scroll_moved(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    point: Point,
    delta_x: f64,
    delta_y: f64,
    before: (f64, f64),
) -> Result<bool, ActionError> {
    let settings = primitives.settings();
    let tab = ctx.tab_id;
    let attempt = tokio::time::timeout(
        settings.wheel_timeout(),
        primitives
            .surface()
            .scroll_wheel(tab, point, delta_x, delta_y),
    )
    .await;

    match attempt {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(tab = %tab, error = %err, "wheel event failed");
            return Ok(false);
        }
        Err(_) => {
            warn!(
                tab = %tab,
                timeout_ms = settings.wheel_timeout_ms,
                "wheel event timed out"
            );
            return Ok(false);
        }
    }

    tokio::time::sleep(settings.verify_delay()).await;
    let after = read_scroll_position(primitives, ctx).await?;
    let moved_x = (after.0 - before.0).abs();
    let moved_y = (after.1 - before.1).abs();
    debug!(tab = %tab, moved_x, moved_y, "wheel displacement");

    let threshold = settings.min_effective_px;
    Ok(moved_x > threshold || moved_y > threshold)
}

async fn read_scroll_position(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
) -> Result<(f64, f64), ActionError> {
    primitives
        .evaluate_point(ctx.tab_id, scripts::SCROLL_POSITION, "x", "y")
        .await
}

async fn attach_screenshot_if_readable(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    output: String,
) -> ActionResult {
    let Some(authority) = ctx.authority.as_ref() else {
        return ActionResult::ok(output);
    };

    let readable = match authority
        .check_permission(
            &ctx.page_url,
            PermissionKind::ReadPageContent,
            Some(&ctx.tool_use_id),
        )
        .await
    {
        Ok(check) => check.allowed,
        Err(err) => {
            debug!(tab = %ctx.tab_id, error = %err, "read permission probe failed");
            false
        }
    };
    if !readable {
        return ActionResult::ok(output);
    }

    match primitives.surface().screenshot(ctx.tab_id).await {
        Ok(shot) => ActionResult::ok_with_image(output, shot.image),
        Err(err) => {
            warn!(tab = %ctx.tab_id, error = %err, "post-scroll screenshot failed");
            ActionResult::ok(output)
        }
    }
}

/// Scroll the element behind `reference` into view.
pub async fn execute_scroll_to(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    reference: &str,
) -> Result<ActionResult, ActionError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ActionError::validation("ref is required for scroll_to"));
    }
    let found = primitives
        .surface()
        .scroll_into_view(ctx.tab_id, reference)
        .await?;
    if !found {
        return Ok(unresolved_reference(reference));
    }
    Ok(ActionResult::ok(format!(
        "Scrolled element {reference} into view"
    )))
}
