//! Wait primitive - bounded sleep with no surface interaction

use std::time::Duration;

use tabpilot_core_types::ActionResult;
use tracing::debug;

use crate::{errors::ActionError, primitives::DefaultActionPrimitives, types::ActionCtx};

pub async fn execute_wait(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    duration_secs: f64,
) -> Result<ActionResult, ActionError> {
    let max = primitives.settings().max_wait_secs;
    validate_duration(duration_secs, max)?;

    debug!(tab = %ctx.tab_id, duration_secs, "waiting");
    tokio::time::sleep(Duration::from_secs_f64(duration_secs)).await;
    Ok(ActionResult::ok(format!("Waited for {duration_secs} seconds")))
}

fn validate_duration(duration_secs: f64, max: f64) -> Result<(), ActionError> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(ActionError::validation("duration must be greater than 0"));
    }
    if duration_secs > max {
        return Err(ActionError::validation(format!(
            "duration cannot exceed {max} seconds"
        )));
    }
    Ok(())
}
