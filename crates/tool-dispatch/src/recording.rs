//! Best-effort frame capture after page actions.

use action_primitives::{scripts, AutomationSurface};
use gif_recorder::{ActionInfo, FrameCapture, RecordingStore};
use tabpilot_core_types::{GroupId, TabId};
use tracing::{debug, warn};

/// Append a post-action frame when `group` is recording. Failures are logged and dropped.
pub(crate) async fn capture_action_frame(
    surface: &dyn AutomationSurface,
    store: &RecordingStore,
    group: GroupId,
    tab: TabId,
    action: ActionInfo,
) {
    if !store.is_recording(group) {
        return;
    }

    let shot = match surface.screenshot(tab).await {
        Ok(shot) => shot,
        Err(err) => {
            warn!(tab = %tab, group = %group, error = %err, "frame capture failed");
            return;
        }
    };
    let device_pixel_ratio = match surface.evaluate(tab, scripts::DEVICE_PIXEL_RATIO).await {
        Ok(value) => value.as_f64().filter(|ratio| *ratio > 0.0).unwrap_or(1.0),
        Err(err) => {
            debug!(tab = %tab, error = %err, "device pixel ratio probe failed");
            1.0
        }
    };

    let overlay = action.wants_overlay().then(|| action.clone());
    let capture = FrameCapture {
        image: shot.image,
        action: Some(action),
        viewport_width: shot.viewport_width.unwrap_or(shot.width),
        viewport_height: shot.viewport_height.unwrap_or(shot.height),
        device_pixel_ratio,
    };
    if store.append_action_frames(group, overlay, capture).is_none() {
        debug!(group = %group, "recording stopped before the frame landed");
    }
}

