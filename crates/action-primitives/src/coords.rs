//! Screenshot-to-viewport coordinate scaling.
//!
//! Agents pick coordinates on the last screenshot they saw. When that image was
//! resized relative to the viewport, every coordinate pair has to be mapped back
//! before it reaches the page.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::TabId;
use tracing::debug;

use crate::ports::ScalingContextProvider;
use crate::types::Point;

/// Viewport and screenshot dimensions of one tab. All four must be positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalingContext {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub screenshot_width: f64,
    pub screenshot_height: f64,
}

/// Map a screenshot coordinate onto the viewport.
pub fn scale(x: f64, y: f64, ctx: &ScalingContext) -> (f64, f64) {
    let sx = ctx.viewport_width / ctx.screenshot_width;
    let sy = ctx.viewport_height / ctx.screenshot_height;
    ((x * sx).round(), (y * sy).round())
}

/// Scale `point` when a context exists, pass it through otherwise.
pub fn scale_point(point: Point, ctx: Option<&ScalingContext>) -> Point {
    match ctx {
        Some(ctx) => {
            let (x, y) = scale(point.x, point.y, ctx);
            Point::new(x, y)
        }
        None => point,
    }
}

/// Scaling contexts learned from screenshots, keyed by tab.
#[derive(Debug, Default)]
pub struct ScreenshotContexts {
    contexts: DashMap<TabId, ScalingContext>,
}

impl ScreenshotContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forget(&self, tab: TabId) {
        self.contexts.remove(&tab);
    }
}

impl ScalingContextProvider for ScreenshotContexts {
    fn get_context(&self, tab: TabId) -> Option<ScalingContext> {
        self.contexts.get(&tab).map(|entry| *entry.value())
    }

    fn record(&self, tab: TabId, ctx: ScalingContext) {
        debug!(tab = %tab, ?ctx, "scaling context recorded");
        self.contexts.insert(tab, ctx);
    }
}
