use async_trait::async_trait;
use serde_json::Value;
use tabpilot_core_types::{ActionResult, ImagePayload, SurfaceError, TabId};

use crate::coords::ScalingContext;
use crate::keys::{KeyChord, KeyCode};
use crate::types::{ClipRegion, Point, PointerEvent, Screenshot};

/// Remote-debugging surface that performs input and capture for one browser.
#[async_trait]
pub trait AutomationSurface: Send + Sync {
    async fn dispatch_pointer(&self, tab: TabId, event: PointerEvent)
        -> Result<(), SurfaceError>;
    async fn type_text(&self, tab: TabId, text: &str) -> Result<(), SurfaceError>;
    async fn insert_text(&self, tab: TabId, text: &str) -> Result<(), SurfaceError>;
    async fn press_key(&self, tab: TabId, key: &KeyCode) -> Result<(), SurfaceError>;
    async fn press_chord(&self, tab: TabId, chord: &KeyChord) -> Result<(), SurfaceError>;
    async fn scroll_wheel(
        &self,
        tab: TabId,
        at: Point,
        delta_x: f64,
        delta_y: f64,
    ) -> Result<(), SurfaceError>;
    async fn screenshot(&self, tab: TabId) -> Result<Screenshot, SurfaceError>;
    async fn capture_region(
        &self,
        tab: TabId,
        region: ClipRegion,
    ) -> Result<ImagePayload, SurfaceError>;
    async fn evaluate(&self, tab: TabId, expression: &str) -> Result<Value, SurfaceError>;
    /// Center of the element behind `reference`, or `None` when it no longer exists.
    async fn resolve_element(
        &self,
        tab: TabId,
        reference: &str,
    ) -> Result<Option<Point>, SurfaceError>;
    /// Returns `false` when `reference` does not resolve.
    async fn scroll_into_view(&self, tab: TabId, reference: &str) -> Result<bool, SurfaceError>;
    async fn reload(&self, tab: TabId, bypass_cache: bool) -> Result<(), SurfaceError>;
    async fn navigate(&self, tab: TabId, url: &str) -> Result<(), SurfaceError>;
    async fn go_back(&self, tab: TabId) -> Result<(), SurfaceError>;
    async fn go_forward(&self, tab: TabId) -> Result<(), SurfaceError>;
    async fn is_active_tab(&self, tab: TabId) -> Result<bool, SurfaceError>;
}

/// Per-tab scaling contexts. Absence means coordinates are already viewport-relative.
pub trait ScalingContextProvider: Send + Sync {
    fn get_context(&self, tab: TabId) -> Option<ScalingContext>;

    fn record(&self, _tab: TabId, _ctx: ScalingContext) {}
}

/// Intercepts clicks that would navigate away from a page.
#[async_trait]
pub trait NavigationGuard: Send + Sync {
    /// A returned result replaces the click entirely.
    async fn check(
        &self,
        tab: TabId,
        original_url: &str,
        action_label: &str,
    ) -> Option<ActionResult>;
}
