//! Action primitives implementation
//!
//! One module per verb. Each handler validates its parameters, resolves the
//! target point, talks to the automation surface and shapes an `ActionResult`.

mod click;
mod drag;
mod hover;
mod key;
mod navigate;
mod screenshot;
mod scroll;
mod type_text;
mod wait;
mod zoom;

pub use navigate::normalize_url;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tabpilot_core_types::{ActionResult, TabId};

use crate::{
    coords::{scale_point, ScreenshotContexts},
    errors::ActionError,
    ports::{AutomationSurface, NavigationGuard, ScalingContextProvider},
    types::{ActionCtx, ActionSettings, ClickParams, KeyParams, Point, ScrollParams, Target},
};

/// Action primitives trait
///
/// Validation failures are raised as `ActionError::Validation` before any side
/// effect. Surface failures are raised as `ActionError::Surface`. Outcomes the
/// agent should read (missing element, region outside the viewport) come back
/// as `ActionResult::Error`.
#[async_trait]
pub trait ActionPrimitives: Send + Sync {
    async fn click(&self, ctx: &ActionCtx, params: &ClickParams)
        -> Result<ActionResult, ActionError>;

    async fn hover(&self, ctx: &ActionCtx, target: &Target) -> Result<ActionResult, ActionError>;

    async fn drag(
        &self,
        ctx: &ActionCtx,
        start: Point,
        end: Point,
    ) -> Result<ActionResult, ActionError>;

    async fn scroll(
        &self,
        ctx: &ActionCtx,
        params: &ScrollParams,
    ) -> Result<ActionResult, ActionError>;

    async fn scroll_to(&self, ctx: &ActionCtx, reference: &str)
        -> Result<ActionResult, ActionError>;

    async fn key(&self, ctx: &ActionCtx, params: &KeyParams) -> Result<ActionResult, ActionError>;

    async fn type_text(&self, ctx: &ActionCtx, text: &str) -> Result<ActionResult, ActionError>;

    async fn zoom(&self, ctx: &ActionCtx, region: [f64; 4]) -> Result<ActionResult, ActionError>;

    async fn wait(&self, ctx: &ActionCtx, duration_secs: f64)
        -> Result<ActionResult, ActionError>;

    async fn screenshot(&self, ctx: &ActionCtx) -> Result<ActionResult, ActionError>;

    async fn navigate(&self, ctx: &ActionCtx, url: &str) -> Result<ActionResult, ActionError>;
}

/// Default implementation of action primitives
pub struct DefaultActionPrimitives {
    surface: Arc<dyn AutomationSurface>,
    scaling: Arc<dyn ScalingContextProvider>,
    guard: Option<Arc<dyn NavigationGuard>>,
    settings: ActionSettings,
}

pub struct ActionPrimitivesBuilder {
    settings: ActionSettings,
    surface: Option<Arc<dyn AutomationSurface>>,
    scaling: Option<Arc<dyn ScalingContextProvider>>,
    guard: Option<Arc<dyn NavigationGuard>>,
}

impl ActionPrimitivesBuilder {
    pub fn new(settings: ActionSettings) -> Self {
        Self {
            settings,
            surface: None,
            scaling: None,
            guard: None,
        }
    }

    pub fn with_surface(mut self, surface: Arc<dyn AutomationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_scaling(mut self, scaling: Arc<dyn ScalingContextProvider>) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn with_navigation_guard(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn build(self) -> Result<DefaultActionPrimitives, ActionError> {
        self.settings.validate()?;
        let surface = self
            .surface
            .ok_or_else(|| ActionError::Internal("automation surface is required".into()))?;
        let scaling = self
            .scaling
            .unwrap_or_else(|| Arc::new(ScreenshotContexts::new()));
        Ok(DefaultActionPrimitives {
            surface,
            scaling,
            guard: self.guard,
            settings: self.settings,
        })
    }
}

impl DefaultActionPrimitives {
    pub fn builder(settings: ActionSettings) -> ActionPrimitivesBuilder {
        ActionPrimitivesBuilder::new(settings)
    }

    pub fn surface(&self) -> &Arc<dyn AutomationSurface> {
        &self.surface
    }

    pub fn scaling(&self) -> &Arc<dyn ScalingContextProvider> {
        &self.scaling
    }

    pub fn settings(&self) -> &ActionSettings {
        &self.settings
    }

    /// Map a screenshot coordinate onto the tab's viewport.
    pub fn scaled(&self, tab: TabId, point: Point) -> Point {
        scale_point(point, self.scaling.get_context(tab).as_ref())
    }

    /// Resolve a target to a viewport point. `Ok(None)` means the reference is gone.
    pub(crate) async fn resolve_target(
        &self,
        tab: TabId,
        target: &Target,
    ) -> Result<Option<Point>, ActionError> {
        match target {
            Target::Reference(reference) => {
                Ok(self.surface.resolve_element(tab, reference).await?)
            }
            Target::Coordinate(point) => Ok(Some(self.scaled(tab, *point))),
        }
    }

    pub(crate) async fn evaluate_point(
        &self,
        tab: TabId,
        script: &str,
        x_key: &str,
        y_key: &str,
    ) -> Result<(f64, f64), ActionError> {
        let value = self.surface.evaluate(tab, script).await?;
        let read = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| ActionError::Script(format!("missing numeric '{key}' in {value}")))
        };
        Ok((read(x_key)?, read(y_key)?))
    }
}

pub(crate) fn unresolved_reference(reference: &str) -> ActionResult {
    ActionResult::error(format!(
        "Element reference '{reference}' was not found on the page"
    ))
}

#[async_trait]
impl ActionPrimitives for DefaultActionPrimitives {
    async fn click(
        &self,
        ctx: &ActionCtx,
        params: &ClickParams,
    ) -> Result<ActionResult, ActionError> {
        click::execute_click(self, ctx, params).await
    }

    async fn hover(&self, ctx: &ActionCtx, target: &Target) -> Result<ActionResult, ActionError> {
        hover::execute_hover(self, ctx, target).await
    }

    async fn drag(
        &self,
        ctx: &ActionCtx,
        start: Point,
        end: Point,
    ) -> Result<ActionResult, ActionError> {
        drag::execute_drag(self, ctx, start, end).await
    }

    async fn scroll(
        &self,
        ctx: &ActionCtx,
        params: &ScrollParams,
    ) -> Result<ActionResult, ActionError> {
        scroll::execute_scroll(self, ctx, params).await
    }

    async fn scroll_to(
        &self,
        ctx: &ActionCtx,
        reference: &str,
    ) -> Result<ActionResult, ActionError> {
        scroll::execute_scroll_to(self, ctx, reference).await
    }

    async fn key(&self, ctx: &ActionCtx, params: &KeyParams) -> Result<ActionResult, ActionError> {
        key::execute_key(self, ctx, params).await
    }

    async fn type_text(&self, ctx: &ActionCtx, text: &str) -> Result<ActionResult, ActionError> {
        type_text::execute_type_text(self, ctx, text).await
    }

    async fn zoom(&self, ctx: &ActionCtx, region: [f64; 4]) -> Result<ActionResult, ActionError> {
        zoom::execute_zoom(self, ctx, region).await
    }

    async fn wait(
        &self,
        ctx: &ActionCtx,
        duration_secs: f64,
    ) -> Result<ActionResult, ActionError> {
        wait::execute_wait(self, ctx, duration_secs).await
    }

    async fn screenshot(&self, ctx: &ActionCtx) -> Result<ActionResult, ActionError> {
        screenshot::execute_screenshot(self, ctx).await
    }

    async fn navigate(&self, ctx: &ActionCtx, url: &str) -> Result<ActionResult, ActionError> {
        navigate::execute_navigate(self, ctx, url).await
    }
}
