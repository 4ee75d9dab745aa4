//! Wiring of the dispatch engine from configuration and browser ports.

use std::sync::Arc;

use action_primitives::{
    AutomationSurface, ClipRegion, DefaultActionPrimitives, KeyChord, KeyCode, NavigationGuard,
    Point, PointerEvent, Screenshot, ScreenshotContexts,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use gif_recorder::{
    EncodeOptions, EncodedGif, FrameDescriptor, GifDelivery, GifEncoder, GifExporter,
    RecordingStore,
};
use permissions_broker::{config::load_policy_from_path, PermissionsBroker};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::Value;
use tabpilot_core_types::{GroupId, ImagePayload, SurfaceError, TabId, TabInfo};
use tool_dispatch::tools::{
    ComputerTool, GifCreatorTool, NavigateTool, TabsContextTool, TabsCreateTool,
};
use tool_dispatch::{
    AnalyticsSink, SessionContexts, TabGroupProvider, Tool, ToolCallHandler, ToolRegistry,
};
use tracing::info;

use crate::config::Config;

const DETACHED: &str = "no browser attached";

/// Browser-side collaborators the engine runs against.
pub struct BrowserPorts {
    pub surface: Arc<dyn AutomationSurface>,
    pub tabs: Arc<dyn TabGroupProvider>,
    pub encoder: Arc<dyn GifEncoder>,
    pub delivery: Arc<dyn GifDelivery>,
    pub navigation_guard: Option<Arc<dyn NavigationGuard>>,
    pub analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl BrowserPorts {
    /// Ports that fail every browser operation. Enough for schema export and policy checks.
    pub fn detached() -> Self {
        Self {
            surface: Arc::new(DetachedSurface),
            tabs: Arc::new(DetachedSurface),
            encoder: Arc::new(DetachedSurface),
            delivery: Arc::new(DetachedSurface),
            navigation_guard: None,
            analytics: None,
        }
    }
}

pub struct Engine {
    pub handler: ToolCallHandler,
    pub broker: Arc<PermissionsBroker>,
    pub recordings: Arc<RecordingStore>,
    pub contexts: Arc<SessionContexts>,
    metrics: Registry,
}

impl Engine {
    pub async fn new(config: &Config, ports: BrowserPorts) -> Result<Self> {
        let broker = Arc::new(PermissionsBroker::new());
        if let Some(path) = config.permissions.policy_path.as_ref() {
            let policy = load_policy_from_path(path)
                .with_context(|| format!("failed to load policy {}", path.display()))?;
            broker
                .load_policy(policy)
                .await
                .with_context(|| format!("invalid policy {}", path.display()))?;
            info!(path = %path.display(), "permission policy loaded");
        }

        let scaling = Arc::new(ScreenshotContexts::new());
        let mut primitives = DefaultActionPrimitives::builder(config.actions.clone())
            .with_surface(ports.surface.clone())
            .with_scaling(scaling.clone());
        if let Some(guard) = ports.navigation_guard {
            primitives = primitives.with_navigation_guard(guard);
        }
        let primitives = Arc::new(primitives.build().context("invalid action settings")?);

        let recordings = Arc::new(RecordingStore::with_capacity(config.recording.max_frames));
        let contexts = Arc::new(SessionContexts::new());
        let exporter = Arc::new(GifExporter::new(
            recordings.clone(),
            ports.encoder,
            ports.delivery,
        ));

        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(ComputerTool::new(primitives.clone())),
            Arc::new(NavigateTool::new(primitives)),
            Arc::new(TabsContextTool::new(ports.tabs.clone())),
            Arc::new(TabsCreateTool::new(ports.tabs.clone(), contexts.clone())),
            Arc::new(GifCreatorTool::new(
                exporter,
                scaling,
                config.recording.encode.clone(),
            )),
        ];
        let registry = Arc::new(ToolRegistry::new(tools).context("tool registry")?);

        let mut builder = ToolCallHandler::builder()
            .with_registry(registry)
            .with_contexts(contexts.clone())
            .with_authority(broker.clone())
            .with_tabs(ports.tabs)
            .with_surface(ports.surface)
            .with_recordings(recordings.clone());
        if let Some(analytics) = ports.analytics {
            builder = builder.with_analytics(analytics);
        }
        let handler = builder.build().context("tool call handler")?;

        let metrics = Registry::new();
        tool_dispatch::metrics::register_metrics(&metrics);
        gif_recorder::metrics::register_metrics(&metrics);

        Ok(Self {
            handler,
            broker,
            recordings,
            contexts,
            metrics,
        })
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.handler.registry()
    }

    pub fn metrics(&self) -> &Registry {
        &self.metrics
    }

    /// Prometheus text exposition of the engine counters.
    pub fn render_metrics(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.metrics.gather(), &mut buffer)
            .context("failed to encode metrics")?;
        String::from_utf8(buffer).context("metrics are not utf-8")
    }
}

struct DetachedSurface;

fn detached<T>() -> Result<T, SurfaceError> {
    Err(SurfaceError::new(DETACHED))
}

#[async_trait]
impl AutomationSurface for DetachedSurface {
    async fn dispatch_pointer(&self, _: TabId, _: PointerEvent) -> Result<(), SurfaceError> {
        detached()
    }
    async fn type_text(&self, _: TabId, _: &str) -> Result<(), SurfaceError> {
        detached()
    }
    async fn insert_text(&self, _: TabId, _: &str) -> Result<(), SurfaceError> {
        detached()
    }
    async fn press_key(&self, _: TabId, _: &KeyCode) -> Result<(), SurfaceError> {
        detached()
    }
    async fn press_chord(&self, _: TabId, _: &KeyChord) -> Result<(), SurfaceError> {
        detached()
    }
    async fn scroll_wheel(&self, _: TabId, _: Point, _: f64, _: f64) -> Result<(), SurfaceError> {
        detached()
    }
    async fn screenshot(&self, _: TabId) -> Result<Screenshot, SurfaceError> {
        detached()
    }
    async fn capture_region(&self, _: TabId, _: ClipRegion) -> Result<ImagePayload, SurfaceError> {
        detached()
    }
    async fn evaluate(&self, _: TabId, _: &str) -> Result<Value, SurfaceError> {
        detached()
    }
    async fn resolve_element(&self, _: TabId, _: &str) -> Result<Option<Point>, SurfaceError> {
        detached()
    }
    async fn scroll_into_view(&self, _: TabId, _: &str) -> Result<bool, SurfaceError> {
        detached()
    }
    async fn reload(&self, _: TabId, _: bool) -> Result<(), SurfaceError> {
        detached()
    }
    async fn navigate(&self, _: TabId, _: &str) -> Result<(), SurfaceError> {
        detached()
    }
    async fn go_back(&self, _: TabId) -> Result<(), SurfaceError> {
        detached()
    }
    async fn go_forward(&self, _: TabId) -> Result<(), SurfaceError> {
        detached()
    }
    async fn is_active_tab(&self, _: TabId) -> Result<bool, SurfaceError> {
        detached()
    }
}

#[async_trait]
impl TabGroupProvider for DetachedSurface {
    async fn list_tabs_with_metadata(&self, _: TabId) -> Result<Vec<TabInfo>, SurfaceError> {
        detached()
    }
    async fn create_tab(&self, _: Option<GroupId>) -> Result<(TabInfo, GroupId), SurfaceError> {
        detached()
    }
}

#[async_trait]
impl GifEncoder for DetachedSurface {
    async fn encode(
        &self,
        _: &[FrameDescriptor],
        _: &EncodeOptions,
    ) -> Result<EncodedGif, SurfaceError> {
        detached()
    }
}

#[async_trait]
impl GifDelivery for DetachedSurface {
    async fn download(&self, _: &EncodedGif, _: &str) -> Result<(), SurfaceError> {
        detached()
    }
    async fn drop_file(
        &self,
        _: TabId,
        _: f64,
        _: f64,
        _: &EncodedGif,
        _: &str,
    ) -> Result<(), SurfaceError> {
        detached()
    }
}
