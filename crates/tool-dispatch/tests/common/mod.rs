#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use action_primitives::{
    scripts, ActionSettings, AutomationSurface, ClipRegion, DefaultActionPrimitives, KeyChord,
    KeyCode, Point, PointerEvent, Screenshot, ScreenshotContexts,
};
use async_trait::async_trait;
use gif_recorder::{
    EncodeOptions, EncodedGif, FrameDescriptor, GifDelivery, GifEncoder, GifExporter,
    RecordingStore,
};
use parking_lot::Mutex;
use permissions_broker::{BrokerError, GrantScope, PermissionAuthority, PermissionCheck};
use serde_json::{json, Value};
use tabpilot_core_types::{
    GroupId, ImagePayload, PermissionKind, PermissionPrompt, SessionId, SurfaceError, TabId,
    TabInfo, ToolUseId,
};
use tool_dispatch::tools::{
    ComputerTool, GifCreatorTool, NavigateTool, TabsContextTool, TabsCreateTool,
};
use tool_dispatch::{
    AnalyticsSink, ApprovalDecision, ApprovalPort, SessionContext, SessionContexts,
    TabGroupProvider, ToolCall, ToolCallEvent, ToolCallHandler, ToolRegistry,
};

pub const GROUP: GroupId = GroupId(10);
pub const TAB: TabId = TabId(1);
pub const OTHER_TAB: TabId = TabId(2);
pub const FOREIGN_TAB: TabId = TabId(3);

/// Side effects seen by the fake surface.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Pointer(PointerEvent),
    Type(String),
    Insert(String),
    Key(String),
    Chord(String),
    Wheel,
    Screenshot,
    CaptureRegion,
    Evaluate(String),
    Navigate(String),
    Reload,
    History,
}

impl SurfaceCall {
    /// Anything that changes the page.
    pub fn is_side_effect(&self) -> bool {
        !matches!(
            self,
            SurfaceCall::Screenshot | SurfaceCall::CaptureRegion | SurfaceCall::Evaluate(_)
        )
    }
}

#[derive(Default)]
pub struct FakeSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    pub fail_screenshot: AtomicBool,
}

impl FakeSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn side_effects(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_side_effect()).count()
    }

    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|&call| pred(call)).count()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl AutomationSurface for FakeSurface {
    async fn dispatch_pointer(&self, _tab: TabId, event: PointerEvent) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Pointer(event));
        Ok(())
    }

    async fn type_text(&self, _tab: TabId, text: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Type(text.to_string()));
        Ok(())
    }

    async fn insert_text(&self, _tab: TabId, text: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Insert(text.to_string()));
        Ok(())
    }

    async fn press_key(&self, _tab: TabId, key: &KeyCode) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Key(key.key.to_string()));
        Ok(())
    }

    async fn press_chord(&self, _tab: TabId, chord: &KeyChord) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Chord(chord.raw.clone()));
        Ok(())
    }

    async fn scroll_wheel(
        &self,
        _tab: TabId,
        _at: Point,
        _delta_x: f64,
        _delta_y: f64,
    ) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Wheel);
        Ok(())
    }

    async fn screenshot(&self, _tab: TabId) -> Result<Screenshot, SurfaceError> {
        self.record(SurfaceCall::Screenshot);
        if self.fail_screenshot.load(Ordering::SeqCst) {
            return Err(SurfaceError::new("capture failed"));
        }
        Ok(Screenshot {
            image: ImagePayload::png("c2hvdA=="),
            width: 640,
            height: 400,
            viewport_width: Some(1280),
            viewport_height: Some(800),
        })
    }

    async fn capture_region(
        &self,
        _tab: TabId,
        _region: ClipRegion,
    ) -> Result<ImagePayload, SurfaceError> {
        self.record(SurfaceCall::CaptureRegion);
        Ok(ImagePayload::png("em9vbQ=="))
    }

    async fn evaluate(&self, _tab: TabId, expression: &str) -> Result<Value, SurfaceError> {
        self.record(SurfaceCall::Evaluate(expression.to_string()));
        if expression == scripts::DEVICE_PIXEL_RATIO {
            return Ok(json!(2.0));
        }
        if expression == scripts::VIEWPORT_SIZE {
            return Ok(json!({ "width": 1280, "height": 800 }));
        }
        Ok(json!({ "x": 0, "y": 0 }))
    }

    async fn resolve_element(
        &self,
        _tab: TabId,
        _reference: &str,
    ) -> Result<Option<Point>, SurfaceError> {
        Ok(None)
    }

    async fn scroll_into_view(&self, _tab: TabId, _reference: &str) -> Result<bool, SurfaceError> {
        Ok(false)
    }

    async fn reload(&self, _tab: TabId, _bypass_cache: bool) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Reload);
        Ok(())
    }

    async fn navigate(&self, _tab: TabId, url: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Navigate(url.to_string()));
        Ok(())
    }

    async fn go_back(&self, _tab: TabId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::History);
        Ok(())
    }

    async fn go_forward(&self, _tab: TabId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::History);
        Ok(())
    }

    async fn is_active_tab(&self, _tab: TabId) -> Result<bool, SurfaceError> {
        Ok(true)
    }
}

/// Two groups: tabs 1 and 2 in group 10, tab 3 in group 20.
pub struct FakeTabs {
    next_tab: AtomicUsize,
    pub created: Mutex<Vec<Option<GroupId>>>,
}

impl Default for FakeTabs {
    fn default() -> Self {
        Self {
            next_tab: AtomicUsize::new(100),
            created: Mutex::new(Vec::new()),
        }
    }
}

fn tab(id: TabId, url: &str) -> TabInfo {
    TabInfo {
        id,
        title: format!("Tab {id}"),
        url: url.to_string(),
    }
}

#[async_trait]
impl TabGroupProvider for FakeTabs {
    async fn list_tabs_with_metadata(
        &self,
        reference_tab: TabId,
    ) -> Result<Vec<TabInfo>, SurfaceError> {
        match reference_tab {
            TAB | OTHER_TAB => Ok(vec![
                tab(TAB, "https://shop.example.com/cart"),
                tab(OTHER_TAB, "https://docs.example.com/"),
            ]),
            FOREIGN_TAB => Ok(vec![tab(FOREIGN_TAB, "https://elsewhere.test/")]),
            other if other.0 >= 100 => Ok(vec![tab(other, "about:blank")]),
            other => Err(SurfaceError::TabNotFound(other)),
        }
    }

    async fn create_tab(&self, group: Option<GroupId>) -> Result<(TabInfo, GroupId), SurfaceError> {
        self.created.lock().push(group);
        let id = TabId(self.next_tab.fetch_add(1, Ordering::SeqCst) as i64);
        Ok((tab(id, "about:blank"), group.unwrap_or(GroupId(77))))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityMode {
    AllowAll,
    DenyAll,
    /// Prompt until a grant is recorded.
    PromptUntilGranted,
    /// Prompt even after a grant.
    AlwaysPrompt,
}

pub struct FakeAuthority {
    mode: AuthorityMode,
    granted: AtomicBool,
    pub checks: Mutex<Vec<(String, PermissionKind)>>,
    pub grants: Mutex<Vec<GrantScope>>,
}

impl FakeAuthority {
    pub fn new(mode: AuthorityMode) -> Self {
        Self {
            mode,
            granted: AtomicBool::new(false),
            checks: Mutex::new(Vec::new()),
            grants: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PermissionAuthority for FakeAuthority {
    async fn check_permission(
        &self,
        url: &str,
        kind: PermissionKind,
        _tool_use_id: Option<&ToolUseId>,
    ) -> Result<PermissionCheck, BrokerError> {
        self.checks.lock().push((url.to_string(), kind));
        Ok(match self.mode {
            AuthorityMode::AllowAll => PermissionCheck::allowed(),
            AuthorityMode::DenyAll => PermissionCheck::denied(),
            AuthorityMode::AlwaysPrompt => PermissionCheck::prompt(),
            AuthorityMode::PromptUntilGranted => {
                if self.granted.load(Ordering::SeqCst) {
                    PermissionCheck::allowed()
                } else {
                    PermissionCheck::prompt()
                }
            }
        })
    }

    async fn grant(
        &self,
        _url: &str,
        _kind: PermissionKind,
        scope: GrantScope,
    ) -> Result<(), BrokerError> {
        self.grants.lock().push(scope);
        self.granted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeApproval {
    decision: ApprovalDecision,
    pub prompts: Mutex<Vec<PermissionPrompt>>,
}

impl FakeApproval {
    pub fn new(decision: ApprovalDecision) -> Self {
        Self {
            decision,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ApprovalPort for FakeApproval {
    async fn request_approval(&self, prompt: &PermissionPrompt) -> ApprovalDecision {
        self.prompts.lock().push(prompt.clone());
        self.decision
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: Mutex<Vec<ToolCallEvent>>,
}

impl AnalyticsSink for RecordingAnalytics {
    fn record(&self, event: &ToolCallEvent) {
        self.events.lock().push(event.clone());
    }
}

#[derive(Default)]
pub struct FakeEncoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl GifEncoder for FakeEncoder {
    async fn encode(
        &self,
        _frames: &[FrameDescriptor],
        _options: &EncodeOptions,
    ) -> Result<EncodedGif, SurfaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EncodedGif {
            data: vec![0x47, 0x49, 0x46],
            width: 640,
            height: 400,
            byte_size: 3,
        })
    }
}

#[derive(Default)]
pub struct FakeDelivery {
    pub downloads: Mutex<Vec<String>>,
    pub drops: Mutex<Vec<(TabId, f64, f64)>>,
}

#[async_trait]
impl GifDelivery for FakeDelivery {
    async fn download(&self, _gif: &EncodedGif, filename: &str) -> Result<(), SurfaceError> {
        self.downloads.lock().push(filename.to_string());
        Ok(())
    }

    async fn drop_file(
        &self,
        tab: TabId,
        x: f64,
        y: f64,
        _gif: &EncodedGif,
        _filename: &str,
    ) -> Result<(), SurfaceError> {
        self.drops.lock().push((tab, x, y));
        Ok(())
    }
}

/// A handler wired to fakes, with session `SESSION` on tab 1 of group 10.
pub struct Harness {
    pub surface: Arc<FakeSurface>,
    pub tabs: Arc<FakeTabs>,
    pub authority: Arc<FakeAuthority>,
    pub analytics: Arc<RecordingAnalytics>,
    pub recordings: Arc<RecordingStore>,
    pub scaling: Arc<ScreenshotContexts>,
    pub encoder: Arc<FakeEncoder>,
    pub delivery: Arc<FakeDelivery>,
    pub contexts: Arc<SessionContexts>,
    pub handler: ToolCallHandler,
    pub session: SessionId,
}

impl Harness {
    pub fn new(mode: AuthorityMode) -> Self {
        let surface = Arc::new(FakeSurface::default());
        let tabs = Arc::new(FakeTabs::default());
        let authority = Arc::new(FakeAuthority::new(mode));
        let analytics = Arc::new(RecordingAnalytics::default());
        let recordings = Arc::new(RecordingStore::new());
        let scaling = Arc::new(ScreenshotContexts::new());
        let encoder = Arc::new(FakeEncoder::default());
        let delivery = Arc::new(FakeDelivery::default());
        let contexts = Arc::new(SessionContexts::new());

        let primitives = Arc::new(
            DefaultActionPrimitives::builder(ActionSettings::default())
                .with_surface(surface.clone())
                .with_scaling(scaling.clone())
                .build()
                .unwrap(),
        );
        let exporter = Arc::new(GifExporter::new(
            recordings.clone(),
            encoder.clone(),
            delivery.clone(),
        ));
        let registry = ToolRegistry::new(vec![
            Arc::new(ComputerTool::new(primitives.clone())),
            Arc::new(NavigateTool::new(primitives)),
            Arc::new(TabsContextTool::new(tabs.clone())),
            Arc::new(TabsCreateTool::new(tabs.clone(), contexts.clone())),
            Arc::new(GifCreatorTool::new(
                exporter,
                scaling.clone(),
                EncodeOptions::default(),
            )),
        ])
        .unwrap();

        let session = SessionId("session-1".into());
        contexts.set(session.clone(), SessionContext::new(TAB, GROUP));

        let handler = ToolCallHandler::builder()
            .with_registry(Arc::new(registry))
            .with_contexts(contexts.clone())
            .with_authority(authority.clone())
            .with_tabs(tabs.clone())
            .with_surface(surface.clone())
            .with_recordings(recordings.clone())
            .with_analytics(analytics.clone())
            .build()
            .unwrap();

        Self {
            surface,
            tabs,
            authority,
            analytics,
            recordings,
            scaling,
            encoder,
            delivery,
            contexts,
            handler,
            session,
        }
    }

    pub fn call(&self, tool: &str, params: Value) -> ToolCall {
        ToolCall::new(tool, params, self.session.clone())
    }

    pub fn last_event(&self) -> ToolCallEvent {
        self.analytics.events.lock().last().cloned().unwrap()
    }
}
