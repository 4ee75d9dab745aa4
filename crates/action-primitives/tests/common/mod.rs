#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use action_primitives::{
    scripts, AutomationSurface, ClipRegion, KeyChord, KeyCode, Point, PointerEvent, Screenshot,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tabpilot_core_types::{ImagePayload, SurfaceError, TabId};

/// Every call the fake surface received, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Pointer(PointerEvent),
    Type(String),
    Insert(String),
    Key(String),
    Chord(String),
    Wheel { at: Point, dx: f64, dy: f64 },
    Screenshot,
    CaptureRegion(ClipRegion),
    ScrollPosition,
    ViewportSize,
    Fallback(String),
    Evaluate(String),
    Resolve(String),
    ScrollIntoView(String),
    Reload { bypass_cache: bool },
    Navigate(String),
    Back,
    Forward,
}

pub struct FakeSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    positions: Mutex<VecDeque<(f64, f64)>>,
    last_position: Mutex<(f64, f64)>,
    elements: Mutex<HashMap<String, Point>>,
    active: AtomicBool,
    hang_wheel: AtomicBool,
    viewport: Mutex<(f64, f64)>,
    screenshot: Mutex<Screenshot>,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            positions: Mutex::new(VecDeque::new()),
            last_position: Mutex::new((0.0, 0.0)),
            elements: Mutex::new(HashMap::new()),
            active: AtomicBool::new(true),
            hang_wheel: AtomicBool::new(false),
            viewport: Mutex::new((1280.0, 800.0)),
            screenshot: Mutex::new(Screenshot {
                image: ImagePayload::png("c2NyZWVu"),
                width: 1280,
                height: 800,
                viewport_width: Some(1280),
                viewport_height: Some(800),
            }),
        }
    }
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|&call| pred(call)).count()
    }

    /// Scroll positions returned by successive position reads.
    pub fn queue_positions(&self, positions: &[(f64, f64)]) {
        self.positions.lock().extend(positions.iter().copied());
    }

    pub fn add_element(&self, reference: &str, point: Point) {
        self.elements.lock().insert(reference.to_string(), point);
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn hang_wheel(&self) {
        self.hang_wheel.store(true, Ordering::SeqCst);
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        *self.viewport.lock() = (width, height);
    }

    pub fn set_screenshot(&self, shot: Screenshot) {
        *self.screenshot.lock() = shot;
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
        at: Point,
        delta_x: f64,
        delta_y: f64,
    ) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Wheel {
            at,
            dx: delta_x,
            dy: delta_y,
        });
        if self.hang_wheel.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn screenshot(&self, _tab: TabId) -> Result<Screenshot, SurfaceError> {
        self.record(SurfaceCall::Screenshot);
        Ok(self.screenshot.lock().clone())
    }

    async fn capture_region(
        &self,
        _tab: TabId,
        region: ClipRegion,
    ) -> Result<ImagePayload, SurfaceError> {
        self.record(SurfaceCall::CaptureRegion(region));
        Ok(ImagePayload::png("em9vbQ=="))
    }

    async fn evaluate(&self, _tab: TabId, expression: &str) -> Result<Value, SurfaceError> {
        if expression == scripts::SCROLL_POSITION {
            self.record(SurfaceCall::ScrollPosition);
            let next = self.positions.lock().pop_front();
            let mut last = self.last_position.lock();
            if let Some(position) = next {
                *last = position;
            }
            return Ok(json!({ "x": last.0, "y": last.1 }));
        }
        if expression == scripts::VIEWPORT_SIZE {
            self.record(SurfaceCall::ViewportSize);
            let (width, height) = *self.viewport.lock();
            return Ok(json!({ "width": width, "height": height }));
        }
        if expression == scripts::DEVICE_PIXEL_RATIO {
            self.record(SurfaceCall::Evaluate(expression.to_string()));
            return Ok(json!(2.0));
        }
        if expression.contains("elementFromPoint") {
            self.record(SurfaceCall::Fallback(expression.to_string()));
            return Ok(json!({ "target": "window" }));
        }
        self.record(SurfaceCall::Evaluate(expression.to_string()));
        Ok(Value::Null)
    }

    async fn resolve_element(
        &self,
        _tab: TabId,
        reference: &str,
    ) -> Result<Option<Point>, SurfaceError> {
        self.record(SurfaceCall::Resolve(reference.to_string()));
        Ok(self.elements.lock().get(reference).copied())
    }

    async fn scroll_into_view(&self, _tab: TabId, reference: &str) -> Result<bool, SurfaceError> {
        self.record(SurfaceCall::ScrollIntoView(reference.to_string()));
        Ok(self.elements.lock().contains_key(reference))
    }

    async fn reload(&self, _tab: TabId, bypass_cache: bool) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Reload { bypass_cache });
        Ok(())
    }

    async fn navigate(&self, _tab: TabId, url: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Navigate(url.to_string()));
        Ok(())
    }

    async fn go_back(&self, _tab: TabId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Back);
        Ok(())
    }

    async fn go_forward(&self, _tab: TabId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Forward);
        Ok(())
    }

    async fn is_active_tab(&self, _tab: TabId) -> Result<bool, SurfaceError> {
        Ok(self.active.load(Ordering::SeqCst))
    }
}
