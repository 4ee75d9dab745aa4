//! Core data types for action primitives

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use permissions_broker::PermissionAuthority;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::{ImagePayload, TabId, ToolUseId};

use crate::errors::ActionError;

/// Execution context for one action.
///
/// Built by the dispatcher for every call and dropped when the call returns.
#[derive(Clone)]
pub struct ActionCtx {
    /// Tab the action runs against
    pub tab_id: TabId,

    /// Identifier of the tool call, used for once-only grants
    pub tool_use_id: ToolUseId,

    /// URL of the tab when the call was received
    pub page_url: String,

    /// Authority of the caller, consulted for optional read-only extras
    pub authority: Option<Arc<dyn PermissionAuthority>>,
}

impl ActionCtx {
    pub fn new(tab_id: TabId, tool_use_id: ToolUseId, page_url: impl Into<String>) -> Self {
        Self {
            tab_id,
            tool_use_id,
            page_url: page_url.into(),
            authority: None,
        }
    }

    pub fn with_authority(mut self, authority: Arc<dyn PermissionAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }
}

impl fmt::Debug for ActionCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCtx")
            .field("tab_id", &self.tab_id)
            .field("tool_use_id", &self.tool_use_id)
            .field("page_url", &self.page_url)
            .field("authority", &self.authority.is_some())
            .finish()
    }
}

/// Viewport position in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_pair(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Where a pointer action lands: a named element reference or a literal coordinate.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Reference(String),
    Coordinate(Point),
}

impl Target {
    /// Reference wins over coordinate when both are supplied.
    pub fn from_parts(
        reference: Option<&str>,
        coordinate: Option<[f64; 2]>,
    ) -> Result<Self, ActionError> {
        match (reference.map(str::trim).filter(|r| !r.is_empty()), coordinate) {
            (Some(reference), _) => Ok(Target::Reference(reference.to_string())),
            (None, Some(pair)) => Ok(Target::Coordinate(Point::from_pair(pair))),
            (None, None) => Err(ActionError::validation(
                "either ref or coordinate is required",
            )),
        }
    }
}

/// Mouse button selection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseBtn {
    #[default]
    Left,
    Middle,
    Right,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyMod: u8 {
        const ALT = 0b0001;
        const CTRL = 0b0010;
        const META = 0b0100;
        const SHIFT = 0b1000;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointerKind {
    Moved,
    Pressed,
    Released,
}

/// Low-level pointer event sent to the automation surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub point: Point,
    pub button: Option<MouseBtn>,
    pub click_count: u8,
    pub modifiers: KeyMod,
}

impl PointerEvent {
    pub fn moved(point: Point, button: Option<MouseBtn>) -> Self {
        Self {
            kind: PointerKind::Moved,
            point,
            button,
            click_count: 0,
            modifiers: KeyMod::empty(),
        }
    }

    pub fn pressed(point: Point, button: MouseBtn, click_count: u8, modifiers: KeyMod) -> Self {
        Self {
            kind: PointerKind::Pressed,
            point,
            button: Some(button),
            click_count,
            modifiers,
        }
    }

    pub fn released(point: Point, button: MouseBtn, click_count: u8, modifiers: KeyMod) -> Self {
        Self {
            kind: PointerKind::Released,
            point,
            button: Some(button),
            click_count,
            modifiers,
        }
    }
}

/// Click variants exposed by the `computer` tool.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    LeftClick,
    RightClick,
    DoubleClick,
    TripleClick,
}

impl ClickKind {
    pub fn button(&self) -> MouseBtn {
        match self {
            ClickKind::RightClick => MouseBtn::Right,
            _ => MouseBtn::Left,
        }
    }

    pub fn click_count(&self) -> u8 {
        match self {
            ClickKind::LeftClick | ClickKind::RightClick => 1,
            ClickKind::DoubleClick => 2,
            ClickKind::TripleClick => 3,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ClickKind::LeftClick => "left_click",
            ClickKind::RightClick => "right_click",
            ClickKind::DoubleClick => "double_click",
            ClickKind::TripleClick => "triple_click",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            ClickKind::LeftClick => "Clicked",
            ClickKind::RightClick => "Right-clicked",
            ClickKind::DoubleClick => "Double-clicked",
            ClickKind::TripleClick => "Triple-clicked",
        }
    }

    pub(crate) fn describe(&self, at: &str) -> String {
        format!("{} {}", self.past_tense(), at)
    }
}

/// Parameters for the click family.
#[derive(Clone, Debug)]
pub struct ClickParams {
    pub kind: ClickKind,
    pub target: Target,
    pub modifiers: KeyMod,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// Signed wheel deltas for `distance` pixels in this direction.
    pub fn deltas(&self, distance: f64) -> (f64, f64) {
        match self {
            ScrollDirection::Up => (0.0, -distance),
            ScrollDirection::Down => (0.0, distance),
            ScrollDirection::Left => (-distance, 0.0),
            ScrollDirection::Right => (distance, 0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScrollParams {
    pub coordinate: Point,
    pub direction: ScrollDirection,
    /// Tick count; the configured default applies when absent.
    pub amount: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct KeyParams {
    pub text: String,
    pub repeat: u32,
}

/// Captured viewport image plus the dimensions needed for coordinate scaling.
#[derive(Clone, Debug, PartialEq)]
pub struct Screenshot {
    pub image: ImagePayload,
    pub width: u32,
    pub height: u32,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
}

/// Region capture request, in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Tunables shared by the action handlers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Pixels scrolled per tick
    pub scroll_tick_px: u32,
    /// Ticks used when the caller omits `scroll_amount`
    pub default_scroll_ticks: u32,
    /// Delay before re-reading the scroll position
    pub verify_delay_ms: u64,
    /// Upper bound for the protocol-level wheel event
    pub wheel_timeout_ms: u64,
    /// Displacement at or below this is treated as "did not scroll"
    pub min_effective_px: f64,
    /// Longest accepted `wait` duration
    pub max_wait_secs: f64,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            scroll_tick_px: 100,
            default_scroll_ticks: 3,
            verify_delay_ms: 200,
            wheel_timeout_ms: 5_000,
            min_effective_px: 5.0,
            max_wait_secs: 30.0,
        }
    }
}

impl ActionSettings {
    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn wheel_timeout(&self) -> Duration {
        Duration::from_millis(self.wheel_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        if self.scroll_tick_px == 0 {
            return Err(ActionError::validation("scroll_tick_px must be positive"));
        }
        if !(1..=10).contains(&self.default_scroll_ticks) {
            return Err(ActionError::validation(
                "default_scroll_ticks must be between 1 and 10",
            ));
        }
        if self.wheel_timeout_ms == 0 {
            return Err(ActionError::validation("wheel_timeout_ms must be positive"));
        }
        if !(self.max_wait_secs > 0.0) {
            return Err(ActionError::validation("max_wait_secs must be positive"));
        }
        Ok(())
    }
}
