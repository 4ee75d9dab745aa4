use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabpilot_core_types::ImagePayload;

/// The action a frame illustrates; drives overlays and frame timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub verb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_coordinate: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionInfo {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            coordinate: None,
            start_coordinate: None,
            text: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_coordinate(mut self, coordinate: Option<[f64; 2]>) -> Self {
        self.coordinate = coordinate;
        self
    }

    pub fn with_start_coordinate(mut self, start: Option<[f64; 2]>) -> Self {
        self.start_coordinate = start;
        self
    }

    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }

    /// Clicks and drags get a synthesized overlay frame before the real capture.
    pub fn wants_overlay(&self) -> bool {
        is_click_verb(&self.verb) || self.verb == "left_click_drag"
    }
}

fn is_click_verb(verb: &str) -> bool {
    matches!(
        verb,
        "click" | "left_click" | "right_click" | "double_click" | "triple_click"
    )
}

/// Rendering delay hint for a frame illustrating `verb`.
pub fn delay_for_verb(verb: Option<&str>) -> u32 {
    match verb {
        Some("wait" | "screenshot") => 300,
        Some("navigate" | "scroll" | "scroll_to" | "type" | "key" | "zoom") => 800,
        Some(v) if is_click_verb(v) || v == "left_click_drag" => 1500,
        _ => 800,
    }
}

/// A capture handed to the store; the store assigns the frame number.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCapture {
    pub image: ImagePayload,
    pub action: Option<ActionInfo>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_pixel_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub image: ImagePayload,
    pub action: Option<ActionInfo>,
    pub frame_number: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_pixel_ratio: f64,
}

/// What the encoder receives per frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub image: ImagePayload,
    pub action: Option<ActionInfo>,
    pub delay_ms: u32,
    pub frame_number: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_pixel_ratio: f64,
}

impl From<Frame> for FrameDescriptor {
    fn from(frame: Frame) -> Self {
        let delay_ms = delay_for_verb(frame.action.as_ref().map(|a| a.verb.as_str()));
        Self {
            image: frame.image,
            action: frame.action,
            delay_ms,
            frame_number: frame.frame_number,
            viewport_width: frame.viewport_width,
            viewport_height: frame.viewport_height,
            device_pixel_ratio: frame.device_pixel_ratio,
        }
    }
}
