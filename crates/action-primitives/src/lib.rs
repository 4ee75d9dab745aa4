//! Action handlers for browser automation
//!
//! This crate turns high-level agent actions into automation surface calls:
//! - click family, hover and drag with viewport-relative coordinate scaling
//! - scrolling with effectiveness verification and a script fallback
//! - key sequences, chords and reload shortcuts
//! - zoomed region capture, screenshots, waits and navigation

pub mod coords;
pub mod errors;
pub mod keys;
pub mod ports;
mod primitives;
pub mod scripts;
pub mod types;

pub use coords::{scale, ScalingContext, ScreenshotContexts};
pub use errors::*;
pub use keys::{KeyChord, KeyCode, ReloadShortcut};
pub use ports::{AutomationSurface, NavigationGuard, ScalingContextProvider};
pub use primitives::*;
pub use types::*;
