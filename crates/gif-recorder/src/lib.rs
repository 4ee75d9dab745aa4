//! Frame recording for agent sessions.
//!
//! Frames are buffered per tab group (at most [`MAX_FRAMES`], oldest evicted
//! first) and exported through an external [`GifEncoder`] plus a
//! [`GifDelivery`] port that downloads the file or drops it onto the page.

pub mod buffer;
pub mod errors;
pub mod export;
pub mod metrics;
pub mod model;

pub use buffer::{
    AppendOutcome, ExportHandoff, RecordingStore, StartOutcome, StopOutcome, MAX_FRAMES,
};
pub use errors::{ExportError, RecorderError};
pub use export::{
    EncodeOptions, EncodedGif, ExportOutcome, ExportRequest, ExportTarget, GifDelivery,
    GifEncoder, GifExporter,
};
pub use model::{delay_for_verb, ActionInfo, Frame, FrameCapture, FrameDescriptor};
