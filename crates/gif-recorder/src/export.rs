//! GIF export: snapshot frames, encode, deliver, then clear.
//!
//! Clearing differs per target. A download clears the exported frames as soon as
//! encoding succeeded, whether or not the download itself worked. A drop onto
//! the page clears only after the drop succeeded, so a failed drop can be
//! retried with the same frames. An encoder failure never clears anything.
//! Only frames handed to the encoder are cleared; frames captured while the
//! export was in flight stay buffered and recording continues.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::{GroupId, SurfaceError, TabId};
use tracing::{info, instrument, warn};

use crate::buffer::RecordingStore;
use crate::errors::{ExportError, RecorderError};
use crate::metrics;
use crate::model::FrameDescriptor;

/// Overlay toggles and compression settings passed to the encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub show_click_indicators: bool,
    pub show_drag_paths: bool,
    pub show_action_labels: bool,
    pub show_progress_bar: bool,
    pub show_watermark: bool,
    /// 1 (best) to 30 (fastest)
    pub quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            show_click_indicators: true,
            show_drag_paths: true,
            show_action_labels: true,
            show_progress_bar: true,
            show_watermark: true,
            quality: 10,
        }
    }
}

impl EncodeOptions {
    pub fn validate(&self) -> Result<(), RecorderError> {
        if !(1..=30).contains(&self.quality) {
            return Err(RecorderError::InvalidOptions(format!(
                "quality must be between 1 and 30, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedGif {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
}

impl EncodedGif {
    pub fn data_url(&self) -> String {
        format!("data:image/gif;base64,{}", STANDARD.encode(&self.data))
    }
}

#[async_trait]
pub trait GifEncoder: Send + Sync {
    async fn encode(
        &self,
        frames: &[FrameDescriptor],
        options: &EncodeOptions,
    ) -> Result<EncodedGif, SurfaceError>;
}

#[async_trait]
pub trait GifDelivery: Send + Sync {
    async fn download(&self, gif: &EncodedGif, filename: &str) -> Result<(), SurfaceError>;

    /// Synthesize a file drop at viewport coordinate `(x, y)`.
    async fn drop_file(
        &self,
        tab: TabId,
        x: f64,
        y: f64,
        gif: &EncodedGif,
        filename: &str,
    ) -> Result<(), SurfaceError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExportTarget {
    Download,
    Drop { tab: TabId, x: f64, y: f64 },
}

impl ExportTarget {
    fn label(&self) -> &'static str {
        match self {
            ExportTarget::Download => "download",
            ExportTarget::Drop { .. } => "drop",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub group: GroupId,
    pub target: ExportTarget,
    pub filename: Option<String>,
    pub options: EncodeOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOutcome {
    pub filename: String,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub target: ExportTarget,
}

pub struct GifExporter {
    store: Arc<RecordingStore>,
    encoder: Arc<dyn GifEncoder>,
    delivery: Arc<dyn GifDelivery>,
}

impl GifExporter {
    pub fn new(
        store: Arc<RecordingStore>,
        encoder: Arc<dyn GifEncoder>,
        delivery: Arc<dyn GifDelivery>,
    ) -> Self {
        Self {
            store,
            encoder,
            delivery,
        }
    }

    pub fn store(&self) -> &Arc<RecordingStore> {
        &self.store
    }

    #[instrument(skip_all, fields(group = %request.group, target = request.target.label()))]
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, ExportError> {
        request.options.validate()?;
        let handoff = self.store.hand_off(request.group);
        if handoff.frames.is_empty() {
            return Err(ExportError::NoFrames(request.group));
        }

        let frame_count = handoff.frames.len();
        let descriptors: Vec<FrameDescriptor> = handoff
            .frames
            .iter()
            .cloned()
            .map(FrameDescriptor::from)
            .collect();
        let gif = match self.encoder.encode(&descriptors, &request.options).await {
            Ok(gif) => gif,
            Err(err) => {
                warn!(error = %err, "gif encoding failed; frames retained");
                metrics::record_export(request.target.label(), "encode_failed");
                return Err(ExportError::Encode(err));
            }
        };

        let filename = request
            .filename
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(default_filename);

        match request.target {
            ExportTarget::Download => {
                let delivered = self.delivery.download(&gif, &filename).await;
                let released = self.store.release(&handoff);
                info!(released, "exported frames cleared after encoding");
                if let Err(err) = delivered {
                    metrics::record_export("download", "delivery_failed");
                    return Err(ExportError::Download(err));
                }
            }
            ExportTarget::Drop { tab, x, y } => {
                if let Err(err) = self.delivery.drop_file(tab, x, y, &gif, &filename).await {
                    warn!(error = %err, "gif drop failed; frames retained");
                    metrics::record_export("drop", "delivery_failed");
                    return Err(ExportError::Drop(err));
                }
                let released = self.store.release(&handoff);
                info!(released, "exported frames cleared after drop");
            }
        }

        metrics::record_export(request.target.label(), "ok");
        Ok(ExportOutcome {
            filename,
            frame_count,
            width: gif.width,
            height: gif.height,
            byte_size: gif.byte_size,
            target: request.target,
        })
    }
}

fn default_filename() -> String {
    format!("recording-{}.gif", Utc::now().format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_is_bounded() {
        assert!(EncodeOptions::default().validate().is_ok());
        let options = EncodeOptions {
            quality: 0,
            ..EncodeOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn data_url_is_base64() {
        let gif = EncodedGif {
            data: b"GIF89a".to_vec(),
            width: 1,
            height: 1,
            byte_size: 6,
        };
        assert_eq!(gif.data_url(), "data:image/gif;base64,R0lGODlh");
    }
}
