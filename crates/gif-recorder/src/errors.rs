use tabpilot_core_types::{GroupId, SurfaceError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecorderError {
    #[error("invalid encode options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no frames recorded for group {0}")]
    NoFrames(GroupId),
    #[error(transparent)]
    Options(#[from] RecorderError),
    #[error("gif encoding failed: {0}")]
    Encode(SurfaceError),
    #[error("gif download failed: {0}")]
    Download(SurfaceError),
    #[error("gif drop failed: {0}")]
    Drop(SurfaceError),
}
