#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use gif_recorder::{EncodeOptions, EncodedGif, FrameDescriptor, GifDelivery, GifEncoder};
use parking_lot::Mutex;
use tabpilot_core_types::{SurfaceError, TabId};

#[derive(Default)]
pub struct FakeEncoder {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub last_delays: Mutex<Vec<u32>>,
}

#[async_trait]
impl GifEncoder for FakeEncoder {
    async fn encode(
        &self,
        frames: &[FrameDescriptor],
        _options: &EncodeOptions,
    ) -> Result<EncodedGif, SurfaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_delays.lock() = frames.iter().map(|f| f.delay_ms).collect();
        if self.fail.load(Ordering::SeqCst) {
            return Err(SurfaceError::new("encoder crashed"));
        }
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
    pub fail_download: AtomicBool,
    pub fail_drop: AtomicBool,
    pub downloads: Mutex<Vec<String>>,
    pub drops: Mutex<Vec<(TabId, f64, f64)>>,
}

#[async_trait]
impl GifDelivery for FakeDelivery {
    async fn download(&self, _gif: &EncodedGif, filename: &str) -> Result<(), SurfaceError> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(SurfaceError::new("download blocked"));
        }
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
        if self.fail_drop.load(Ordering::SeqCst) {
            return Err(SurfaceError::new("no drop target"));
        }
        self.drops.lock().push((tab, x, y));
        Ok(())
    }
}
