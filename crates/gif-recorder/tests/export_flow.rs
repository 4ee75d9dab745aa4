mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use common::{FakeDelivery, FakeEncoder};
use gif_recorder::{
    ActionInfo, EncodeOptions, EncodedGif, ExportError, ExportRequest, ExportTarget, FrameCapture,
    FrameDescriptor, GifEncoder, GifExporter, RecordingStore,
};
use parking_lot::Mutex;
use tabpilot_core_types::{GroupId, ImagePayload, SurfaceError, TabId};

const GROUP: GroupId = GroupId(11);

struct Harness {
    store: Arc<RecordingStore>,
    encoder: Arc<FakeEncoder>,
    delivery: Arc<FakeDelivery>,
    exporter: GifExporter,
}

fn harness() -> Harness {
    let store = Arc::new(RecordingStore::new());
    let encoder = Arc::new(FakeEncoder::default());
    let delivery = Arc::new(FakeDelivery::default());
    let exporter = GifExporter::new(store.clone(), encoder.clone(), delivery.clone());
    Harness {
        store,
        encoder,
        delivery,
        exporter,
    }
}

fn capture(verb: &str) -> FrameCapture {
    FrameCapture {
        image: ImagePayload::png(verb),
        action: Some(ActionInfo::new(verb)),
        viewport_width: 1280,
        viewport_height: 800,
        device_pixel_ratio: 2.0,
    }
}

fn record(store: &RecordingStore, verbs: &[&str]) {
    store.start(GROUP);
    for verb in verbs {
        store.append_frame(GROUP, capture(verb)).unwrap();
    }
}

/// Encoder that captures another frame into the group while it is encoding.
struct AppendingEncoder {
    store: Arc<RecordingStore>,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl GifEncoder for AppendingEncoder {
    async fn encode(
        &self,
        frames: &[FrameDescriptor],
        _options: &EncodeOptions,
    ) -> Result<EncodedGif, SurfaceError> {
        *self.seen.lock() = frames.iter().map(|f| f.image.data.clone()).collect();
        self.store.append_frame(GROUP, capture("scroll"));
        tokio::task::yield_now().await;
        Ok(EncodedGif {
            data: vec![0x47],
            width: 10,
            height: 10,
            byte_size: 1,
        })
    }
}

fn request(target: ExportTarget) -> ExportRequest {
    ExportRequest {
        group: GROUP,
        target,
        filename: Some("demo.gif".into()),
        options: EncodeOptions::default(),
    }
}

#[tokio::test]
async fn empty_buffer_never_reaches_encoder() {
    let h = harness();
    let err = h
        .exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoFrames(GroupId(11))));
    assert_eq!(h.encoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn download_passes_delay_hints_and_clears() {
    let h = harness();
    record(&h.store, &["screenshot", "left_click", "scroll"]);

    let outcome = h
        .exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap();
    assert_eq!(outcome.frame_count, 3);
    assert_eq!(outcome.filename, "demo.gif");
    assert_eq!(*h.encoder.last_delays.lock(), vec![300, 1500, 800]);
    assert_eq!(*h.delivery.downloads.lock(), vec!["demo.gif".to_string()]);
    assert_eq!(h.store.frame_count(GROUP), 0);
}

#[tokio::test]
async fn failed_download_still_clears_after_encoding() {
    let h = harness();
    record(&h.store, &["screenshot"]);
    h.delivery.fail_download.store(true, Ordering::SeqCst);

    let err = h
        .exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Download(_)));
    assert_eq!(h.store.frame_count(GROUP), 0);
}

#[tokio::test]
async fn failed_drop_keeps_frames_for_retry() {
    let h = harness();
    record(&h.store, &["screenshot", "type"]);
    h.delivery.fail_drop.store(true, Ordering::SeqCst);
    let target = ExportTarget::Drop {
        tab: TabId(3),
        x: 40.0,
        y: 50.0,
    };

    let err = h.exporter.export(request(target)).await.unwrap_err();
    assert!(matches!(err, ExportError::Drop(_)));
    assert_eq!(h.store.frame_count(GROUP), 2);

    h.delivery.fail_drop.store(false, Ordering::SeqCst);
    let outcome = h.exporter.export(request(target)).await.unwrap();
    assert_eq!(outcome.frame_count, 2);
    assert_eq!(*h.delivery.drops.lock(), vec![(TabId(3), 40.0, 50.0)]);
    assert_eq!(h.store.frame_count(GROUP), 0);
}

#[tokio::test]
async fn frames_captured_during_export_survive_it() {
    let store = Arc::new(RecordingStore::new());
    let encoder = Arc::new(AppendingEncoder {
        store: store.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let delivery = Arc::new(FakeDelivery::default());
    let exporter = GifExporter::new(store.clone(), encoder.clone(), delivery.clone());
    record(&store, &["left_click"]);

    let outcome = exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap();
    assert_eq!(outcome.frame_count, 1);
    assert_eq!(*encoder.seen.lock(), vec!["left_click".to_string()]);

    assert!(store.is_recording(GROUP));
    let left: Vec<_> = store
        .frames(GROUP)
        .into_iter()
        .map(|f| f.image.data)
        .collect();
    assert_eq!(left, vec!["scroll".to_string()]);

    let next = exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap();
    assert_eq!(next.frame_count, 1);
    assert_eq!(*encoder.seen.lock(), vec!["scroll".to_string()]);
}

#[tokio::test]
async fn encoder_failure_clears_nothing() {
    let h = harness();
    record(&h.store, &["wait"]);
    h.encoder.fail.store(true, Ordering::SeqCst);

    let err = h
        .exporter
        .export(request(ExportTarget::Download))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Encode(_)));
    assert_eq!(h.store.frame_count(GROUP), 1);
    assert!(h.store.is_recording(GROUP));
    assert!(h.delivery.downloads.lock().is_empty());
}

#[tokio::test]
async fn blank_filename_gets_timestamped_default() {
    let h = harness();
    record(&h.store, &["navigate"]);
    let mut req = request(ExportTarget::Download);
    req.filename = Some("  ".into());

    let outcome = h.exporter.export(req).await.unwrap();
    assert!(outcome.filename.starts_with("recording-"));
    assert!(outcome.filename.ends_with(".gif"));
}
