use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounter, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref RECORDER_FRAMES_TOTAL: IntCounter = IntCounter::new(
        "tabpilot_recorder_frames_total",
        "Frames appended to recording buffers"
    )
    .unwrap();
    static ref RECORDER_EVICTIONS_TOTAL: IntCounter = IntCounter::new(
        "tabpilot_recorder_evictions_total",
        "Frames evicted because a buffer was full"
    )
    .unwrap();
    static ref RECORDER_EXPORTS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tabpilot_recorder_exports_total",
            "GIF exports grouped by target and outcome"
        ),
        &["target", "outcome"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register recorder metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, RECORDER_FRAMES_TOTAL.clone());
    register(registry, RECORDER_EVICTIONS_TOTAL.clone());
    register(registry, RECORDER_EXPORTS_TOTAL.clone());
}

pub fn record_frames(appended: usize, evicted: usize) {
    RECORDER_FRAMES_TOTAL.inc_by(appended as u64);
    RECORDER_EVICTIONS_TOTAL.inc_by(evicted as u64);
}

pub fn record_export(target: &str, outcome: &str) {
    RECORDER_EXPORTS_TOTAL
        .with_label_values(&[target, outcome])
        .inc();
}
