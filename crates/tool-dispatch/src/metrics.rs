use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounter, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref TOOL_CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tabpilot_tool_calls_total",
            "Tool calls grouped by tool and outcome"
        ),
        &["tool", "outcome"]
    )
    .unwrap();
    static ref PERMISSION_PROMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tabpilot_permission_prompts_total",
            "Permission prompts issued per tool"
        ),
        &["tool"]
    )
    .unwrap();
    static ref PROTOCOL_VIOLATIONS_TOTAL: IntCounter = IntCounter::new(
        "tabpilot_protocol_violations_total",
        "Retries that asked for permission a second time"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register dispatch metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, TOOL_CALLS_TOTAL.clone());
    register(registry, PERMISSION_PROMPTS_TOTAL.clone());
    register(registry, PROTOCOL_VIOLATIONS_TOTAL.clone());
}

pub fn record_call(tool: &str, outcome: &str) {
    TOOL_CALLS_TOTAL.with_label_values(&[tool, outcome]).inc();
}

pub fn record_prompt(tool: &str) {
    PERMISSION_PROMPTS_TOTAL.with_label_values(&[tool]).inc();
}

pub fn record_protocol_violation() {
    PROTOCOL_VIOLATIONS_TOTAL.inc();
}
