use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, HistogramVec, IntCounterVec, Registry};
use tracing::error;

use crate::shape::InboundShape;

lazy_static! {
    static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "vapi_bridge_requests_total",
            "Webhook requests by detected inbound shape"
        ),
        &["shape"]
    )
    .unwrap();
    static ref FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "vapi_bridge_failures_total",
            "Webhook requests answered with an in-band error"
        ),
        &["kind"]
    )
    .unwrap();
    static ref ORCHESTRATION_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "vapi_bridge_orchestration_duration_seconds",
            "Remote orchestration latency",
            vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 80.0]
        ),
        &["outcome"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector)) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register webhook adapter metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, REQUESTS_TOTAL.clone());
    register(registry, FAILURES_TOTAL.clone());
    register(registry, ORCHESTRATION_DURATION.clone());
}

pub fn record_request(shape: InboundShape) {
    REQUESTS_TOTAL.with_label_values(&[shape.as_str()]).inc();
}

pub fn record_failure(kind: &str) {
    FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_orchestration(elapsed: Duration, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    ORCHESTRATION_DURATION
        .with_label_values(&[outcome])
        .observe(elapsed.as_secs_f64());
}
