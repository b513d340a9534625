//! # Prometheus Metrics
//!
//! Operational metrics for the parcel node, scraped at `/metrics` on the
//! configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] under the
//! `parcel` namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Parcels produced by the factory.
    pub parcels_created_total: IntCounter,
    /// Successful `open()` calls.
    pub parcels_emptied_total: IntCounter,
    /// Accepted deposits of any asset kind.
    pub deposits_total: IntCounter,
    /// `open()` calls rejected for a wrong secret.
    pub open_attempts_failed_total: IntCounter,
    /// Requests that ended in a contract error.
    pub requests_rejected_total: IntCounter,
    /// Hosted parcels in the `Open` state, recounted after creates and locks.
    pub parcels_open: IntGauge,
    /// Runtime call latency, labelled by operation.
    pub operation_latency_seconds: HistogramVec,
}

fn register<M: Collector + Clone + 'static>(registry: &Registry, metric: M) -> M {
    registry
        .register(Box::new(metric.clone()))
        .expect("metric registration");
    metric
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("parcel".into()), None)
            .expect("failed to create prometheus registry");

        let parcels_created_total = register(
            &registry,
            IntCounter::new("parcels_created_total", "Parcels created by the factory")
                .expect("metric creation"),
        );
        let parcels_emptied_total = register(
            &registry,
            IntCounter::new("parcels_emptied_total", "Parcels opened and emptied")
                .expect("metric creation"),
        );
        let deposits_total = register(
            &registry,
            IntCounter::new("deposits_total", "Deposits accepted into parcels")
                .expect("metric creation"),
        );
        let open_attempts_failed_total = register(
            &registry,
            IntCounter::new(
                "open_attempts_failed_total",
                "Open attempts rejected for an incorrect secret",
            )
            .expect("metric creation"),
        );
        let requests_rejected_total = register(
            &registry,
            IntCounter::new(
                "requests_rejected_total",
                "API requests rejected with a contract error",
            )
            .expect("metric creation"),
        );
        let parcels_open = register(
            &registry,
            IntGauge::new("parcels_open", "Parcels still accepting deposits")
                .expect("metric creation"),
        );
        let operation_latency_seconds = register(
            &registry,
            HistogramVec::new(
                HistogramOpts::new(
                    "operation_latency_seconds",
                    "Latency of runtime operations in seconds",
                )
                .buckets(vec![
                    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
                ]),
                &["operation"],
            )
            .expect("metric creation"),
        );

        Self {
            registry,
            parcels_created_total,
            parcels_emptied_total,
            deposits_total,
            open_attempts_failed_total,
            requests_rejected_total,
            parcels_open,
            operation_latency_seconds,
        }
    }

    /// Encodes all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler for `GET /metrics`.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("failed to encode metrics: {e}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_encode_with_namespace() {
        let metrics = NodeMetrics::new();
        metrics.parcels_created_total.inc();
        metrics
            .operation_latency_seconds
            .with_label_values(&["open"])
            .observe(0.001);

        let output = metrics.encode().unwrap();
        assert!(output.contains("parcel_parcels_created_total 1"));
        assert!(output.contains("parcel_operation_latency_seconds"));
        assert!(output.contains("operation=\"open\""));
    }

    #[test]
    fn gauge_tracks_open_parcels() {
        let metrics = NodeMetrics::new();
        metrics.parcels_open.inc();
        metrics.parcels_open.inc();
        metrics.parcels_open.dec();
        assert_eq!(metrics.parcels_open.get(), 1);
    }
}
