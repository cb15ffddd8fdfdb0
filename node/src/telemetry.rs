// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskanchor_node=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(
        "taskanchor_completions_total",
        "Completion flows finished, labeled by outcome"
    );
    metrics::describe_counter!(
        "taskanchor_ledger_appends_total",
        "Confirmed ledger writes"
    );
    metrics::describe_counter!(
        "taskanchor_persist_divergence_total",
        "Ledger writes confirmed while the store update failed"
    );
    metrics::describe_histogram!(
        "taskanchor_completion_duration_seconds",
        "Wall time of one completion flow"
    );

    metrics::gauge!("taskanchor_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
