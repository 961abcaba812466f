// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const LINKS_COMMITTED: &str = "ethos_links_committed_total";
pub const APPEND_FAILURES: &str = "ethos_append_failures_total";
pub const APPEND_DURATION: &str = "ethos_append_duration_seconds";
pub const VERIFICATIONS: &str = "ethos_verifications_total";
pub const VERIFICATION_FAILURES: &str = "ethos_verification_failures_total";
pub const CHAIN_LENGTH: &str = "ethos_chain_length";
pub const RECOVERY_DURATION: &str = "ethos_recovery_duration_seconds";

/// Initialize telemetry (logs + metrics)
///
/// Safe to call more than once; later calls leave the first
/// subscriber and recorder in place.
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ethos_node=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    // 2. Initialize Metrics (Prometheus)
    if PROM_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if PROM_HANDLE.set(handle).is_err() {
                    tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
                }
            }
            Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
        }
    }

    metrics::describe_counter!(LINKS_COMMITTED, "Total number of chain links committed");
    metrics::describe_counter!(APPEND_FAILURES, "Appends rolled back after a storage failure");
    metrics::describe_histogram!(APPEND_DURATION, "Time taken to commit one link");
    metrics::describe_counter!(VERIFICATIONS, "Chain verifications run");
    metrics::describe_counter!(VERIFICATION_FAILURES, "Chain verifications that found a violation");
    metrics::describe_gauge!(CHAIN_LENGTH, "Number of links in the chain");
    metrics::describe_histogram!(RECOVERY_DURATION, "Time taken to open and verify a stored chain");
}

/// Render metrics in Prometheus exposition format
pub fn render_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_telemetry();
        init_telemetry();

        metrics::counter!(LINKS_COMMITTED, 1);
        let rendered = render_metrics();
        assert!(rendered.contains(LINKS_COMMITTED), "{}", rendered);
    }
}
