//! Prometheus recorder for the client counters
//!
//! The CLI is short-lived, so nothing scrapes it; the rendered counters are
//! logged at debug level when the operation finishes.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Returns `None` if a recorder is already installed.
pub fn install_recorder() -> Option<PrometheusHandle> {
    PrometheusBuilder::new().install_recorder().ok()
}
