//! Request and token exchange counters
//!
//! Recorded through the `metrics` facade. Without an installed recorder
//! these are no-ops; binaries that want them install one.
//!
//! - `daraja_requests_total` (counter): labels `operation`, `outcome`
//! - `daraja_token_exchanges_total` (counter): label `outcome`

use crate::error::Error;

/// Outcome label for a finished call.
pub fn outcome<T>(result: &Result<T, Error>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(Error::Configuration(_)) => "configuration_error",
        Err(Error::Authentication(_)) => "authentication_error",
        Err(Error::Validation(_)) => "validation_error",
        Err(Error::Transport(_)) => "transport_error",
        Err(Error::Remote { .. }) => "remote_error",
        Err(Error::InvalidResponse(_)) => "invalid_response",
    }
}

/// Record a dispatched operation.
pub fn record_request(operation: &'static str, outcome: &'static str) {
    metrics::counter!("daraja_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

/// Record one OAuth exchange attempt.
pub fn record_token_exchange(success: bool) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!("daraja_token_exchanges_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("stk_push", "success");
        record_token_exchange(false);
    }

    #[test]
    fn record_request_carries_labels() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("stk_push", "success");
        record_request("b2c", "remote_error");

        let output = handle.render();
        assert!(output.contains("daraja_requests_total"), "got: {output}");
        assert!(output.contains("operation=\"stk_push\""), "got: {output}");
        assert!(output.contains("outcome=\"remote_error\""), "got: {output}");
    }

    #[test]
    fn record_token_exchange_counts_outcomes() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_token_exchange(true);
        record_token_exchange(false);

        let output = handle.render();
        assert!(output.contains("daraja_token_exchanges_total"), "got: {output}");
        assert!(output.contains("outcome=\"success\""), "got: {output}");
        assert!(output.contains("outcome=\"error\""), "got: {output}");
    }

    #[test]
    fn outcome_labels() {
        let ok: Result<(), Error> = Ok(());
        assert_eq!(outcome(&ok), "success");
        let remote: Result<(), Error> = Err(Error::Remote {
            status: 500,
            body: String::new(),
        });
        assert_eq!(outcome(&remote), "remote_error");
        let auth: Result<(), Error> = Err(daraja_auth::Error::MissingToken.into());
        assert_eq!(outcome(&auth), "authentication_error");
    }
}
