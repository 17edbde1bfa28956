//! Telemetry module for hubbridge
//!
//! Prometheus metrics for upstream traffic and the token lifecycle.

use crate::{GatewayError, Result};
use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, TextEncoder, register_counter_vec,
    register_histogram_vec,
};

/// Upstream CRM requests counter
static UPSTREAM_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hubbridge_upstream_requests_total",
        "Total number of CRM API requests sent upstream",
        &["operation", "outcome"]
    )
    .unwrap()
});

/// Upstream CRM request duration histogram
static UPSTREAM_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        HistogramOpts::new(
            "hubbridge_upstream_request_duration_seconds",
            "Duration of CRM API requests in seconds"
        ),
        &["operation"]
    )
    .unwrap()
});

/// Refresh-grant counter
static TOKEN_REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hubbridge_token_refresh_total",
        "Total number of refresh-token grants performed",
        &["outcome"]
    )
    .unwrap()
});

/// Authorization-code exchange counter
static TOKEN_EXCHANGE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hubbridge_token_exchange_total",
        "Total number of authorization code exchanges performed",
        &["outcome"]
    )
    .unwrap()
});

fn outcome(success: bool) -> &'static str {
    if success { "success" } else { "failure" }
}

/// Record one upstream CRM call
pub fn record_upstream_request(operation: &str, success: bool, duration_secs: f64) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome(success)])
        .inc();
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Record one refresh grant (not one per waiting caller)
pub fn record_token_refresh(success: bool) {
    TOKEN_REFRESH_TOTAL
        .with_label_values(&[outcome(success)])
        .inc();
}

/// Record one authorization code exchange
pub fn record_token_exchange(success: bool) {
    TOKEN_EXCHANGE_TOTAL
        .with_label_values(&[outcome(success)])
        .inc();
}

/// Get Prometheus metrics in text format
pub fn get_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| GatewayError::config(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| GatewayError::config(format!("Failed to convert metrics to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_refresh_count(success: bool) -> f64 {
        TOKEN_REFRESH_TOTAL
            .with_label_values(&[outcome(success)])
            .get()
    }

    #[test]
    fn test_record_metrics() {
        record_upstream_request("create_contact", true, 0.123);
        record_upstream_request("create_contact", false, 0.5);
        record_token_refresh(true);
        record_token_exchange(false);

        let metrics = get_metrics().unwrap();

        assert!(metrics.contains("hubbridge_upstream_requests_total"));
        assert!(metrics.contains("hubbridge_upstream_request_duration_seconds"));
        assert!(metrics.contains("hubbridge_token_refresh_total"));
        assert!(metrics.contains("hubbridge_token_exchange_total"));
        assert!(metrics.contains("operation=\"create_contact\""));
    }

    #[test]
    fn test_refresh_counter_increases() {
        let before = token_refresh_count(false);
        record_token_refresh(false);
        assert!(token_refresh_count(false) >= before + 1.0);
    }
}
