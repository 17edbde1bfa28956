//! Authenticated calls to the CRM API
//!
//! One request per call, no retries. Non-2xx responses surface as
//! [`GatewayError::UpstreamCallFailed`] carrying the upstream status and the
//! body exactly as received.

use crate::constants::CONTENT_TYPE_JSON;
use crate::{GatewayError, Result, telemetry};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Parse an upstream body as JSON, falling back to the raw text
///
/// An empty body becomes `null`.
pub(crate) fn body_to_value(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// HTTP client bound to the CRM API base URL
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            // A 3xx is reported to the caller, never followed
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: api_base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Send `body` to `path` with `token` as the bearer credential
    ///
    /// `operation` only labels logs and metrics.
    pub async fn call(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header(ACCEPT, CONTENT_TYPE_JSON);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, CONTENT_TYPE_JSON).json(body);
        }

        let result = self.send(request).await;
        let elapsed = started.elapsed();
        telemetry::record_upstream_request(operation, result.is_ok(), elapsed.as_secs_f64());

        match &result {
            Ok(_) => tracing::debug!(
                operation,
                method = %method,
                path,
                elapsed_ms = elapsed.as_millis() as u64,
                "Upstream call succeeded"
            ),
            Err(e) => tracing::warn!(
                operation,
                method = %method,
                path,
                status = e.upstream_status(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Upstream call failed: {}",
                e
            ),
        }

        result
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::upstream_unreachable(format!(
                    "upstream timed out after {:?}",
                    self.timeout
                ))
            } else {
                GatewayError::upstream_unreachable(format!("upstream unreachable: {}", e))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::UpstreamCallFailed {
            status: Some(status.as_u16()),
            body: None,
            message: format!("failed to read upstream response: {}", e),
        })?;

        if !status.is_success() {
            return Err(GatewayError::upstream(status.as_u16(), body_to_value(text)));
        }

        Ok(body_to_value(text))
    }
}
