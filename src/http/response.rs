//! HTTP error body shared by every handler
//!
//! `{"error": {"type", "message", "status", "upstream"?: {"status", "body"}}}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct HttpErrorResponse<'a> {
    error: HttpErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct HttpErrorDetail<'a> {
    #[serde(rename = "type")]
    error_type: &'a str,
    message: &'a str,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream: Option<UpstreamDetail>,
}

/// What the upstream answered, when it answered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamDetail {
    pub status: Option<u16>,
    pub body: Option<Value>,
}

/// Write a standardized HTTP error response
pub fn write_http_error(
    status: StatusCode,
    error_type: &str,
    message: &str,
    upstream: Option<UpstreamDetail>,
) -> Response {
    let response = HttpErrorResponse {
        error: HttpErrorDetail {
            error_type,
            message,
            status: status.as_u16(),
            upstream,
        },
    };

    (status, Json(response)).into_response()
}
