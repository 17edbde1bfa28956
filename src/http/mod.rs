//! HTTP server for hubbridge
//!
//! Mounts the integration routes under `/integrations/hubspot` plus the
//! ambient `/healthz` and `/metrics` endpoints.

pub mod extract;
pub mod response;
pub mod routes;

use self::response::{UpstreamDetail, write_http_error};
use crate::auth::{AuthorizationEndpoint, TokenBroker, TokenEndpointClient};
use crate::config::{Config, HttpConfig};
use crate::constants::ROUTE_PREFIX;
use crate::crm::CrmGateway;
use crate::upstream::UpstreamClient;
use crate::{GatewayError, Result};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<TokenBroker>,
    pub crm: Arc<CrmGateway>,
    pub authorization: AuthorizationEndpoint,
}

impl AppState {
    /// Wire the broker, CRM gateway and consent URL builder from config
    ///
    /// Fails with `MisconfiguredClient` when credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.upstream.timeout();
        let endpoint = TokenEndpointClient::new(
            &config.upstream.api_base_url,
            config.oauth.credentials()?,
            timeout,
        )?;
        let broker = Arc::new(TokenBroker::new(endpoint));
        let upstream = UpstreamClient::new(&config.upstream.api_base_url, timeout)?;

        Ok(Self {
            crm: Arc::new(CrmGateway::new(Arc::clone(&broker), upstream)),
            broker,
            authorization: AuthorizationEndpoint::from_config(config),
        })
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct AppError(GatewayError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::NotAuthenticated | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::TokenRefreshFailed { .. } | GatewayError::UpstreamCallFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::MisconfiguredClient(_)
            | GatewayError::TokenExchangeFailed { .. }
            | GatewayError::Config(_)
            | GatewayError::Io(_)
            | GatewayError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.0.kind();

        let message = match &self.0 {
            GatewayError::Config(_) | GatewayError::Io(_) | GatewayError::Json(_) => {
                // Log full error details internally
                tracing::error!("Internal error: {:?}", self.0);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let upstream = match &self.0 {
            GatewayError::TokenExchangeFailed { status, body, .. }
            | GatewayError::TokenRefreshFailed { status, body, .. }
            | GatewayError::UpstreamCallFailed { status, body, .. } => Some(UpstreamDetail {
                status: *status,
                body: body.clone(),
            }),
            _ => None,
        };

        tracing::debug!(
            error_type = error_type,
            status = %status,
            message = %message,
            "HTTP request error response"
        );

        write_http_error(status, error_type, &message, upstream)
    }
}

impl<E> From<E> for AppError
where
    E: Into<GatewayError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    if let Err(e) = config.validate() {
        tracing::error!("Refusing to start: {}", e);
        return Err(e);
    }

    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.http);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| GatewayError::config(format!("Invalid address {}: {}", addr, e)))?;

    tracing::info!("Starting HTTP server on {}", socket_addr);

    let listener = tokio::net::TcpListener::bind(socket_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::config(format!("Server error: {}", e)))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState, http_config: &HttpConfig) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest(ROUTE_PREFIX, routes::integration_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new())
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Micros),
                        ),
                )
                .layer(cors_layer(http_config)),
        )
}

/// CORS for the browser frontend; configured origins or localhost dev servers
fn cors_layer(http_config: &HttpConfig) -> CorsLayer {
    let origins: Vec<String> = match &http_config.allowed_origins {
        Some(origins) => origins.clone(),
        None => vec![
            format!("http://localhost:{}", http_config.port),
            format!("http://127.0.0.1:{}", http_config.port),
            "http://localhost:5173".to_string(),
        ],
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics_handler() -> std::result::Result<(StatusCode, String), AppError> {
    let metrics = crate::telemetry::get_metrics()?;
    Ok((StatusCode::OK, metrics))
}
