//! hubbridge - OAuth2 integration gateway for the HubSpot CRM
//!
//! Connects one HubSpot account through the authorization code flow, keeps
//! its access token valid (refreshing lazily, one refresh at a time) and
//! forwards typed CRM requests upstream with that token.
//!
//! # Example
//!
//! ```rust,no_run
//! use hubbridge::config::Config;
//! use hubbridge::http::{AppState, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let state = AppState::from_config(&config)?;
//!     let app = build_router(state, &config.http);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod constants;
pub mod error;
pub mod model;

// Token lifecycle and upstream access
pub mod auth;
pub mod crm;
pub mod upstream;

// Infrastructure
pub mod config;
pub mod telemetry;

// Interface layers
pub mod cli;
pub mod http;

pub use auth::{TokenBroker, TokenStore};
pub use crm::CrmGateway;
pub use error::{GatewayError, Result};
pub use model::{TokenRecord, TokenState};

/// Initialize logging for the application
///
/// `RUST_LOG` wins over the configured level; `format: json` switches to
/// JSON lines. Safe to call more than once.
pub fn init_logging(log: &config::LogConfig) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| match log.level.as_deref() {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new(constants::DEFAULT_LOG_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(constants::DEFAULT_LOG_FILTER));

    let json = log.format.as_deref() == Some("json");
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
