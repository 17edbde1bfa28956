//! OAuth 2.0 client side of the gateway
//!
//! - **store**: the single connected account's token record
//! - **client**: form-encoded calls to the upstream token endpoint
//! - **broker**: token lifecycle with lazy single-flight refresh
//! - **authorize**: consent URL for starting the code flow

pub mod authorize;
pub mod broker;
pub mod client;
pub mod store;

pub use authorize::{AuthorizationEndpoint, authorization_url};
pub use broker::{CodeExchange, TokenBroker};
pub use client::TokenEndpointClient;
pub use store::TokenStore;
