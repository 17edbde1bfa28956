//! OAuth 2.0 token endpoint client
//!
//! Performs the two form-encoded grants the gateway needs against the
//! upstream token endpoint. Failures keep the upstream status and body so
//! callers can see exactly what the provider rejected.

use crate::config::ClientCredentials;
use crate::constants::*;
use crate::model::TokenGrant;
use crate::upstream::body_to_value;
use crate::{GatewayError, Result};
use serde_json::Value;
use std::time::Duration;

/// Which grant a request performs; decides the error variant on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    fn as_str(self) -> &'static str {
        match self {
            Grant::AuthorizationCode => GRANT_AUTHORIZATION_CODE,
            Grant::RefreshToken => GRANT_REFRESH_TOKEN,
        }
    }

    fn failure(self, status: Option<u16>, body: Option<Value>, message: String) -> GatewayError {
        match self {
            Grant::AuthorizationCode => GatewayError::TokenExchangeFailed {
                status,
                body,
                message,
            },
            Grant::RefreshToken => GatewayError::TokenRefreshFailed {
                status,
                body,
                message,
            },
        }
    }
}

/// Client for `POST {apiBaseUrl}/oauth/v1/token`
pub struct TokenEndpointClient {
    http_client: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
    timeout: Duration,
}

impl TokenEndpointClient {
    /// Create a token endpoint client
    pub fn new(
        api_base_url: &str,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        // Disable redirects to prevent authorization code interception
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GatewayError::config(format!("Failed to build HTTP client for OAuth: {}", e))
            })?;

        Ok(Self {
            http_client,
            token_url: format!("{}{}", api_base_url.trim_end_matches('/'), TOKEN_PATH),
            credentials,
            timeout,
        })
    }

    /// Exchange an authorization code for a token grant
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let form = [
            ("grant_type", Grant::AuthorizationCode.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("code", code),
        ];
        self.request_grant(Grant::AuthorizationCode, &form).await
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let form = [
            ("grant_type", Grant::RefreshToken.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.request_grant(Grant::RefreshToken, &form).await
    }

    async fn request_grant(&self, grant: Grant, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("token endpoint timed out after {:?}", self.timeout)
                } else {
                    format!("token endpoint unreachable: {}", e)
                };
                tracing::warn!(grant = grant.as_str(), "{}", message);
                grant.failure(None, None, message)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            grant.failure(
                Some(status.as_u16()),
                None,
                format!("failed to read token endpoint response: {}", e),
            )
        })?;

        if !status.is_success() {
            tracing::warn!(
                grant = grant.as_str(),
                status = status.as_u16(),
                "Token endpoint rejected the request"
            );
            return Err(grant.failure(
                Some(status.as_u16()),
                Some(body_to_value(text)),
                format!("token endpoint responded with HTTP {}", status.as_u16()),
            ));
        }

        serde_json::from_str::<TokenGrant>(&text).map_err(|e| {
            grant.failure(
                Some(status.as_u16()),
                Some(body_to_value(text.clone())),
                format!("failed to decode token response: {}", e),
            )
        })
    }
}
