//! Consent URL that starts the authorization code flow

use crate::config::Config;
use crate::constants::AUTHORIZE_PATH;
use crate::{GatewayError, Result};
use url::Url;

/// Builds the upstream consent URL; holds no token state
#[derive(Debug, Clone)]
pub struct AuthorizationEndpoint {
    auth_base_url: String,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
}

impl AuthorizationEndpoint {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auth_base_url: config.upstream.auth_base_url.clone(),
            client_id: config.oauth.client_id.clone(),
            redirect_uri: config.oauth.redirect_uri.clone(),
            scopes: config.oauth.scopes(),
        }
    }

    pub fn authorization_url(&self) -> Result<String> {
        authorization_url(
            &self.auth_base_url,
            self.client_id.as_deref(),
            self.redirect_uri.as_deref(),
            &self.scopes,
        )
    }
}

/// `{auth_base_url}/oauth/authorize?client_id=..&redirect_uri=..&scope=..`
///
/// Scopes are space-joined before encoding.
pub fn authorization_url(
    auth_base_url: &str,
    client_id: Option<&str>,
    redirect_uri: Option<&str>,
    scopes: &[String],
) -> Result<String> {
    let client_id = client_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GatewayError::misconfigured("client id is not set"))?;
    let redirect_uri = redirect_uri
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GatewayError::misconfigured("redirect URI is not set"))?;

    let base = format!("{}{}", auth_base_url.trim_end_matches('/'), AUTHORIZE_PATH);
    let mut url = Url::parse(&base).map_err(|e| {
        GatewayError::misconfigured(format!("invalid authorization base URL '{}': {}", base, e))
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "));

    Ok(url.into())
}
