//! Configuration management for hubbridge
//!
//! Loads configuration from an optional `hubbridge.config.json` (or YAML)
//! file, then overlays environment variables. OAuth client credentials are
//! required: [`Config::validate`] refuses to hand back a config without them.

use crate::constants::*;
use crate::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Complete hubbridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// OAuth client registration with the upstream CRM
    #[serde(default)]
    pub oauth: OAuthClientConfig,

    /// Upstream endpoints and call limits
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// OAuth client credentials
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthClientConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Scopes requested on the consent page; defaults to the full operation set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

// Keep the client secret out of debug logs.
impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl OAuthClientConfig {
    /// Scopes to request, falling back to [`DEFAULT_SCOPES`]
    pub fn scopes(&self) -> Vec<String> {
        self.scopes
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect())
    }

    /// Validated credentials for talking to the token endpoint
    pub fn credentials(&self) -> Result<ClientCredentials> {
        Ok(ClientCredentials {
            client_id: required(&self.client_id, ENV_CLIENT_ID)?,
            client_secret: required(&self.client_secret, ENV_CLIENT_SECRET)?,
            redirect_uri: required(&self.redirect_uri, ENV_REDIRECT_URI)?,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::misconfigured(format!("{} is not set", name)))
}

/// Client credentials with every field present
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Upstream endpoints and call limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// CRM API base URL (token endpoint and objects)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Consent page base URL
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// Timeout applied to every upstream request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_auth_base_url() -> String {
    DEFAULT_AUTH_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_SECS
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_base_url: default_auth_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["https://app.example.com"])
    /// If not specified, defaults to localhost dev-server origins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

fn default_host() -> String {
    DEFAULT_HTTP_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level or filter directive (debug, info, hubbridge=trace, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Output format: "text" (default) or "json"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(CONFIG_FILE_NAME)
    }

    /// Load configuration from a specific path, then apply env overrides
    ///
    /// Supports both JSON and YAML formats based on file extension:
    /// - `.yaml` or `.yml` files are parsed as YAML
    /// - anything else is parsed as JSON
    ///
    /// A missing file is not an error; the defaults plus environment are used.
    /// The result is not validated here, call [`Config::validate`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse the file alone, without environment overrides
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match path.extension().and_then(|s| s.to_str()) {
                Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                    GatewayError::config(format!("Failed to parse YAML config: {}", e))
                })?,
                _ => serde_json::from_str(&content).map_err(|e| {
                    GatewayError::config(format!("Failed to parse JSON config: {}", e))
                })?,
            }
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        Ok(config)
    }

    /// Overlay environment variables on top of file values
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (the environment in production)
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_CLIENT_ID) {
            self.oauth.client_id = Some(v);
        }
        if let Some(v) = get(ENV_CLIENT_SECRET) {
            self.oauth.client_secret = Some(v);
        }
        if let Some(v) = get(ENV_REDIRECT_URI) {
            self.oauth.redirect_uri = Some(v);
        }
        if let Some(v) = get(ENV_API_BASE_URL) {
            self.upstream.api_base_url = v;
        }
        if let Some(v) = get(ENV_AUTH_BASE_URL) {
            self.upstream.auth_base_url = v;
        }
        if let Some(v) = get(ENV_HOST) {
            self.http.host = v;
        }
        if let Some(v) = get(ENV_PORT) {
            match v.trim().parse::<u16>() {
                Ok(port) => self.http.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", ENV_PORT, v),
            }
        }
        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log.level = Some(v);
        }
    }

    /// Validate configuration
    ///
    /// Missing OAuth credentials are a [`GatewayError::MisconfiguredClient`];
    /// everything else is a [`GatewayError::Config`].
    pub fn validate(&self) -> Result<()> {
        self.oauth.credentials()?;

        if self.http.port == 0 {
            return Err(GatewayError::config("http.port must be nonzero (1-65535)"));
        }
        if self.http.host.is_empty() {
            return Err(GatewayError::config("http.host cannot be empty"));
        }
        if let Some(ref origins) = self.http.allowed_origins
            && origins.iter().any(|o| o.is_empty())
        {
            return Err(GatewayError::config(
                "http.allowedOrigins cannot contain empty strings",
            ));
        }

        for (name, value) in [
            ("upstream.apiBaseUrl", &self.upstream.api_base_url),
            ("upstream.authBaseUrl", &self.upstream.auth_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| GatewayError::config(format!("{} is invalid: {}", name, e)))?;
        }

        if self.upstream.timeout_secs == 0 {
            return Err(GatewayError::config("upstream.timeoutSecs must be nonzero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod config_test;
