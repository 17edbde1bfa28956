use super::*;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn configured() -> Config {
    let mut config = Config::default();
    config.apply_env_with(lookup(&[
        (ENV_CLIENT_ID, "client-123"),
        (ENV_CLIENT_SECRET, "secret-456"),
        (ENV_REDIRECT_URI, "http://localhost:3000/integrations/hubspot/oauth2callback"),
    ]));
    config
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.http.port, 3000);
    assert_eq!(config.upstream.api_base_url, "https://api.hubapi.com");
    assert_eq!(config.upstream.timeout_secs, 30);
    assert!(config.oauth.client_id.is_none());
}

#[test]
fn test_missing_credentials_are_misconfigured() {
    let err = Config::default().validate().unwrap_err();
    assert!(matches!(err, GatewayError::MisconfiguredClient(_)));
    assert!(err.to_string().contains("HUBSPOT_CLIENT_ID"));
}

#[test]
fn test_missing_secret_is_misconfigured() {
    let mut config = configured();
    config.oauth.client_secret = None;
    let err = config.validate().unwrap_err();
    assert!(matches!(err, GatewayError::MisconfiguredClient(_)));
    assert!(err.to_string().contains("HUBSPOT_CLIENT_SECRET"));
}

#[test]
fn test_blank_redirect_uri_is_misconfigured() {
    let mut config = configured();
    config.oauth.redirect_uri = Some("   ".to_string());
    assert!(matches!(
        config.validate(),
        Err(GatewayError::MisconfiguredClient(_))
    ));
}

#[test]
fn test_env_overlay() {
    let mut config = Config::default();
    config.apply_env_with(lookup(&[
        (ENV_CLIENT_ID, "abc"),
        (ENV_PORT, "8088"),
        (ENV_API_BASE_URL, "http://127.0.0.1:9999"),
        (ENV_LOG_LEVEL, "debug"),
    ]));

    assert_eq!(config.oauth.client_id.as_deref(), Some("abc"));
    assert_eq!(config.http.port, 8088);
    assert_eq!(config.upstream.api_base_url, "http://127.0.0.1:9999");
    assert_eq!(config.log.level.as_deref(), Some("debug"));
}

#[test]
fn test_invalid_port_env_is_ignored() {
    let mut config = Config::default();
    config.apply_env_with(lookup(&[(ENV_PORT, "not-a-port")]));
    assert_eq!(config.http.port, 3000);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = configured();
    assert!(config.validate().is_ok());

    config.http.port = 0;
    assert!(matches!(config.validate(), Err(GatewayError::Config(_))));

    let mut config = configured();
    config.upstream.api_base_url = "not a url".to_string();
    assert!(matches!(config.validate(), Err(GatewayError::Config(_))));

    let mut config = configured();
    config.upstream.timeout_secs = 0;
    assert!(matches!(config.validate(), Err(GatewayError::Config(_))));
}

#[test]
fn test_default_scopes() {
    let config = configured();
    let scopes = config.oauth.scopes();
    assert_eq!(scopes[0], "oauth");
    assert!(scopes.contains(&"crm.objects.deals.write".to_string()));
}

#[test]
fn test_debug_hides_secret() {
    let config = configured();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("secret-456"));
    assert!(debug.contains("client-123"));
}

#[test]
fn test_config_load_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("hubbridge.config.json");

    let config_content = r#"
{
    "oauth": {
        "clientId": "file-client",
        "clientSecret": "file-secret",
        "redirectUri": "http://localhost:3000/cb",
        "scopes": ["oauth", "crm.objects.contacts.write"]
    },
    "upstream": {
        "timeoutSecs": 5
    },
    "http": {
        "host": "0.0.0.0",
        "port": 3100
    }
}
"#;

    fs::write(&config_path, config_content).unwrap();
    let config = Config::load_file(&config_path).unwrap();

    assert_eq!(config.oauth.client_id.as_deref(), Some("file-client"));
    assert_eq!(config.upstream.timeout_secs, 5);
    assert_eq!(config.upstream.api_base_url, "https://api.hubapi.com");
    assert_eq!(config.http.port, 3100);
    assert_eq!(config.oauth.scopes().len(), 2);
}

#[test]
fn test_config_load_from_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("hubbridge.yaml");

    let config_content = r#"
oauth:
  clientId: yaml-client
  clientSecret: yaml-secret
  redirectUri: http://localhost:3000/cb
log:
  level: debug
  format: json
"#;

    fs::write(&config_path, config_content).unwrap();
    let config = Config::load_file(&config_path).unwrap();

    assert_eq!(config.oauth.client_id.as_deref(), Some("yaml-client"));
    assert_eq!(config.log.format.as_deref(), Some("json"));
}

#[test]
fn test_config_load_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("broken.json");
    fs::write(&config_path, "{ not json").unwrap();

    let err = Config::load_file(&config_path).unwrap_err();
    assert!(matches!(err, GatewayError::Config(_)));
}
