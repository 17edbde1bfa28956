//! Constants used throughout hubbridge
//!
//! Upstream endpoints, inbound route paths, environment variable names and
//! defaults live here so the wire contract is readable in one place.

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "hubbridge.config.json";

/// Default HTTP port (matches the port the demo frontend targets)
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default bind host
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";

/// Default timeout for every upstream call, in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Default log filter when neither RUST_LOG nor config sets one
pub const DEFAULT_LOG_FILTER: &str = "hubbridge=info";

/// Environment variable: OAuth client id
pub const ENV_CLIENT_ID: &str = "HUBSPOT_CLIENT_ID";

/// Environment variable: OAuth client secret
pub const ENV_CLIENT_SECRET: &str = "HUBSPOT_CLIENT_SECRET";

/// Environment variable: OAuth redirect URI
pub const ENV_REDIRECT_URI: &str = "HUBSPOT_REDIRECT_URI";

/// Environment variable: CRM API base URL override
pub const ENV_API_BASE_URL: &str = "HUBSPOT_API_BASE_URL";

/// Environment variable: authorization page base URL override
pub const ENV_AUTH_BASE_URL: &str = "HUBSPOT_AUTH_BASE_URL";

/// Environment variable: bind host
pub const ENV_HOST: &str = "HUBBRIDGE_HOST";

/// Environment variable: bind port
pub const ENV_PORT: &str = "PORT";

/// Environment variable: log level
pub const ENV_LOG_LEVEL: &str = "HUBBRIDGE_LOG_LEVEL";

// ============================================================================
// UPSTREAM
// ============================================================================

/// CRM API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.hubapi.com";

/// Authorization (consent) page base URL
pub const DEFAULT_AUTH_BASE_URL: &str = "https://app.hubspot.com";

/// Consent page path
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Token endpoint path
pub const TOKEN_PATH: &str = "/oauth/v1/token";

/// Contacts object path
pub const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";

/// Companies object path
pub const COMPANIES_PATH: &str = "/crm/v3/objects/companies";

/// Deals object path
pub const DEALS_PATH: &str = "/crm/v3/objects/deals";

/// Engagements path (meetings, tasks, notes, emails)
pub const ENGAGEMENTS_PATH: &str = "/engagements/v1/engagements";

/// Scopes requested for the operation set exposed by the gateway
pub const DEFAULT_SCOPES: &[&str] = &[
    "oauth",
    "crm.objects.contacts.read",
    "crm.objects.contacts.write",
    "crm.objects.companies.read",
    "crm.objects.companies.write",
    "crm.objects.deals.read",
    "crm.objects.deals.write",
];

/// Grant type: authorization code
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";

/// Grant type: refresh token
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// HubSpot-defined association type: deal to contact
pub const ASSOC_DEAL_TO_CONTACT: u32 = 3;

/// HubSpot-defined association type: deal to company
pub const ASSOC_DEAL_TO_COMPANY: u32 = 5;

/// Association category for built-in association types
pub const ASSOC_CATEGORY_HUBSPOT_DEFINED: &str = "HUBSPOT_DEFINED";

// ============================================================================
// INBOUND ROUTES
// ============================================================================

/// Prefix all integration routes are nested under
pub const ROUTE_PREFIX: &str = "/integrations/hubspot";

pub const ROUTE_AUTHORIZE: &str = "/authorize";
pub const ROUTE_CALLBACK: &str = "/oauth2callback";
pub const ROUTE_FORCE_REFRESH: &str = "/force-refresh";
pub const ROUTE_TOKEN_STATUS: &str = "/token/status";
pub const ROUTE_CREATE_CONTACT: &str = "/create-contact";
pub const ROUTE_CREATE_COMPANY: &str = "/create-company";
pub const ROUTE_CREATE_DEAL: &str = "/create-deal";
pub const ROUTE_STORE_MEETING: &str = "/store-meeting";
pub const ROUTE_CREATE_TASKS: &str = "/batch/create-tasks";
pub const ROUTE_CREATE_NOTE: &str = "/batch/create-note";
pub const ROUTE_CREATE_EMAILS: &str = "/batch/create-emails";

// ============================================================================
// HTTP
// ============================================================================

/// Content-Type: application/json
pub const CONTENT_TYPE_JSON: &str = "application/json";
