//! Core data structures for hubbridge
//!
//! Token lifecycle types plus the typed request bodies accepted for each CRM
//! operation. Request bodies reject unknown fields; the shaping into upstream
//! payloads lives in [`crate::crm`].

use crate::{GatewayError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidateEmail};

// ============================================================================
// TOKENS
// ============================================================================

/// The connected account's credentials
///
/// Always fully populated; replaced wholesale on refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Bearer credential for CRM API calls
    pub access_token: String,

    /// Credential used to mint a new access token
    pub refresh_token: String,

    /// Instant after which `access_token` must not be used
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenRecord {
    /// Build a record from a token endpoint grant received at `now`
    ///
    /// `current_refresh` is the refresh token already held, reused when the
    /// server does not rotate it. Without either, the grant is rejected.
    pub fn from_grant(
        grant: &TokenGrant,
        current_refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, &'static str> {
        if grant.access_token.trim().is_empty() {
            return Err("token endpoint returned an empty access_token");
        }

        let refresh_token = grant
            .refresh_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(current_refresh)
            .ok_or("token endpoint returned no refresh_token")?;

        Ok(Self {
            access_token: grant.access_token.clone(),
            refresh_token: refresh_token.to_string(),
            expires_at: expiry_from(now, grant.expires_in)
                .ok_or("token endpoint returned an out-of-range expires_in")?,
        })
    }

    /// True once `now` has reached `expires_at`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// `now + expires_in` seconds, converted to milliseconds exactly once
///
/// `None` when the lifetime does not fit a timestamp.
pub fn expiry_from(now: DateTime<Utc>, expires_in_secs: i64) -> Option<DateTime<Utc>> {
    let millis = expires_in_secs.max(0).checked_mul(1000)?;
    now.checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// Token endpoint JSON response
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Logical state of the token lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Unauthenticated,
    Valid,
    Expired,
}

// ============================================================================
// CRM OBJECT INPUTS
// ============================================================================

/// Body of `POST /create-contact`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactInput {
    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 256))]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 256))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(email)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 64))]
    pub phone: Option<String>,
}

/// Body of `POST /create-company`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyInput {
    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 256))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 256))]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(max = 64))]
    pub phone: Option<String>,
}

/// Body of `POST /create-deal`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DealInput {
    #[validate(length(min = 1, max = 256))]
    pub deal_name: String,

    #[serde(default, deserialize_with = "optional_amount")]
    pub amount: Option<Amount>,

    #[serde(default, deserialize_with = "non_blank")]
    pub deal_stage: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    pub pipeline: Option<String>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub close_date: Option<Timestamp>,

    #[serde(default, deserialize_with = "optional_id")]
    pub contact_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub company_id: Option<String>,
}

/// A monetary amount given as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    /// Decimal string form sent upstream
    pub fn normalize(&self) -> Result<String> {
        match self {
            Amount::Number(n) => Ok(n.to_string()),
            Amount::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(trimmed.to_string()),
                    _ => Err(GatewayError::validation(format!(
                        "amount must be numeric, got '{}'",
                        s
                    ))),
                }
            }
        }
    }
}

/// A point in time given as epoch milliseconds or a date string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl Timestamp {
    /// Epoch milliseconds
    ///
    /// Text accepts a numeric string, RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`
    /// (read as UTC) or `YYYY-MM-DD` (UTC midnight).
    pub fn to_epoch_millis(&self) -> Result<i64> {
        let text = match self {
            Timestamp::Millis(ms) => return Ok(*ms),
            Timestamp::Text(s) => s.trim(),
        };

        if let Ok(ms) = text.parse::<i64>() {
            return Ok(ms);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.timestamp_millis());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            && let Some(naive) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
        }

        Err(GatewayError::validation(format!(
            "unrecognized timestamp '{}'",
            text
        )))
    }
}

// ============================================================================
// ENGAGEMENT INPUTS
// ============================================================================

/// Body of `POST /store-meeting`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MeetingInput {
    #[validate(length(min = 1, max = 512))]
    pub title: String,

    #[serde(default, deserialize_with = "non_blank")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub start_time: Option<Timestamp>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub end_time: Option<Timestamp>,

    #[serde(default, deserialize_with = "optional_id")]
    pub buyer_contact_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub seller_contact_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub buyer_company_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub seller_company_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub deal_id: Option<String>,
}

/// Body of `POST /batch/create-tasks`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 512))]
    pub subject: String,

    #[serde(default, deserialize_with = "non_blank")]
    pub body: Option<String>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub due_date: Option<Timestamp>,

    /// NOT_STARTED, IN_PROGRESS, WAITING, COMPLETED or DEFERRED
    #[serde(default, deserialize_with = "non_blank")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "id_list")]
    pub contact_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub company_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub deal_ids: Vec<Option<String>>,
}

/// Body of `POST /batch/create-note`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NoteInput {
    #[serde(default, deserialize_with = "non_blank")]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub body: String,

    #[serde(default, deserialize_with = "id_list")]
    pub contact_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub company_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub deal_ids: Vec<Option<String>>,
}

/// Body of `POST /batch/create-emails`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmailInput {
    #[validate(length(min = 1, max = 998))]
    pub subject: String,

    #[serde(default, deserialize_with = "non_blank")]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    pub html: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    #[validate(email)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default, deserialize_with = "id_list")]
    pub contact_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub company_ids: Vec<Option<String>>,

    #[serde(default, deserialize_with = "id_list")]
    pub deal_ids: Vec<Option<String>>,
}

impl EmailInput {
    /// Recipient addresses must look like email addresses
    pub fn validate_recipients(&self) -> Result<()> {
        for to in &self.to {
            if !to.validate_email() {
                return Err(GatewayError::validation(format!(
                    "to: '{}' is not an email address",
                    to
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// DESERIALIZATION HELPERS
// ============================================================================

/// Blank strings are treated as absent (HTML forms submit "" for empty inputs)
fn non_blank<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn optional_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Amount>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Amount>::deserialize(deserializer)?;
    Ok(value.filter(|a| !matches!(a, Amount::Text(s) if s.trim().is_empty())))
}

fn optional_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Timestamp>::deserialize(deserializer)?;
    Ok(value.filter(|t| !matches!(t, Timestamp::Text(s) if s.trim().is_empty())))
}

/// Record IDs arrive as strings from v3 responses and as numbers from v1
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_id(self) -> Option<String> {
        match self {
            RawId::Text(s) if s.trim().is_empty() => None,
            RawId::Text(s) => Some(s.trim().to_string()),
            RawId::Number(n) => Some(n.to_string()),
        }
    }
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<RawId>::deserialize(deserializer)?;
    Ok(value.and_then(RawId::into_id))
}

fn id_list<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Option<RawId>>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.and_then(RawId::into_id))
        .collect())
}
