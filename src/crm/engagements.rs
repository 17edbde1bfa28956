//! Payloads for the v1 engagements endpoint
//!
//! Every engagement has the same envelope:
//! `{engagement: {active, type, timestamp}, associations: {contactIds,
//! companyIds, dealIds}, metadata}`. The three association lists are always
//! present, possibly empty.

use crate::model::{EmailInput, MeetingInput, NoteInput, TaskInput, Timestamp};
use crate::{GatewayError, Result};
use serde_json::{Map, Value, json};

const MEETING_STATUS_SCHEDULED: &str = "SCHEDULED";
const TASK_STATUS_DEFAULT: &str = "NOT_STARTED";
const TASK_FOR_OBJECT_TYPE: &str = "OWNER";

/// Engagement kinds accepted upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    Meeting,
    Task,
    Note,
    Email,
}

impl EngagementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementKind::Meeting => "MEETING",
            EngagementKind::Task => "TASK",
            EngagementKind::Note => "NOTE",
            EngagementKind::Email => "EMAIL",
        }
    }
}

/// Drop absent and blank IDs, keep order
fn collect_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Option<String>>,
{
    ids.into_iter()
        .flatten()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn envelope(
    kind: EngagementKind,
    timestamp: i64,
    contact_ids: Vec<String>,
    company_ids: Vec<String>,
    deal_ids: Vec<String>,
    metadata: Map<String, Value>,
) -> Value {
    json!({
        "engagement": {
            "active": true,
            "type": kind.as_str(),
            "timestamp": timestamp
        },
        "associations": {
            "contactIds": contact_ids,
            "companyIds": company_ids,
            "dealIds": deal_ids
        },
        "metadata": metadata
    })
}

fn required_time(value: Option<&Timestamp>, field: &str) -> Result<i64> {
    value
        .ok_or_else(|| GatewayError::validation(format!("{} is required", field)))?
        .to_epoch_millis()
}

/// Meeting between a buyer and a seller, optionally tied to a deal
pub fn meeting_payload(input: &MeetingInput, now_ms: i64) -> Result<Value> {
    let start_time = required_time(input.start_time.as_ref(), "startTime")?;
    let end_time = required_time(input.end_time.as_ref(), "endTime")?;
    if end_time < start_time {
        return Err(GatewayError::validation("endTime is before startTime"));
    }

    let mut metadata = Map::new();
    metadata.insert("title".into(), json!(input.title.trim()));
    if let Some(description) = &input.description {
        metadata.insert("body".into(), json!(description));
    }
    metadata.insert("startTime".into(), json!(start_time));
    metadata.insert("endTime".into(), json!(end_time));
    metadata.insert("status".into(), json!(MEETING_STATUS_SCHEDULED));

    Ok(envelope(
        EngagementKind::Meeting,
        now_ms,
        collect_ids([&input.buyer_contact_id, &input.seller_contact_id]),
        collect_ids([&input.buyer_company_id, &input.seller_company_id]),
        collect_ids([&input.deal_id]),
        metadata,
    ))
}

pub fn task_payload(input: &TaskInput, now_ms: i64) -> Result<Value> {
    let timestamp = match &input.due_date {
        Some(due) => due.to_epoch_millis()?,
        None => now_ms,
    };

    let mut metadata = Map::new();
    metadata.insert("subject".into(), json!(input.subject.trim()));
    if let Some(body) = &input.body {
        metadata.insert("body".into(), json!(body));
    }
    metadata.insert(
        "status".into(),
        json!(input.status.as_deref().unwrap_or(TASK_STATUS_DEFAULT)),
    );
    metadata.insert("forObjectType".into(), json!(TASK_FOR_OBJECT_TYPE));

    Ok(envelope(
        EngagementKind::Task,
        timestamp,
        collect_ids(&input.contact_ids),
        collect_ids(&input.company_ids),
        collect_ids(&input.deal_ids),
        metadata,
    ))
}

pub fn note_payload(input: &NoteInput, now_ms: i64) -> Value {
    let body = match &input.title {
        Some(title) => format!("{}\n\n{}", title, input.body),
        None => input.body.clone(),
    };

    let mut metadata = Map::new();
    metadata.insert("body".into(), json!(body));

    envelope(
        EngagementKind::Note,
        now_ms,
        collect_ids(&input.contact_ids),
        collect_ids(&input.company_ids),
        collect_ids(&input.deal_ids),
        metadata,
    )
}

pub fn email_payload(input: &EmailInput, now_ms: i64) -> Value {
    let mut metadata = Map::new();
    metadata.insert("subject".into(), json!(input.subject.trim()));
    if let Some(text) = &input.text {
        metadata.insert("text".into(), json!(text));
    }
    if let Some(html) = &input.html {
        metadata.insert("html".into(), json!(html));
    }
    if let Some(from) = &input.from {
        metadata.insert("from".into(), json!({ "email": from }));
    }
    let to: Vec<Value> = input.to.iter().map(|email| json!({ "email": email })).collect();
    metadata.insert("to".into(), Value::Array(to));

    envelope(
        EngagementKind::Email,
        now_ms,
        collect_ids(&input.contact_ids),
        collect_ids(&input.company_ids),
        collect_ids(&input.deal_ids),
        metadata,
    )
}
