//! CRM operations exposed by the gateway
//!
//! Each operation validates and shapes its input first, then asks the
//! [`TokenBroker`] for a valid token and forwards the payload upstream. The
//! upstream response body is returned unchanged.

pub mod engagements;
pub mod objects;

use crate::Result;
use crate::auth::TokenBroker;
use crate::constants::{COMPANIES_PATH, CONTACTS_PATH, DEALS_PATH, ENGAGEMENTS_PATH};
use crate::model::{
    CompanyInput, ContactInput, DealInput, EmailInput, MeetingInput, NoteInput, TaskInput,
};
use crate::upstream::UpstreamClient;
use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub struct CrmGateway {
    broker: Arc<TokenBroker>,
    upstream: UpstreamClient,
}

impl CrmGateway {
    pub fn new(broker: Arc<TokenBroker>, upstream: UpstreamClient) -> Self {
        Self { broker, upstream }
    }

    pub async fn create_contact(&self, input: ContactInput) -> Result<Value> {
        input.validate()?;
        let body = objects::contact_payload(&input);
        self.post("create_contact", CONTACTS_PATH, &body).await
    }

    pub async fn create_company(&self, input: CompanyInput) -> Result<Value> {
        input.validate()?;
        let body = objects::company_payload(&input);
        self.post("create_company", COMPANIES_PATH, &body).await
    }

    pub async fn create_deal(&self, input: DealInput) -> Result<Value> {
        input.validate()?;
        let body = objects::deal_payload(&input)?;
        self.post("create_deal", DEALS_PATH, &body).await
    }

    pub async fn store_meeting(&self, input: MeetingInput) -> Result<Value> {
        input.validate()?;
        let body = engagements::meeting_payload(&input, now_millis())?;
        self.post("store_meeting", ENGAGEMENTS_PATH, &body).await
    }

    pub async fn create_task(&self, input: TaskInput) -> Result<Value> {
        input.validate()?;
        let body = engagements::task_payload(&input, now_millis())?;
        self.post("create_task", ENGAGEMENTS_PATH, &body).await
    }

    pub async fn create_note(&self, input: NoteInput) -> Result<Value> {
        input.validate()?;
        let body = engagements::note_payload(&input, now_millis());
        self.post("create_note", ENGAGEMENTS_PATH, &body).await
    }

    pub async fn create_email(&self, input: EmailInput) -> Result<Value> {
        input.validate()?;
        input.validate_recipients()?;
        let body = engagements::email_payload(&input, now_millis());
        self.post("create_email", ENGAGEMENTS_PATH, &body).await
    }

    async fn post(&self, operation: &str, path: &str, body: &Value) -> Result<Value> {
        let token = self.broker.get_valid_token().await?;
        tracing::debug!(operation, path, "Forwarding CRM request");
        self.upstream
            .call(operation, Method::POST, path, &token, Some(body))
            .await
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
