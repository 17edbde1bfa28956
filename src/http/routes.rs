//! Handlers for the `/integrations/hubspot` routes

use super::extract::Payload;
use super::{AppError, AppState};
use crate::GatewayError;
use crate::constants::*;
use crate::model::{
    CompanyInput, ContactInput, DealInput, EmailInput, MeetingInput, NoteInput, TaskInput,
    TokenRecord,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

type HandlerResult<T> = std::result::Result<T, AppError>;

pub fn integration_routes() -> Router<AppState> {
    Router::new()
        .route(ROUTE_AUTHORIZE, get(authorize_handler))
        .route(ROUTE_CALLBACK, get(callback_handler))
        .route(ROUTE_FORCE_REFRESH, get(force_refresh_handler))
        .route(ROUTE_TOKEN_STATUS, get(token_status_handler))
        .route(ROUTE_CREATE_CONTACT, post(create_contact_handler))
        .route(ROUTE_CREATE_COMPANY, post(create_company_handler))
        .route(ROUTE_CREATE_DEAL, post(create_deal_handler))
        .route(ROUTE_STORE_MEETING, post(store_meeting_handler))
        .route(ROUTE_CREATE_TASKS, post(create_task_handler))
        .route(ROUTE_CREATE_NOTE, post(create_note_handler))
        .route(ROUTE_CREATE_EMAILS, post(create_email_handler))
}

// ============================================================================
// OAUTH
// ============================================================================

/// 302 to the consent page
async fn authorize_handler(State(state): State<AppState>) -> HandlerResult<Response> {
    let url = state.authorization.authorization_url()?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> HandlerResult<Json<Value>> {
    if let Some(error) = params.error.as_deref() {
        let detail = params.error_description.as_deref().unwrap_or(error);
        return Err(
            GatewayError::validation(format!("authorization was not granted: {}", detail)).into(),
        );
    }

    let code = params
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GatewayError::validation("missing authorization code"))?;

    let exchange = state.broker.exchange_code(code).await?;

    Ok(Json(json!({
        "accessToken": exchange.record.access_token,
        "refreshToken": exchange.record.refresh_token,
        "expiresIn": exchange.expires_in,
    })))
}

async fn force_refresh_handler(State(state): State<AppState>) -> HandlerResult<Json<TokenRecord>> {
    Ok(Json(state.broker.force_refresh().await?))
}

async fn token_status_handler(State(state): State<AppState>) -> Json<Value> {
    let token_state = state.broker.state();
    let mut body = json!({ "state": token_state });
    if let Some(record) = state.broker.current_record() {
        body["expiresAt"] = json!(record.expires_at.timestamp_millis());
    }
    Json(body)
}

// ============================================================================
// CRM
// ============================================================================

async fn create_contact_handler(
    State(state): State<AppState>,
    Payload(input): Payload<ContactInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_contact(input).await?))
}

async fn create_company_handler(
    State(state): State<AppState>,
    Payload(input): Payload<CompanyInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_company(input).await?))
}

async fn create_deal_handler(
    State(state): State<AppState>,
    Payload(input): Payload<DealInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_deal(input).await?))
}

async fn store_meeting_handler(
    State(state): State<AppState>,
    Payload(input): Payload<MeetingInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.store_meeting(input).await?))
}

async fn create_task_handler(
    State(state): State<AppState>,
    Payload(input): Payload<TaskInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_task(input).await?))
}

async fn create_note_handler(
    State(state): State<AppState>,
    Payload(input): Payload<NoteInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_note(input).await?))
}

async fn create_email_handler(
    State(state): State<AppState>,
    Payload(input): Payload<EmailInput>,
) -> HandlerResult<Json<Value>> {
    Ok(Json(state.crm.create_email(input).await?))
}
