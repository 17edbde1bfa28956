//! OAuth 2.0 token lifecycle for the connected account
//!
//! `TokenBroker` owns the state machine Unauthenticated → Valid ⇄ Expired.
//! Refresh is lazy and single-flight: callers that find the token expired
//! while a refresh is already running await that same refresh and receive its
//! outcome, success or failure.

use super::client::TokenEndpointClient;
use super::store::TokenStore;
use crate::model::{TokenRecord, TokenState};
use crate::{GatewayError, Result, telemetry};
use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::sync::Arc;

type SharedRefresh = Shared<BoxFuture<'static, Result<TokenRecord>>>;

#[derive(Default)]
struct RefreshSlot {
    /// Bumped for every refresh started; lets a finished refresh tell whether
    /// the pending entry is still its own
    generation: u64,
    pending: Option<SharedRefresh>,
}

/// Result of a successful authorization code exchange
#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub record: TokenRecord,
    /// Lifetime reported by the token endpoint, in seconds
    pub expires_in: i64,
}

pub struct TokenBroker {
    store: TokenStore,
    endpoint: Arc<TokenEndpointClient>,
    refresh_slot: Arc<Mutex<RefreshSlot>>,
}

impl TokenBroker {
    pub fn new(endpoint: TokenEndpointClient) -> Self {
        Self::with_store(TokenStore::new(), endpoint)
    }

    /// Build a broker over an existing store
    pub fn with_store(store: TokenStore, endpoint: TokenEndpointClient) -> Self {
        Self {
            store,
            endpoint: Arc::new(endpoint),
            refresh_slot: Arc::new(Mutex::new(RefreshSlot::default())),
        }
    }

    /// Exchange an authorization code and install the resulting record
    ///
    /// On failure the store is left untouched.
    pub async fn exchange_code(&self, code: &str) -> Result<CodeExchange> {
        let grant = match self.endpoint.exchange_code(code).await {
            Ok(grant) => grant,
            Err(e) => {
                telemetry::record_token_exchange(false);
                return Err(e);
            }
        };

        let record = TokenRecord::from_grant(&grant, None, Utc::now()).map_err(|reason| {
            telemetry::record_token_exchange(false);
            GatewayError::TokenExchangeFailed {
                status: None,
                body: None,
                message: reason.to_string(),
            }
        })?;

        self.store.set(record.clone());
        telemetry::record_token_exchange(true);
        tracing::info!(expires_at = %record.expires_at, "Connected account authorized");

        Ok(CodeExchange {
            record,
            expires_in: grant.expires_in,
        })
    }

    /// Return an access token that is valid right now
    ///
    /// Uses the cached token while it is valid and refreshes it otherwise.
    pub async fn get_valid_token(&self) -> Result<String> {
        let record = self.store.get().ok_or(GatewayError::NotAuthenticated)?;
        if !record.is_expired() {
            return Ok(record.access_token);
        }

        tracing::debug!(expired_at = %record.expires_at, "Access token expired, refreshing");
        let refreshed = self.refresh(false).await?;
        Ok(refreshed.access_token)
    }

    /// Refresh regardless of expiry
    ///
    /// Joins a refresh that is already in flight instead of starting another.
    pub async fn force_refresh(&self) -> Result<TokenRecord> {
        self.refresh(true).await
    }

    pub fn state(&self) -> TokenState {
        match self.store.get() {
            None => TokenState::Unauthenticated,
            Some(record) if record.is_expired() => TokenState::Expired,
            Some(_) => TokenState::Valid,
        }
    }

    /// Snapshot of the installed record
    pub fn current_record(&self) -> Option<TokenRecord> {
        self.store.get()
    }

    async fn refresh(&self, force: bool) -> Result<TokenRecord> {
        let pending = {
            let mut slot = self.refresh_slot.lock();
            if let Some(pending) = slot.pending.clone() {
                pending
            } else {
                // Re-check under the lock: a refresh may have completed
                // between the caller's read and now
                let current = self.store.get().ok_or(GatewayError::NotAuthenticated)?;
                if !force && !current.is_expired() {
                    return Ok(current);
                }

                slot.generation += 1;
                let generation = slot.generation;

                // The grant runs in its own task so it completes and installs
                // even when every waiter has been dropped
                let task = tokio::spawn(refresh_task(
                    self.store.clone(),
                    Arc::clone(&self.endpoint),
                    current,
                    Arc::clone(&self.refresh_slot),
                    generation,
                ));
                let refresh_slot = Arc::clone(&self.refresh_slot);
                let pending = async move {
                    task.await.unwrap_or_else(|e| {
                        release_slot(&refresh_slot, generation);
                        telemetry::record_token_refresh(false);
                        Err(GatewayError::TokenRefreshFailed {
                            status: None,
                            body: None,
                            message: format!("refresh task aborted: {}", e),
                        })
                    })
                }
                .boxed()
                .shared();

                slot.pending = Some(pending.clone());
                pending
            }
        };

        pending.await
    }
}

/// Clear the in-flight entry if it still belongs to `generation`
fn release_slot(refresh_slot: &Mutex<RefreshSlot>, generation: u64) {
    let mut slot = refresh_slot.lock();
    if slot.generation == generation {
        slot.pending = None;
    }
}

async fn refresh_task(
    store: TokenStore,
    endpoint: Arc<TokenEndpointClient>,
    current: TokenRecord,
    refresh_slot: Arc<Mutex<RefreshSlot>>,
    generation: u64,
) -> Result<TokenRecord> {
    let outcome = refresh_record(store, endpoint, current).await;
    release_slot(&refresh_slot, generation);
    outcome
}

/// One refresh grant; installs the new record unless the account was
/// re-authorized while the grant was in flight
async fn refresh_record(
    store: TokenStore,
    endpoint: Arc<TokenEndpointClient>,
    current: TokenRecord,
) -> Result<TokenRecord> {
    let grant = match endpoint.refresh(&current.refresh_token).await {
        Ok(grant) => grant,
        Err(e) => {
            telemetry::record_token_refresh(false);
            tracing::warn!(status = e.upstream_status(), "Token refresh failed: {}", e);
            return Err(e);
        }
    };

    let record = TokenRecord::from_grant(&grant, Some(&current.refresh_token), Utc::now())
        .map_err(|reason| {
            telemetry::record_token_refresh(false);
            tracing::warn!("Token refresh rejected: {}", reason);
            GatewayError::TokenRefreshFailed {
                status: None,
                body: None,
                message: reason.to_string(),
            }
        })?;

    let installed = store.replace_if_current(&current.refresh_token, record);
    telemetry::record_token_refresh(true);
    tracing::info!(expires_at = %installed.expires_at, "Access token refreshed");

    Ok(installed)
}
