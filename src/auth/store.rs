//! In-memory slot for the connected account's token record

use crate::model::TokenRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds zero or one [`TokenRecord`]
///
/// Cloning shares the same slot. Writes replace the whole record under the
/// lock, so readers observe either the previous or the next record.
#[derive(Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Option<TokenRecord>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record, if any
    pub fn get(&self) -> Option<TokenRecord> {
        self.slot.read().clone()
    }

    /// Replace the record
    pub fn set(&self, record: TokenRecord) {
        *self.slot.write() = Some(record);
    }

    /// Install a refreshed record only if the slot still holds the refresh
    /// token the refresh was performed with
    ///
    /// Returns whichever record is in the slot afterwards. A mismatch means
    /// the account was re-authorized while the refresh was in flight, and the
    /// newer authorization wins.
    pub fn replace_if_current(&self, used_refresh_token: &str, record: TokenRecord) -> TokenRecord {
        let mut slot = self.slot.write();
        match slot.as_ref() {
            Some(current) if current.refresh_token != used_refresh_token => current.clone(),
            _ => {
                *slot = Some(record.clone());
                record
            }
        }
    }
}
