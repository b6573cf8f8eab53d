use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::store::{AccountId, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: AccountId,
    /// Identity-provider user id this account belongs to.
    pub subject: String,
    pub premium: bool,
    /// Generations since the last reset; only meaningful for the calendar day of
    /// `last_generated_at`.
    pub daily_generations: u32,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId, subject: &str, now: DateTime<Utc>) -> Self {
        Account {
            id,
            subject: subject.to_string(),
            premium: false,
            daily_generations: 0,
            last_generated_at: None,
            created_at: now,
        }
    }

    pub fn get(store: &Store, id: AccountId) -> Result<Self, AppError> {
        let slot = store.account_slot(id).ok_or(AppError::NotFound("account"))?;
        let account = slot.lock().account.clone();
        Ok(account)
    }

    /// Look up the account for an authenticated subject, registering it on first sight.
    pub fn get_or_create(
        store: &Store,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        if let Some(id) = store.account_id_for_subject(subject) {
            return Account::get(store, id);
        }

        let (id, created) = store.insert_account_if_absent(subject, now);
        if created {
            info!(account_id = id, "Registered new account");
        }
        Account::get(store, id)
    }

    /// One-way upgrade to premium. Idempotent.
    pub fn upgrade(store: &Store, id: AccountId) -> Result<Self, AppError> {
        let slot = store.account_slot(id).ok_or(AppError::NotFound("account"))?;
        let mut slot = slot.lock();
        if !slot.account.premium {
            slot.account.premium = true;
            info!(account_id = id, "Account upgraded to premium");
        }
        Ok(slot.account.clone())
    }
}
