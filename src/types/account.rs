use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Account;
use crate::quota::QuotaPolicy;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub account: Account,
    pub daily_limit: u32,
    pub generations_today: u32,
    /// Whether a generation requested now would pass the quota check.
    pub can_generate: bool,
    /// `null` for premium accounts.
    pub remaining_generations: Option<u32>,
}

impl AccountResponse {
    pub fn new(account: Account, policy: &QuotaPolicy, now: DateTime<Utc>) -> Self {
        AccountResponse {
            daily_limit: policy.daily_limit(),
            generations_today: policy.generations_today(&account, now),
            can_generate: policy.check_allowed(&account, now),
            remaining_generations: policy.remaining(&account, now),
            account,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpgradeResponse {
    pub message: String,
    pub account: Account,
}
