//! Free-tier daily quota.
//!
//! [`QuotaPolicy`] holds the pure rules. [`QuotaTracker`] applies them to stored accounts under
//! each account's own lock. A generation first takes a [`QuotaReservation`] (check and hold one
//! slot atomically), runs the slow generator call with no lock held, then commits the reservation
//! on success or releases it on failure. Concurrent requests therefore can never spend more than
//! the remaining headroom.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::Account;
use crate::store::{AccountId, AccountSlot, Store};

pub const DEFAULT_DAILY_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    daily_limit: u32,
    /// Offset that defines where one calendar day ends and the next begins.
    day_offset: FixedOffset,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        QuotaPolicy::new(DEFAULT_DAILY_LIMIT, Utc.fix())
    }
}

impl QuotaPolicy {
    pub fn new(daily_limit: u32, day_offset: FixedOffset) -> Self {
        QuotaPolicy {
            daily_limit,
            day_offset,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    fn calendar_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.day_offset).date_naive()
    }

    /// Full year-month-day comparison in the policy's offset.
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.calendar_day(a) == self.calendar_day(b)
    }

    /// The account's count as of `now`: zero once the last generation is on an earlier day.
    pub fn generations_today(&self, account: &Account, now: DateTime<Utc>) -> u32 {
        match account.last_generated_at {
            Some(last) if self.same_day(last, now) => account.daily_generations,
            _ => 0,
        }
    }

    /// Pure read: premium accounts are always allowed, free accounts while under the limit.
    pub fn check_allowed(&self, account: &Account, now: DateTime<Utc>) -> bool {
        account.premium || self.generations_today(account, now) < self.daily_limit
    }

    /// `None` means unlimited.
    pub fn remaining(&self, account: &Account, now: DateTime<Utc>) -> Option<u32> {
        if account.premium {
            None
        } else {
            Some(
                self.daily_limit
                    .saturating_sub(self.generations_today(account, now)),
            )
        }
    }

    /// Count one successful generation at `now`, restarting the count on a new calendar day.
    pub fn record_generation(&self, mut account: Account, now: DateTime<Utc>) -> Account {
        account.daily_generations = match account.last_generated_at {
            Some(last) if self.same_day(last, now) => account.daily_generations.saturating_add(1),
            _ => 1,
        };
        account.last_generated_at = Some(now);
        account
    }

    fn has_headroom(&self, slot: &AccountSlot, now: DateTime<Utc>) -> bool {
        slot.account.premium
            || self
                .generations_today(&slot.account, now)
                .saturating_add(slot.in_flight)
                < self.daily_limit
    }
}

#[derive(Clone)]
pub struct QuotaTracker {
    store: Arc<Store>,
    policy: QuotaPolicy,
}

impl QuotaTracker {
    pub fn new(store: Arc<Store>, policy: QuotaPolicy) -> Self {
        QuotaTracker { store, policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    fn slot(&self, id: AccountId) -> Result<Arc<Mutex<AccountSlot>>, AppError> {
        self.store
            .account_slot(id)
            .ok_or(AppError::NotFound("account"))
    }

    #[cfg(test)]
    pub fn check_allowed(&self, id: AccountId, now: DateTime<Utc>) -> Result<bool, AppError> {
        let slot = self.slot(id)?;
        let allowed = self.policy.check_allowed(&slot.lock().account, now);
        Ok(allowed)
    }

    /// Atomically check quota and hold one generation slot for `id`.
    ///
    /// Fails with `QuotaExceeded` without mutating anything when the account has no headroom
    /// left after counting generations already in flight.
    pub fn reserve(&self, id: AccountId, now: DateTime<Utc>) -> Result<QuotaReservation, AppError> {
        let slot = self.slot(id)?;
        {
            let mut guard = slot.lock();
            if !self.policy.has_headroom(&guard, now) {
                info!(account_id = id, "Daily generation limit reached");
                return Err(AppError::QuotaExceeded {
                    limit: self.policy.daily_limit,
                });
            }
            guard.in_flight += 1;
        }

        debug!(account_id = id, "Quota slot reserved");
        Ok(QuotaReservation {
            account_id: id,
            slot,
            policy: self.policy,
            settled: false,
        })
    }

    /// Record a generation directly, outside the reserve/commit flow.
    #[cfg(test)]
    pub fn record_generation(
        &self,
        id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock();
        guard.account = self.policy.record_generation(guard.account.clone(), now);
        Ok(guard.account.clone())
    }

    pub fn upgrade(&self, id: AccountId) -> Result<Account, AppError> {
        Account::upgrade(&self.store, id)
    }
}

/// One held unit of quota. Dropping it without committing gives the unit back.
pub struct QuotaReservation {
    account_id: AccountId,
    slot: Arc<Mutex<AccountSlot>>,
    policy: QuotaPolicy,
    settled: bool,
}

impl QuotaReservation {
    #[cfg(test)]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Turn the held slot into a recorded generation.
    pub fn commit(mut self, now: DateTime<Utc>) -> Account {
        self.settled = true;
        let mut guard = self.slot.lock();
        guard.in_flight = guard.in_flight.saturating_sub(1);
        guard.account = self.policy.record_generation(guard.account.clone(), now);
        guard.account.clone()
    }

    pub fn release(mut self) {
        self.settled = true;
        self.give_back();
    }

    fn give_back(&self) {
        let mut guard = self.slot.lock();
        guard.in_flight = guard.in_flight.saturating_sub(1);
        debug!(account_id = self.account_id, "Quota slot released");
    }
}

impl Drop for QuotaReservation {
    fn drop(&mut self) {
        if !self.settled {
            self.give_back();
        }
    }
}
