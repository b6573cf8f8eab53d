//! In-process persistence for accounts, the tool catalog, and saved generations.
//!
//! Each collection is keyed by an auto-incrementing integer id starting at 1. Accounts live
//! behind their own lock so quota mutation for one account never waits on another.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::models::{Account, GenerationRecord, Tool};

pub type AccountId = i64;
pub type ToolId = i64;
pub type GenerationId = i64;

/// An account plus the number of generations currently reserved against its quota.
#[derive(Debug)]
pub struct AccountSlot {
    pub account: Account,
    pub in_flight: u32,
}

#[derive(Default)]
struct AccountTable {
    next_id: AccountId,
    by_id: HashMap<AccountId, Arc<Mutex<AccountSlot>>>,
    by_subject: HashMap<String, AccountId>,
}

#[derive(Default)]
pub(crate) struct GenerationTable {
    next_id: GenerationId,
    pub(crate) rows: BTreeMap<GenerationId, GenerationRecord>,
    last_created_at: Option<DateTime<Utc>>,
}

impl GenerationTable {
    pub(crate) fn allocate(&mut self, now: DateTime<Utc>) -> (GenerationId, DateTime<Utc>) {
        self.next_id += 1;
        let created_at = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(created_at);
        (self.next_id, created_at)
    }
}

pub struct Store {
    accounts: RwLock<AccountTable>,
    tools: Vec<Tool>,
    generations: RwLock<GenerationTable>,
}

impl Store {
    /// A fresh store with the tool catalog seeded.
    pub fn new() -> Self {
        Store {
            accounts: RwLock::new(AccountTable::default()),
            tools: Tool::catalog(),
            generations: RwLock::new(GenerationTable::default()),
        }
    }

    pub fn account_slot(&self, id: AccountId) -> Option<Arc<Mutex<AccountSlot>>> {
        self.accounts.read().by_id.get(&id).cloned()
    }

    pub fn account_id_for_subject(&self, subject: &str) -> Option<AccountId> {
        self.accounts.read().by_subject.get(subject).copied()
    }

    /// Insert an account for `subject` unless one already exists; returns the account id and
    /// whether it was created by this call.
    pub fn insert_account_if_absent(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> (AccountId, bool) {
        let mut table = self.accounts.write();
        if let Some(id) = table.by_subject.get(subject) {
            return (*id, false);
        }

        table.next_id += 1;
        let id = table.next_id;
        let account = Account::new(id, subject, now);
        table.by_id.insert(
            id,
            Arc::new(Mutex::new(AccountSlot {
                account,
                in_flight: 0,
            })),
        );
        table.by_subject.insert(subject.to_string(), id);
        (id, true)
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub(crate) fn generations(&self) -> &RwLock<GenerationTable> {
        &self.generations
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
