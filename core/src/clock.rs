//! Ledger clock, the source of "today".
//!
//! `record_repayment` decides completion against today's balance, so the
//! ledger never reads the wall clock directly. Tests pin the date with
//! `FixedClock`.

use chrono::NaiveDate;
use std::sync::{Arc, RwLock};

pub trait LedgerClock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl LedgerClock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to a date. Clones share the same date, so a test can
/// hand one clone to the ledger and move time forward with the other.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<RwLock<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date: Arc::new(RwLock::new(date)) }
    }

    pub fn set(&self, date: NaiveDate) {
        // A poisoned lock still holds a valid date.
        let mut guard = self.date.write().unwrap_or_else(|e| e.into_inner());
        *guard = date;
    }

    pub fn advance_days(&self, days: i64) {
        let next = self.today() + chrono::Duration::days(days);
        self.set(next);
    }
}

impl LedgerClock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(|e| e.into_inner())
    }
}
