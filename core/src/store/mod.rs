//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The ledger calls store methods and never executes SQL directly.

use crate::{
    error::LedgerResult,
    event::EventLogEntry,
};
use chrono::NaiveDate;
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
    Connection, OptionalExtension, Transaction, TransactionBehavior,
};
use rust_decimal::Decimal;
use std::str::FromStr;

mod loan;
mod member;
mod repayment;

pub struct LedgerStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LedgerStore {
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // A second writer waits for the lock instead of failing at once.
        // Set before the journal switch, which itself needs the lock.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> LedgerResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_event_log.sql"))?;
        Ok(())
    }

    /// Start a write transaction that holds the database write lock from
    /// the first statement. Every store call made on this store before the
    /// guard is committed runs inside it; dropping the guard rolls back.
    pub fn begin_immediate(&self) -> LedgerResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO ledger_event (subject_id, event_type, recorded_on, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.subject_id,
                entry.event_type,
                entry.recorded_on,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_subject(&self, subject_id: &str) -> LedgerResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_id, event_type, recorded_on, payload
             FROM ledger_event WHERE subject_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![subject_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    subject_id: row.get(1)?,
                    event_type: row.get(2)?,
                    recorded_on: row.get::<_, NaiveDate>(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Date the loan was marked completed, from its `loan_completed` event.
    pub fn completion_date(&self, loan_id: &str) -> LedgerResult<Option<NaiveDate>> {
        let date = self
            .conn
            .query_row(
                "SELECT recorded_on FROM ledger_event
                 WHERE subject_id = ?1 AND event_type = 'loan_completed'
                 ORDER BY id ASC LIMIT 1",
                params![loan_id],
                |row| row.get::<_, NaiveDate>(0),
            )
            .optional()?;
        Ok(date)
    }

    pub fn event_count(&self, event_type: &str) -> LedgerResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM ledger_event WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ── Column helpers ─────────────────────────────────────────────

/// Read a decimal amount stored as text.
fn amount_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Canonical text form of an amount for storage.
fn amount_text(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Closed enums are stored by name and parsed back on read. An
/// unrecognised name in the table fails the read rather than being
/// guessed at.
macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse::<$ty>()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(crate::loan::LoanCategory);
text_enum_sql!(crate::loan::LoanStatus);
text_enum_sql!(crate::member::MemberStatus);
