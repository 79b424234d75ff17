//! Ledger audit events.
//!
//! RULE: Every state change writes exactly one event, inside the same
//! transaction as the change itself.

use crate::types::{Amount, EntityId, LoanId, MemberId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    MemberRegistered {
        member_id: MemberId,
        name: String,
    },
    MemberDeactivated {
        member_id: MemberId,
    },
    LoanOpened {
        loan_id: LoanId,
        member_id: MemberId,
        category: String,
        principal: Amount,
        interest_rate: Amount,
        start_date: NaiveDate,
        due_date: NaiveDate,
    },
    RepaymentRecorded {
        loan_id: LoanId,
        repayment_id: EntityId,
        amount: Amount,
        date: NaiveDate,
        balance_after: Amount,
    },
    LoanCompleted {
        loan_id: LoanId,
        completed_on: NaiveDate,
    },
}

impl LedgerEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            LedgerEvent::MemberRegistered { .. }  => "member_registered",
            LedgerEvent::MemberDeactivated { .. } => "member_deactivated",
            LedgerEvent::LoanOpened { .. }        => "loan_opened",
            LedgerEvent::RepaymentRecorded { .. } => "repayment_recorded",
            LedgerEvent::LoanCompleted { .. }     => "loan_completed",
        }
    }

    /// The record the event is about.
    pub fn subject_id(&self) -> &str {
        match self {
            LedgerEvent::MemberRegistered { member_id, .. }
            | LedgerEvent::MemberDeactivated { member_id } => member_id,
            LedgerEvent::LoanOpened { loan_id, .. }
            | LedgerEvent::RepaymentRecorded { loan_id, .. }
            | LedgerEvent::LoanCompleted { loan_id, .. } => loan_id,
        }
    }
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub subject_id: String,
    pub event_type: String,
    pub recorded_on: NaiveDate,
    pub payload: String,
}

impl EventLogEntry {
    pub fn new(event: &LedgerEvent, recorded_on: NaiveDate) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            subject_id: event.subject_id().to_string(),
            event_type: event.type_name().to_string(),
            recorded_on,
            payload: serde_json::to_string(event)?,
        })
    }

    pub fn decode(&self) -> serde_json::Result<LedgerEvent> {
        serde_json::from_str(&self.payload)
    }
}
