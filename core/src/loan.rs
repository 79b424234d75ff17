//! Loan and repayment records.
//!
//! Loans are append-only apart from the single `active -> completed`
//! status transition. Repayments are strictly append-only.

use crate::{
    error::LedgerError,
    types::{Amount, EntityId, LoanId, MemberId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Largest principal or single repayment the ledger accepts.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Largest interest rate, in percent, the ledger accepts.
pub const MAX_RATE_PERCENT: i64 = 1_000;

/// Rejects amounts outside `(0, MAX_AMOUNT]`.
pub fn validate_amount(what: &str, amount: Amount) -> Result<(), LedgerError> {
    if amount <= Amount::ZERO {
        return Err(LedgerError::validation(format!(
            "{what} must be positive, got {amount}"
        )));
    }
    if amount > Amount::from(MAX_AMOUNT) {
        return Err(LedgerError::validation(format!(
            "{what} {amount} exceeds the limit of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Loan category. Selects the interest regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanCategory {
    /// Annual simple interest, pro-rated by days.
    Standard,
    /// Flat monthly simple interest, counted per calendar-month crossing.
    Emergency,
}

impl LoanCategory {
    pub const ALL: [LoanCategory; 2] = [LoanCategory::Standard, LoanCategory::Emergency];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanCategory::Standard  => "standard",
            LoanCategory::Emergency => "emergency",
        }
    }
}

impl fmt::Display for LoanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanCategory {
    type Err = LedgerError;

    /// Accepts the names older records use for standard loans
    /// ("normal", "development"). Anything unrecognised is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "normal" | "development" => Ok(LoanCategory::Standard),
            "emergency" => Ok(LoanCategory::Emergency),
            other => Err(LedgerError::validation(format!(
                "unknown loan category '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Completed,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active    => "active",
            LoanStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Completed)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(LoanStatus::Active),
            // "paid" is how older records spell it.
            "completed" | "paid" => Ok(LoanStatus::Completed),
            other => Err(LedgerError::validation(format!(
                "unknown loan status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub member_id: MemberId,
    pub category: LoanCategory,
    pub principal: Amount,
    /// Percentage: 10 means 10 %. Annual for standard loans,
    /// monthly for emergency loans.
    pub interest_rate: Amount,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Overdue means still active after the due date.
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.is_active() && as_of > self.due_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub repayment_id: EntityId,
    pub loan_id: LoanId,
    pub amount: Amount,
    pub date: NaiveDate,
}

/// Terms for a new loan, as entered by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub member_id: MemberId,
    pub category: LoanCategory,
    pub principal: Amount,
    pub interest_rate: Amount,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl LoanTerms {
    /// Checks everything that does not need the store.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount("principal", self.principal)?;
        if self.interest_rate < Amount::ZERO {
            return Err(LedgerError::validation(format!(
                "interest rate must not be negative, got {}",
                self.interest_rate
            )));
        }
        if self.interest_rate > Amount::from(MAX_RATE_PERCENT) {
            return Err(LedgerError::validation(format!(
                "interest rate {}% exceeds the limit of {MAX_RATE_PERCENT}%",
                self.interest_rate
            )));
        }
        if self.start_date > self.due_date {
            return Err(LedgerError::validation(format!(
                "start date {} is after due date {}",
                self.start_date, self.due_date
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_accepts_legacy_names() {
        assert_eq!("normal".parse::<LoanCategory>().unwrap(), LoanCategory::Standard);
        assert_eq!("Development".parse::<LoanCategory>().unwrap(), LoanCategory::Standard);
        assert_eq!(" emergency ".parse::<LoanCategory>().unwrap(), LoanCategory::Emergency);
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let err = "welfare".parse::<LoanCategory>().unwrap_err();
        assert!(err.is_validation(), "got {err}");
    }

    #[test]
    fn paid_reads_as_completed() {
        assert_eq!("paid".parse::<LoanStatus>().unwrap(), LoanStatus::Completed);
        assert!("overdue".parse::<LoanStatus>().is_err());
    }
}
