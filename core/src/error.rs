use crate::loan::LoanStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Loan '{loan_id}' is {status}; no further repayments are accepted")]
    InvalidState { loan_id: String, status: LoanStatus },

    #[error("Loan '{loan_id}' not found")]
    LoanNotFound { loan_id: String },

    #[error("Member '{member_id}' not found")]
    MemberNotFound { member_id: String },

    #[error("Amount overflow while computing figures for loan '{loan_id}'")]
    AmountOverflow { loan_id: String },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Bad caller input: fix the input and try again.
    /// An unknown member is a validation failure of `open_loan`.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MemberNotFound { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
