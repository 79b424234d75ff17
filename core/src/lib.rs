//! Loan book for a self-help group: members, loans under two simple
//! interest regimes, append-only repayments, and balance reports.

pub mod balance;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod member;
pub mod report;
pub mod store;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use ledger::LoanLedger;
