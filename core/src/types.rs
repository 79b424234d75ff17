//! Shared primitive types used across the entire ledger.

use rust_decimal::Decimal;

/// A stable, unique identifier for any ledger record.
pub type EntityId = String;

/// Identifier of a group member.
pub type MemberId = EntityId;

/// Identifier of a loan.
pub type LoanId = EntityId;

/// A monetary amount. Exact decimal, never floating point.
pub type Amount = Decimal;
