//! Interest accrual: pure functions of loan terms and elapsed time.
//!
//! Both regimes are simple interest on the original principal.
//! Repayments never reduce the base; they are netted off in `balance`.
//!
//! Emergency: `principal * rate% * months`, where months counts calendar
//! month boundaries crossed, not 30-day periods. A loan started on the
//! 28th owes one month of interest on the 1st of the next month.
//!
//! Standard: `principal * rate% * days / 365`.

use crate::{
    error::{LedgerError, LedgerResult},
    loan::{Loan, LoanCategory},
    types::Amount,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

pub const DAYS_PER_YEAR: i64 = 365;

/// Interest is carried to cents.
pub const AMOUNT_DP: u32 = 2;

/// `(as_of.year - start.year) * 12 + (as_of.month - start.month)`,
/// zero when `as_of` precedes `start`.
pub fn whole_calendar_months_between(start: NaiveDate, as_of: NaiveDate) -> i64 {
    if as_of < start {
        return 0;
    }
    let years = i64::from(as_of.year()) - i64::from(start.year());
    let months = i64::from(as_of.month()) - i64::from(start.month());
    (years * 12 + months).max(0)
}

/// Whole days from `start` to `as_of`, zero when `as_of` precedes `start`.
pub fn days_between(start: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - start).num_days().max(0)
}

/// Interest owed on `loan` as of `as_of`. Does not consult repayments.
///
/// Fails with `AmountOverflow` instead of panicking when terms read back
/// from the store are too large to accrue.
pub fn accrued_interest(loan: &Loan, as_of: NaiveDate) -> LedgerResult<Amount> {
    let (periods, divisor) = match loan.category {
        LoanCategory::Emergency => (
            whole_calendar_months_between(loan.start_date, as_of),
            Decimal::ONE_HUNDRED,
        ),
        LoanCategory::Standard => (
            days_between(loan.start_date, as_of),
            Decimal::from(100 * DAYS_PER_YEAR),
        ),
    };
    let raw = loan
        .principal
        .checked_mul(loan.interest_rate)
        .and_then(|v| v.checked_mul(Decimal::from(periods)))
        .and_then(|v| v.checked_div(divisor))
        .ok_or_else(|| LedgerError::AmountOverflow {
            loan_id: loan.loan_id.clone(),
        })?;
    Ok(round_amount(raw))
}

pub fn round_amount(value: Amount) -> Amount {
    value.round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::MidpointAwayFromZero)
}
