//! Balance arithmetic over a loan and its repayments.

use crate::{
    error::{LedgerError, LedgerResult},
    interest::accrued_interest,
    loan::{Loan, Repayment},
    types::Amount,
};
use chrono::NaiveDate;

/// Sum of repayments dated on or before `as_of`.
pub fn total_repaid(repayments: &[Repayment], as_of: NaiveDate) -> LedgerResult<Amount> {
    repayments
        .iter()
        .filter(|r| r.date <= as_of)
        .try_fold(Amount::ZERO, |sum, r| {
            sum.checked_add(r.amount)
                .ok_or_else(|| LedgerError::AmountOverflow {
                    loan_id: r.loan_id.clone(),
                })
        })
}

/// Principal plus interest accrued to `as_of`.
pub fn total_owed(loan: &Loan, as_of: NaiveDate) -> LedgerResult<Amount> {
    loan.principal
        .checked_add(accrued_interest(loan, as_of)?)
        .ok_or_else(|| LedgerError::AmountOverflow {
            loan_id: loan.loan_id.clone(),
        })
}

/// `max(0, principal + interest - repaid)`. Never negative: over-payment
/// floors at zero instead of becoming a credit.
pub fn current_balance(
    loan: &Loan,
    repayments: &[Repayment],
    as_of: NaiveDate,
) -> LedgerResult<Amount> {
    let owed = total_owed(loan, as_of)?;
    let repaid = total_repaid(repayments, as_of)?;
    // Both sides are non-negative, so the subtraction cannot overflow.
    Ok((owed - repaid).max(Amount::ZERO))
}

/// Balance breakdown for display.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BalanceBreakdown {
    pub as_of: NaiveDate,
    pub principal: Amount,
    pub interest: Amount,
    pub repaid: Amount,
    pub balance: Amount,
}

impl BalanceBreakdown {
    pub fn compute(
        loan: &Loan,
        repayments: &[Repayment],
        as_of: NaiveDate,
    ) -> LedgerResult<Self> {
        Ok(Self {
            as_of,
            principal: loan.principal,
            interest: accrued_interest(loan, as_of)?,
            repaid: total_repaid(repayments, as_of)?,
            balance: current_balance(loan, repayments, as_of)?,
        })
    }
}
