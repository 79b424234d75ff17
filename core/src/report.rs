//! Read-only reports over the loan book.
//!
//! Every figure is derived from `current_balance` or `accrued_interest` per
//! loan; loans share no state, so nothing here needs coordination beyond a
//! consistent read.

use crate::{
    balance,
    error::{LedgerError, LedgerResult},
    interest,
    ledger::LoanLedger,
    loan::{Loan, LoanCategory, LoanStatus},
    types::{Amount, LoanId, MemberId},
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueLoan {
    pub loan_id: LoanId,
    pub member_id: MemberId,
    pub member_name: String,
    pub category: LoanCategory,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub balance: Amount,
}

/// One row of the loans export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanStatement {
    pub loan_id: LoanId,
    pub member_name: String,
    pub category: LoanCategory,
    pub principal: Amount,
    pub interest_rate: Amount,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub total_repaid: Amount,
    pub balance: Amount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    pub as_of: Option<NaiveDate>,
    pub active_loans: usize,
    pub completed_loans: usize,
    pub overdue_loans: usize,
    pub principal_issued: Amount,
    /// Interest earned across the book, each loan up to its completion.
    pub interest_accrued: Amount,
    pub total_repaid: Amount,
    pub outstanding: Amount,
}

/// Label of the reporting year containing `date`, e.g. `2024-2025`.
/// With a March start, January and February belong to the year that
/// began the previous March.
pub fn financial_year(date: NaiveDate, start_month: u32) -> String {
    let first = first_calendar_year(date, start_month);
    if start_month == 1 {
        return first.to_string();
    }
    format!("{}-{}", first, first + 1)
}

fn first_calendar_year(date: NaiveDate, start_month: u32) -> i32 {
    if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    }
}

/// First day of the reporting year after the one containing `date`.
/// `None` past the end of the calendar.
fn next_financial_year_start(date: NaiveDate, start_month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(first_calendar_year(date, start_month) + 1, start_month, 1)
}

impl LoanLedger {
    /// Active loans past their due date as of `as_of`, most overdue first.
    pub fn overdue_loans(&self, as_of: NaiveDate) -> LedgerResult<Vec<OverdueLoan>> {
        let names = self.member_names()?;
        let mut overdue = Vec::new();
        for loan in self.store().loans_with_status(LoanStatus::Active)? {
            if !loan.is_overdue(as_of) {
                continue;
            }
            let balance = self.balance_of(&loan, as_of)?;
            overdue.push(OverdueLoan {
                member_name: names.get(&loan.member_id).cloned().unwrap_or_default(),
                days_overdue: (as_of - loan.due_date).num_days(),
                loan_id: loan.loan_id,
                member_id: loan.member_id,
                category: loan.category,
                due_date: loan.due_date,
                balance,
            });
        }
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        Ok(overdue)
    }

    /// What a member still owes across their active loans.
    pub fn member_outstanding(&self, member_id: &str, as_of: NaiveDate) -> LedgerResult<Amount> {
        if self.store().get_member(member_id)?.is_none() {
            return Err(LedgerError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }
        let mut total = Amount::ZERO;
        for loan in self.loans_for_member(member_id)? {
            if loan.is_active() {
                total += self.balance_of(&loan, as_of)?;
            }
        }
        Ok(total)
    }

    pub fn loan_statements(&self, as_of: NaiveDate) -> LedgerResult<Vec<LoanStatement>> {
        let names = self.member_names()?;
        self.store()
            .list_loans()?
            .into_iter()
            .map(|loan| {
                let repayments = self.store().repayments_for_loan(&loan.loan_id, Some(as_of))?;
                Ok(LoanStatement {
                    member_name: names.get(&loan.member_id).cloned().unwrap_or_default(),
                    total_repaid: balance::total_repaid(&repayments, as_of)?,
                    balance: balance::current_balance(&loan, &repayments, as_of)?,
                    loan_id: loan.loan_id,
                    category: loan.category,
                    principal: loan.principal,
                    interest_rate: loan.interest_rate,
                    start_date: loan.start_date,
                    due_date: loan.due_date,
                    status: loan.status,
                })
            })
            .collect()
    }

    /// Completed loans contribute their principal and repayments but
    /// never an outstanding balance.
    pub fn portfolio_summary(&self, as_of: NaiveDate) -> LedgerResult<PortfolioSummary> {
        let mut summary = PortfolioSummary {
            as_of: Some(as_of),
            ..Default::default()
        };
        for statement in self.loan_statements(as_of)? {
            summary.principal_issued += statement.principal;
            summary.total_repaid += statement.total_repaid;
            match statement.status {
                LoanStatus::Active => {
                    summary.active_loans += 1;
                    summary.outstanding += statement.balance;
                    if as_of > statement.due_date {
                        summary.overdue_loans += 1;
                    }
                }
                LoanStatus::Completed => summary.completed_loans += 1,
            }
        }
        for loan in self.store().list_loans()? {
            let end = self.interest_end(&loan, as_of)?;
            summary.interest_accrued += interest::accrued_interest(&loan, end)?;
        }
        Ok(summary)
    }

    /// Interest earned per reporting year up to `as_of`, keyed by year label.
    ///
    /// A loan's interest is split at each year boundary: a year is credited
    /// with what accrued between its first and last day. Completed loans
    /// stop earning on their completion date. Years with nothing earned
    /// are left out.
    pub fn interest_by_financial_year(
        &self,
        as_of: NaiveDate,
    ) -> LedgerResult<BTreeMap<String, Amount>> {
        let start_month = self.config().financial_year_start_month;
        let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
        for loan in self.store().list_loans()? {
            let end = self.interest_end(&loan, as_of)?;
            let mut earned_before = Amount::ZERO;
            let mut year_start = loan.start_date;
            while year_start <= end {
                let next = next_financial_year_start(year_start, start_month);
                let year_end = next
                    .and_then(|n| n.pred_opt())
                    .map_or(end, |last| last.min(end));
                let earned = interest::accrued_interest(&loan, year_end)?;
                let share = earned - earned_before;
                if !share.is_zero() {
                    *totals
                        .entry(financial_year(year_start, start_month))
                        .or_default() += share;
                }
                earned_before = earned;
                match next {
                    Some(n) => year_start = n,
                    None => break,
                }
            }
        }
        Ok(totals)
    }

    /// Last date a loan earns interest for reporting: its completion date,
    /// or its latest repayment for legacy rows completed without an event.
    fn interest_end(&self, loan: &Loan, as_of: NaiveDate) -> LedgerResult<NaiveDate> {
        if loan.status != LoanStatus::Completed {
            return Ok(as_of);
        }
        let completed_on = match self.store().completion_date(&loan.loan_id)? {
            Some(date) => Some(date),
            None => self
                .store()
                .repayments_for_loan(&loan.loan_id, None)?
                .iter()
                .map(|r| r.date)
                .max(),
        };
        Ok(completed_on.map_or(as_of, |date| date.min(as_of)))
    }

    /// Principal issued per reporting year, keyed by year label.
    pub fn principal_issued_by_financial_year(&self) -> LedgerResult<BTreeMap<String, Amount>> {
        let start_month = self.config().financial_year_start_month;
        let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
        for loan in self.store().list_loans()? {
            *totals
                .entry(financial_year(loan.start_date, start_month))
                .or_default() += loan.principal;
        }
        Ok(totals)
    }

    fn member_names(&self) -> LedgerResult<HashMap<MemberId, String>> {
        Ok(self
            .store()
            .list_members()?
            .into_iter()
            .map(|m| (m.member_id, m.name))
            .collect())
    }
}
