//! Overdue list, member totals, loan statements and portfolio summary.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use shg_ledger_core::{
    loan::{LoanCategory, LoanStatus, LoanTerms},
    report::PortfolioSummary,
    types::Amount,
    LedgerError, LoanLedger,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct Book {
    ledger: LoanLedger,
    alice: String,
    bob: String,
}

/// Alice: an overdue emergency loan and a completed standard loan.
/// Bob: one standard loan not yet due.
fn build() -> Book {
    let _ = env_logger::builder().is_test(true).try_init();
    let ledger = LoanLedger::build_test(d(2025, 4, 1)).expect("build test ledger");
    let alice = ledger.register_member("Alice", None, d(2024, 1, 1)).unwrap().member_id;
    let bob = ledger.register_member("Bob", None, d(2024, 1, 1)).unwrap().member_id;
    Book { ledger, alice, bob }
}

fn open(ledger: &LoanLedger, member_id: &str, category: LoanCategory, principal: Amount, rate: Amount, start: NaiveDate, due: NaiveDate) -> String {
    ledger
        .open_loan(LoanTerms {
            member_id: member_id.to_string(),
            category,
            principal,
            interest_rate: rate,
            start_date: start,
            due_date: due,
        })
        .unwrap()
        .loan_id
}

#[test]
fn overdue_lists_only_active_loans_past_due() {
    let book = build();
    let late = open(&book.ledger, &book.alice, LoanCategory::Emergency, dec!(5000), dec!(2), d(2025, 1, 10), d(2025, 2, 9));
    let paid = open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(1000), dec!(0), d(2025, 1, 1), d(2025, 2, 1));
    book.ledger.record_repayment(&paid, dec!(1000), d(2025, 1, 31)).unwrap();
    open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(8000), dec!(10), d(2025, 3, 1), d(2027, 3, 1));

    let overdue = book.ledger.overdue_loans(d(2025, 4, 1)).unwrap();
    assert_eq!(overdue.len(), 1);
    let row = &overdue[0];
    assert_eq!(row.loan_id, late);
    assert_eq!(row.member_name, "Alice");
    assert_eq!(row.days_overdue, 51);
    // Three month boundaries crossed since 10 Jan.
    assert_eq!(row.balance, dec!(5300));
}

#[test]
fn loan_is_not_overdue_on_its_due_date() {
    let book = build();
    open(&book.ledger, &book.bob, LoanCategory::Emergency, dec!(1000), dec!(2), d(2025, 3, 1), d(2025, 4, 1));
    assert!(book.ledger.overdue_loans(d(2025, 4, 1)).unwrap().is_empty());
    assert_eq!(book.ledger.overdue_loans(d(2025, 4, 2)).unwrap().len(), 1);
}

#[test]
fn member_outstanding_sums_active_balances() {
    let book = build();
    open(&book.ledger, &book.alice, LoanCategory::Emergency, dec!(5000), dec!(2), d(2025, 1, 10), d(2025, 2, 9));
    open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(2000), dec!(0), d(2025, 1, 1), d(2026, 1, 1));
    open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(9999), dec!(0), d(2025, 1, 1), d(2026, 1, 1));

    assert_eq!(book.ledger.member_outstanding(&book.alice, d(2025, 4, 1)).unwrap(), dec!(7300));
    assert_eq!(book.ledger.member_outstanding(&book.bob, d(2025, 4, 1)).unwrap(), dec!(9999));
}

#[test]
fn member_outstanding_rejects_unknown_member() {
    let book = build();
    let err = book.ledger.member_outstanding("nobody", d(2025, 4, 1)).unwrap_err();
    assert!(matches!(err, LedgerError::MemberNotFound { ref member_id } if member_id == "nobody"));
    assert!(err.is_validation());
}

#[test]
fn member_without_loans_owes_nothing() {
    let book = build();
    assert_eq!(book.ledger.member_outstanding(&book.bob, d(2025, 4, 1)).unwrap(), dec!(0));
}

#[test]
fn statements_cover_every_loan() {
    let book = build();
    let paid = open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(1000), dec!(0), d(2025, 1, 1), d(2025, 2, 1));
    book.ledger.record_repayment(&paid, dec!(1200), d(2025, 1, 31)).unwrap();
    open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(3650), dec!(10), d(2025, 3, 1), d(2027, 3, 1));

    let statements = book.ledger.loan_statements(d(2025, 4, 1)).unwrap();
    assert_eq!(statements.len(), 2);

    let alice = statements.iter().find(|s| s.member_name == "Alice").unwrap();
    assert_eq!(alice.status, LoanStatus::Completed);
    assert_eq!(alice.total_repaid, dec!(1200));
    assert_eq!(alice.balance, dec!(0));

    // 3650 * 10% * 31 / 365 = 31.
    let bob = statements.iter().find(|s| s.member_name == "Bob").unwrap();
    assert_eq!(bob.status, LoanStatus::Active);
    assert_eq!(bob.balance, dec!(3681));
}

#[test]
fn portfolio_summary_totals() {
    let book = build();
    open(&book.ledger, &book.alice, LoanCategory::Emergency, dec!(5000), dec!(2), d(2025, 1, 10), d(2025, 2, 9));
    let paid = open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(1000), dec!(0), d(2025, 1, 1), d(2025, 2, 1));
    book.ledger.record_repayment(&paid, dec!(1000), d(2025, 1, 31)).unwrap();
    let bob_loan = open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(2000), dec!(0), d(2025, 3, 1), d(2027, 3, 1));
    book.ledger.record_repayment(&bob_loan, dec!(500), d(2025, 3, 15)).unwrap();

    let summary = book.ledger.portfolio_summary(d(2025, 4, 1)).unwrap();
    assert_eq!(
        summary,
        PortfolioSummary {
            as_of: Some(d(2025, 4, 1)),
            active_loans: 2,
            completed_loans: 1,
            overdue_loans: 1,
            principal_issued: dec!(8000),
            // Alice's emergency loan: three month boundaries at 2% of 5000.
            interest_accrued: dec!(300),
            total_repaid: dec!(1500),
            outstanding: dec!(6800),
        }
    );
}

#[test]
fn principal_grouped_by_financial_year() {
    let book = build();
    open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(1000), dec!(0), d(2025, 2, 28), d(2025, 6, 1));
    open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(2000), dec!(0), d(2025, 3, 1), d(2025, 6, 1));
    open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(3000), dec!(0), d(2025, 12, 1), d(2026, 6, 1));

    let totals = book.ledger.principal_issued_by_financial_year().unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals["2024-2025"], dec!(1000));
    assert_eq!(totals["2025-2026"], dec!(5000));
}

#[test]
fn interest_is_split_across_financial_years() {
    let book = build();
    // 1 a day. 27 days fall in February, the rest from 1 March.
    open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(3650), dec!(10), d(2025, 2, 1), d(2027, 2, 1));
    // Crosses 1 March and 1 April: 2 x 20, both in the new year.
    open(&book.ledger, &book.bob, LoanCategory::Emergency, dec!(1000), dec!(2), d(2025, 2, 10), d(2025, 3, 12));

    let as_of = d(2025, 4, 15);
    let by_year = book.ledger.interest_by_financial_year(as_of).unwrap();
    assert_eq!(by_year.len(), 2);
    assert_eq!(by_year["2024-2025"], dec!(27));
    assert_eq!(by_year["2025-2026"], dec!(86));

    let summary = book.ledger.portfolio_summary(as_of).unwrap();
    assert_eq!(summary.interest_accrued, dec!(113));
    assert_eq!(by_year.values().copied().sum::<Amount>(), summary.interest_accrued);
}

#[test]
fn completed_loans_stop_earning_interest() {
    let book = build();
    // Today is 2025-04-01: 90 days at 1 a day.
    let loan = open(&book.ledger, &book.alice, LoanCategory::Standard, dec!(3650), dec!(10), d(2025, 1, 1), d(2026, 1, 1));
    book.ledger.record_repayment(&loan, dec!(3740), d(2025, 4, 1)).unwrap();
    assert_eq!(book.ledger.get_loan(&loan).unwrap().status, LoanStatus::Completed);

    let later = d(2026, 6, 1);
    assert_eq!(book.ledger.portfolio_summary(later).unwrap().interest_accrued, dec!(90));
    let by_year = book.ledger.interest_by_financial_year(later).unwrap();
    assert_eq!(by_year.len(), 2);
    assert_eq!(by_year["2024-2025"], dec!(58));
    assert_eq!(by_year["2025-2026"], dec!(32));
}

#[test]
fn nothing_is_earned_before_a_loan_starts() {
    let book = build();
    open(&book.ledger, &book.bob, LoanCategory::Standard, dec!(3650), dec!(10), d(2025, 3, 1), d(2026, 3, 1));
    assert!(book.ledger.interest_by_financial_year(d(2025, 2, 1)).unwrap().is_empty());
    assert_eq!(book.ledger.portfolio_summary(d(2025, 2, 1)).unwrap().interest_accrued, dec!(0));
}
