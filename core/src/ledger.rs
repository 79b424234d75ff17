//! The loan ledger: opens loans, records repayments, reports balances.
//!
//! RULES:
//!   - Loan terms never change after `open_loan`.
//!   - Repayments are append-only.
//!   - `status` moves `active -> completed` once, inside `record_repayment`,
//!     when the balance as of today reaches zero. Nothing reopens a loan.
//!   - Inserting a repayment and the completion check are one transaction.

use crate::{
    balance::{self, BalanceBreakdown},
    clock::LedgerClock,
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
    event::{EventLogEntry, LedgerEvent},
    interest,
    loan::{validate_amount, Loan, LoanCategory, LoanStatus, LoanTerms, Repayment},
    member::{Member, MemberStatus},
    store::LedgerStore,
    types::Amount,
};
use chrono::NaiveDate;
use uuid::Uuid;

pub struct LoanLedger {
    store: LedgerStore,
    config: LedgerConfig,
    clock: Box<dyn LedgerClock>,
}

impl LoanLedger {
    pub fn new(store: LedgerStore, config: LedgerConfig, clock: impl LedgerClock + 'static) -> Self {
        Self {
            store,
            config,
            clock: Box::new(clock),
        }
    }

    /// In-memory store, test config, pinned clock.
    pub fn build_test(today: NaiveDate) -> LedgerResult<Self> {
        let store = LedgerStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(
            store,
            LedgerConfig::default_test(),
            crate::clock::FixedClock::new(today),
        ))
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ── Members ───────────────────────────────────────────────────

    pub fn register_member(
        &self,
        name: &str,
        phone: Option<&str>,
        join_date: NaiveDate,
    ) -> LedgerResult<Member> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("member name must not be blank"));
        }
        let member = Member {
            member_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
            status: MemberStatus::Active,
            join_date,
        };

        let tx = self.store.begin_immediate()?;
        self.store.insert_member(&member)?;
        self.record_event(&LedgerEvent::MemberRegistered {
            member_id: member.member_id.clone(),
            name: member.name.clone(),
        })?;
        tx.commit()?;

        log::info!("Member {} registered ({})", member.member_id, member.name);
        Ok(member)
    }

    /// Inactive members keep their loans but cannot open new ones.
    pub fn deactivate_member(&self, member_id: &str) -> LedgerResult<()> {
        let tx = self.store.begin_immediate()?;
        if !self.store.set_member_status(member_id, MemberStatus::Inactive)? {
            return Err(LedgerError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }
        self.record_event(&LedgerEvent::MemberDeactivated {
            member_id: member_id.to_string(),
        })?;
        tx.commit()?;
        log::info!("Member {member_id} deactivated");
        Ok(())
    }

    // ── Loans ─────────────────────────────────────────────────────

    /// Open a new active loan. No duplicate or solvency check: a member
    /// may hold several loans at once.
    pub fn open_loan(&self, terms: LoanTerms) -> LedgerResult<Loan> {
        terms.validate()?;

        // Take the write lock before checking the member so a concurrent
        // deactivation cannot land between the check and the insert.
        let tx = self.store.begin_immediate()?;
        let member = self
            .store
            .get_member(&terms.member_id)?
            .ok_or_else(|| LedgerError::MemberNotFound {
                member_id: terms.member_id.clone(),
            })?;
        if member.status != MemberStatus::Active {
            return Err(LedgerError::validation(format!(
                "member '{}' is {}; loans are only issued to active members",
                member.member_id, member.status
            )));
        }

        let loan = Loan {
            loan_id: Uuid::new_v4().to_string(),
            member_id: terms.member_id,
            category: terms.category,
            principal: terms.principal,
            interest_rate: terms.interest_rate,
            start_date: terms.start_date,
            due_date: terms.due_date,
            status: LoanStatus::Active,
        };

        self.store.insert_loan(&loan)?;
        self.record_event(&LedgerEvent::LoanOpened {
            loan_id: loan.loan_id.clone(),
            member_id: loan.member_id.clone(),
            category: loan.category.to_string(),
            principal: loan.principal,
            interest_rate: loan.interest_rate,
            start_date: loan.start_date,
            due_date: loan.due_date,
        })?;
        tx.commit()?;

        log::info!(
            "Loan {} opened: {} {} @ {}% for member {}",
            loan.loan_id,
            loan.category,
            loan.principal,
            loan.interest_rate,
            loan.member_id
        );
        Ok(loan)
    }

    /// Open a loan on the configured product terms: default rate, and a
    /// due date `term_days` after the start.
    pub fn issue_loan(
        &self,
        member_id: &str,
        category: LoanCategory,
        principal: Amount,
        start_date: NaiveDate,
    ) -> LedgerResult<Loan> {
        let product = self.config.product(category).ok_or_else(|| {
            LedgerError::validation(format!("no loan product configured for '{category}'"))
        })?;
        let due_date = chrono::Duration::try_days(product.term_days)
            .and_then(|term| start_date.checked_add_signed(term))
            .ok_or_else(|| {
                LedgerError::validation(format!(
                    "a {}-day term starting {start_date} runs past the last representable date",
                    product.term_days
                ))
            })?;
        self.open_loan(LoanTerms {
            member_id: member_id.to_string(),
            category,
            principal,
            interest_rate: product.default_rate_percent,
            start_date,
            due_date,
        })
    }

    pub fn get_loan(&self, loan_id: &str) -> LedgerResult<Loan> {
        self.store
            .get_loan(loan_id)?
            .ok_or_else(|| LedgerError::LoanNotFound {
                loan_id: loan_id.to_string(),
            })
    }

    pub fn loans_for_member(&self, member_id: &str) -> LedgerResult<Vec<Loan>> {
        self.store.loans_for_member(member_id)
    }

    /// Repayment history, newest first.
    pub fn repayments(&self, loan_id: &str) -> LedgerResult<Vec<Repayment>> {
        let mut history = self.store.repayments_for_loan(loan_id, None)?;
        history.reverse();
        Ok(history)
    }

    // ── Balances ──────────────────────────────────────────────────

    pub fn accrued_interest(&self, loan_id: &str, as_of: NaiveDate) -> LedgerResult<Amount> {
        let loan = self.get_loan(loan_id)?;
        interest::accrued_interest(&loan, as_of)
    }

    pub fn current_balance(&self, loan_id: &str, as_of: NaiveDate) -> LedgerResult<Amount> {
        let loan = self.get_loan(loan_id)?;
        self.balance_of(&loan, as_of)
    }

    pub fn balance_breakdown(
        &self,
        loan_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<BalanceBreakdown> {
        let loan = self.get_loan(loan_id)?;
        let repayments = self.store.repayments_for_loan(&loan.loan_id, Some(as_of))?;
        BalanceBreakdown::compute(&loan, &repayments, as_of)
    }

    pub(crate) fn balance_of(&self, loan: &Loan, as_of: NaiveDate) -> LedgerResult<Amount> {
        let repayments = self.store.repayments_for_loan(&loan.loan_id, Some(as_of))?;
        let owed = balance::current_balance(loan, &repayments, as_of)?;
        log::debug!("Loan {} balance as of {as_of}: {owed}", loan.loan_id);
        Ok(owed)
    }

    // ── Repayments ────────────────────────────────────────────────

    /// Record a repayment. Backdated repayments are accepted; over-payment
    /// is not rejected (the balance floors at zero). Fails with
    /// `InvalidState` once the loan is completed.
    ///
    /// Completes the loan when its balance as of today is zero after the
    /// insert. The read of the loan, the insert and the status change run
    /// in a single IMMEDIATE transaction, so concurrent repayments on the
    /// same database are serialized.
    pub fn record_repayment(
        &self,
        loan_id: &str,
        amount: Amount,
        date: NaiveDate,
    ) -> LedgerResult<Repayment> {
        let tx = self.store.begin_immediate()?;

        let loan = self.get_loan(loan_id)?;
        if loan.status.is_terminal() {
            log::warn!("Rejected repayment of {amount} on {} loan {loan_id}", loan.status);
            return Err(LedgerError::InvalidState {
                loan_id: loan.loan_id,
                status: loan.status,
            });
        }
        validate_amount("repayment amount", amount)?;

        let repayment = Repayment {
            repayment_id: Uuid::new_v4().to_string(),
            loan_id: loan.loan_id.clone(),
            amount,
            date,
        };
        self.store.insert_repayment(&repayment)?;

        let today = self.today();
        let balance_after = self.balance_of(&loan, today)?;
        self.record_event(&LedgerEvent::RepaymentRecorded {
            loan_id: loan.loan_id.clone(),
            repayment_id: repayment.repayment_id.clone(),
            amount,
            date,
            balance_after,
        })?;

        if balance_after <= Amount::ZERO {
            self.store.set_loan_status(&loan.loan_id, LoanStatus::Completed)?;
            self.record_event(&LedgerEvent::LoanCompleted {
                loan_id: loan.loan_id.clone(),
                completed_on: today,
            })?;
            log::info!("Loan {} completed on {today}", loan.loan_id);
        }

        tx.commit()?;
        log::info!(
            "Repayment {} of {amount} dated {date} on loan {}; balance now {balance_after}",
            repayment.repayment_id,
            loan.loan_id
        );
        Ok(repayment)
    }

    // ── Audit ─────────────────────────────────────────────────────

    pub fn history(&self, subject_id: &str) -> LedgerResult<Vec<LedgerEvent>> {
        self.store
            .events_for_subject(subject_id)?
            .iter()
            .map(|e| e.decode().map_err(LedgerError::from))
            .collect()
    }

    fn record_event(&self, event: &LedgerEvent) -> LedgerResult<()> {
        let entry = EventLogEntry::new(event, self.today())?;
        self.store.append_event(&entry)
    }
}
