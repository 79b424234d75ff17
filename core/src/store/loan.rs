use super::{amount_at, amount_text, LedgerStore};
use crate::{
    error::LedgerResult,
    loan::{Loan, LoanStatus},
};
use rusqlite::{params, OptionalExtension};

const LOAN_COLUMNS: &str = "loan_id, member_id, category, principal, interest_rate,
                            start_date, due_date, status";

fn loan_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        loan_id: row.get(0)?,
        member_id: row.get(1)?,
        category: row.get(2)?,
        principal: amount_at(row, 3)?,
        interest_rate: amount_at(row, 4)?,
        start_date: row.get(5)?,
        due_date: row.get(6)?,
        status: row.get(7)?,
    })
}

impl LedgerStore {
    // ── Loan ──────────────────────────────────────────────────────

    pub fn insert_loan(&self, l: &Loan) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO loan (
                loan_id, member_id, category, principal, interest_rate,
                start_date, due_date, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &l.loan_id,
                &l.member_id,
                l.category,
                amount_text(l.principal),
                amount_text(l.interest_rate),
                l.start_date,
                l.due_date,
                l.status,
            ],
        )?;
        Ok(())
    }

    pub fn get_loan(&self, loan_id: &str) -> LedgerResult<Option<Loan>> {
        let sql = format!("SELECT {LOAN_COLUMNS} FROM loan WHERE loan_id = ?1");
        let loan = self
            .conn
            .query_row(&sql, params![loan_id], loan_row_mapper)
            .optional()?;
        Ok(loan)
    }

    /// All loans, oldest first.
    pub fn list_loans(&self) -> LedgerResult<Vec<Loan>> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loan ORDER BY start_date ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], loan_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn loans_with_status(&self, status: LoanStatus) -> LedgerResult<Vec<Loan>> {
        // Older rows may carry 'paid' for completed.
        let sql = match status {
            LoanStatus::Active => format!(
                "SELECT {LOAN_COLUMNS} FROM loan WHERE status = 'active'
                 ORDER BY start_date ASC, rowid ASC"
            ),
            LoanStatus::Completed => format!(
                "SELECT {LOAN_COLUMNS} FROM loan WHERE status IN ('completed', 'paid')
                 ORDER BY start_date ASC, rowid ASC"
            ),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], loan_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn loans_for_member(&self, member_id: &str) -> LedgerResult<Vec<Loan>> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loan WHERE member_id = ?1
             ORDER BY start_date ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![member_id], loan_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The only mutation a loan row ever sees.
    pub fn set_loan_status(&self, loan_id: &str, status: LoanStatus) -> LedgerResult<()> {
        self.conn.execute(
            "UPDATE loan SET status = ?1 WHERE loan_id = ?2",
            params![status, loan_id],
        )?;
        Ok(())
    }
}
