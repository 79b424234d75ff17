use super::{amount_at, amount_text, LedgerStore};
use crate::{error::LedgerResult, loan::Repayment};
use chrono::NaiveDate;
use rusqlite::params;

fn repayment_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Repayment> {
    Ok(Repayment {
        repayment_id: row.get(0)?,
        loan_id: row.get(1)?,
        amount: amount_at(row, 2)?,
        date: row.get(3)?,
    })
}

impl LedgerStore {
    // ── Repayment ─────────────────────────────────────────────────

    pub fn insert_repayment(&self, r: &Repayment) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO repayment (repayment_id, loan_id, amount, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![&r.repayment_id, &r.loan_id, amount_text(r.amount), r.date],
        )?;
        Ok(())
    }

    /// Repayments on a loan in date order, optionally only those dated
    /// on or before `up_to`.
    pub fn repayments_for_loan(
        &self,
        loan_id: &str,
        up_to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Repayment>> {
        let mut stmt = self.conn.prepare(
            "SELECT repayment_id, loan_id, amount, date
             FROM repayment
             WHERE loan_id = ?1 AND (?2 IS NULL OR date <= ?2)
             ORDER BY date ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![loan_id, up_to], repayment_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn repayment_count(&self, loan_id: &str) -> LedgerResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM repayment WHERE loan_id = ?1",
            params![loan_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
