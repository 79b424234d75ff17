use super::LedgerStore;
use crate::{
    error::LedgerResult,
    member::{Member, MemberStatus},
};
use rusqlite::{params, OptionalExtension};

fn member_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        member_id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        status: row.get(3)?,
        join_date: row.get(4)?,
    })
}

impl LedgerStore {
    // ── Member ────────────────────────────────────────────────────

    pub fn insert_member(&self, m: &Member) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO member (member_id, name, phone, status, join_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&m.member_id, &m.name, m.phone.as_deref(), m.status, m.join_date],
        )?;
        Ok(())
    }

    pub fn get_member(&self, member_id: &str) -> LedgerResult<Option<Member>> {
        let member = self
            .conn
            .query_row(
                "SELECT member_id, name, phone, status, join_date
                 FROM member WHERE member_id = ?1",
                params![member_id],
                member_row_mapper,
            )
            .optional()?;
        Ok(member)
    }

    pub fn list_members(&self) -> LedgerResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(
            "SELECT member_id, name, phone, status, join_date
             FROM member ORDER BY name ASC, member_id ASC",
        )?;
        let rows = stmt.query_map([], member_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Returns false when no such member exists.
    pub fn set_member_status(&self, member_id: &str, status: MemberStatus) -> LedgerResult<bool> {
        let changed = self.conn.execute(
            "UPDATE member SET status = ?1 WHERE member_id = ?2",
            params![status, member_id],
        )?;
        Ok(changed > 0)
    }
}
