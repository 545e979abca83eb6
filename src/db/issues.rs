use rusqlite::{params, Connection};

use crate::models::IssueRecord;

/// Load issue records. A NULL `returned_at` maps to an active loan; any
/// timestamp text that does not parse surfaces as a conversion error.
pub(crate) fn fetch_issue_records(conn: &Connection) -> rusqlite::Result<Vec<IssueRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, book_id, member_id, issued_at, returned_at
         FROM issue_records
         ORDER BY position",
    )?;

    let records = stmt
        .query_map([], |row| {
            Ok(IssueRecord {
                id: row.get(0)?,
                book_id: row.get(1)?,
                member_id: row.get(2)?,
                issued_at: row.get(3)?,
                returned_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub(crate) fn replace_issue_records<'a>(
    conn: &mut Connection,
    records: impl IntoIterator<Item = &'a IssueRecord>,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM issue_records", [])?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO issue_records (position, id, book_id, member_id, issued_at, returned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (position, record) in records.into_iter().enumerate() {
            stmt.execute(params![
                position as i64,
                record.id,
                record.book_id,
                record.member_id,
                record.issued_at,
                record.returned_at,
            ])?;
            written += 1;
        }
    }
    tx.commit()?;
    Ok(written)
}
