use rusqlite::{params, Connection};

use crate::models::Member;

pub(crate) fn fetch_members(conn: &Connection) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, contact
         FROM members
         ORDER BY position",
    )?;

    let members = stmt
        .query_map([], |row| {
            Ok(Member {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                contact: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(members)
}

pub(crate) fn replace_members<'a>(
    conn: &mut Connection,
    members: impl IntoIterator<Item = &'a Member>,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM members", [])?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO members (position, id, name, email, contact)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, member) in members.into_iter().enumerate() {
            stmt.execute(params![
                position as i64,
                member.id,
                member.name,
                member.email,
                member.contact,
            ])?;
            written += 1;
        }
    }
    tx.commit()?;
    Ok(written)
}
