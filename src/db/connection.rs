use std::fs;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::StorageError;

/// Tables the gateway owns, in the order they are written.
pub(crate) const TABLES: [&str; 3] = ["books", "members", "issue_records"];

/// Open (creating if needed) the database for writing and make sure every
/// table exists.
pub(crate) fn open_for_write(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Open an existing database without creating or migrating anything, so a
/// load never leaves a file behind on first run.
pub(crate) fn open_for_read(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

/// Count how many of our tables exist. Zero means the file holds no saved
/// state yet; a partial set means something else wrote to it.
pub(crate) fn tables_present(conn: &Connection) -> rusqlite::Result<usize> {
    let mut present = 0;
    for table in TABLES {
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        if found > 0 {
            present += 1;
        }
    }
    Ok(present)
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            position INTEGER NOT NULL,
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            publisher TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            issued INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS members (
            position INTEGER NOT NULL,
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            contact TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS issue_records (
            position INTEGER NOT NULL,
            id TEXT PRIMARY KEY NOT NULL,
            book_id TEXT NOT NULL,
            member_id TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            returned_at TEXT
        )",
        [],
    )?;

    Ok(())
}
