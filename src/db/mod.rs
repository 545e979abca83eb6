//! Persistence gateway around an embedded SQLite file. Each collection lives
//! in its own table and is written in its own transaction, so a save that
//! fails part-way can leave earlier tables updated and later ones stale.
//!
//! A file that cannot be read back is renamed to `<name>.corrupt` so the next
//! save starts a fresh database instead of failing on the same bytes.

mod books;
mod connection;
mod issues;
mod members;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::{LibraryError, Result, StorageError};
use crate::ledger::LendingLedger;
use crate::library::Library;
use crate::models::{Book, IssueRecord, Member};
use crate::roster::Roster;

use books::{fetch_books, replace_books};
use connection::{open_for_read, open_for_write, tables_present, TABLES};
use issues::{fetch_issue_records, replace_issue_records};
use members::{fetch_members, replace_members};

/// Result of a load. Unreadable data never fails the load; it yields empty
/// stores and a `CorruptData` warning for the caller to show.
#[derive(Debug)]
pub struct Loaded {
    pub catalog: Catalog,
    pub roster: Roster,
    pub ledger: LendingLedger,
    pub warning: Option<LibraryError>,
}

impl Loaded {
    fn empty(warning: Option<LibraryError>) -> Self {
        Self {
            catalog: Catalog::new(),
            roster: Roster::new(),
            ledger: LendingLedger::new(),
            warning,
        }
    }

    /// Hand the stores to a `Library`, returning any warning alongside.
    pub fn into_library(self) -> (Library, Option<LibraryError>) {
        (
            Library::from_parts(self.catalog, self.roster, self.ledger),
            self.warning,
        )
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    path: PathBuf,
}

impl PersistenceGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupt data file is moved: the same path with `.corrupt`
    /// appended.
    pub fn quarantine_path(&self) -> PathBuf {
        quarantine_path(&self.path)
    }

    /// Write all three collections. An existing file that SQLite cannot read
    /// is moved aside once and replaced; every other error propagates as
    /// `LibraryError::Io`. In-memory state is never touched.
    pub fn save(&self, catalog: &Catalog, roster: &Roster, ledger: &LendingLedger) -> Result<()> {
        let mut conn = match open_for_write(&self.path) {
            Ok(conn) => conn,
            Err(StorageError::Sqlite(err)) if is_unreadable(&err) && self.path.exists() => {
                let moved = quarantine(&self.path).map_err(StorageError::from)?;
                warn!(
                    path = %self.path.display(),
                    moved_to = %moved.display(),
                    error = %err,
                    "existing data file is not a usable database, starting a fresh one"
                );
                open_for_write(&self.path)?
            }
            Err(err) => return Err(err.into()),
        };
        let books = replace_books(&mut conn, catalog.list()).map_err(StorageError::from)?;
        let members = replace_members(&mut conn, roster.list()).map_err(StorageError::from)?;
        let records =
            replace_issue_records(&mut conn, ledger.all_records()).map_err(StorageError::from)?;
        info!(
            path = %self.path.display(),
            books,
            members,
            records,
            "library saved"
        );
        Ok(())
    }

    /// Convenience wrapper that saves every store of a `Library`.
    pub fn save_library(&self, library: &Library) -> Result<()> {
        self.save(library.catalog(), library.roster(), library.ledger())
    }

    /// Read all three collections. A missing file is a first run and loads
    /// empty without a warning.
    pub fn load(&self) -> Loaded {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no saved data found, starting empty");
            return Loaded::empty(None);
        }

        match read_all(&self.path) {
            Ok(Some((books, members, records))) => {
                info!(
                    books = books.len(),
                    members = members.len(),
                    records = records.len(),
                    "library loaded"
                );
                Loaded {
                    catalog: Catalog::from_books(books),
                    roster: Roster::from_members(members),
                    ledger: LendingLedger::from_records(records),
                    warning: None,
                }
            }
            Ok(None) => {
                info!(path = %self.path.display(), "saved data file is empty, starting empty");
                Loaded::empty(None)
            }
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "saved data is corrupt, starting empty");
                match quarantine(&self.path) {
                    Ok(moved) => {
                        info!(moved_to = %moved.display(), "corrupt data file moved aside")
                    }
                    Err(err) => warn!(error = %err, "could not move corrupt data file aside"),
                }
                Loaded::empty(Some(LibraryError::CorruptData(reason)))
            }
        }
    }
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Rename an unreadable file out of the way. An older quarantined copy is
/// replaced.
fn quarantine(path: &Path) -> io::Result<PathBuf> {
    let target = quarantine_path(path);
    fs::rename(path, &target)?;
    Ok(target)
}

fn is_unreadable(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

type Collections = (Vec<Book>, Vec<Member>, Vec<IssueRecord>);

/// Pull every table out of the file. `Ok(None)` means the file carries none of
/// our tables yet; `Err` carries a human-readable reason for the warning.
fn read_all(path: &Path) -> std::result::Result<Option<Collections>, String> {
    let conn = open_for_read(path).map_err(|err| err.to_string())?;
    match tables_present(&conn).map_err(|err| err.to_string())? {
        0 => return Ok(None),
        n if n < TABLES.len() => {
            return Err(format!("expected {} tables, found {n}", TABLES.len()));
        }
        _ => {}
    }

    let collections = read_tables(&conn).map_err(|err| err.to_string())?;
    check_copy_counts(&collections.0)?;
    Ok(Some(collections))
}

fn read_tables(conn: &Connection) -> rusqlite::Result<Collections> {
    Ok((
        fetch_books(conn)?,
        fetch_members(conn)?,
        fetch_issue_records(conn)?,
    ))
}

fn check_copy_counts(books: &[Book]) -> std::result::Result<(), String> {
    match books
        .iter()
        .find(|b| b.quantity < 0 || b.issued < 0 || b.issued > b.quantity)
    {
        Some(book) => Err(format!(
            "book {} has {} of {} copies issued",
            book.id, book.issued, book.quantity
        )),
        None => Ok(()),
    }
}
