//! Error type shared by the stores and the persistence gateway. Every variant
//! is a recoverable condition that the UI renders as a footer message; nothing
//! in here is meant to tear the process down.

use std::fmt;

use thiserror::Error;

/// Which entity an error refers to. Kept separate from the message text so
/// callers can match on it without parsing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Member,
    IssueRecord,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Book => "Book",
            EntityKind::Member => "Member",
            EntityKind::IssueRecord => "Issue record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{kind} ID {id} already exists.")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("{kind} {id} not found.")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} {id} still has active loans.")]
    HasActiveLoans { kind: EntityKind, id: String },

    #[error("No available copies of book {book_id}.")]
    NoCopiesAvailable { book_id: String },

    #[error("Issue record {issue_id} has already been returned.")]
    AlreadyReturned { issue_id: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] StorageError),

    #[error("saved data is unreadable: {0}")]
    CorruptData(String),
}

/// Lower-level failures from the storage backend. Wrapped so the domain
/// error does not leak `rusqlite` into every signature.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Fs(#[from] std::io::Error),
}

impl LibraryError {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        LibraryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, id: &str) -> Self {
        LibraryError::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn active_loans(kind: EntityKind, id: &str) -> Self {
        LibraryError::HasActiveLoans {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// Trim a required text input, rejecting it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LibraryError::InvalidArgument(format!("{field} is required.")))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = LibraryError::active_loans(EntityKind::Member, "M-1");
        assert_eq!(err.to_string(), "Member M-1 still has active loans.");

        let err = LibraryError::not_found(EntityKind::IssueRecord, "I-9");
        assert_eq!(err.to_string(), "Issue record I-9 not found.");
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("Title", "  Dune ").unwrap(), "Dune");
        assert!(matches!(
            required("Title", "   "),
            Err(LibraryError::InvalidArgument(msg)) if msg == "Title is required."
        ));
    }
}
