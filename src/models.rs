//! Domain models owned by the three stores. They stay plain data holders:
//! the rules about who may change which field live in `catalog`, `roster` and
//! `ledger`, so the fields here are read-only outside the crate.

use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A title held by the library. `quantity` counts every copy owned while
/// `issued` counts the copies currently out on loan.
pub struct Book {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) publisher: String,
    pub(crate) quantity: i64,
    pub(crate) issued: i64,
}

impl Book {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn issued(&self) -> i64 {
        self.issued
    }

    /// Copies still on the shelf. Derived on every call, never stored.
    pub fn available(&self) -> i64 {
        self.quantity - self.issued
    }
}

impl fmt::Display for Book {
    /// `Title by Author`, the form used in pickers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A registered borrower.
pub struct Member {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) contact: String,
}

impl Member {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One issuance event. Books and members are referenced by id only so the
/// ledger always reads their current state from the owning store.
pub struct IssueRecord {
    pub(crate) id: String,
    pub(crate) book_id: String,
    pub(crate) member_id: String,
    pub(crate) issued_at: DateTime<Utc>,
    pub(crate) returned_at: Option<DateTime<Utc>>,
}

/// Lifecycle of an issue record. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Active,
    Returned,
}

impl IssueRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn state(&self) -> LoanState {
        if self.returned_at.is_some() {
            LoanState::Returned
        } else {
            LoanState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}
