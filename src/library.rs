//! Orchestration context that owns the three stores. The UI and the tests
//! talk to this type; it wires the ledger into the deletion guards and
//! borrows the catalog and roster into lending operations.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::ledger::LendingLedger;
use crate::models::{Book, IssueRecord, Member};
use crate::roster::Roster;

/// Counts shown on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryStats {
    pub total_books: usize,
    pub total_members: usize,
    pub books_issued: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Library {
    catalog: Catalog,
    roster: Roster,
    ledger: LendingLedger,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(catalog: Catalog, roster: Roster, ledger: LendingLedger) -> Self {
        Self {
            catalog,
            roster,
            ledger,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &LendingLedger {
        &self.ledger
    }

    pub fn add_book(
        &mut self,
        id: &str,
        title: &str,
        author: &str,
        publisher: &str,
        quantity: i64,
    ) -> Result<&Book> {
        self.catalog.add(id, title, author, publisher, quantity)
    }

    pub fn update_book(
        &mut self,
        id: &str,
        title: &str,
        author: &str,
        publisher: &str,
        quantity: i64,
    ) -> Result<&Book> {
        self.catalog.update(id, title, author, publisher, quantity)
    }

    pub fn remove_book(&mut self, id: &str) -> Result<Book> {
        self.catalog.remove(id, &self.ledger)
    }

    pub fn add_member(&mut self, id: &str, name: &str, email: &str, contact: &str) -> Result<&Member> {
        self.roster.add(id, name, email, contact)
    }

    pub fn update_member(
        &mut self,
        id: &str,
        name: &str,
        email: &str,
        contact: &str,
    ) -> Result<&Member> {
        self.roster.update(id, name, email, contact)
    }

    pub fn remove_member(&mut self, id: &str) -> Result<Member> {
        self.roster.remove(id, &self.ledger)
    }

    pub fn issue(&mut self, book_id: &str, member_id: &str) -> Result<&IssueRecord> {
        self.ledger
            .issue(book_id, member_id, &mut self.catalog, &self.roster)
    }

    pub fn return_book(&mut self, issue_id: &str) -> Result<&IssueRecord> {
        self.ledger.return_book(issue_id, &mut self.catalog)
    }

    /// Title of the referenced book, or `N/A` once it has left the catalog.
    pub fn book_title(&self, book_id: &str) -> &str {
        self.catalog.get(book_id).map_or("N/A", Book::title)
    }

    /// Name of the referenced member, or `N/A` once they have left the roster.
    pub fn member_name(&self, member_id: &str) -> &str {
        self.roster.get(member_id).map_or("N/A", Member::name)
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            total_books: self.catalog.len(),
            total_members: self.roster.len(),
            books_issued: self.ledger.active_count(),
        }
    }
}
