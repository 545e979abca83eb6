//! The catalog owns every `Book` and is the only place that touches copy
//! counts. Lookups are linear scans over an insertion-ordered `Vec`, which is
//! plenty for a small library and keeps `list()` order stable for the UI.

use tracing::info;

use crate::error::{required, EntityKind, LibraryError, Result};
use crate::ledger::LoanIndex;
use crate::models::Book;

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from persisted books, keeping their stored order.
    pub(crate) fn from_books(books: Vec<Book>) -> Self {
        Self { books }
    }

    pub fn add(
        &mut self,
        id: &str,
        title: &str,
        author: &str,
        publisher: &str,
        quantity: i64,
    ) -> Result<&Book> {
        let id = required("Book ID", id)?;
        let title = required("Title", title)?;
        let author = required("Author", author)?;
        let publisher = required("Publisher", publisher)?;
        if quantity < 0 {
            return Err(LibraryError::InvalidArgument(
                "Quantity cannot be negative.".to_string(),
            ));
        }
        if self.books.iter().any(|b| b.id.eq_ignore_ascii_case(&id)) {
            return Err(LibraryError::duplicate(EntityKind::Book, &id));
        }

        info!(book_id = %id, quantity, "book added");
        self.books.push(Book {
            id,
            title,
            author,
            publisher,
            quantity,
            issued: 0,
        });
        Ok(&self.books[self.books.len() - 1])
    }

    /// Overwrite the editable fields. The id and the issued count are left
    /// alone, and the new quantity may not drop below what is out on loan.
    pub fn update(
        &mut self,
        id: &str,
        title: &str,
        author: &str,
        publisher: &str,
        quantity: i64,
    ) -> Result<&Book> {
        let title = required("Title", title)?;
        let author = required("Author", author)?;
        let publisher = required("Publisher", publisher)?;
        let book = self.find_mut(id)?;
        if quantity < book.issued {
            return Err(LibraryError::InvalidArgument(format!(
                "Quantity cannot be set lower than the number of currently issued books ({}).",
                book.issued
            )));
        }

        book.title = title;
        book.author = author;
        book.publisher = publisher;
        book.quantity = quantity;
        info!(book_id = %book.id, quantity, "book updated");
        Ok(&*book)
    }

    pub fn remove(&mut self, id: &str, loans: &impl LoanIndex) -> Result<Book> {
        let idx = self.position(id)?;
        if loans.has_active_loan_for_book(id) {
            return Err(LibraryError::active_loans(EntityKind::Book, id));
        }
        let book = self.books.remove(idx);
        info!(book_id = %book.id, "book removed");
        Ok(book)
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn available_copies(&self, id: &str) -> Result<i64> {
        self.get(id)
            .map(Book::available)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))
    }

    /// Take one copy off the shelf. Returns `false` without touching the
    /// counts when every copy is already out.
    pub fn try_issue_one_copy(&mut self, id: &str) -> Result<bool> {
        let book = self.find_mut(id)?;
        if book.available() > 0 {
            book.issued += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Put one copy back. A book with nothing issued stays at zero.
    pub fn return_one_copy(&mut self, id: &str) -> Result<()> {
        let book = self.find_mut(id)?;
        if book.issued > 0 {
            book.issued -= 1;
        }
        Ok(())
    }

    /// Every book in insertion order. The iterator is `Clone`, so callers
    /// can walk it more than once.
    pub fn list(&self) -> std::slice::Iter<'_, Book> {
        self.books.iter()
    }

    /// Books that still have at least one copy to lend, for the issue picker.
    pub fn available_books(&self) -> impl Iterator<Item = &Book> + Clone {
        self.books.iter().filter(|b| b.available() > 0)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Book> {
        self.books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoLoans;

    impl LoanIndex for NoLoans {
        fn has_active_loan_for_book(&self, _book_id: &str) -> bool {
            false
        }

        fn has_active_loan_for_member(&self, _member_id: &str) -> bool {
            false
        }
    }

    struct AllOnLoan;

    impl LoanIndex for AllOnLoan {
        fn has_active_loan_for_book(&self, _book_id: &str) -> bool {
            true
        }

        fn has_active_loan_for_member(&self, _member_id: &str) -> bool {
            true
        }
    }

    fn catalog_with(id: &str, quantity: i64) -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add(id, "Dune", "Frank Herbert", "Chilton", quantity)
            .unwrap();
        catalog
    }

    #[test]
    fn add_starts_with_nothing_issued() {
        let catalog = catalog_with("B-1", 3);
        let book = catalog.get("B-1").unwrap();
        assert_eq!(book.issued(), 0);
        assert_eq!(book.available(), 3);
        assert_eq!(book.to_string(), "Dune by Frank Herbert");
    }

    #[test]
    fn add_rejects_duplicate_ids_ignoring_case() {
        let mut catalog = catalog_with("B-1", 1);
        let err = catalog.add("b-1", "Emma", "Austen", "Murray", 1).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateId { kind: EntityKind::Book, .. }));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn add_validates_fields() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.add("B-1", "Dune", "", "Chilton", 1),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(matches!(
            catalog.add("B-1", "Dune", "Herbert", "Chilton", -1),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn zero_quantity_books_are_allowed_but_never_issue() {
        let mut catalog = catalog_with("B-0", 0);
        assert_eq!(catalog.available_copies("B-0").unwrap(), 0);
        assert!(!catalog.try_issue_one_copy("B-0").unwrap());
        assert_eq!(catalog.get("B-0").unwrap().issued(), 0);
    }

    #[test]
    fn update_cannot_shrink_below_issued() {
        let mut catalog = catalog_with("B-1", 2);
        assert!(catalog.try_issue_one_copy("B-1").unwrap());
        assert!(catalog.try_issue_one_copy("B-1").unwrap());

        let err = catalog
            .update("B-1", "Dune", "Frank Herbert", "Chilton", 1)
            .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidArgument(_)));
        assert_eq!(catalog.get("B-1").unwrap().quantity(), 2);

        let book = catalog
            .update("B-1", "Dune Messiah", "Frank Herbert", "Putnam", 2)
            .unwrap();
        assert_eq!(book.title(), "Dune Messiah");
        assert_eq!(book.issued(), 2);
    }

    #[test]
    fn update_unknown_book_is_not_found() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.update("B-9", "a", "b", "c", 1),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn issue_and_return_keep_counts_in_range() {
        let mut catalog = catalog_with("B-1", 1);
        assert!(catalog.try_issue_one_copy("B-1").unwrap());
        assert!(!catalog.try_issue_one_copy("B-1").unwrap());
        assert_eq!(catalog.get("B-1").unwrap().issued(), 1);

        catalog.return_one_copy("B-1").unwrap();
        catalog.return_one_copy("B-1").unwrap();
        assert_eq!(catalog.get("B-1").unwrap().issued(), 0);
    }

    #[test]
    fn copy_accounting_on_unknown_book_is_not_found() {
        let mut catalog = Catalog::new();
        assert!(catalog.try_issue_one_copy("nope").is_err());
        assert!(catalog.return_one_copy("nope").is_err());
        assert!(catalog.available_copies("nope").is_err());
    }

    #[test]
    fn remove_respects_loan_guard() {
        let mut catalog = catalog_with("B-1", 1);
        assert!(matches!(
            catalog.remove("B-1", &AllOnLoan),
            Err(LibraryError::HasActiveLoans { kind: EntityKind::Book, .. })
        ));
        assert_eq!(catalog.len(), 1);

        let removed = catalog.remove("B-1", &NoLoans).unwrap();
        assert_eq!(removed.id(), "B-1");
        assert_eq!(catalog.list().count(), 0);
        assert!(matches!(
            catalog.remove("B-1", &NoLoans),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn list_keeps_insertion_order_and_restarts() {
        let mut catalog = Catalog::new();
        for id in ["C", "A", "B"] {
            catalog.add(id, "t", "a", "p", 1).unwrap();
        }
        let iter = catalog.list();
        let first: Vec<_> = iter.clone().map(Book::id).collect();
        let second: Vec<_> = iter.map(Book::id).collect();
        assert_eq!(first, ["C", "A", "B"]);
        assert_eq!(first, second);
    }
}
