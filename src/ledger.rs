//! Issue/return bookkeeping. The ledger owns every `IssueRecord` and only ever
//! refers to books and members by id, reading their live state from the
//! catalog and roster it is handed for each operation.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::IssueRecord;
use crate::roster::Roster;

/// Prefix for generated issue ids (`I-1`, `I-2`, ...).
const ISSUE_ID_PREFIX: &str = "I-";

/// Read-only view of outstanding loans. The catalog and roster take this
/// instead of the whole ledger so they can guard deletions without being able
/// to change lending state.
pub trait LoanIndex {
    fn has_active_loan_for_book(&self, book_id: &str) -> bool;
    fn has_active_loan_for_member(&self, member_id: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct LendingLedger {
    records: Vec<IssueRecord>,
    next_seq: u64,
}

impl Default for LendingLedger {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_seq: 1,
        }
    }
}

impl LendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ledger from persisted records. The id counter resumes past
    /// the highest numeric suffix already in use, wrapping to 1 if that suffix
    /// is `u64::MAX`.
    pub(crate) fn from_records(records: Vec<IssueRecord>) -> Self {
        let highest = records
            .iter()
            .filter_map(|r| r.id.strip_prefix(ISSUE_ID_PREFIX))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next_seq = highest.checked_add(1).unwrap_or(1);
        debug!(records = records.len(), next_seq, "ledger restored");
        Self { records, next_seq }
    }

    /// Lend one copy of `book_id` to `member_id`.
    ///
    /// Both ids must resolve before any state changes. The copy count and the
    /// new record are updated together: once the catalog hands out a copy
    /// nothing below can fail.
    pub fn issue(
        &mut self,
        book_id: &str,
        member_id: &str,
        catalog: &mut Catalog,
        roster: &Roster,
    ) -> Result<&IssueRecord> {
        if catalog.get(book_id).is_none() {
            return Err(LibraryError::not_found(EntityKind::Book, book_id));
        }
        if roster.get(member_id).is_none() {
            return Err(LibraryError::not_found(EntityKind::Member, member_id));
        }
        if !catalog.try_issue_one_copy(book_id)? {
            return Err(LibraryError::NoCopiesAvailable {
                book_id: book_id.to_string(),
            });
        }

        let id = self.next_id();
        info!(issue_id = %id, book_id, member_id, "book issued");
        self.records.push(IssueRecord {
            id,
            book_id: book_id.to_string(),
            member_id: member_id.to_string(),
            issued_at: Utc::now(),
            returned_at: None,
        });
        Ok(&self.records[self.records.len() - 1])
    }

    /// Close an active record and put its copy back on the shelf.
    pub fn return_book(&mut self, issue_id: &str, catalog: &mut Catalog) -> Result<&IssueRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == issue_id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::IssueRecord, issue_id))?;
        if record.returned_at.is_some() {
            return Err(LibraryError::AlreadyReturned {
                issue_id: issue_id.to_string(),
            });
        }

        // Clamp so a clock step backwards cannot put the return before the issue.
        record.returned_at = Some(Utc::now().max(record.issued_at));
        if let Err(err) = catalog.return_one_copy(&record.book_id) {
            warn!(
                issue_id,
                book_id = %record.book_id,
                error = %err,
                "returned a record whose book is no longer in the catalog"
            );
        }
        info!(issue_id, book_id = %record.book_id, "book returned");
        Ok(&*record)
    }

    pub fn get(&self, issue_id: &str) -> Option<&IssueRecord> {
        self.records.iter().find(|r| r.id == issue_id)
    }

    pub fn active_records(&self) -> impl Iterator<Item = &IssueRecord> + Clone {
        self.records.iter().filter(|r| r.is_active())
    }

    pub fn all_records(&self) -> std::slice::Iter<'_, IssueRecord> {
        self.records.iter()
    }

    pub fn active_count(&self) -> usize {
        self.active_records().count()
    }

    fn next_id(&mut self) -> String {
        loop {
            let candidate = format!("{ISSUE_ID_PREFIX}{}", self.next_seq);
            // Wraps to 1 at the top; ids already present are skipped.
            self.next_seq = self.next_seq.checked_add(1).unwrap_or(1);
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

impl LoanIndex for LendingLedger {
    fn has_active_loan_for_book(&self, book_id: &str) -> bool {
        self.active_records().any(|r| r.book_id == book_id)
    }

    fn has_active_loan_for_member(&self, member_id: &str) -> bool {
        self.active_records().any(|r| r.member_id == member_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::LoanState;

    fn stores(quantity: i64) -> (Catalog, Roster) {
        let mut catalog = Catalog::new();
        catalog
            .add("B-1", "Dune", "Frank Herbert", "Chilton", quantity)
            .unwrap();
        let mut roster = Roster::new();
        roster.add("M-1", "Ada", "ada@example.com", "555").unwrap();
        (catalog, roster)
    }

    #[test]
    fn issue_until_shelf_is_empty() {
        let (mut catalog, roster) = stores(2);
        let mut ledger = LendingLedger::new();

        ledger.issue("B-1", "M-1", &mut catalog, &roster).unwrap();
        ledger.issue("B-1", "M-1", &mut catalog, &roster).unwrap();
        assert_eq!(catalog.get("B-1").unwrap().issued(), 2);
        assert_eq!(catalog.available_copies("B-1").unwrap(), 0);

        let err = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap_err();
        assert!(matches!(err, LibraryError::NoCopiesAvailable { .. }));
        assert_eq!(catalog.get("B-1").unwrap().issued(), 2);
        assert_eq!(ledger.all_records().count(), 2);
    }

    #[test]
    fn issue_requires_known_book_and_member() {
        let (mut catalog, roster) = stores(1);
        let mut ledger = LendingLedger::new();

        assert!(matches!(
            ledger.issue("B-9", "M-1", &mut catalog, &roster),
            Err(LibraryError::NotFound { kind: EntityKind::Book, .. })
        ));
        assert!(matches!(
            ledger.issue("B-1", "M-9", &mut catalog, &roster),
            Err(LibraryError::NotFound { kind: EntityKind::Member, .. })
        ));
        assert_eq!(catalog.get("B-1").unwrap().issued(), 0);
        assert_eq!(ledger.all_records().count(), 0);
    }

    #[test]
    fn return_restores_copy_once() {
        let (mut catalog, roster) = stores(1);
        let mut ledger = LendingLedger::new();
        let issue_id = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();

        let record = ledger.return_book(&issue_id, &mut catalog).unwrap();
        assert_eq!(record.state(), LoanState::Returned);
        assert!(record.returned_at().unwrap() >= record.issued_at());
        assert_eq!(catalog.get("B-1").unwrap().issued(), 0);

        assert!(matches!(
            ledger.return_book(&issue_id, &mut catalog),
            Err(LibraryError::AlreadyReturned { .. })
        ));
        assert_eq!(catalog.get("B-1").unwrap().issued(), 0);
        assert!(matches!(
            ledger.return_book("I-404", &mut catalog),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn return_tolerates_missing_book() {
        let (mut catalog, roster) = stores(1);
        let mut ledger = LendingLedger::new();
        let issue_id = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();

        let mut emptied = Catalog::new();
        let record = ledger.return_book(&issue_id, &mut emptied).unwrap();
        assert!(!record.is_active());
    }

    #[test]
    fn loan_index_tracks_active_records_only() {
        let (mut catalog, roster) = stores(1);
        let mut ledger = LendingLedger::new();
        let issue_id = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();
        assert!(ledger.has_active_loan_for_book("B-1"));
        assert!(ledger.has_active_loan_for_member("M-1"));
        assert_eq!(ledger.active_count(), 1);

        ledger.return_book(&issue_id, &mut catalog).unwrap();
        assert!(!ledger.has_active_loan_for_book("B-1"));
        assert!(!ledger.has_active_loan_for_member("M-1"));
        assert_eq!(ledger.active_records().count(), 0);
        assert_eq!(ledger.all_records().count(), 1);
    }

    #[test]
    fn ids_stay_unique_after_restore() {
        let (mut catalog, roster) = stores(10);
        let mut ledger = LendingLedger::new();
        for _ in 0..3 {
            ledger.issue("B-1", "M-1", &mut catalog, &roster).unwrap();
        }

        let mut restored = LendingLedger::from_records(ledger.all_records().cloned().collect());
        let fresh = restored
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();
        assert_eq!(fresh, "I-4");

        let ids: HashSet<_> = restored.all_records().map(IssueRecord::id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn generated_ids_skip_foreign_ids_already_present() {
        let (mut catalog, roster) = stores(5);
        let legacy = IssueRecord {
            id: "I-1700000000000".to_string(),
            book_id: "B-1".to_string(),
            member_id: "M-1".to_string(),
            issued_at: Utc::now(),
            returned_at: Some(Utc::now()),
        };
        let mut ledger = LendingLedger::from_records(vec![legacy]);
        let id = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();
        assert_eq!(id, "I-1700000000001");
    }

    #[test]
    fn counter_wraps_instead_of_overflowing() {
        let (mut catalog, roster) = stores(5);
        let record = |id: &str| IssueRecord {
            id: id.to_string(),
            book_id: "B-1".to_string(),
            member_id: "M-1".to_string(),
            issued_at: Utc::now(),
            returned_at: Some(Utc::now()),
        };
        let mut ledger =
            LendingLedger::from_records(vec![record("I-18446744073709551615"), record("I-1")]);

        let id = ledger
            .issue("B-1", "M-1", &mut catalog, &roster)
            .unwrap()
            .id()
            .to_string();
        assert_eq!(id, "I-2");
    }
}
