use crate::library::Library;

/// Clamp a cursor move inside `0..len`.
pub(crate) fn move_index(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = selected as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

/// Backing state for the loans table.
#[derive(Default)]
pub(crate) struct LoansView {
    /// Show every record instead of only active loans.
    pub(crate) show_history: bool,
    pub(crate) selected: usize,
}

impl LoansView {
    /// Ids of the rows currently on screen, in display order.
    pub(crate) fn visible_ids(&self, library: &Library) -> Vec<String> {
        if self.show_history {
            library
                .ledger()
                .all_records()
                .map(|r| r.id().to_string())
                .collect()
        } else {
            library
                .ledger()
                .active_records()
                .map(|r| r.id().to_string())
                .collect()
        }
    }

    pub(crate) fn toggle_history(&mut self) -> bool {
        self.show_history = !self.show_history;
        self.selected = 0;
        self.show_history
    }
}

/// Which list the issue picker is currently showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum PickStep {
    Book,
    Member,
}

/// Two-step picker: choose an available book, then the member receiving it.
pub(crate) struct IssuePicker {
    pub(crate) step: PickStep,
    /// `(id, label)` pairs for books with copies on the shelf.
    pub(crate) books: Vec<(String, String)>,
    pub(crate) members: Vec<(String, String)>,
    pub(crate) selected: usize,
    pub(crate) book_id: Option<String>,
}

impl IssuePicker {
    /// Snapshot the candidates. Books with no available copies are left out.
    pub(crate) fn load(library: &Library) -> Self {
        let books = library
            .catalog()
            .available_books()
            .map(|b| {
                (
                    b.id().to_string(),
                    format!("{b} [{} available]", b.available()),
                )
            })
            .collect();
        let members = library
            .roster()
            .list()
            .map(|m| (m.id().to_string(), m.to_string()))
            .collect();
        Self {
            step: PickStep::Book,
            books,
            members,
            selected: 0,
            book_id: None,
        }
    }

    pub(crate) fn items(&self) -> &[(String, String)] {
        match self.step {
            PickStep::Book => &self.books,
            PickStep::Member => &self.members,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = move_index(self.selected, offset, self.items().len());
    }

    /// Confirm the highlighted entry. Returns `(book_id, member_id)` once both
    /// have been chosen.
    pub(crate) fn choose(&mut self) -> Option<(String, String)> {
        let (id, _) = self.items().get(self.selected)?.clone();
        match self.step {
            PickStep::Book => {
                self.book_id = Some(id);
                self.step = PickStep::Member;
                self.selected = 0;
                None
            }
            PickStep::Member => self.book_id.clone().map(|book_id| (book_id, id)),
        }
    }

    /// Step back from the member list to the book list. Returns `false` when
    /// already on the first step.
    pub(crate) fn back(&mut self) -> bool {
        match self.step {
            PickStep::Book => false,
            PickStep::Member => {
                self.step = PickStep::Book;
                self.selected = self
                    .book_id
                    .take()
                    .and_then(|id| self.books.iter().position(|(b, _)| *b == id))
                    .unwrap_or(0);
                true
            }
        }
    }
}
