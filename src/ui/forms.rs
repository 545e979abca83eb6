use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, Member};

/// One labelled text input inside a modal form.
#[derive(Clone)]
pub(crate) struct Field {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    /// Only ASCII digits are accepted.
    pub(crate) numeric: bool,
    /// Shown but not editable (record ids while editing).
    pub(crate) locked: bool,
}

impl Field {
    fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            numeric: false,
            locked: false,
        }
    }

    fn number(label: &'static str) -> Self {
        Self {
            numeric: true,
            ..Self::text(label)
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Form state shared by the book and member dialogs. Fields are addressed by
/// position; the constructors below fix the order.
#[derive(Clone)]
pub(crate) struct RecordForm {
    pub(crate) fields: Vec<Field>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

const BOOK_ID: usize = 0;
const BOOK_TITLE: usize = 1;
const BOOK_AUTHOR: usize = 2;
const BOOK_PUBLISHER: usize = 3;
const BOOK_QUANTITY: usize = 4;

const MEMBER_ID: usize = 0;
const MEMBER_NAME: usize = 1;
const MEMBER_EMAIL: usize = 2;
const MEMBER_CONTACT: usize = 3;

/// Typed values pulled out of the book form.
#[derive(Debug)]
pub(crate) struct BookInput {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) publisher: String,
    pub(crate) quantity: i64,
}

#[derive(Debug)]
pub(crate) struct MemberInput {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) contact: String,
}

impl RecordForm {
    fn new(fields: Vec<Field>) -> Self {
        let mut form = Self {
            fields,
            active: 0,
            error: None,
        };
        form.skip_locked(1);
        form
    }

    pub(crate) fn new_book() -> Self {
        Self::new(vec![
            Field::text("Book ID"),
            Field::text("Title"),
            Field::text("Author"),
            Field::text("Publisher"),
            Field::number("Quantity"),
        ])
    }

    pub(crate) fn from_book(book: &Book) -> Self {
        Self::new(vec![
            Field::text("Book ID").with_value(book.id()).locked(),
            Field::text("Title").with_value(book.title()),
            Field::text("Author").with_value(book.author()),
            Field::text("Publisher").with_value(book.publisher()),
            Field::number("Quantity").with_value(book.quantity().to_string()),
        ])
    }

    pub(crate) fn new_member() -> Self {
        Self::new(vec![
            Field::text("Member ID"),
            Field::text("Name"),
            Field::text("Email"),
            Field::text("Contact"),
        ])
    }

    pub(crate) fn from_member(member: &Member) -> Self {
        Self::new(vec![
            Field::text("Member ID").with_value(member.id()).locked(),
            Field::text("Name").with_value(member.name()),
            Field::text("Email").with_value(member.email()),
            Field::text("Contact").with_value(member.contact()),
        ])
    }

    /// Move focus forward, wrapping and skipping locked fields.
    pub(crate) fn next_field(&mut self) {
        self.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, direction: isize) {
        let len = self.fields.len() as isize;
        self.active = (self.active as isize + direction).rem_euclid(len) as usize;
        self.skip_locked(direction);
    }

    fn skip_locked(&mut self, direction: isize) {
        let len = self.fields.len() as isize;
        for _ in 0..len {
            if !self.fields[self.active].locked {
                return;
            }
            self.active = (self.active as isize + direction).rem_euclid(len) as usize;
        }
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = &mut self.fields[self.active];
        let allowed = if field.numeric {
            ch.is_ascii_digit()
        } else {
            !ch.is_control()
        };
        if !allowed || field.locked {
            return false;
        }
        field.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = &mut self.fields[self.active];
        if !field.locked {
            field.value.pop();
        }
    }

    pub(crate) fn book_input(&self) -> Result<BookInput> {
        let quantity_raw = self.fields[BOOK_QUANTITY].value.trim();
        if quantity_raw.is_empty() {
            return Err(anyhow!("Quantity is required."));
        }
        let quantity = quantity_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Quantity must be a whole number."))?;
        Ok(BookInput {
            id: self.value(BOOK_ID),
            title: self.value(BOOK_TITLE),
            author: self.value(BOOK_AUTHOR),
            publisher: self.value(BOOK_PUBLISHER),
            quantity,
        })
    }

    pub(crate) fn member_input(&self) -> MemberInput {
        MemberInput {
            id: self.value(MEMBER_ID),
            name: self.value(MEMBER_NAME),
            email: self.value(MEMBER_EMAIL),
            contact: self.value(MEMBER_CONTACT),
        }
    }

    fn value(&self, index: usize) -> String {
        self.fields[index].value.clone()
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = self.active == index;

        let display = if field.value.is_empty() {
            "<required>".to_string()
        } else {
            field.value.clone()
        };

        let style = if field.locked {
            Style::default().fg(Color::Gray)
        } else if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Column where the cursor belongs for the active field.
    pub(crate) fn cursor_offset(&self) -> usize {
        let field = &self.fields[self.active];
        field.label.len() + 2 + field.value.chars().count()
    }
}

/// What a pending delete confirmation refers to.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteTarget {
    Book,
    Member,
}

#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) target: DeleteTarget,
    pub(crate) id: String,
    pub(crate) label: String,
}

impl ConfirmDelete {
    pub(crate) fn book(book: &Book) -> Self {
        Self {
            target: DeleteTarget::Book,
            id: book.id().to_string(),
            label: book.to_string(),
        }
    }

    pub(crate) fn member(member: &Member) -> Self {
        Self {
            target: DeleteTarget::Member,
            id: member.id().to_string(),
            label: member.to_string(),
        }
    }
}

/// Return confirmation, with the names resolved when the dialog opened.
#[derive(Clone)]
pub(crate) struct ConfirmReturn {
    pub(crate) issue_id: String,
    pub(crate) book_title: String,
    pub(crate) member_name: String,
}

/// Tracks the user's choice in the "save before exiting?" dialog.
pub(crate) struct ConfirmExit {
    pub(crate) selection: ExitChoice,
}

impl ConfirmExit {
    pub(crate) fn new() -> Self {
        Self {
            selection: ExitChoice::SaveAndQuit,
        }
    }

    /// Move the selection forward (Save → Quit → Cancel).
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            ExitChoice::SaveAndQuit => ExitChoice::Quit,
            ExitChoice::Quit => ExitChoice::Cancel,
            ExitChoice::Cancel => ExitChoice::SaveAndQuit,
        };
    }

    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            ExitChoice::SaveAndQuit => ExitChoice::Cancel,
            ExitChoice::Quit => ExitChoice::SaveAndQuit,
            ExitChoice::Cancel => ExitChoice::Quit,
        };
    }

    pub(crate) fn labels(&self) -> [&'static str; 3] {
        ["Save & Quit", "Quit Without Saving", "Cancel"]
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            ExitChoice::SaveAndQuit => 0,
            ExitChoice::Quit => 1,
            ExitChoice::Cancel => 2,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ExitChoice {
    SaveAndQuit,
    Quit,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut RecordForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn book_form_parses_quantity() {
        let mut form = RecordForm::new_book();
        for value in ["B-1", "Dune", "Herbert", "Chilton"] {
            type_str(&mut form, value);
            form.next_field();
        }
        type_str(&mut form, "3x");

        let input = form.book_input().unwrap();
        assert_eq!(input.id, "B-1");
        assert_eq!(input.publisher, "Chilton");
        assert_eq!(input.quantity, 3);
    }

    #[test]
    fn missing_quantity_is_reported() {
        let form = RecordForm::new_book();
        let err = form.book_input().unwrap_err();
        assert_eq!(err.to_string(), "Quantity is required.");
    }

    #[test]
    fn edit_form_skips_locked_id() {
        let mut catalog = crate::catalog::Catalog::new();
        let book = catalog.add("B-1", "Dune", "Herbert", "Chilton", 2).unwrap();
        let mut form = RecordForm::from_book(book);
        assert_eq!(form.active, BOOK_TITLE);

        form.previous_field();
        assert_eq!(form.active, BOOK_QUANTITY);
        form.next_field();
        assert_eq!(form.active, BOOK_TITLE);
    }

    #[test]
    fn exit_choice_cycles() {
        let mut confirm = ConfirmExit::new();
        confirm.previous();
        assert_eq!(confirm.selection, ExitChoice::Cancel);
        confirm.next();
        confirm.next();
        assert_eq!(confirm.selected_index(), 1);
    }
}
