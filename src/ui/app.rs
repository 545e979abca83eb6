use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs,
    Wrap,
};
use ratatui::Frame;
use tracing::{info, warn};

use crate::db::PersistenceGateway;
use crate::error::LibraryError;
use crate::library::Library;
use crate::models::{Book, IssueRecord, Member};

use super::forms::{ConfirmDelete, ConfirmExit, ConfirmReturn, DeleteTarget, ExitChoice, RecordForm};
use super::helpers::{centered_rect, format_timestamp, surface_error};
use super::screens::{move_index, IssuePicker, LoansView, PickStep};

/// Height of the tab bar at the top of every screen.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// High-level navigation states, one per tab.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Screen {
    Home,
    Books,
    Members,
    Loans,
}

impl Screen {
    const ALL: [Screen; 4] = [Screen::Home, Screen::Books, Screen::Members, Screen::Loans];

    fn title(self) -> &'static str {
        match self {
            Screen::Home => "1 Home",
            Screen::Books => "2 Books",
            Screen::Members => "3 Members",
            Screen::Loans => "4 Issue/Return",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn offset(self, by: isize) -> Screen {
        let len = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + by).rem_euclid(len) as usize]
    }
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    AddingBook(RecordForm),
    EditingBook { id: String, form: RecordForm },
    AddingMember(RecordForm),
    EditingMember { id: String, form: RecordForm },
    ConfirmDelete(ConfirmDelete),
    Issuing(IssuePicker),
    ConfirmReturn(ConfirmReturn),
    ConfirmExit(ConfirmExit),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    gateway: PersistenceGateway,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    book_selected: usize,
    member_selected: usize,
    loans: LoansView,
}

impl App {
    pub fn new(library: Library, gateway: PersistenceGateway) -> Self {
        Self {
            library,
            gateway,
            screen: Screen::Home,
            mode: Mode::Normal,
            status: None,
            book_selected: 0,
            member_selected: 0,
            loans: LoansView::default(),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Show a startup warning when saved data could not be read.
    pub fn report_load_warning(&mut self, warning: &LibraryError) {
        let moved = self.gateway.quarantine_path();
        let text = if moved.exists() {
            format!(
                "Error loading data: {warning}. Old file kept at {}. Starting with empty lists.",
                moved.display()
            )
        } else {
            format!("Error loading data: {warning}. Starting with empty lists.")
        };
        self.set_status(text, StatusKind::Error);
    }

    /// Feed one key press through the state machine. Returns `true` once the
    /// user has confirmed they want to leave.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code),
            Mode::AddingBook(mut form) => {
                if self.drive_form(code, &mut form, "Add book cancelled.", Self::save_new_book) {
                    Mode::AddingBook(form)
                } else {
                    Mode::Normal
                }
            }
            Mode::EditingBook { id, mut form } => {
                let keep_open = self.drive_form(code, &mut form, "Edit cancelled.", |app, form| {
                    app.save_existing_book(&id, form)
                });
                if keep_open {
                    Mode::EditingBook { id, form }
                } else {
                    Mode::Normal
                }
            }
            Mode::AddingMember(mut form) => {
                if self.drive_form(code, &mut form, "Add member cancelled.", Self::save_new_member)
                {
                    Mode::AddingMember(form)
                } else {
                    Mode::Normal
                }
            }
            Mode::EditingMember { id, mut form } => {
                let keep_open = self.drive_form(code, &mut form, "Edit cancelled.", |app, form| {
                    app.save_existing_member(&id, form)
                });
                if keep_open {
                    Mode::EditingMember { id, form }
                } else {
                    Mode::Normal
                }
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Issuing(picker) => self.handle_issue_picker(code, picker),
            Mode::ConfirmReturn(confirm) => self.handle_confirm_return(code, confirm),
            Mode::ConfirmExit(confirm) => self.handle_confirm_exit(code, confirm, &mut exit),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Mode::ConfirmExit(ConfirmExit::new()),
            KeyCode::Char('1') => self.switch_screen(Screen::Home),
            KeyCode::Char('2') => self.switch_screen(Screen::Books),
            KeyCode::Char('3') => self.switch_screen(Screen::Members),
            KeyCode::Char('4') => self.switch_screen(Screen::Loans),
            KeyCode::Tab | KeyCode::Right => self.switch_screen(self.screen.offset(1)),
            KeyCode::BackTab | KeyCode::Left => self.switch_screen(self.screen.offset(-1)),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Char('s') => self.save_with_status(),
            _ => return self.handle_screen_key(code),
        }
        Mode::Normal
    }

    /// Shortcuts that only make sense on a particular tab.
    fn handle_screen_key(&mut self, code: KeyCode) -> Mode {
        match (self.screen, code) {
            (Screen::Books, KeyCode::Char('a')) => Mode::AddingBook(RecordForm::new_book()),
            (Screen::Books, KeyCode::Char('e')) => match self.current_book() {
                Some(book) => Mode::EditingBook {
                    id: book.id().to_string(),
                    form: RecordForm::from_book(book),
                },
                None => self.no_selection("Please select a book to update."),
            },
            (Screen::Books, KeyCode::Char('d')) => match self.current_book() {
                Some(book) => Mode::ConfirmDelete(ConfirmDelete::book(book)),
                None => self.no_selection("Please select a book to delete."),
            },
            (Screen::Members, KeyCode::Char('a')) => Mode::AddingMember(RecordForm::new_member()),
            (Screen::Members, KeyCode::Char('e')) => match self.current_member() {
                Some(member) => Mode::EditingMember {
                    id: member.id().to_string(),
                    form: RecordForm::from_member(member),
                },
                None => self.no_selection("Please select a member to update."),
            },
            (Screen::Members, KeyCode::Char('d')) => match self.current_member() {
                Some(member) => Mode::ConfirmDelete(ConfirmDelete::member(member)),
                None => self.no_selection("Please select a member to delete."),
            },
            (Screen::Loans, KeyCode::Char('i')) => self.open_issue_picker(),
            (Screen::Loans, KeyCode::Char('r')) => match self.current_loan() {
                Some(record) => Mode::ConfirmReturn(ConfirmReturn {
                    issue_id: record.id().to_string(),
                    book_title: self.library.book_title(record.book_id()).to_string(),
                    member_name: self.library.member_name(record.member_id()).to_string(),
                }),
                None => self.no_selection("Please select an issued book to return."),
            },
            (Screen::Loans, KeyCode::Char('h')) => {
                let message = if self.loans.toggle_history() {
                    "Showing full loan history."
                } else {
                    "Showing active loans."
                };
                self.set_status(message, StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::Normal,
        }
    }

    /// Shared key handling for the book and member dialogs. Returns whether
    /// the form should stay open.
    fn drive_form<F>(
        &mut self,
        code: KeyCode,
        form: &mut RecordForm,
        cancel_message: &str,
        submit: F,
    ) -> bool
    where
        F: FnOnce(&mut Self, &RecordForm) -> Result<()>,
    {
        match code {
            KeyCode::Esc => {
                self.set_status(cancel_message, StatusKind::Info);
                return false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match submit(self, form) {
                Ok(()) => return false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        true
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = match confirm.target {
                    DeleteTarget::Book => self.library.remove_book(&confirm.id).map(|_| ()),
                    DeleteTarget::Member => self.library.remove_member(&confirm.id).map(|_| ()),
                };
                match result {
                    Ok(()) => {
                        self.clamp_selections();
                        self.set_status(format!("Deleted {}.", confirm.label), StatusKind::Info);
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn open_issue_picker(&mut self) -> Mode {
        let picker = IssuePicker::load(&self.library);
        if picker.books.is_empty() {
            self.no_selection("No books with available copies.")
        } else if picker.members.is_empty() {
            self.no_selection("No members registered yet.")
        } else {
            Mode::Issuing(picker)
        }
    }

    fn handle_issue_picker(&mut self, code: KeyCode, mut picker: IssuePicker) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
                if !picker.back() {
                    self.set_status("Issue cancelled.", StatusKind::Info);
                    return Mode::Normal;
                }
            }
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-PAGE_STEP),
            KeyCode::PageDown => picker.move_selection(PAGE_STEP),
            KeyCode::Enter | KeyCode::Right => {
                if let Some((book_id, member_id)) = picker.choose() {
                    match self.library.issue(&book_id, &member_id) {
                        Ok(record) => {
                            let message = format!("Book issued successfully! ({})", record.id());
                            self.set_status(message, StatusKind::Info);
                        }
                        Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                    }
                    return Mode::Normal;
                }
            }
            _ => {}
        }
        Mode::Issuing(picker)
    }

    fn handle_confirm_return(&mut self, code: KeyCode, confirm: ConfirmReturn) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Return cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.library.return_book(&confirm.issue_id) {
                    Ok(_) => {
                        self.clamp_selections();
                        self.set_status("Book returned successfully!", StatusKind::Info);
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmReturn(confirm),
        }
    }

    fn handle_confirm_exit(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmExit,
        exit: &mut bool,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                confirm.previous();
                Mode::ConfirmExit(confirm)
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                confirm.next();
                Mode::ConfirmExit(confirm)
            }
            KeyCode::Enter => match confirm.selection {
                ExitChoice::SaveAndQuit => match self.save() {
                    Ok(()) => {
                        *exit = true;
                        Mode::Normal
                    }
                    Err(err) => {
                        self.report_save_error(&err);
                        Mode::ConfirmExit(confirm)
                    }
                },
                ExitChoice::Quit => {
                    info!("exiting without saving");
                    *exit = true;
                    Mode::Normal
                }
                ExitChoice::Cancel => Mode::Normal,
            },
            _ => Mode::ConfirmExit(confirm),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match self.screen {
            Screen::Home => self.draw_home(frame, chunks[1]),
            Screen::Books => self.draw_books(frame, chunks[1]),
            Screen::Members => self.draw_members(frame, chunks[1]),
            Screen::Loans => self.draw_loans(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingBook(form) => self.draw_form(frame, area, "Add New Book", form),
            Mode::EditingBook { form, .. } => self.draw_form(frame, area, "Update Book", form),
            Mode::AddingMember(form) => self.draw_form(frame, area, "Add New Member", form),
            Mode::EditingMember { form, .. } => {
                self.draw_form(frame, area, "Update Member", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Issuing(picker) => self.draw_issue_picker(frame, area, picker),
            Mode::ConfirmReturn(confirm) => self.draw_confirm_return(frame, area, confirm),
            Mode::ConfirmExit(confirm) => self.draw_confirm_exit(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(Screen::ALL.iter().map(|s| s.title()))
            .select(self.screen.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Library Management System"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let stats = self.library.stats();
        let lines = vec![
            Line::from(Span::styled(
                "Welcome to the Library Management System!",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Total Books: {}", stats.total_books)),
            Line::from(format!("Total Members: {}", stats.total_members)),
            Line::from(format!("Books Issued: {}", stats.books_issued)),
            Line::from(""),
            Line::from(Span::styled(
                "Use the tabs above to manage books, members and loans.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Dashboard"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .library
            .catalog()
            .list()
            .map(|b| {
                Row::new(vec![
                    b.id().to_string(),
                    b.title().to_string(),
                    b.author().to_string(),
                    b.publisher().to_string(),
                    b.quantity().to_string(),
                    b.issued().to_string(),
                    b.available().to_string(),
                ])
            })
            .collect();
        render_table(
            frame,
            area,
            "Books",
            &["ID", "Title", "Author", "Publisher", "Qty", "Issued", "Available"],
            rows,
            &[
                Constraint::Length(8),
                Constraint::Percentage(30),
                Constraint::Percentage(20),
                Constraint::Percentage(20),
                Constraint::Length(5),
                Constraint::Length(7),
                Constraint::Length(10),
            ],
            self.book_selected,
            "No books yet. Press 'a' to add one.",
        );
    }

    fn draw_members(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .library
            .roster()
            .list()
            .map(|m| {
                Row::new(vec![
                    m.id().to_string(),
                    m.name().to_string(),
                    m.email().to_string(),
                    m.contact().to_string(),
                ])
            })
            .collect();
        render_table(
            frame,
            area,
            "Members",
            &["ID", "Name", "Email", "Contact"],
            rows,
            &[
                Constraint::Length(8),
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(25),
            ],
            self.member_selected,
            "No members yet. Press 'a' to add one.",
        );
    }

    fn draw_loans(&self, frame: &mut Frame, area: Rect) {
        let records: Vec<&IssueRecord> = if self.loans.show_history {
            self.library.ledger().all_records().collect()
        } else {
            self.library.ledger().active_records().collect()
        };
        let rows: Vec<Row> = records
            .into_iter()
            .map(|r| {
                let returned = r
                    .returned_at()
                    .map(format_timestamp)
                    .unwrap_or_else(|| "-".to_string());
                Row::new(vec![
                    r.id().to_string(),
                    self.library.book_title(r.book_id()).to_string(),
                    self.library.member_name(r.member_id()).to_string(),
                    format_timestamp(r.issued_at()),
                    returned,
                ])
            })
            .collect();
        let (title, empty) = if self.loans.show_history {
            ("Loan History", "No books have been issued yet.")
        } else {
            ("Currently Issued Books", "No books are currently issued. Press 'i' to issue one.")
        };
        render_table(
            frame,
            area,
            title,
            &["Issue ID", "Book Title", "Member Name", "Issue Date", "Returned"],
            rows,
            &[
                Constraint::Length(10),
                Constraint::Percentage(30),
                Constraint::Percentage(25),
                Constraint::Length(17),
                Constraint::Length(17),
            ],
            self.loans.selected,
            empty,
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match (&self.mode, self.screen) {
            (Mode::Issuing(_), _) => &[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Choose"),
                ("[Esc]", "Back"),
            ],
            (Mode::Normal, Screen::Books) | (Mode::Normal, Screen::Members) => &[
                ("[a]", "Add"),
                ("[e]", "Edit"),
                ("[d]", "Delete"),
                ("[s]", "Save"),
                ("[Tab]", "Next Tab"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::Loans) => &[
                ("[i]", "Issue"),
                ("[r]", "Return"),
                ("[h]", "History"),
                ("[s]", "Save"),
                ("[Tab]", "Next Tab"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::Home) => &[
                ("[1-4]", "Switch Tab"),
                ("[s]", "Save"),
                ("[q]", "Quit"),
            ],
            _ => &[],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, label) in hints {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &RecordForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len()).map(|i| form.build_line(i)).collect();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if inner.width > 0 {
            let cursor_x = inner.x + (form.cursor_offset() as u16).min(inner.width - 1);
            let cursor_y = inner.y + form.active as u16;
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let noun = match confirm.target {
            DeleteTarget::Book => "book",
            DeleteTarget::Member => "member",
        };
        let lines = vec![
            Line::from(format!("Delete {noun} {}?", confirm.label)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        draw_dialog(frame, area, "Confirm Deletion", lines);
    }

    fn draw_confirm_return(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmReturn) {
        let lines = vec![
            Line::from(format!(
                "Return \"{}\" borrowed by {} ({})?",
                confirm.book_title, confirm.member_name, confirm.issue_id
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        draw_dialog(frame, area, "Return Book", lines);
    }

    fn draw_issue_picker(&self, frame: &mut Frame, area: Rect, picker: &IssuePicker) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = match (picker.step, &picker.book_id) {
            (PickStep::Member, Some(book_id)) => {
                format!("Issue {}: choose a member", self.library.book_title(book_id))
            }
            _ => "Issue Book: choose a book".to_string(),
        };
        let items: Vec<ListItem> = picker
            .items()
            .iter()
            .map(|(_, label)| ListItem::new(label.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_confirm_exit(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmExit) {
        let mut option_spans = Vec::new();
        for (idx, label) in confirm.labels().iter().enumerate() {
            if idx > 0 {
                option_spans.push(Span::raw("   "));
            }
            let style = if confirm.selected_index() == idx {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            option_spans.push(Span::styled(*label, style));
        }

        let lines = vec![
            Line::from("Do you want to save your changes before exiting?"),
            Line::from(""),
            Line::from(option_spans),
            Line::from(""),
            Line::from(Span::styled(
                "Use ←/→ to choose • Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        draw_dialog(frame, area, "Confirm Exit", lines);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn no_selection(&mut self, message: &str) -> Mode {
        self.set_status(message, StatusKind::Error);
        Mode::Normal
    }

    fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.clamp_selections();
    }

    fn save(&mut self) -> Result<()> {
        self.gateway
            .save_library(&self.library)
            .context("failed to save library data")
    }

    fn save_with_status(&mut self) {
        match self.save() {
            Ok(()) => {
                let text = format!("Data saved to {}.", self.gateway.path().display());
                self.set_status(text, StatusKind::Info)
            }
            Err(err) => self.report_save_error(&err),
        }
    }

    fn report_save_error(&mut self, err: &anyhow::Error) {
        warn!(error = %format!("{err:#}"), "save failed");
        self.set_status(
            format!("Error saving data: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn save_new_book(&mut self, form: &RecordForm) -> Result<()> {
        let input = form.book_input()?;
        let id = self
            .library
            .add_book(
                &input.id,
                &input.title,
                &input.author,
                &input.publisher,
                input.quantity,
            )?
            .id()
            .to_string();
        self.focus_book(&id);
        self.set_status(format!("Book {id} saved successfully!"), StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, id: &str, form: &RecordForm) -> Result<()> {
        let input = form.book_input()?;
        self.library.update_book(
            id,
            &input.title,
            &input.author,
            &input.publisher,
            input.quantity,
        )?;
        self.set_status(format!("Book {id} updated."), StatusKind::Info);
        Ok(())
    }

    fn save_new_member(&mut self, form: &RecordForm) -> Result<()> {
        let input = form.member_input();
        let id = self
            .library
            .add_member(&input.id, &input.name, &input.email, &input.contact)?
            .id()
            .to_string();
        self.focus_member(&id);
        self.set_status(format!("Member {id} saved successfully!"), StatusKind::Info);
        Ok(())
    }

    fn save_existing_member(&mut self, id: &str, form: &RecordForm) -> Result<()> {
        let input = form.member_input();
        self.library
            .update_member(id, &input.name, &input.email, &input.contact)?;
        self.set_status(format!("Member {id} updated."), StatusKind::Info);
        Ok(())
    }

    fn focus_book(&mut self, id: &str) {
        if let Some(idx) = self.library.catalog().list().position(|b| b.id() == id) {
            self.book_selected = idx;
        }
    }

    fn focus_member(&mut self, id: &str) {
        if let Some(idx) = self.library.roster().list().position(|m| m.id() == id) {
            self.member_selected = idx;
        }
    }

    fn current_book(&self) -> Option<&Book> {
        self.library.catalog().list().nth(self.book_selected)
    }

    fn current_member(&self) -> Option<&Member> {
        self.library.roster().list().nth(self.member_selected)
    }

    fn current_loan(&self) -> Option<&IssueRecord> {
        let ids = self.loans.visible_ids(&self.library);
        ids.get(self.loans.selected)
            .and_then(|id| self.library.ledger().get(id))
    }

    fn move_selection(&mut self, offset: isize) {
        match self.screen {
            Screen::Home => {}
            Screen::Books => {
                self.book_selected =
                    move_index(self.book_selected, offset, self.library.catalog().len());
            }
            Screen::Members => {
                self.member_selected =
                    move_index(self.member_selected, offset, self.library.roster().len());
            }
            Screen::Loans => {
                let len = self.loans.visible_ids(&self.library).len();
                self.loans.selected = move_index(self.loans.selected, offset, len);
            }
        }
    }

    /// Pull every cursor back inside its list after rows disappear.
    fn clamp_selections(&mut self) {
        self.book_selected = move_index(self.book_selected, 0, self.library.catalog().len());
        self.member_selected = move_index(self.member_selected, 0, self.library.roster().len());
        let loans = self.loans.visible_ids(&self.library).len();
        self.loans.selected = move_index(self.loans.selected, 0, loans);
    }
}

/// Bordered table with a highlighted cursor row, or a centred hint when empty.
#[allow(clippy::too_many_arguments)]
fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    header: &[&'static str],
    rows: Vec<Row<'static>>,
    widths: &[Constraint],
    selected: usize,
    empty_message: &str,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if rows.is_empty() {
        let message = Paragraph::new(empty_message.to_string())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let header_row =
        Row::new(header.iter().copied()).style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths.iter().copied())
        .header(header_row)
        .block(block)
        .row_highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_dialog(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'_>>) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn app(dir: &TempDir) -> App {
        App::new(
            Library::new(),
            PersistenceGateway::new(dir.path().join("library.sqlite")),
        )
    }

    fn press(app: &mut App, keys: &[KeyCode]) -> bool {
        let mut exit = false;
        for key in keys {
            exit = app.handle_key(*key).unwrap();
        }
        exit
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn add_book_through_the_form() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('a')]);
        for value in ["B-1", "Dune", "Frank Herbert", "Chilton"] {
            type_text(&mut app, value);
            press(&mut app, &[KeyCode::Tab]);
        }
        type_text(&mut app, "2");
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.library().catalog().available_copies("B-1").unwrap(), 2);
    }

    #[test]
    fn form_errors_keep_the_dialog_open() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        press(&mut app, &[KeyCode::Char('3'), KeyCode::Char('a')]);
        type_text(&mut app, "M-1");
        press(&mut app, &[KeyCode::Enter]);

        match &app.mode {
            Mode::AddingMember(form) => {
                assert_eq!(form.error.as_deref(), Some("Name is required."))
            }
            _ => panic!("member form should still be open"),
        }
        assert!(app.library().roster().is_empty());
    }

    #[test]
    fn issue_and_return_from_the_loans_tab() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.library
            .add_book("B-1", "Dune", "Frank Herbert", "Chilton", 1)
            .unwrap();
        app.library.add_member("M-1", "Ada", "a@x", "1").unwrap();

        press(
            &mut app,
            &[KeyCode::Char('4'), KeyCode::Char('i'), KeyCode::Enter, KeyCode::Enter],
        );
        assert_eq!(app.library().stats().books_issued, 1);

        press(&mut app, &[KeyCode::Char('i')]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("No books with available copies.")
        );

        press(&mut app, &[KeyCode::Char('r'), KeyCode::Char('y')]);
        assert_eq!(app.library().stats().books_issued, 0);
        assert_eq!(app.library().catalog().available_copies("B-1").unwrap(), 1);
    }

    #[test]
    fn deleting_a_member_on_loan_reports_the_guard() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.library.add_book("B-1", "Dune", "Herbert", "Chilton", 1).unwrap();
        app.library.add_member("M-1", "Ada", "a@x", "1").unwrap();
        app.library.issue("B-1", "M-1").unwrap();

        press(&mut app, &[KeyCode::Char('3'), KeyCode::Char('d'), KeyCode::Char('y')]);
        assert_eq!(app.library().roster().len(), 1);
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("Member M-1 still has active loans.")
        );
    }

    #[test]
    fn save_and_quit_writes_the_database() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.library.add_member("M-1", "Ada", "a@x", "1").unwrap();

        assert!(!press(&mut app, &[KeyCode::Char('q')]));
        assert!(press(&mut app, &[KeyCode::Enter]));

        let (library, warning) = PersistenceGateway::new(dir.path().join("library.sqlite"))
            .load()
            .into_library();
        assert!(warning.is_none());
        assert_eq!(library.roster().len(), 1);
    }

    #[test]
    fn save_command_names_the_data_file() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        press(&mut app, &[KeyCode::Char('s')]);

        let path = dir.path().join("library.sqlite");
        assert!(path.exists());
        assert_eq!(
            app.status.as_ref().map(|s| s.text.clone()),
            Some(format!("Data saved to {}.", path.display()))
        );
    }

    #[test]
    fn load_warning_points_at_the_moved_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.sqlite");
        std::fs::write(&path, b"not a database").unwrap();
        let gateway = PersistenceGateway::new(&path);
        let (library, warning) = gateway.load().into_library();

        let mut app = App::new(library, gateway);
        app.report_load_warning(&warning.unwrap());
        let text = app.status.as_ref().map(|s| s.text.clone()).unwrap();
        assert!(text.contains("library.sqlite.corrupt"), "{text}");
    }

    #[test]
    fn cancel_exit_stays_in_the_app() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert!(!press(
            &mut app,
            &[KeyCode::Esc, KeyCode::Left, KeyCode::Enter]
        ));
        assert!(matches!(app.mode, Mode::Normal));
        assert!(!dir.path().join("library.sqlite").exists());
    }
}
