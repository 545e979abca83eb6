//! Core library surface for the Library Manager TUI application.
//!
//! The stores (`Catalog`, `Roster`, `LendingLedger`) hold all lending rules,
//! `db` persists them, and `ui` is a thin terminal front-end over the same
//! operations. Tests and other tooling can drive the stores without a terminal.
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod library;
pub mod logging;
pub mod models;
pub mod roster;
pub mod ui;

pub use catalog::Catalog;
pub use config::Config;
pub use db::{Loaded, PersistenceGateway};
pub use error::{EntityKind, LibraryError, Result};
pub use ledger::{LendingLedger, LoanIndex};
pub use library::{Library, LibraryStats};
pub use models::{Book, IssueRecord, LoanState, Member};
pub use roster::Roster;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
