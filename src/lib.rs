//! Prioritized tasks and a simple checklist, kept in a local SQLite file.

pub mod config;
pub mod database;
pub mod duration;
pub mod entry;
pub mod error;
pub mod list_manager;
pub mod list_ui;
pub mod rules;

pub use error::{Error, Result};
