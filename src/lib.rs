//! Team task board: SQLite-backed accounts and tasks behind a terminal UI.

pub mod accounts;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod password;
pub mod task;
pub mod task_store;
pub mod ui;

pub use accounts::AccountStore;
pub use db::Database;
pub use error::{Result, StoreError};
pub use task::{Priority, Task, TaskDraft, TaskUpdate, User};
pub use task_store::{sort_by_assignee, sort_by_priority, TaskStore};
