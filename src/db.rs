//! Store handle.
//!
//! One `Database` is opened at process start and dropped at shutdown. The
//! account and task stores borrow it instead of reaching for a global
//! connection.

use std::path::Path;

use rusqlite::Connection;
use tracing::{info, warn};

use crate::accounts::AccountStore;
use crate::error::Result;
use crate::task_store::TaskStore;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the SQLite file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening task database at {}", path.display());
        Self::configure(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    /// The bundled SQLite enforces foreign keys by default. Tasks may point at
    /// users that do not exist, so enforcement is switched off.
    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(Self { conn })
    }

    /// Create both tables if they are missing. Safe to call repeatedly.
    ///
    /// Each table is attempted even if the other fails; the first error is returned.
    pub fn ensure_schema(&self) -> Result<()> {
        let users = self
            .accounts()
            .ensure_schema()
            .inspect_err(|e| warn!(error = %e, "Failed to create users table"));
        let tasks = self
            .tasks()
            .ensure_schema()
            .inspect_err(|e| warn!(error = %e, "Failed to create tasks table"));
        users.and(tasks)
    }

    pub fn accounts(&self) -> AccountStore<'_> {
        AccountStore::new(&self.conn)
    }

    pub fn tasks(&self) -> TaskStore<'_> {
        TaskStore::new(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
