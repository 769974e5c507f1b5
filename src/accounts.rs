//! Account store: registration, login, and user lookup over the `users` table.

use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::password::{hash_password, verify_password};
use crate::task::User;

const USERS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);
";

pub struct AccountStore<'a> {
    conn: &'a Connection,
}

impl<'a> AccountStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(USERS_SCHEMA)?;
        Ok(())
    }

    /// Register a new account.
    ///
    /// The `UNIQUE` constraint on `username` is the only duplicate check, so two
    /// racing registrations cannot both succeed.
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(StoreError::Validation(
                "username and password cannot be empty".to_string(),
            ));
        }

        let hashed = hash_password(password);
        match self.conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![username, hashed],
        ) {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(StoreError::DuplicateUsername(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        info!(user_id = id, "Registered user {}", username);
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    /// Authenticate by exact (case-sensitive) username and password.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, username, password FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((id, username, stored)) if verify_password(password, &stored) => {
                debug!(user_id = id, "Login succeeded");
                Ok(User { id, username })
            }
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    /// All users ordered by id, for assignment pickers.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username FROM users ORDER BY id ASC")?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn username_for(&self, user_id: i64) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT username FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}
