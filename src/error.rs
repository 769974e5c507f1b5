//! Error types for the account and task stores.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was empty or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Another account already uses this username.
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Unknown username or wrong password. The two cases are not told apart.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("task not found: {0}")]
    TaskNotFound(i64),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_not_found_display() {
        assert_eq!(StoreError::TaskNotFound(7).to_string(), "task not found: 7");
    }

    #[test]
    fn credentials_display_hides_which_field_failed() {
        let msg = StoreError::InvalidCredentials.to_string();
        assert_eq!(msg, "invalid username or password");
    }
}
