//! Client error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A decoded database failure.
///
/// Carries the full decoded message, the SQL code and the vendor code of
/// the status vector it was built from, and the time it was raised. The
/// codes cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    message: String,
    sql_code: i32,
    db_code: i64,
    when: DateTime<Utc>,
}

impl DatabaseError {
    /// Create an error with no native status (both codes zero).
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_codes(message, 0, 0)
    }

    /// Create an error with explicit codes.
    #[must_use]
    pub fn with_codes(message: impl Into<String>, sql_code: i32, db_code: i64) -> Self {
        Self {
            message: message.into(),
            sql_code,
            db_code,
            when: Utc::now(),
        }
    }

    /// The decoded message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// SQL code, 0 when raised without native status.
    #[must_use]
    pub fn sql_code(&self) -> i32 {
        self.sql_code
    }

    /// Vendor (ISC) code, 0 when raised without native status.
    #[must_use]
    pub fn db_code(&self) -> i64 {
        self.db_code
    }

    /// When the error was raised.
    #[must_use]
    pub fn when(&self) -> DateTime<Utc> {
        self.when
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.trim_end())
    }
}

impl std::error::Error for DatabaseError {}

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Attaching to or detaching from a database failed.
    #[error("connection error: {0}")]
    Connection(DatabaseError),

    /// Any other native call failed.
    #[error("database error: {0}")]
    Database(DatabaseError),

    /// The API was used incorrectly (bad argument, closed resource, ...).
    #[error("usage error: {0}")]
    Usage(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Parameter buffer could not be built or a response could not be read.
    #[error("protocol error: {0}")]
    Protocol(#[from] fb_protocol::ProtocolError),

    /// Type conversion error.
    #[error("type error: {0}")]
    Type(#[from] fb_types::TypeError),
}

impl Error {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Check if this is a usage error.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Check if this error came from a failed attach or detach.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The decoded database failure, if this error carries one.
    #[must_use]
    pub fn exception(&self) -> Option<&DatabaseError> {
        match self {
            Self::Connection(e) | Self::Database(e) => Some(e),
            _ => None,
        }
    }

    /// SQL code of the underlying database failure.
    #[must_use]
    pub fn sql_code(&self) -> Option<i32> {
        self.exception().map(DatabaseError::sql_code)
    }

    /// Vendor code of the underlying database failure.
    #[must_use]
    pub fn db_code(&self) -> Option<i64> {
        self.exception().map(DatabaseError::db_code)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Combine the outcome of an operation with the outcome of its cleanup.
///
/// The operation's failure wins. A cleanup failure behind it is logged and
/// dropped. A cleanup failure after a successful operation is returned.
pub(crate) fn with_cleanup<T>(primary: Result<T>, cleanup: Result<()>, what: &str) -> Result<T> {
    match (primary, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) => Err(error),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(secondary)) => {
            tracing::warn!(error = %secondary, "{what} failed after an earlier error");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_without_status() {
        let error = DatabaseError::new("Error opening connection.");
        assert_eq!(error.message(), "Error opening connection.");
        assert_eq!(error.sql_code(), 0);
        assert_eq!(error.db_code(), 0);
        assert!(error.when() <= Utc::now());
    }

    #[test]
    fn test_error_classification() {
        let usage = Error::usage("connection is closed");
        assert!(usage.is_usage());
        assert!(usage.exception().is_none());

        let db = Error::Database(DatabaseError::with_codes("boom", -901, 335_544_345));
        assert!(!db.is_usage());
        assert_eq!(db.sql_code(), Some(-901));
        assert_eq!(db.db_code(), Some(335_544_345));

        let conn = Error::Connection(DatabaseError::new("detach"));
        assert!(conn.is_connection());
    }

    #[test]
    fn test_with_cleanup_primary_wins() {
        let result: Result<()> = with_cleanup(
            Err(Error::usage("primary")),
            Err(Error::usage("secondary")),
            "close",
        );
        assert!(matches!(result, Err(Error::Usage(m)) if m == "primary"));

        let result = with_cleanup(Ok(5), Err(Error::usage("cleanup")), "close");
        assert!(matches!(result, Err(Error::Usage(m)) if m == "cleanup"));

        assert!(matches!(with_cleanup(Ok(5), Ok(()), "close"), Ok(5)));
    }
}
