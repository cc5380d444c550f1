//! Status vector decoding.
//!
//! Turns a failed call's [`StatusVector`] into the message text carried by
//! [`DatabaseError`]. The text layout is fixed:
//!
//! ```text
//! <prefix>
//! <interpreted line 1>
//! <interpreted line 2>
//! <sql code message>
//! SQL Code = <sql code>
//! Firebird Code = <vendor code>
//! ```
//!
//! The prefix line is omitted when the prefix is empty, and everything after
//! it is omitted when there is no status vector.

use std::fmt::Write as _;

use fb_protocol::StatusVector;
use fb_protocol::status::sql_message;

use crate::error::DatabaseError;

/// Label used for the vendor code line.
pub const VENDOR_LABEL: &str = "Firebird";

/// Build the error text for a status vector.
///
/// Never fails, including when `status` is `None`.
#[must_use]
pub fn decode(status: Option<&StatusVector>, prefix: &str) -> String {
    let mut text = String::new();
    if !prefix.is_empty() {
        text.push_str(prefix);
        text.push('\n');
    }

    let Some(status) = status else {
        return text;
    };

    let sql_code = status.sql_code();
    let db_code = status.primary_code();

    let mut cursor = 0;
    while let Some(line) = status.interpret_next(&mut cursor) {
        text.push_str(&line);
        text.push('\n');
    }

    text.push_str(sql_message(sql_code));

    // Writing into a String cannot fail.
    let _ = write!(text, "\nSQL Code = {sql_code}\n");
    let _ = writeln!(text, "{VENDOR_LABEL} Code = {db_code}");
    text
}

/// Decode `status` into a [`DatabaseError`] carrying its codes.
#[must_use]
pub fn raise(status: &StatusVector, message: &str) -> DatabaseError {
    DatabaseError::with_codes(
        decode(Some(status), message),
        status.sql_code(),
        status.primary_code(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_protocol::consts::{ISC_DSQL_ERROR, ISC_DSQL_RELATION_ERR, ISC_LOCK_CONFLICT, ISC_SQLERR};

    #[test]
    fn test_decode_without_status() {
        assert_eq!(decode(None, "Error opening connection."), "Error opening connection.\n");
        assert_eq!(decode(None, ""), "");
    }

    #[test]
    fn test_decode_layout() {
        let status = StatusVector::error(ISC_LOCK_CONFLICT);
        let text = decode(Some(&status), "Error committing transaction.");
        assert_eq!(
            text,
            "Error committing transaction.\n\
             lock conflict on no wait transaction\n\
             Unsuccessful execution caused by system error that does not preclude successful execution of subsequent statements\n\
             SQL Code = -901\n\
             Firebird Code = 335544345\n"
        );
    }

    #[test]
    fn test_decode_empty_prefix_and_no_sql_message() {
        let status = StatusVector::error(77);
        let text = decode(Some(&status), "");
        assert_eq!(text, "unknown ISC error 77\n\nSQL Code = -999\nFirebird Code = 77\n");
    }

    #[test]
    fn test_raise_carries_codes() {
        let status = StatusVector::error(ISC_DSQL_ERROR)
            .with_code(ISC_SQLERR)
            .with_number(-204)
            .with_code(ISC_DSQL_RELATION_ERR);
        let error = raise(&status, "Error preparing a SQL statement.");
        assert_eq!(error.sql_code(), -204);
        assert_eq!(error.db_code(), ISC_DSQL_ERROR);
        assert!(error.message().starts_with("Error preparing a SQL statement.\nDynamic SQL Error\n"));
        assert!(error.message().contains("Table unknown\n"));
        assert!(error.message().ends_with("SQL Code = -204\nFirebird Code = 335544569\n"));
    }
}
