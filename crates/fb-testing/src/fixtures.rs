//! Test fixture utilities.
//!
//! A small "employee" database scripted on the mock library, in the shape
//! of the sample database that ships with the server.

use std::sync::Arc;

use fb_client::{Connection, ConnectionOptions, Database, SqlValue};
use fb_protocol::StatusVector;
use fb_protocol::consts::{
    ISC_DSQL_ERROR, ISC_DSQL_RELATION_ERR, ISC_SQLERR, ISC_UNIQUE_KEY_VIOLATION,
};

use crate::mock_library::{MockClientLibrary, MockColumn, MockResponse};

/// Database file of the fixture.
pub const DATABASE: &str = "employee.fdb";
/// Fixture user.
pub const USER: &str = "SYSDBA";
/// Fixture password.
pub const PASSWORD: &str = "masterkey";

/// Query returning every country, three rows.
pub const SELECT_COUNTRIES: &str = "SELECT COUNTRY, CURRENCY FROM COUNTRY ORDER BY COUNTRY";
/// Query returning no rows.
pub const SELECT_NOTHING: &str = "SELECT COUNTRY FROM COUNTRY WHERE 1 = 0";
/// Insert that succeeds, one record.
pub const INSERT_COUNTRY: &str = "INSERT INTO COUNTRY VALUES ('Utopia', 'Dollar')";
/// Insert that fails on execute with a primary key violation.
pub const INSERT_DUPLICATE: &str = "INSERT INTO COUNTRY VALUES ('USA', 'Dollar')";
/// Query that fails on prepare (unknown table).
pub const SELECT_MISSING: &str = "SELECT * FROM MISSING";
/// Schema change, refused while other statements are allocated.
pub const DROP_SCRATCH: &str = "DROP TABLE SCRATCH";

/// Status reported for [`INSERT_DUPLICATE`].
#[must_use]
pub fn duplicate_key_status() -> StatusVector {
    StatusVector::error(ISC_UNIQUE_KEY_VIOLATION)
        .with_string("INTEG_2")
        .with_string("COUNTRY")
}

/// Status reported for [`SELECT_MISSING`].
#[must_use]
pub fn unknown_table_status() -> StatusVector {
    StatusVector::error(ISC_DSQL_ERROR)
        .with_code(ISC_SQLERR)
        .with_number(-204)
        .with_code(ISC_DSQL_RELATION_ERR)
        .with_string("MISSING")
}

fn country(name: &str, currency: &str) -> Vec<SqlValue> {
    vec![SqlValue::from(name), SqlValue::from(currency)]
}

/// A mock library holding the fixture database.
#[must_use]
pub fn employee_library() -> Arc<MockClientLibrary> {
    MockClientLibrary::builder()
        .with_database(DATABASE)
        .with_user(USER, PASSWORD)
        .with_response(
            SELECT_COUNTRIES,
            MockResponse::rows(
                vec![MockColumn::varchar("COUNTRY", 15), MockColumn::varchar("CURRENCY", 10)],
                vec![
                    country("Canada", "CdnDlr"),
                    country("England", "Pound"),
                    country("USA", "Dollar"),
                ],
            ),
        )
        .with_response(
            SELECT_NOTHING,
            MockResponse::rows(vec![MockColumn::varchar("COUNTRY", 15)], Vec::new()),
        )
        .with_response(INSERT_COUNTRY, MockResponse::affected(1))
        .with_response(INSERT_DUPLICATE, MockResponse::error(duplicate_key_status()))
        .with_response(SELECT_MISSING, MockResponse::PrepareError(unknown_table_status()))
        .with_response(DROP_SCRATCH, MockResponse::Ddl)
        .build()
}

/// Open a connection to the fixture database.
pub fn connect(library: &Arc<MockClientLibrary>) -> fb_client::Result<Connection> {
    Database::new(library.clone(), DATABASE).connect(
        Some(USER),
        Some(PASSWORD),
        &ConnectionOptions::new(),
    )
}
