//! Statement execution tests: explicit transactions, implicit transactions
//! and result set ownership.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use fb_client::{Error, Executed};
use fb_protocol::StatusVector;
use fb_protocol::consts::{
    ISC_DSQL_ERROR, ISC_LOCK_CONFLICT, ISC_NETWORK_ERROR, ISC_NO_META_UPDATE,
    ISC_UNIQUE_KEY_VIOLATION,
};
use fb_testing::fixtures::{
    self, DROP_SCRATCH, INSERT_COUNTRY, INSERT_DUPLICATE, SELECT_COUNTRIES, SELECT_MISSING,
    SELECT_NOTHING,
};
use fb_testing::mock_library::Operation;

#[test]
fn test_execute_query_returns_result_set() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    let tx = connection.start_transaction().unwrap();

    let mut rows = connection.execute(SELECT_COUNTRIES, &tx).unwrap().rows().unwrap();
    assert_eq!(rows.column_count(), 2);
    assert!(rows.transaction().is_none());

    let countries: Vec<String> = rows
        .by_ref()
        .map(|row| row.unwrap().get_by_name::<String>("country").unwrap())
        .collect();
    assert_eq!(countries, vec!["Canada", "England", "USA"]);
    assert_eq!(rows.row_count(), 3);

    rows.close().unwrap();
    assert_eq!(library.live_statements(), 0);
    // The result set does not own an explicit transaction.
    assert!(tx.is_active());
    tx.commit().unwrap();
}

#[test]
fn test_execute_non_query_releases_statement() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    let tx = connection.start_transaction().unwrap();

    let executed = connection.execute(INSERT_COUNTRY, &tx).unwrap();
    assert_eq!(executed.affected(), Some(1));
    assert_eq!(library.live_statements(), 0);
    assert_eq!(library.calls(Operation::Free).len(), 1);
    tx.rollback().unwrap();
}

#[test]
fn test_failed_execute_releases_statement() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    let tx = connection.start_transaction().unwrap();

    let error = connection.execute(INSERT_DUPLICATE, &tx).unwrap_err();
    assert_eq!(error.db_code(), Some(ISC_UNIQUE_KEY_VIOLATION));
    assert_eq!(library.live_statements(), 0);
    tx.rollback().unwrap();

    // A leaked statement would make the schema change fail.
    let executed = connection.execute_immediate(DROP_SCRATCH).unwrap();
    assert_eq!(executed.affected(), Some(0));
}

#[test]
fn test_prepare_error_is_decoded() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let error = connection.execute_immediate(SELECT_MISSING).unwrap_err();
    assert_eq!(error.sql_code(), Some(-204));
    assert_eq!(error.db_code(), Some(ISC_DSQL_ERROR));
    let message = error.exception().unwrap().message();
    assert!(message.starts_with("Error preparing a SQL statement.\n"));
    assert!(message.contains("Table unknown\n"));

    assert_eq!(library.live_statements(), 0);
    assert_eq!(library.open_transactions(), 0);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_execute_with_returns_last_value() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    let tx = connection.start_transaction().unwrap();

    let mut count = 0;
    let last = connection
        .execute_with(SELECT_COUNTRIES, &tx, |row| {
            count += 1;
            row.get::<String>(1).map_err(Error::from)
        })
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(last.rows(), Some(Some("Dollar".to_owned())));
    assert_eq!(library.live_statements(), 0);

    let none = connection
        .execute_with(SELECT_NOTHING, &tx, |row| row.get::<String>(0).map_err(Error::from))
        .unwrap();
    assert_eq!(none.rows(), Some(None));
    tx.commit().unwrap();
}

#[test]
fn test_execute_immediate_non_query_commits_once() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let executed = connection.execute_immediate(INSERT_COUNTRY).unwrap();
    assert!(matches!(executed, Executed::Affected(1)));
    assert_eq!(library.calls(Operation::Commit).len(), 1);
    assert!(library.calls(Operation::Rollback).is_empty());
    assert_eq!(library.open_transactions(), 0);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_execute_immediate_query_owns_transaction() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let mut rows = connection.execute_immediate(SELECT_COUNTRIES).unwrap().rows().unwrap();
    let tx = rows.transaction().cloned().unwrap();
    assert!(tx.is_active());
    assert_eq!(connection.transactions(), vec![tx.clone()]);

    let first = rows.fetch().unwrap().unwrap();
    assert_eq!(first.get::<String>(0).unwrap(), "Canada");
    assert!(library.calls(Operation::Commit).is_empty());

    rows.close().unwrap();
    assert!(!tx.is_active());
    assert_eq!(library.calls(Operation::Commit).len(), 1);
    assert!(connection.transactions().is_empty());
    assert_eq!(library.live_statements(), 0);
}

#[test]
fn test_dropping_result_set_commits_its_transaction() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let rows = connection.execute_immediate(SELECT_COUNTRIES).unwrap().rows().unwrap();
    drop(rows);

    assert_eq!(library.calls(Operation::Commit).len(), 1);
    assert_eq!(library.open_transactions(), 0);
    assert_eq!(library.live_statements(), 0);
}

#[test]
fn test_execute_immediate_with_streams_rows_in_order() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let mut seen = Vec::new();
    let last = connection
        .execute_immediate_with(SELECT_COUNTRIES, |row| {
            let country = row.get::<String>(0)?;
            seen.push(country.clone());
            Ok::<_, Error>(country.len())
        })
        .unwrap();

    assert_eq!(seen, vec!["Canada", "England", "USA"]);
    assert_eq!(last.rows(), Some(Some(3)));
    assert_eq!(library.calls(Operation::Commit).len(), 1);
    assert_eq!(library.live_statements(), 0);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_execute_immediate_with_consumer_error_rolls_back() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let result = connection.execute_immediate_with(SELECT_COUNTRIES, |row| {
        let country = row.get::<String>(0)?;
        if country == "England" {
            return Err(Error::Config("stop".into()));
        }
        Ok(country)
    });

    assert!(matches!(result, Err(Error::Config(m)) if m == "stop"));
    assert!(library.calls(Operation::Commit).is_empty());
    assert_eq!(library.calls(Operation::Rollback).len(), 1);
    assert_eq!(library.live_statements(), 0);
    assert_eq!(library.open_transactions(), 0);
}

#[test]
fn test_execute_immediate_error_rolls_back() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let error = connection.execute_immediate(INSERT_DUPLICATE).unwrap_err();
    assert_eq!(error.sql_code(), Some(-803));
    assert!(
        error
            .exception()
            .unwrap()
            .message()
            .contains("violation of PRIMARY or UNIQUE KEY constraint \"INTEG_2\" on table \"COUNTRY\"")
    );
    assert!(library.calls(Operation::Commit).is_empty());
    assert_eq!(library.calls(Operation::Rollback).len(), 1);
    assert_eq!(library.open_transactions(), 0);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_scoped_transaction_rolls_back_on_error() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let result: Result<(), Error> = connection.transaction(|tx| {
        connection.execute(INSERT_COUNTRY, tx)?;
        connection.execute(INSERT_DUPLICATE, tx)?;
        Ok(())
    });

    let error = result.unwrap_err();
    assert!(matches!(error, Error::Database(_)));
    assert_eq!(error.db_code(), Some(ISC_UNIQUE_KEY_VIOLATION));
    assert!(
        error
            .exception()
            .unwrap()
            .message()
            .starts_with("Error executing SQL statement.\n")
    );
    assert!(library.calls(Operation::Commit).is_empty());
    assert_eq!(library.calls(Operation::Rollback).len(), 1);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_scoped_transaction_leaves_ended_transaction_alone() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let value = connection
        .transaction(|tx| {
            connection.execute(INSERT_COUNTRY, tx)?;
            tx.commit()?;
            Ok::<_, Error>(7)
        })
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(library.calls(Operation::Commit).len(), 1);
    assert!(library.calls(Operation::Rollback).is_empty());
}

#[test]
fn test_scoped_transaction_rolls_back_failed_commit() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    library.fail_next(Operation::Commit, StatusVector::error(ISC_LOCK_CONFLICT));

    let error = connection
        .transaction(|tx| {
            connection.execute(INSERT_COUNTRY, tx)?;
            Ok::<_, Error>(1)
        })
        .unwrap_err();

    assert_eq!(error.db_code(), Some(ISC_LOCK_CONFLICT));
    assert!(
        error
            .exception()
            .unwrap()
            .message()
            .starts_with("Error committing transaction.\n")
    );
    assert_eq!(library.calls(Operation::Rollback).len(), 1);
    assert_eq!(library.open_transactions(), 0);
    assert!(connection.transactions().is_empty());
}

#[test]
fn test_scoped_transaction_failed_commit_and_rollback_reports_commit() {
    let library = fixtures::employee_library();
    let mut connection = fixtures::connect(&library).unwrap();
    library.fail_next(Operation::Commit, StatusVector::error(ISC_LOCK_CONFLICT));
    library.fail_next(Operation::Rollback, StatusVector::error(ISC_NETWORK_ERROR));

    let error = connection.transaction(|_| Ok::<_, Error>(())).unwrap_err();
    assert_eq!(error.db_code(), Some(ISC_LOCK_CONFLICT));
    assert_eq!(connection.transactions().len(), 1);

    // Closing the connection finishes the cleanup.
    assert!(connection.close().unwrap());
    assert_eq!(library.open_transactions(), 0);
}

#[test]
fn test_scoped_transaction_rollback_failure_keeps_caller_error() {
    let library = fixtures::employee_library();
    let mut connection = fixtures::connect(&library).unwrap();
    library.fail_next(Operation::Rollback, StatusVector::error(ISC_NETWORK_ERROR));

    let result: Result<(), Error> =
        connection.transaction(|_| Err(Error::Config("boom".into())));

    assert!(matches!(result, Err(Error::Config(m)) if m == "boom"));
    assert_eq!(library.calls(Operation::Rollback).len(), 1);
    assert_eq!(connection.transactions().len(), 1);

    assert!(connection.close().unwrap());
    assert_eq!(library.open_transactions(), 0);
}

#[test]
fn test_execute_immediate_rollback_failure_keeps_execute_error() {
    let library = fixtures::employee_library();
    let mut connection = fixtures::connect(&library).unwrap();
    library.fail_next(Operation::Rollback, StatusVector::error(ISC_NETWORK_ERROR));

    let error = connection.execute_immediate(INSERT_DUPLICATE).unwrap_err();
    assert_eq!(error.db_code(), Some(ISC_UNIQUE_KEY_VIOLATION));
    assert!(
        error
            .exception()
            .unwrap()
            .message()
            .starts_with("Error executing SQL statement.\n")
    );
    assert_eq!(connection.transactions().len(), 1);

    assert!(connection.close().unwrap());
    assert_eq!(library.open_transactions(), 0);
}

#[test]
fn test_statement_release_failure_keeps_execute_error() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();
    let tx = connection.start_transaction().unwrap();
    library.fail_next(Operation::Free, StatusVector::error(ISC_NETWORK_ERROR));

    let error = connection.execute(INSERT_DUPLICATE, &tx).unwrap_err();
    assert_eq!(error.db_code(), Some(ISC_UNIQUE_KEY_VIOLATION));
    assert_eq!(library.calls(Operation::Free).len(), 1);
    tx.rollback().unwrap();
}

#[test]
fn test_open_result_set_blocks_schema_change() {
    let library = fixtures::employee_library();
    let connection = fixtures::connect(&library).unwrap();

    let mut rows = connection.execute_immediate(SELECT_COUNTRIES).unwrap().rows().unwrap();
    let error = connection.execute_immediate(DROP_SCRATCH).unwrap_err();
    assert_eq!(error.db_code(), Some(ISC_NO_META_UPDATE));
    assert!(
        error
            .exception()
            .unwrap()
            .message()
            .contains("object SCRATCH is in use")
    );

    rows.close().unwrap();
    connection.execute_immediate(DROP_SCRATCH).unwrap();
}

#[test]
fn test_statement_rejects_foreign_transaction() {
    let library = fixtures::employee_library();
    let first = fixtures::connect(&library).unwrap();
    let second = fixtures::connect(&library).unwrap();
    let tx = first.start_transaction().unwrap();

    assert!(second.execute(INSERT_COUNTRY, &tx).unwrap_err().is_usage());
    assert!(library.calls(Operation::Allocate).is_empty());
}
