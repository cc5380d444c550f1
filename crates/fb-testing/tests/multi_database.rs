//! Transactions spanning more than one connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use fb_client::{ConnectionOptions, Database, IsolationLevel, Tpb, Transaction};
use fb_testing::mock_library::{Call, MockClientLibrary, Operation};

const ORDERS: &str = "orders.fdb";
const BILLING: &str = "billing.fdb";

fn library() -> std::sync::Arc<MockClientLibrary> {
    MockClientLibrary::builder()
        .with_database(ORDERS)
        .with_database(BILLING)
        .build()
}

fn open(library: &std::sync::Arc<MockClientLibrary>, file: &str) -> fb_client::Connection {
    Database::new(library.clone(), file)
        .connect(None, None, &ConnectionOptions::new())
        .unwrap()
}

#[test]
fn test_start_registers_with_every_connection() {
    let library = library();
    let orders = open(&library, ORDERS);
    let billing = open(&library, BILLING);

    let tx = Transaction::start(&[&orders, &billing]).unwrap();
    assert_eq!(tx.connection_count(), 2);
    assert!(tx.spans(&orders));
    assert!(tx.spans(&billing));
    assert_eq!(orders.transactions(), vec![tx.clone()]);
    assert_eq!(billing.transactions(), vec![tx.clone()]);

    let Call::StartTransaction { dbs, .. } = &library.calls(Operation::StartTransaction)[0] else {
        panic!("expected a start call");
    };
    assert_eq!(dbs.len(), 2);
    tx.rollback().unwrap();
}

#[test]
fn test_commit_deregisters_from_every_connection() {
    let library = library();
    let orders = open(&library, ORDERS);
    let billing = open(&library, BILLING);
    let local = orders.start_transaction().unwrap();
    let tx = Transaction::start(&[&orders, &billing]).unwrap();

    tx.commit().unwrap();
    assert!(!tx.is_active());
    assert_eq!(orders.transactions(), vec![local.clone()]);
    assert!(billing.transactions().is_empty());
    assert!(!local.spans(&billing));
    local.commit().unwrap();
}

#[test]
fn test_closing_one_connection_ends_shared_transaction() {
    let library = library();
    let mut orders = open(&library, ORDERS);
    let mut billing = open(&library, BILLING);
    let tx = Transaction::start(&[&orders, &billing]).unwrap();
    let handle = tx.handle().unwrap();

    assert!(orders.close().unwrap());
    assert!(!tx.is_active());
    assert!(!library.is_transaction_open(handle));
    assert!(billing.transactions().is_empty());
    assert_eq!(library.calls(Operation::Rollback), vec![Call::Rollback(handle)]);

    // Nothing left to roll back on the other side.
    library.clear_journal();
    assert!(billing.close().unwrap());
    let operations: Vec<Operation> = library.journal().iter().map(Call::operation).collect();
    assert_eq!(operations, vec![Operation::Detach]);
}

#[test]
fn test_shared_transaction_outlives_dropped_connection() {
    let library = library();
    let orders = open(&library, ORDERS);
    let tx = {
        let billing = open(&library, BILLING);
        Transaction::start(&[&orders, &billing]).unwrap()
    };

    // Dropping billing rolled the shared transaction back.
    assert!(!tx.is_active());
    assert!(orders.transactions().is_empty());
    assert_eq!(tx.connection_count(), 2);
    assert!(tx.commit().unwrap_err().is_usage());
}

#[test]
fn test_start_requires_open_connections() {
    let library = library();
    let orders = open(&library, ORDERS);
    let mut billing = open(&library, BILLING);
    billing.close().unwrap();

    assert!(Transaction::start(&[&orders, &billing]).unwrap_err().is_usage());
    assert!(Transaction::start(&[]).unwrap_err().is_usage());
    assert!(orders.transactions().is_empty());
    assert!(library.calls(Operation::StartTransaction).is_empty());
}

#[test]
fn test_start_with_options_passes_tpb() {
    let library = library();
    let orders = open(&library, ORDERS);
    let billing = open(&library, BILLING);
    let options = Tpb::new()
        .with_isolation(IsolationLevel::ReadCommitted)
        .read_only()
        .no_wait();

    let tx = Transaction::start_with(&[&orders, &billing], &options).unwrap();
    let Call::StartTransaction { tpb, .. } = &library.calls(Operation::StartTransaction)[0] else {
        panic!("expected a start call");
    };
    assert_eq!(&tpb[..], &options.encode()[..]);
    tx.force_commit().unwrap();
    assert!(orders.transactions().is_empty());
    assert!(billing.transactions().is_empty());
}

#[test]
fn test_failed_start_registers_nothing() {
    let library = library();
    let orders = open(&library, ORDERS);
    let billing = open(&library, BILLING);
    library.fail_next(
        Operation::StartTransaction,
        fb_protocol::StatusVector::error(fb_protocol::consts::ISC_LOCK_CONFLICT),
    );

    let error = Transaction::start(&[&orders, &billing]).unwrap_err();
    assert_eq!(error.sql_code(), Some(-901));
    assert!(orders.transactions().is_empty());
    assert!(billing.transactions().is_empty());
}

#[test]
fn test_start_rejects_mixed_client_libraries() {
    let first = library();
    let second = library();
    let orders = open(&first, ORDERS);
    let billing = open(&second, BILLING);

    assert!(Transaction::start(&[&orders, &billing]).unwrap_err().is_usage());
    assert!(first.calls(Operation::StartTransaction).is_empty());
    assert!(second.calls(Operation::StartTransaction).is_empty());
    assert!(orders.transactions().is_empty());
    assert!(billing.transactions().is_empty());
}
