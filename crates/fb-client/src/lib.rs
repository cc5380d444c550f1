//! # fb-client
//!
//! Blocking Firebird/InterBase client built on top of the vendor client
//! library.
//!
//! The client library itself is reached through the [`ClientLibrary`]
//! trait. Callers provide the implementation; this crate does not load or
//! link the vendor library itself.
//!
//! ## Features
//!
//! - **Safe teardown**: every native handle has exactly one owner and is
//!   released on drop if it was not released explicitly
//! - **Transaction tracking**: closing a connection rolls back exactly the
//!   transactions still open on it, most recent first
//! - **Multi-database transactions**: one transaction may span several
//!   connections, each of which learns when it ends
//! - **Scoped execution**: [`Connection::transaction`] and
//!   [`Connection::execute_immediate`] guarantee commit or rollback on every
//!   exit path
//! - **Decoded errors**: failed native calls surface as [`DatabaseError`]
//!   with the interpreted status text, SQL code and vendor code
//!
//! ## Connection Lifecycle
//!
//! ```text
//! Unattached -> Open (via Database::connect())
//! Open -> Closed (via close(), or drop)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fb_client::{ConnectionOptions, Database, Error};
//!
//! let db = Database::new(library, "localhost:/data/employee.fdb");
//! let mut connection = db.connect(
//!     Some("SYSDBA"),
//!     Some("masterkey"),
//!     &ConnectionOptions::from_connection_string("charset=UTF8;role=SALES")?,
//! )?;
//!
//! // Commit on success, roll back on error.
//! connection.transaction(|tx| {
//!     connection.execute("INSERT INTO COUNTRY VALUES ('Utopia', 'Dollar')", tx)?;
//!     Ok::<_, Error>(())
//! })?;
//!
//! // Implicit transaction, rows streamed to the closure.
//! connection.execute_immediate_with("SELECT COUNTRY FROM COUNTRY", |row| {
//!     println!("{}", row.get::<String>(0)?);
//!     Ok::<_, Error>(())
//! })?;
//!
//! connection.close()?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub(crate) mod handle;
pub mod library;
pub mod registry;
pub mod result_set;
pub mod row;
pub mod service;
pub mod statement;
pub mod status;
pub mod transaction;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{ConnectionOptions, OptionValue, Settings};
pub use connection::Connection;
pub use database::Database;
pub use error::{DatabaseError, Error, Result};
pub use fb_protocol::{IsolationLevel, StatusVector, Tpb, WritePolicy};
pub use fb_types::{ColumnDesc, ColumnType, FromSql, SqlValue};
pub use library::{
    ClientLibrary, DbHandle, StatementInfo, StatementKind, StmtHandle, SvcHandle, TrHandle,
};
pub use registry::TransactionRegistry;
pub use result_set::ResultSet;
pub use row::Row;
pub use service::ServiceManager;
pub use statement::{Executed, Statement};
pub use transaction::Transaction;
