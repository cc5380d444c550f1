//! # fb-testing
//!
//! Test infrastructure for the Firebird client.
//!
//! This crate provides an in-memory implementation of the vendor client
//! library so the connection and transaction lifecycle can be tested
//! without a server.
//!
//! ## Features
//!
//! - Mock client library with scripted SQL responses
//! - Call journal for asserting which native calls were made, and in what
//!   order
//! - One-shot failure injection for every native entry point
//! - Scripted service manager output
//! - A ready-made "employee" fixture database
//!
//! ## Example
//!
//! ```rust,ignore
//! use fb_testing::fixtures;
//! use fb_testing::mock_library::Operation;
//!
//! let library = fixtures::employee_library();
//! let mut connection = fixtures::connect(&library)?;
//! let tx = connection.start_transaction()?;
//! connection.close()?;
//!
//! assert!(!tx.is_active());
//! assert_eq!(library.calls(Operation::Rollback).len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_library;

pub use mock_library::{
    Call, MockClientLibrary, MockColumn, MockError, MockLibraryBuilder, MockResponse, Operation,
};
