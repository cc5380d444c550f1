//! # fb-types
//!
//! Firebird/InterBase column types and their Rust representations.
//!
//! ## Type Mappings
//!
//! | Column Type | Rust Type |
//! |-------------|-----------|
//! | `BOOLEAN` | `bool` |
//! | `SMALLINT` | `i16` |
//! | `INTEGER` | `i32` |
//! | `INT64` | `i64` |
//! | `FLOAT` | `f32` |
//! | `DOUBLE` | `f64` |
//! | `NUMERIC`/`DECIMAL` | scaled integer, `f64` via [`SqlValue::as_f64`] |
//! | `CHAR`/`VARCHAR` | `String` |
//! | `BLOB` | `Vec<u8>` / `bytes::Bytes` |
//! | `DATE` | `chrono::NaiveDate` |
//! | `TIME` | `chrono::NaiveTime` |
//! | `TIMESTAMP` | `chrono::NaiveDateTime` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod column;
pub mod error;
pub mod from_sql;
pub mod value;

pub use column::{ColumnDesc, ColumnType};
pub use error::TypeError;
pub use from_sql::FromSql;
pub use value::SqlValue;
