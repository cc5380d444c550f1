//! # fb-protocol
//!
//! Binary formats that sit at the boundary between this client and the
//! Firebird/InterBase client library.
//!
//! This crate is intentionally IO-free. It knows how to lay out the buffers
//! the vendor library consumes and how to read the structures it hands
//! back, but it never talks to a server itself. Higher-level crates drive
//! the library and use these types to build requests and decode failures.
//!
//! ## Contents
//!
//! - [`dpb`]: database parameter buffer encoder (attach options)
//! - [`tpb`]: transaction parameter buffer encoder (isolation, access, lock wait)
//! - [`status`]: status vector model and the builtin message interpreter
//! - [`service`]: service parameter buffer and service-query response parsing
//! - [`consts`]: vendor-defined tags, info items and error codes
//!
//! ## Example
//!
//! ```rust
//! use fb_protocol::dpb::{Dpb, WritePolicy};
//!
//! let dpb = Dpb::new()
//!     .with_user("SYSDBA")
//!     .with_password("masterkey")
//!     .with_write_policy(WritePolicy::Sync);
//!
//! let bytes = dpb.encode().unwrap();
//! assert_eq!(bytes.len(), dpb.encoded_len());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod consts;
pub mod dpb;
pub mod error;
pub mod service;
pub mod status;
pub mod tpb;

pub use dpb::{Dpb, WritePolicy};
pub use error::ProtocolError;
pub use service::{QueryResponse, Spb};
pub use status::{StatusArg, StatusVector};
pub use tpb::{IsolationLevel, Tpb};
