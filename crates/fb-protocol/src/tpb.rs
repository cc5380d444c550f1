//! Transaction parameter buffer (TPB) encoding.
//!
//! An empty TPB asks the server for its defaults (snapshot isolation,
//! read-write, wait on conflicts). A non-empty TPB starts with
//! [`ISC_TPB_VERSION3`] followed by one tag byte per setting.

use bytes::{BufMut, Bytes, BytesMut};

use crate::consts::{
    ISC_TPB_CONCURRENCY, ISC_TPB_CONSISTENCY, ISC_TPB_NO_REC_VERSION, ISC_TPB_NOWAIT,
    ISC_TPB_READ, ISC_TPB_READ_COMMITTED, ISC_TPB_REC_VERSION, ISC_TPB_VERSION3, ISC_TPB_WAIT,
    ISC_TPB_WRITE,
};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Snapshot of the database at transaction start (server default).
    #[default]
    Snapshot,
    /// Snapshot with table reservation; blocks concurrent writers.
    SnapshotTableStability,
    /// See changes committed by other transactions, newest version wins.
    ReadCommitted,
    /// See changes committed by other transactions, wait on uncommitted
    /// versions.
    ReadCommittedNoRecordVersion,
}

impl IsolationLevel {
    /// Get the isolation level name as used in `SET TRANSACTION`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snapshot => "SNAPSHOT",
            Self::SnapshotTableStability => "SNAPSHOT TABLE STABILITY",
            Self::ReadCommitted => "READ COMMITTED RECORD_VERSION",
            Self::ReadCommittedNoRecordVersion => "READ COMMITTED NO RECORD_VERSION",
        }
    }
}

/// Transaction start options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Tpb {
    /// Isolation level. `None` leaves it to the server.
    pub isolation: Option<IsolationLevel>,
    /// Read-only access.
    pub read_only: bool,
    /// Fail immediately on lock conflicts instead of waiting.
    pub no_wait: bool,
}

impl Tpb {
    /// Server defaults (encodes to an empty buffer).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    #[must_use]
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = Some(isolation);
        self
    }

    /// Request read-only access.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Fail on lock conflicts instead of waiting.
    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.no_wait = true;
        self
    }

    /// Whether the buffer asks for server defaults.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Encode the TPB. Server defaults encode to an empty buffer.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        if self.is_default() {
            return Bytes::new();
        }

        let mut buf = BytesMut::with_capacity(5);
        buf.put_u8(ISC_TPB_VERSION3);
        match self.isolation.unwrap_or_default() {
            IsolationLevel::Snapshot => buf.put_u8(ISC_TPB_CONCURRENCY),
            IsolationLevel::SnapshotTableStability => buf.put_u8(ISC_TPB_CONSISTENCY),
            IsolationLevel::ReadCommitted => {
                buf.put_u8(ISC_TPB_READ_COMMITTED);
                buf.put_u8(ISC_TPB_REC_VERSION);
            }
            IsolationLevel::ReadCommittedNoRecordVersion => {
                buf.put_u8(ISC_TPB_READ_COMMITTED);
                buf.put_u8(ISC_TPB_NO_REC_VERSION);
            }
        }
        buf.put_u8(if self.read_only { ISC_TPB_READ } else { ISC_TPB_WRITE });
        buf.put_u8(if self.no_wait { ISC_TPB_NOWAIT } else { ISC_TPB_WAIT });
        buf.freeze()
    }
}
