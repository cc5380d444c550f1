//! The seam between this crate and the vendor client library.
//!
//! Every native call the client makes goes through [`ClientLibrary`]. This
//! crate ships no binding of its own: callers provide the implementation
//! that reaches the vendor library, and tests use an in-memory fake. Calls
//! are blocking and report failure as a [`StatusVector`], exactly like the
//! C API does.
//!
//! Handles are plain integers. The null handle (0) means "not attached" or
//! "no longer valid" and is never passed to the library by this crate.

use std::fmt;

use fb_protocol::StatusVector;
use fb_protocol::consts::ISC_WISH_LIST;
use fb_types::{ColumnDesc, SqlValue};

macro_rules! native_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The null handle.
            pub const NULL: Self = Self(0);

            /// Whether this is the null handle.
            #[must_use]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

native_handle!(
    /// Database attachment handle (`isc_db_handle`).
    DbHandle
);
native_handle!(
    /// Transaction handle (`isc_tr_handle`).
    TrHandle
);
native_handle!(
    /// DSQL statement handle (`isc_stmt_handle`).
    StmtHandle
);
native_handle!(
    /// Service manager handle (`isc_svc_handle`).
    SvcHandle
);

/// What a prepared statement does, as reported by `isc_info_sql_stmt_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StatementKind {
    /// `SELECT`.
    Select,
    /// `SELECT ... FOR UPDATE`.
    SelectForUpdate,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
    /// Data definition.
    Ddl,
    /// `EXECUTE PROCEDURE`.
    ExecProcedure,
    /// Anything else (`SET GENERATOR`, `COMMIT` inside DSQL, ...).
    Other,
}

impl StatementKind {
    /// Whether executing the statement opens a cursor.
    #[must_use]
    pub fn is_query(self) -> bool {
        matches!(self, Self::Select | Self::SelectForUpdate)
    }
}

/// Result of preparing a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementInfo {
    /// Statement kind.
    pub kind: StatementKind,
    /// Output columns (empty for non-queries).
    pub columns: Vec<ColumnDesc>,
}

impl StatementInfo {
    /// Describe a statement with no output columns.
    #[must_use]
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
        }
    }

    /// Describe a query with the given output columns.
    #[must_use]
    pub fn query(columns: Vec<ColumnDesc>) -> Self {
        Self {
            kind: StatementKind::Select,
            columns,
        }
    }
}

/// Status vector reported for calls a library binding does not provide.
#[must_use]
pub fn unsupported() -> StatusVector {
    StatusVector::error(ISC_WISH_LIST)
}

/// Blocking entry points of the vendor client library.
///
/// Methods mirror the C API one to one. Service manager and database
/// creation entry points have default bodies reporting "feature is not
/// supported", since not every client library ships them.
pub trait ClientLibrary: Send + Sync + fmt::Debug {
    /// `isc_attach_database`.
    fn attach_database(&self, file: &str, dpb: &[u8]) -> Result<DbHandle, StatusVector>;

    /// `isc_detach_database`.
    fn detach_database(&self, db: DbHandle) -> Result<(), StatusVector>;

    /// `isc_dsql_execute_immediate` of a `CREATE DATABASE` statement with
    /// null handles. Returns the attachment to the new database.
    fn create_database(&self, sql: &str, dialect: u16) -> Result<DbHandle, StatusVector> {
        let _ = (sql, dialect);
        Err(unsupported())
    }

    /// `isc_drop_database`. On success the attachment is gone.
    fn drop_database(&self, db: DbHandle) -> Result<(), StatusVector> {
        let _ = db;
        Err(unsupported())
    }

    /// `isc_start_multiple` over every attachment in `dbs`.
    fn start_transaction(&self, dbs: &[DbHandle], tpb: &[u8]) -> Result<TrHandle, StatusVector>;

    /// `isc_commit_transaction`.
    fn commit_transaction(&self, tr: TrHandle) -> Result<(), StatusVector>;

    /// `isc_rollback_transaction`.
    fn rollback_transaction(&self, tr: TrHandle) -> Result<(), StatusVector>;

    /// `isc_dsql_allocate_statement`.
    fn allocate_statement(&self, db: DbHandle) -> Result<StmtHandle, StatusVector>;

    /// `isc_dsql_prepare` followed by `isc_dsql_describe`.
    fn prepare_statement(
        &self,
        stmt: StmtHandle,
        tr: TrHandle,
        sql: &str,
        dialect: u16,
    ) -> Result<StatementInfo, StatusVector>;

    /// `isc_dsql_execute`. Returns the number of affected records for
    /// non-queries. A query opens its cursor and returns 0.
    fn execute_statement(&self, stmt: StmtHandle, tr: TrHandle) -> Result<u64, StatusVector>;

    /// `isc_dsql_fetch`. `None` once the cursor is exhausted.
    fn fetch_row(&self, stmt: StmtHandle) -> Result<Option<Vec<SqlValue>>, StatusVector>;

    /// `isc_dsql_free_statement` with `DSQL_close`.
    fn close_cursor(&self, stmt: StmtHandle) -> Result<(), StatusVector>;

    /// `isc_dsql_free_statement` with `DSQL_drop`.
    fn free_statement(&self, stmt: StmtHandle) -> Result<(), StatusVector>;

    /// `isc_service_attach`.
    fn service_attach(&self, service: &str, spb: &[u8]) -> Result<SvcHandle, StatusVector> {
        let _ = (service, spb);
        Err(unsupported())
    }

    /// `isc_service_detach`.
    fn service_detach(&self, svc: SvcHandle) -> Result<(), StatusVector> {
        let _ = svc;
        Err(unsupported())
    }

    /// `isc_service_start`.
    fn service_start(&self, svc: SvcHandle, request: &[u8]) -> Result<(), StatusVector> {
        let _ = (svc, request);
        Err(unsupported())
    }

    /// `isc_service_query`. Fills at most `buffer_len` bytes.
    fn service_query(
        &self,
        svc: SvcHandle,
        items: &[u8],
        buffer_len: usize,
    ) -> Result<Vec<u8>, StatusVector> {
        let _ = (svc, items, buffer_len);
        Err(unsupported())
    }
}
