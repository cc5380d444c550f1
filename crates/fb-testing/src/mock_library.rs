//! Mock client library for unit testing.
//!
//! [`MockClientLibrary`] implements [`ClientLibrary`] entirely in memory. It
//! tracks attachments, transactions, statements and service sessions the
//! way the server does, answers SQL from a table of scripted responses, and
//! records every call in a journal tests can inspect.
//!
//! ## Features
//!
//! - Attach validates the DPB and, when configured, the database file and
//!   the user's credentials
//! - Detach refuses while transactions are still open on the attachment
//! - DDL refuses while another statement is still allocated on the same
//!   attachment, which catches leaked statement handles
//! - One-shot failure injection for any entry point
//! - Scripted service manager output, honouring the caller's buffer size
//!
//! ## Example
//!
//! ```rust,ignore
//! use fb_testing::mock_library::{MockClientLibrary, MockColumn, MockResponse};
//! use fb_client::{Database, SqlValue};
//!
//! let library = MockClientLibrary::builder()
//!     .with_database("employee.fdb")
//!     .with_user("SYSDBA", "masterkey")
//!     .with_response(
//!         "SELECT ID FROM T",
//!         MockResponse::rows(vec![MockColumn::int("ID")], vec![vec![SqlValue::Integer(1)]]),
//!     )
//!     .build();
//!
//! let db = Database::new(library.clone(), "employee.fdb");
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::{BufMut, Bytes, BytesMut};
use fb_client::library::{
    ClientLibrary, DbHandle, StatementInfo, StatementKind, StmtHandle, SvcHandle, TrHandle,
};
use fb_protocol::consts::{
    ISC_BAD_DB_HANDLE, ISC_BAD_TRANS_HANDLE, ISC_DSQL_ERROR, ISC_DSQL_TOKEN_UNK_ERR,
    ISC_INFO_DATA_NOT_READY, ISC_INFO_END, ISC_INFO_SVC_TO_EOF, ISC_INFO_TRUNCATED, ISC_IO_ERROR,
    ISC_LOGIN, ISC_NO_META_UPDATE, ISC_OBJ_IN_USE, ISC_OPEN_TRANS, ISC_RANDOM,
};
use fb_protocol::{Dpb, ProtocolError, Spb, StatusVector};
use fb_types::column::{SQL_INT64, SQL_LONG, SQL_TYPE_DATE, SQL_VARYING};
use fb_types::{ColumnDesc, SqlValue};
use parking_lot::Mutex;
use thiserror::Error;

/// Error type for mock library helpers.
#[derive(Debug, Error)]
pub enum MockError {
    /// A scripted service reply does not fit a two-byte length.
    #[error("service reply of {0} bytes is too long")]
    ReplyTooLong(usize),

    /// SQL the mock has to understand could not be parsed.
    #[error("cannot parse SQL: {0}")]
    UnparseableSql(String),

    /// A parameter buffer could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Result type for mock library helpers.
pub type Result<T> = std::result::Result<T, MockError>;

/// Scripted answer to a SQL statement.
#[derive(Clone)]
pub enum MockResponse {
    /// A query returning rows.
    Rows {
        /// Column descriptors.
        columns: Vec<ColumnDesc>,
        /// Row data.
        rows: Vec<Vec<SqlValue>>,
    },

    /// A data-changing statement affecting this many records.
    Affected(u64),

    /// A data definition statement.
    Ddl,

    /// Execution fails with this status.
    Error(StatusVector),

    /// Preparation fails with this status.
    PrepareError(StatusVector),

    /// Compute the response from the SQL text.
    Custom(Arc<dyn Fn(&str) -> MockResponse + Send + Sync>),
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows { columns, rows } => f
                .debug_struct("Rows")
                .field("columns", columns)
                .field("rows", rows)
                .finish(),
            Self::Affected(n) => f.debug_tuple("Affected").field(n).finish(),
            Self::Ddl => f.write_str("Ddl"),
            Self::Error(status) => f.debug_tuple("Error").field(status).finish(),
            Self::PrepareError(status) => f.debug_tuple("PrepareError").field(status).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl MockResponse {
    /// Create a multi-row response.
    pub fn rows(columns: Vec<ColumnDesc>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self::Rows { columns, rows }
    }

    /// Create a single integer value response.
    pub fn scalar_int(name: &str, value: i32) -> Self {
        Self::rows(vec![MockColumn::int(name)], vec![vec![SqlValue::Integer(value)]])
    }

    /// Create a rows affected response.
    pub fn affected(count: u64) -> Self {
        Self::Affected(count)
    }

    /// Create an execution failure.
    pub fn error(status: StatusVector) -> Self {
        Self::Error(status)
    }

    /// Create a response from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> MockResponse + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    fn resolve(&self, sql: &str) -> Self {
        match self {
            Self::Custom(f) => f(sql).resolve(sql),
            other => other.clone(),
        }
    }
}

/// Column descriptor shortcuts.
pub struct MockColumn;

impl MockColumn {
    /// A nullable INTEGER column.
    pub fn int(name: &str) -> ColumnDesc {
        ColumnDesc::new(name, SQL_LONG + 1)
    }

    /// A nullable BIGINT column.
    pub fn bigint(name: &str) -> ColumnDesc {
        ColumnDesc::new(name, SQL_INT64 + 1)
    }

    /// A nullable VARCHAR column.
    pub fn varchar(name: &str, length: i16) -> ColumnDesc {
        ColumnDesc::new(name, SQL_VARYING + 1).with_length(length)
    }

    /// A nullable DATE column.
    pub fn date(name: &str) -> ColumnDesc {
        ColumnDesc::new(name, SQL_TYPE_DATE + 1)
    }
}

/// Library entry points, for failure injection and journal queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `attach_database`.
    Attach,
    /// `detach_database`.
    Detach,
    /// `create_database`.
    CreateDatabase,
    /// `drop_database`.
    DropDatabase,
    /// `start_transaction`.
    StartTransaction,
    /// `commit_transaction`.
    Commit,
    /// `rollback_transaction`.
    Rollback,
    /// `allocate_statement`.
    Allocate,
    /// `prepare_statement`.
    Prepare,
    /// `execute_statement`.
    Execute,
    /// `fetch_row`.
    Fetch,
    /// `close_cursor`.
    CloseCursor,
    /// `free_statement`.
    Free,
    /// `service_attach`.
    ServiceAttach,
    /// `service_detach`.
    ServiceDetach,
    /// `service_start`.
    ServiceStart,
    /// `service_query`.
    ServiceQuery,
}

/// One recorded library call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Attach to `file` with the given DPB.
    Attach {
        /// Database file.
        file: String,
        /// Raw DPB bytes.
        dpb: Vec<u8>,
    },
    /// Detach.
    Detach(DbHandle),
    /// Create a database.
    CreateDatabase {
        /// The `CREATE DATABASE` statement.
        sql: String,
    },
    /// Drop a database.
    DropDatabase(DbHandle),
    /// Start a transaction over `dbs`.
    StartTransaction {
        /// Spanned attachments.
        dbs: Vec<DbHandle>,
        /// Raw TPB bytes.
        tpb: Vec<u8>,
    },
    /// Commit.
    Commit(TrHandle),
    /// Roll back.
    Rollback(TrHandle),
    /// Allocate a statement.
    Allocate(DbHandle),
    /// Prepare `sql`.
    Prepare {
        /// Statement handle.
        stmt: StmtHandle,
        /// SQL text.
        sql: String,
    },
    /// Execute.
    Execute(StmtHandle),
    /// Fetch a row.
    Fetch(StmtHandle),
    /// Close a cursor.
    CloseCursor(StmtHandle),
    /// Free a statement.
    Free(StmtHandle),
    /// Attach to a service manager.
    ServiceAttach {
        /// Service name.
        service: String,
        /// Raw SPB bytes.
        spb: Vec<u8>,
    },
    /// Detach from a service manager.
    ServiceDetach(SvcHandle),
    /// Start a service task.
    ServiceStart(SvcHandle),
    /// Query service output with a buffer of `buffer_len` bytes.
    ServiceQuery {
        /// Service handle.
        svc: SvcHandle,
        /// Buffer size offered by the caller.
        buffer_len: usize,
    },
}

impl Call {
    /// The entry point this call went through.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Attach { .. } => Operation::Attach,
            Self::Detach(_) => Operation::Detach,
            Self::CreateDatabase { .. } => Operation::CreateDatabase,
            Self::DropDatabase(_) => Operation::DropDatabase,
            Self::StartTransaction { .. } => Operation::StartTransaction,
            Self::Commit(_) => Operation::Commit,
            Self::Rollback(_) => Operation::Rollback,
            Self::Allocate(_) => Operation::Allocate,
            Self::Prepare { .. } => Operation::Prepare,
            Self::Execute(_) => Operation::Execute,
            Self::Fetch(_) => Operation::Fetch,
            Self::CloseCursor(_) => Operation::CloseCursor,
            Self::Free(_) => Operation::Free,
            Self::ServiceAttach { .. } => Operation::ServiceAttach,
            Self::ServiceDetach(_) => Operation::ServiceDetach,
            Self::ServiceStart(_) => Operation::ServiceStart,
            Self::ServiceQuery { .. } => Operation::ServiceQuery,
        }
    }
}

/// Encode a service reply carrying `text` as `isc_info_svc_to_eof` output.
pub fn service_output(text: &str) -> Result<Bytes> {
    let len = u16::try_from(text.len()).map_err(|_| MockError::ReplyTooLong(text.len()))?;
    let mut buf = BytesMut::with_capacity(text.len() + 4);
    buf.put_u8(ISC_INFO_SVC_TO_EOF);
    buf.put_u16_le(len);
    buf.put_slice(text.as_bytes());
    buf.put_u8(ISC_INFO_END);
    Ok(buf.freeze())
}

/// Encode a service reply saying no output is ready yet.
#[must_use]
pub fn service_not_ready() -> Bytes {
    Bytes::from_static(&[ISC_INFO_DATA_NOT_READY, ISC_INFO_END])
}

/// File name of a `CREATE DATABASE '<file>' ...` statement.
pub fn parse_create_database(sql: &str) -> Result<String> {
    let unparseable = || MockError::UnparseableSql(sql.to_owned());
    let rest = sql.trim_start();
    let head = rest.get(..15).ok_or_else(unparseable)?;
    if !head.eq_ignore_ascii_case("CREATE DATABASE") {
        return Err(unparseable());
    }
    let rest = rest[15..].trim_start().strip_prefix('\'').ok_or_else(unparseable)?;

    let mut file = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
            } else {
                return Ok(file);
            }
        }
        file.push(c);
    }
    Err(unparseable())
}

fn classify(sql: &str) -> StatementKind {
    let word = sql.split_whitespace().next().unwrap_or_default().to_ascii_uppercase();
    match word.as_str() {
        "SELECT" | "WITH" if sql.to_ascii_uppercase().contains("FOR UPDATE") => {
            StatementKind::SelectForUpdate
        }
        "SELECT" | "WITH" => StatementKind::Select,
        "INSERT" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        "CREATE" | "ALTER" | "DROP" | "RECREATE" => StatementKind::Ddl,
        "EXECUTE" => StatementKind::ExecProcedure,
        _ => StatementKind::Other,
    }
}

/// Name of the object a DDL statement touches: the third word, as in
/// `DROP TABLE T`.
fn ddl_object(sql: &str) -> String {
    sql.split_whitespace()
        .nth(2)
        .map_or_else(|| "UNKNOWN".to_owned(), str::to_ascii_uppercase)
}

fn bad_statement(stmt: StmtHandle) -> StatusVector {
    StatusVector::error(ISC_RANDOM).with_string(format!("invalid statement handle {}", stmt.0))
}

/// Configuration for the mock library.
#[derive(Default)]
struct MockConfig {
    responses: HashMap<String, MockResponse>,
    default_response: Option<MockResponse>,
    users: HashMap<String, String>,
    restrict_files: bool,
}

/// Builder for [`MockClientLibrary`].
pub struct MockLibraryBuilder {
    config: MockConfig,
    databases: HashSet<String>,
    service_replies: VecDeque<Bytes>,
}

impl MockLibraryBuilder {
    /// Create a builder that accepts any file and any user, and answers
    /// unknown SQL as a statement affecting no records.
    pub fn new() -> Self {
        Self {
            config: MockConfig {
                default_response: Some(MockResponse::affected(0)),
                ..MockConfig::default()
            },
            databases: HashSet::new(),
            service_replies: VecDeque::new(),
        }
    }

    /// Declare an existing database file. Once any file is declared,
    /// attaching to an undeclared file fails.
    pub fn with_database(mut self, file: impl Into<String>) -> Self {
        self.databases.insert(file.into());
        self.config.restrict_files = true;
        self
    }

    /// Declare a user. Once any user is declared, attaching requires valid
    /// credentials. User names are case-insensitive.
    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.config
            .users
            .insert(user.into().to_ascii_uppercase(), password.into());
        self
    }

    /// Add a response for a specific SQL statement.
    pub fn with_response(mut self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.config.responses.insert(sql.into().trim().to_owned(), response);
        self
    }

    /// Set the response for unmatched SQL. `None` makes unmatched SQL fail
    /// to prepare.
    pub fn with_default_response(mut self, response: Option<MockResponse>) -> Self {
        self.config.default_response = response;
        self
    }

    /// Queue a raw service query reply.
    pub fn with_service_reply(mut self, reply: Bytes) -> Self {
        self.service_replies.push_back(reply);
        self
    }

    /// Build the library.
    pub fn build(self) -> Arc<MockClientLibrary> {
        Arc::new(MockClientLibrary {
            next_handle: AtomicU32::new(0),
            config: self.config,
            state: Mutex::new(State {
                databases: self.databases,
                service_replies: self.service_replies,
                ..State::default()
            }),
        })
    }
}

impl Default for MockLibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Attachment {
    file: String,
    dpb: Dpb,
}

#[derive(Debug)]
struct Stmt {
    db: DbHandle,
    sql: String,
    kind: Option<StatementKind>,
    response: Option<MockResponse>,
    cursor: Option<VecDeque<Vec<SqlValue>>>,
}

#[derive(Debug, Default)]
struct State {
    databases: HashSet<String>,
    attachments: HashMap<DbHandle, Attachment>,
    transactions: HashMap<TrHandle, Vec<DbHandle>>,
    statements: HashMap<StmtHandle, Stmt>,
    services: HashSet<SvcHandle>,
    service_replies: VecDeque<Bytes>,
    failures: HashMap<Operation, VecDeque<StatusVector>>,
    journal: Vec<Call>,
}

impl State {
    /// Record `call` and return the injected failure for it, if any.
    fn enter(&mut self, call: Call) -> std::result::Result<(), StatusVector> {
        let operation = call.operation();
        self.journal.push(call);
        match self.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(status) => {
                tracing::debug!(?operation, "injected failure");
                Err(status)
            }
            None => Ok(()),
        }
    }

    fn open_transactions_on(&self, db: DbHandle) -> usize {
        self.transactions.values().filter(|dbs| dbs.contains(&db)).count()
    }

    fn attached(&self, db: DbHandle) -> std::result::Result<&Attachment, StatusVector> {
        self.attachments
            .get(&db)
            .ok_or_else(|| StatusVector::error(ISC_BAD_DB_HANDLE))
    }
}

/// An in-memory client library.
pub struct MockClientLibrary {
    next_handle: AtomicU32,
    config: MockConfig,
    state: Mutex<State>,
}

impl MockClientLibrary {
    /// Create a new builder.
    pub fn builder() -> MockLibraryBuilder {
        MockLibraryBuilder::new()
    }

    /// A library with default behaviour.
    pub fn new() -> Arc<Self> {
        MockLibraryBuilder::new().build()
    }

    fn next(&self) -> u32 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Make the next call through `operation` fail with `status`.
    ///
    /// Repeated calls queue further failures.
    pub fn fail_next(&self, operation: Operation, status: StatusVector) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(status);
    }

    /// Queue a raw service query reply.
    pub fn push_service_reply(&self, reply: Bytes) {
        self.state.lock().service_replies.push_back(reply);
    }

    /// Every call made so far, in order.
    pub fn journal(&self) -> Vec<Call> {
        self.state.lock().journal.clone()
    }

    /// Calls made through `operation`, in order.
    pub fn calls(&self, operation: Operation) -> Vec<Call> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|call| call.operation() == operation)
            .cloned()
            .collect()
    }

    /// Forget the calls recorded so far.
    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Number of live attachments.
    pub fn open_attachments(&self) -> usize {
        self.state.lock().attachments.len()
    }

    /// Number of live transactions.
    pub fn open_transactions(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// Number of allocated statements.
    pub fn live_statements(&self) -> usize {
        self.state.lock().statements.len()
    }

    /// Whether `tr` is still live.
    pub fn is_transaction_open(&self, tr: TrHandle) -> bool {
        self.state.lock().transactions.contains_key(&tr)
    }

    /// The decoded DPB an attachment was made with.
    pub fn attachment_dpb(&self, db: DbHandle) -> Option<Dpb> {
        self.state.lock().attachments.get(&db).map(|a| a.dpb.clone())
    }

    /// Database files that currently exist.
    pub fn databases(&self) -> Vec<String> {
        let mut files: Vec<String> = self.state.lock().databases.iter().cloned().collect();
        files.sort();
        files
    }

    fn response_for(&self, sql: &str) -> Option<MockResponse> {
        let sql = sql.trim();
        self.config
            .responses
            .get(sql)
            .or_else(|| {
                self.config
                    .responses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(sql))
                    .map(|(_, response)| response)
            })
            .or(self.config.default_response.as_ref())
            .map(|response| response.resolve(sql))
    }

    fn check_login(&self, dpb: &Dpb) -> std::result::Result<(), StatusVector> {
        if self.config.users.is_empty() {
            return Ok(());
        }
        let known = dpb
            .user
            .as_deref()
            .and_then(|user| self.config.users.get(&user.to_ascii_uppercase()));
        match known {
            Some(password) if dpb.password.as_deref() == Some(password.as_str()) => Ok(()),
            _ => Err(StatusVector::error(ISC_LOGIN)),
        }
    }
}

impl fmt::Debug for MockClientLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockClientLibrary")
            .field("attachments", &state.attachments.len())
            .field("transactions", &state.transactions.len())
            .field("statements", &state.statements.len())
            .field("calls", &state.journal.len())
            .finish()
    }
}

impl ClientLibrary for MockClientLibrary {
    fn attach_database(&self, file: &str, dpb: &[u8]) -> std::result::Result<DbHandle, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Attach {
            file: file.to_owned(),
            dpb: dpb.to_vec(),
        })?;

        let decoded = Dpb::decode(dpb).map_err(|e| {
            StatusVector::error(ISC_RANDOM).with_string(format!("bad database parameter buffer: {e}"))
        })?;
        if self.config.restrict_files && !state.databases.contains(file) {
            return Err(StatusVector::error(ISC_IO_ERROR)
                .with_string("open")
                .with_string(file));
        }
        self.check_login(&decoded)?;

        let handle = DbHandle(self.next());
        state.databases.insert(file.to_owned());
        state.attachments.insert(
            handle,
            Attachment {
                file: file.to_owned(),
                dpb: decoded,
            },
        );
        tracing::trace!(file, %handle, "mock attach");
        Ok(handle)
    }

    fn detach_database(&self, db: DbHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Detach(db))?;
        state.attached(db)?;

        let open = state.open_transactions_on(db);
        if open > 0 {
            return Err(StatusVector::error(ISC_OPEN_TRANS).with_number(open as i64));
        }

        state.attachments.remove(&db);
        state.statements.retain(|_, stmt| stmt.db != db);
        Ok(())
    }

    fn create_database(&self, sql: &str, _dialect: u16) -> std::result::Result<DbHandle, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::CreateDatabase { sql: sql.to_owned() })?;

        let file = parse_create_database(sql).map_err(|e| {
            StatusVector::error(ISC_DSQL_ERROR)
                .with_code(ISC_DSQL_TOKEN_UNK_ERR)
                .with_number(1)
                .with_number(1)
                .with_interpreted(e.to_string())
        })?;
        if state.databases.contains(&file) {
            return Err(StatusVector::error(ISC_IO_ERROR)
                .with_string("create")
                .with_string(file));
        }

        let handle = DbHandle(self.next());
        state.databases.insert(file.clone());
        state.attachments.insert(
            handle,
            Attachment {
                file,
                dpb: Dpb::new(),
            },
        );
        Ok(handle)
    }

    fn drop_database(&self, db: DbHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::DropDatabase(db))?;
        let file = state.attached(db)?.file.clone();

        let others = state
            .attachments
            .iter()
            .any(|(handle, attachment)| *handle != db && attachment.file == file);
        if others || state.open_transactions_on(db) > 0 {
            return Err(StatusVector::error(ISC_OBJ_IN_USE).with_string(file));
        }

        state.attachments.remove(&db);
        state.databases.remove(&file);
        state.statements.retain(|_, stmt| stmt.db != db);
        Ok(())
    }

    fn start_transaction(&self, dbs: &[DbHandle], tpb: &[u8]) -> std::result::Result<TrHandle, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::StartTransaction {
            dbs: dbs.to_vec(),
            tpb: tpb.to_vec(),
        })?;
        if dbs.is_empty() {
            return Err(StatusVector::error(ISC_BAD_DB_HANDLE));
        }
        for db in dbs {
            state.attached(*db)?;
        }

        let handle = TrHandle(self.next());
        state.transactions.insert(handle, dbs.to_vec());
        Ok(handle)
    }

    fn commit_transaction(&self, tr: TrHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Commit(tr))?;
        state
            .transactions
            .remove(&tr)
            .map(drop)
            .ok_or_else(|| StatusVector::error(ISC_BAD_TRANS_HANDLE))
    }

    fn rollback_transaction(&self, tr: TrHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Rollback(tr))?;
        state
            .transactions
            .remove(&tr)
            .map(drop)
            .ok_or_else(|| StatusVector::error(ISC_BAD_TRANS_HANDLE))
    }

    fn allocate_statement(&self, db: DbHandle) -> std::result::Result<StmtHandle, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Allocate(db))?;
        state.attached(db)?;

        let handle = StmtHandle(self.next());
        state.statements.insert(
            handle,
            Stmt {
                db,
                sql: String::new(),
                kind: None,
                response: None,
                cursor: None,
            },
        );
        Ok(handle)
    }

    fn prepare_statement(
        &self,
        stmt: StmtHandle,
        tr: TrHandle,
        sql: &str,
        _dialect: u16,
    ) -> std::result::Result<StatementInfo, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Prepare {
            stmt,
            sql: sql.to_owned(),
        })?;
        if !state.transactions.contains_key(&tr) {
            return Err(StatusVector::error(ISC_BAD_TRANS_HANDLE));
        }
        if !state.statements.contains_key(&stmt) {
            return Err(bad_statement(stmt));
        }

        let response = self.response_for(sql).ok_or_else(|| {
            StatusVector::error(ISC_DSQL_ERROR)
                .with_code(ISC_DSQL_TOKEN_UNK_ERR)
                .with_number(1)
                .with_number(1)
                .with_interpreted(format!("no scripted response for: {sql}"))
        })?;

        let info = match &response {
            MockResponse::PrepareError(status) => return Err(status.clone()),
            MockResponse::Rows { columns, .. } => {
                let mut info = StatementInfo::query(columns.clone());
                if classify(sql) == StatementKind::SelectForUpdate {
                    info.kind = StatementKind::SelectForUpdate;
                }
                info
            }
            MockResponse::Ddl => StatementInfo::new(StatementKind::Ddl),
            MockResponse::Affected(_) | MockResponse::Error(_) | MockResponse::Custom(_) => {
                match classify(sql) {
                    kind if kind.is_query() => StatementInfo::new(StatementKind::Other),
                    kind => StatementInfo::new(kind),
                }
            }
        };

        if let Some(entry) = state.statements.get_mut(&stmt) {
            entry.sql = sql.to_owned();
            entry.kind = Some(info.kind);
            entry.response = Some(response);
            entry.cursor = None;
        }
        Ok(info)
    }

    fn execute_statement(&self, stmt: StmtHandle, tr: TrHandle) -> std::result::Result<u64, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Execute(stmt))?;
        if !state.transactions.contains_key(&tr) {
            return Err(StatusVector::error(ISC_BAD_TRANS_HANDLE));
        }
        let (db, kind, response, object) = match state.statements.get(&stmt) {
            Some(Stmt {
                db,
                sql,
                kind: Some(kind),
                response: Some(response),
                ..
            }) => (*db, *kind, response.clone(), ddl_object(sql)),
            _ => return Err(bad_statement(stmt)),
        };

        if kind == StatementKind::Ddl {
            let busy = state
                .statements
                .iter()
                .any(|(handle, other)| *handle != stmt && other.db == db);
            if busy {
                return Err(StatusVector::error(ISC_NO_META_UPDATE)
                    .with_code(ISC_OBJ_IN_USE)
                    .with_string(object));
            }
        }

        match response {
            MockResponse::Error(status) | MockResponse::PrepareError(status) => Err(status),
            MockResponse::Rows { rows, .. } => {
                if let Some(entry) = state.statements.get_mut(&stmt) {
                    entry.cursor = Some(rows.into());
                }
                Ok(0)
            }
            MockResponse::Affected(n) => Ok(n),
            MockResponse::Ddl | MockResponse::Custom(_) => Ok(0),
        }
    }

    fn fetch_row(&self, stmt: StmtHandle) -> std::result::Result<Option<Vec<SqlValue>>, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Fetch(stmt))?;
        let entry = state.statements.get_mut(&stmt).ok_or_else(|| bad_statement(stmt))?;
        let cursor = entry.cursor.as_mut().ok_or_else(|| {
            StatusVector::error(ISC_RANDOM).with_string("Attempt to fetch from a closed cursor")
        })?;
        Ok(cursor.pop_front())
    }

    fn close_cursor(&self, stmt: StmtHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::CloseCursor(stmt))?;
        let entry = state.statements.get_mut(&stmt).ok_or_else(|| bad_statement(stmt))?;
        entry.cursor = None;
        Ok(())
    }

    fn free_statement(&self, stmt: StmtHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::Free(stmt))?;
        state
            .statements
            .remove(&stmt)
            .map(drop)
            .ok_or_else(|| bad_statement(stmt))
    }

    fn service_attach(&self, service: &str, spb: &[u8]) -> std::result::Result<SvcHandle, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::ServiceAttach {
            service: service.to_owned(),
            spb: spb.to_vec(),
        })?;
        if !service.ends_with("service_mgr") {
            return Err(StatusVector::error(ISC_RANDOM).with_string(format!("unknown service {service}")));
        }
        // The service SPB shares its user and password tags with the DPB.
        if !self.config.users.is_empty() {
            let mut dpb_bytes = vec![fb_protocol::consts::ISC_DPB_VERSION1];
            dpb_bytes.extend_from_slice(spb.get(2..).unwrap_or_default());
            let credentials = Dpb::decode(&dpb_bytes).unwrap_or_default();
            self.check_login(&credentials)?;
        }

        let handle = SvcHandle(self.next());
        state.services.insert(handle);
        Ok(handle)
    }

    fn service_detach(&self, svc: SvcHandle) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::ServiceDetach(svc))?;
        if state.services.remove(&svc) {
            Ok(())
        } else {
            Err(StatusVector::error(ISC_RANDOM).with_string("invalid service handle"))
        }
    }

    fn service_start(&self, svc: SvcHandle, _request: &[u8]) -> std::result::Result<(), StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::ServiceStart(svc))?;
        if state.services.contains(&svc) {
            Ok(())
        } else {
            Err(StatusVector::error(ISC_RANDOM).with_string("invalid service handle"))
        }
    }

    fn service_query(
        &self,
        svc: SvcHandle,
        _items: &[u8],
        buffer_len: usize,
    ) -> std::result::Result<Vec<u8>, StatusVector> {
        let mut state = self.state.lock();
        state.enter(Call::ServiceQuery { svc, buffer_len })?;
        if !state.services.contains(&svc) {
            return Err(StatusVector::error(ISC_RANDOM).with_string("invalid service handle"));
        }

        let Some(reply) = state.service_replies.pop_front() else {
            return Ok(vec![ISC_INFO_END]);
        };
        if reply.len() > buffer_len {
            state.service_replies.push_front(reply);
            return Ok(vec![ISC_INFO_TRUNCATED, ISC_INFO_END]);
        }
        Ok(reply.to_vec())
    }
}

/// Build the SPB the client sends for `user`/`password`, for journal
/// assertions.
pub fn expected_spb(user: &str, password: &str) -> Result<Bytes> {
    Ok(Spb::new().with_user(user).with_password(password).encode()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_database() {
        assert_eq!(
            parse_create_database("CREATE DATABASE 'a''b.fdb' USER 'x'").unwrap(),
            "a'b.fdb"
        );
        assert_eq!(parse_create_database("create database 'x.fdb'").unwrap(), "x.fdb");
        assert!(parse_create_database("CREATE TABLE T").is_err());
        assert!(parse_create_database("CREATE DATABASE 'open").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("select 1 from rdb$database"), StatementKind::Select);
        assert_eq!(classify("SELECT * FROM T FOR UPDATE"), StatementKind::SelectForUpdate);
        assert_eq!(classify("  insert into t values (1)"), StatementKind::Insert);
        assert_eq!(classify("DROP TABLE T"), StatementKind::Ddl);
        assert_eq!(classify("SET GENERATOR G TO 1"), StatementKind::Other);
        assert_eq!(ddl_object("drop table orders"), "ORDERS");
    }

    #[test]
    fn test_service_output_encoding() {
        let reply = service_output("ok").unwrap();
        assert_eq!(&reply[..], &[ISC_INFO_SVC_TO_EOF, 2, 0, b'o', b'k', ISC_INFO_END]);
        assert!(matches!(
            service_output(&"x".repeat(70_000)),
            Err(MockError::ReplyTooLong(70_000))
        ));
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let library = MockClientLibrary::new();
        library.fail_next(Operation::Attach, StatusVector::error(ISC_LOGIN));
        assert!(library.attach_database("a.fdb", &[1]).is_err());
        assert!(library.attach_database("a.fdb", &[1]).is_ok());
        assert_eq!(library.calls(Operation::Attach).len(), 2);
    }

    #[test]
    fn test_detach_refuses_open_transactions() {
        let library = MockClientLibrary::new();
        let db = library.attach_database("a.fdb", &[1]).unwrap();
        let tr = library.start_transaction(&[db], &[]).unwrap();

        let status = library.detach_database(db).unwrap_err();
        assert_eq!(status.primary_code(), ISC_OPEN_TRANS);

        library.rollback_transaction(tr).unwrap();
        library.detach_database(db).unwrap();
        assert_eq!(library.open_attachments(), 0);
    }

    #[test]
    fn test_truncated_reply_is_kept() {
        let library = MockClientLibrary::builder()
            .with_service_reply(service_output("0123456789").unwrap())
            .build();
        let svc = library.service_attach("service_mgr", &[2, 2]).unwrap();

        let reply = library.service_query(svc, &[], 4).unwrap();
        assert_eq!(reply, vec![ISC_INFO_TRUNCATED, ISC_INFO_END]);
        let reply = library.service_query(svc, &[], 64).unwrap();
        assert_eq!(reply.len(), 14);
    }
}
