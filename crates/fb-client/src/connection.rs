//! Database connections.
//!
//! A [`Connection`] owns one native attachment and the registry of every
//! transaction still open against it. Closing a connection, explicitly or
//! by dropping it, rolls those transactions back before detaching.
//!
//! ## Example
//!
//! ```rust,ignore
//! let db = Database::new(library, "localhost:/data/employee.fdb");
//! let connection = db.connect(Some("SYSDBA"), Some("masterkey"), &ConnectionOptions::new())?;
//!
//! connection.transaction(|tx| {
//!     connection.execute("UPDATE T SET N = N + 1", tx)?;
//!     Ok::<_, Error>(())
//! })?;
//!
//! let total = connection.execute_immediate_with("SELECT N FROM T", |row| row.get::<i32>(0))?;
//! connection.close()?;
//! ```

use std::sync::Arc;

use fb_protocol::Tpb;
use fb_protocol::consts::{
    ISC_DPB_DAMAGED, ISC_DPB_FORCE_WRITE, ISC_DPB_LC_CTYPE, ISC_DPB_LC_MESSAGES,
    ISC_DPB_NUM_BUFFERS, ISC_DPB_SQL_ROLE_NAME, ISC_DPB_SYS_USER_NAME,
};

use crate::config::{ConnectionOptions, Settings};
use crate::database::Database;
use crate::error::{Error, Result, with_cleanup};
use crate::handle::Attachment;
use crate::library::{ClientLibrary, DbHandle};
use crate::registry::TransactionRegistry;
use crate::result_set::ResultSet;
use crate::row::Row;
use crate::statement::{Executed, Statement};
use crate::status;
use crate::transaction::Transaction;

/// An attachment to one database.
///
/// Not `Clone`: the attachment handle has exactly one owner.
pub struct Connection {
    attachment: Attachment,
    database: Database,
    user: Option<String>,
    registry: Arc<TransactionRegistry>,
}

impl Connection {
    /// Option tag: mark the database as damaged.
    pub const MARK_DATABASE_DAMAGED: u8 = ISC_DPB_DAMAGED;
    /// Option tag: forced-write policy.
    pub const WRITE_POLICY: u8 = ISC_DPB_FORCE_WRITE;
    /// Option tag: connection character set.
    pub const CHARACTER_SET: u8 = ISC_DPB_LC_CTYPE;
    /// Option tag: message file locale.
    pub const MESSAGE_FILE: u8 = ISC_DPB_LC_MESSAGES;
    /// Option tag: number of cache buffers.
    pub const NUMBER_OF_CACHE_BUFFERS: u8 = ISC_DPB_NUM_BUFFERS;
    /// Option tag: DBA user name.
    pub const DBA_USER_NAME: u8 = ISC_DPB_SYS_USER_NAME;
    /// Option tag: SQL role.
    pub const ROLE: u8 = ISC_DPB_SQL_ROLE_NAME;
    /// Write policy value: asynchronous writes.
    pub const WRITE_ASYNCHRONOUS: i64 = 0;
    /// Write policy value: forced (synchronous) writes.
    pub const WRITE_SYNCHRONOUS: i64 = 1;

    /// Attach to `database`.
    ///
    /// A failed attach is reported as [`Error::Connection`] carrying the
    /// decoded status.
    pub fn open(
        database: &Database,
        user: Option<&str>,
        password: Option<&str>,
        options: &ConnectionOptions,
    ) -> Result<Self> {
        let dpb = options.to_dpb(user, password).encode()?;
        let library = Arc::clone(database.library());

        let handle = library
            .attach_database(database.file(), &dpb)
            .map_err(|s| Error::Connection(status::raise(&s, "Error opening database connection.")))?;
        drop(dpb);

        tracing::info!(file = database.file(), %handle, "connection opened");
        Ok(Self {
            attachment: Attachment::new(library, handle),
            database: database.clone(),
            user: user.map(str::to_owned),
            registry: Arc::new(TransactionRegistry::new()),
        })
    }

    /// Whether the connection is attached.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.attachment.is_null()
    }

    /// Whether the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.attachment.is_null()
    }

    /// Roll back every open transaction and detach.
    ///
    /// Returns `Ok(false)` when the connection was already closed. If the
    /// detach fails the connection stays open and `close` may be retried.
    pub fn close(&mut self) -> Result<bool> {
        if self.is_closed() {
            return Ok(false);
        }

        self.registry.drain_and_rollback()?;

        let handle = self.attachment.get();
        self.attachment
            .release()
            .map_err(|s| Error::Connection(status::raise(&s, "Error closing database connection.")))?;

        tracing::info!(file = self.database.file(), %handle, "connection closed");
        Ok(true)
    }

    pub(crate) fn handle(&self) -> DbHandle {
        self.attachment.get()
    }

    pub(crate) fn library(&self) -> &Arc<dyn ClientLibrary> {
        self.attachment.library()
    }

    pub(crate) fn registry(&self) -> &Arc<TransactionRegistry> {
        &self.registry
    }

    /// Settings inherited from the database descriptor.
    #[must_use]
    pub fn settings(&self) -> Settings {
        *self.database.settings()
    }

    /// The attach-time user name.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The descriptor this connection was opened from.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Transactions still open on this connection, oldest first.
    #[must_use]
    pub fn transactions(&self) -> Vec<Transaction> {
        self.registry.snapshot()
    }

    /// Start a transaction with default options.
    pub fn start_transaction(&self) -> Result<Transaction> {
        Transaction::start(&[self])
    }

    /// Start a transaction with explicit options.
    pub fn start_transaction_with(&self, options: &Tpb) -> Result<Transaction> {
        Transaction::start_with(&[self], options)
    }

    /// Run `f` in a new transaction.
    ///
    /// Commits when `f` succeeds. When `f` or the commit fails the
    /// transaction is rolled back and the first error is returned as is; a
    /// failing rollback is only logged. A transaction `f` already ended
    /// itself is left alone.
    pub fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let transaction = self.start_transaction()?;
        match f(&transaction) {
            Ok(value) => {
                if transaction.is_active() {
                    if let Err(error) = transaction.commit() {
                        Self::roll_back_quietly(&transaction);
                        return Err(error.into());
                    }
                }
                Ok(value)
            }
            Err(error) => {
                Self::roll_back_quietly(&transaction);
                Err(error)
            }
        }
    }

    fn roll_back_quietly(transaction: &Transaction) {
        if !transaction.is_active() {
            return;
        }
        if let Err(rollback) = transaction.rollback() {
            tracing::warn!(
                transaction = transaction.id(),
                error = %rollback,
                "rollback after failed unit of work failed"
            );
        }
    }

    fn prepare(&self, sql: &str, transaction: &Transaction) -> Result<Statement> {
        Statement::new(self, transaction, sql, self.settings().dialect)
    }

    /// Prepare and execute `sql` under `transaction`.
    ///
    /// The statement is released on every path. A query hands its handle to
    /// the returned [`ResultSet`].
    pub fn execute(&self, sql: &str, transaction: &Transaction) -> Result<Executed<ResultSet>> {
        let mut statement = self.prepare(sql, transaction)?;
        let executed = statement.execute();
        with_cleanup(executed, statement.close(), "closing statement")
    }

    /// Execute `sql` under `transaction`, feeding query rows to `f`.
    ///
    /// For a query, returns the value `f` produced for the last row (`None`
    /// when there were no rows) after closing the result set.
    pub fn execute_with<T, E, F>(
        &self,
        sql: &str,
        transaction: &Transaction,
        f: F,
    ) -> std::result::Result<Executed<Option<T>>, E>
    where
        F: FnMut(Row) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        match self.execute(sql, transaction)? {
            Executed::Rows(mut rows) => {
                let consumed = rows.consume(f);
                let closed = rows.close();
                match (consumed, closed) {
                    (Ok(last), Ok(())) => Ok(Executed::Rows(last)),
                    (Ok(_), Err(error)) => Err(error.into()),
                    (Err(error), closed) => {
                        if let Err(secondary) = closed {
                            tracing::warn!(error = %secondary, "closing result set failed after an earlier error");
                        }
                        Err(error)
                    }
                }
            }
            Executed::Affected(n) => Ok(Executed::Affected(n)),
        }
    }

    /// Execute `sql` in an implicit transaction.
    ///
    /// On failure the implicit transaction is rolled back. A non-query
    /// commits at once. A query hands the transaction to the returned
    /// [`ResultSet`], which commits it when closed.
    pub fn execute_immediate(&self, sql: &str) -> Result<Executed<ResultSet>> {
        let transaction = self.start_transaction()?;
        match self.execute(sql, &transaction) {
            Ok(Executed::Rows(mut rows)) => {
                rows.adopt_transaction(transaction);
                Ok(Executed::Rows(rows))
            }
            Ok(Executed::Affected(n)) => {
                transaction.force_commit()?;
                Ok(Executed::Affected(n))
            }
            Err(error) => with_cleanup(Err(error), transaction.rollback(), "rolling back"),
        }
    }

    /// Execute `sql` in an implicit transaction, feeding query rows to `f`.
    ///
    /// Rows arrive in fetch order. After the last row the result set is
    /// closed, which commits the implicit transaction, and the value `f`
    /// produced for the last row is returned. If `f` fails the transaction
    /// is rolled back instead and the error from `f` is returned.
    pub fn execute_immediate_with<T, E, F>(
        &self,
        sql: &str,
        f: F,
    ) -> std::result::Result<Executed<Option<T>>, E>
    where
        F: FnMut(Row) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        match self.execute_immediate(sql)? {
            Executed::Rows(mut rows) => match rows.consume(f) {
                Ok(last) => {
                    rows.close()?;
                    Ok(Executed::Rows(last))
                }
                Err(error) => {
                    if let Err(secondary) = rows.discard() {
                        tracing::warn!(error = %secondary, "discarding result set failed after an earlier error");
                    }
                    Err(error)
                }
            },
            Executed::Affected(n) => Ok(Executed::Affected(n)),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Err(error) = self.registry.drain_and_rollback() {
            tracing::warn!(%error, "failed to roll back open transactions on drop");
        }
        // The attachment detaches itself.
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_closed() {
            f.write_str("(CLOSED)")
        } else {
            write!(
                f,
                "{}@{} (OPEN)",
                self.user.as_deref().unwrap_or_default(),
                self.database.file()
            )
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("file", &self.database.file())
            .field("user", &self.user)
            .field("handle", &self.attachment.get())
            .field("transactions", &self.registry.len())
            .finish()
    }
}
