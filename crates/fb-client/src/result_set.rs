//! Forward-only result sets.
//!
//! A [`ResultSet`] owns the statement handle of the query that produced it
//! and, for queries run through
//! [`Connection::execute_immediate`](crate::Connection::execute_immediate),
//! the implicit transaction as well. Closing the result set closes the
//! cursor, frees the statement and force-commits that transaction.

use std::sync::Arc;

use fb_types::ColumnDesc;

use crate::config::Settings;
use crate::error::{Error, Result, with_cleanup};
use crate::handle::Owned;
use crate::library::StmtHandle;
use crate::row::Row;
use crate::status;
use crate::transaction::Transaction;

/// Rows of an executed query, fetched one at a time.
pub struct ResultSet {
    statement: Option<Owned<StmtHandle>>,
    columns: Arc<[ColumnDesc]>,
    settings: Settings,
    transaction: Option<Transaction>,
    exhausted: bool,
    fetched: u64,
}

impl ResultSet {
    pub(crate) fn new(
        statement: Owned<StmtHandle>,
        columns: Arc<[ColumnDesc]>,
        settings: Settings,
    ) -> Self {
        Self {
            statement: Some(statement),
            columns,
            settings,
            transaction: None,
            exhausted: false,
            fetched: 0,
        }
    }

    /// Hand the fate of `transaction` to this result set.
    pub(crate) fn adopt_transaction(&mut self, transaction: Transaction) {
        self.transaction = Some(transaction);
    }

    /// Output column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// Number of output columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows fetched so far.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.fetched
    }

    /// Whether the cursor has reported its last row.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether the result set has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.statement.is_none()
    }

    /// The implicit transaction owned by this result set, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Fetch the next row. `None` once the cursor is exhausted.
    pub fn fetch(&mut self) -> Result<Option<Row>> {
        let statement = self
            .statement
            .as_ref()
            .ok_or_else(|| Error::usage("cannot fetch from a closed result set"))?;
        if self.exhausted {
            return Ok(None);
        }

        match statement.library().fetch_row(statement.get()) {
            Ok(Some(values)) => {
                self.fetched += 1;
                Ok(Some(Row::new(values, Arc::clone(&self.columns), &self.settings)))
            }
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(s) => {
                self.exhausted = true;
                Err(Error::Database(status::raise(&s, "Error fetching query row.")))
            }
        }
    }

    /// Feed every remaining row to `f` in fetch order and return the last
    /// value it produced. Stops at the first error.
    pub fn consume<T, E, F>(&mut self, mut f: F) -> std::result::Result<Option<T>, E>
    where
        F: FnMut(Row) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut last = None;
        while let Some(row) = self.fetch()? {
            last = Some(f(row)?);
        }
        Ok(last)
    }

    /// Close the cursor, free the statement and force-commit an owned
    /// transaction. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.shutdown(true)
    }

    /// Like [`close`](Self::close), but roll back an owned transaction.
    pub(crate) fn discard(&mut self) -> Result<()> {
        self.shutdown(false)
    }

    fn shutdown(&mut self, commit: bool) -> Result<()> {
        let Some(mut statement) = self.statement.take() else {
            return Ok(());
        };

        let handle = statement.get();
        let closed = statement
            .library()
            .close_cursor(handle)
            .map_err(|s| Error::Database(status::raise(&s, "Error closing result set.")));
        let freed = match statement.release() {
            Ok(()) => Ok(()),
            Err(s) => {
                statement.forget();
                Err(Error::Database(status::raise(&s, "Error releasing statement.")))
            }
        };

        let ended = match self.transaction.take() {
            Some(transaction) if commit => transaction.force_commit(),
            Some(transaction) if transaction.is_active() => transaction.rollback(),
            _ => Ok(()),
        };

        tracing::debug!(%handle, rows = self.fetched, "result set closed");
        let result = with_cleanup(closed, freed, "releasing statement");
        with_cleanup(result, ended, "ending implicit transaction")
    }
}

impl Iterator for ResultSet {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_closed() || self.exhausted {
            return None;
        }
        self.fetch().transpose()
    }
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(%error, "failed to close result set on drop");
        }
    }
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("columns", &self.columns.len())
            .field("fetched", &self.fetched)
            .field("exhausted", &self.exhausted)
            .field("closed", &self.is_closed())
            .field("transaction", &self.transaction)
            .finish()
    }
}
