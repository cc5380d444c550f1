//! Prepared statements.

use std::sync::Arc;

use fb_types::ColumnDesc;

use crate::config::Settings;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::handle::Owned;
use crate::library::{StatementKind, StmtHandle};
use crate::result_set::ResultSet;
use crate::status;
use crate::transaction::Transaction;

/// Outcome of executing a statement.
#[derive(Debug)]
pub enum Executed<T> {
    /// The statement was a query.
    Rows(T),
    /// The statement changed this many records.
    Affected(u64),
}

impl<T> Executed<T> {
    /// The query result, if this was a query.
    pub fn rows(self) -> Option<T> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Affected(_) => None,
        }
    }

    /// The affected record count, if this was not a query.
    #[must_use]
    pub fn affected(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Affected(n) => Some(*n),
        }
    }

    /// Whether this was a query.
    #[must_use]
    pub fn is_rows(&self) -> bool {
        matches!(self, Self::Rows(_))
    }

    /// Map the query result.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Executed<U> {
        match self {
            Self::Rows(rows) => Executed::Rows(f(rows)),
            Self::Affected(n) => Executed::Affected(n),
        }
    }
}

/// A SQL statement prepared against one connection within one transaction.
///
/// Executing a query hands the statement handle over to the returned
/// [`ResultSet`], after which the statement is closed. Non-queries may be
/// executed repeatedly.
pub struct Statement {
    handle: Option<Owned<StmtHandle>>,
    transaction: Transaction,
    kind: StatementKind,
    columns: Arc<[ColumnDesc]>,
    sql: String,
    dialect: u16,
    settings: Settings,
}

impl Statement {
    /// Allocate and prepare `sql` on `connection` under `transaction`.
    pub fn new(
        connection: &Connection,
        transaction: &Transaction,
        sql: &str,
        dialect: u16,
    ) -> Result<Self> {
        if connection.is_closed() {
            return Err(Error::usage("cannot prepare a statement on a closed connection"));
        }
        let tr = transaction
            .handle()
            .ok_or_else(|| Error::usage("cannot prepare a statement in an inactive transaction"))?;
        if !transaction.spans(connection) {
            return Err(Error::usage(
                "transaction does not span the connection the statement is prepared on",
            ));
        }

        let library = connection.library();
        let handle = library
            .allocate_statement(connection.handle())
            .map_err(|s| Error::Database(status::raise(&s, "Error allocating a SQL statement.")))?;
        let owned = Owned::new(Arc::clone(library), handle);

        let info = library
            .prepare_statement(handle, tr, sql, dialect)
            .map_err(|s| Error::Database(status::raise(&s, "Error preparing a SQL statement.")))?;

        tracing::debug!(%handle, kind = ?info.kind, dialect, "statement prepared");
        Ok(Self {
            handle: Some(owned),
            transaction: transaction.clone(),
            kind: info.kind,
            columns: info.columns.into(),
            sql: sql.to_owned(),
            dialect,
            settings: connection.settings(),
        })
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The dialect the statement was prepared with.
    #[must_use]
    pub fn dialect(&self) -> u16 {
        self.dialect
    }

    /// What the statement does.
    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Whether executing the statement produces rows.
    #[must_use]
    pub fn is_query(&self) -> bool {
        self.kind.is_query()
    }

    /// Output column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// The transaction the statement runs under.
    #[must_use]
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Whether the statement handle has been released or handed over.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Execute the statement.
    pub fn execute(&mut self) -> Result<Executed<ResultSet>> {
        let owned = self
            .handle
            .as_ref()
            .ok_or_else(|| Error::usage("cannot execute a closed statement"))?;
        let tr = self
            .transaction
            .handle()
            .ok_or_else(|| Error::usage("cannot execute in an inactive transaction"))?;

        let handle = owned.get();
        let affected = owned
            .library()
            .execute_statement(handle, tr)
            .map_err(|s| Error::Database(status::raise(&s, "Error executing SQL statement.")))?;
        tracing::debug!(%handle, query = self.is_query(), affected, "statement executed");

        if self.kind.is_query() {
            if let Some(owned) = self.handle.take() {
                return Ok(Executed::Rows(ResultSet::new(
                    owned,
                    Arc::clone(&self.columns),
                    self.settings,
                )));
            }
        }
        Ok(Executed::Affected(affected))
    }

    /// Release the statement handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut owned) = self.handle.take() else {
            return Ok(());
        };
        if let Err(s) = owned.release() {
            owned.forget();
            return Err(Error::Database(status::raise(&s, "Error releasing statement.")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("kind", &self.kind)
            .field("dialect", &self.dialect)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executed_accessors() {
        let rows: Executed<&str> = Executed::Rows("rs");
        assert!(rows.is_rows());
        assert_eq!(rows.affected(), None);
        assert_eq!(rows.map(str::len).rows(), Some(2));

        let affected: Executed<&str> = Executed::Affected(3);
        assert_eq!(affected.affected(), Some(3));
        assert_eq!(affected.rows(), None);
    }
}
