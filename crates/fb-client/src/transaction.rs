//! Transactions.
//!
//! A [`Transaction`] is a shared reference to one native transaction. It may
//! span several connections (a multi-database transaction). Every spanning
//! connection registers it on start and is told when it ends, so a
//! connection that closes can roll back exactly the work still open on it.
//!
//! ## Example
//!
//! ```rust,ignore
//! let tx = connection.start_transaction()?;
//! connection.execute("INSERT INTO t VALUES (1)", &tx)?;
//! tx.commit()?;
//!
//! // Across two databases.
//! let tx = Transaction::start(&[&orders, &billing])?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use fb_protocol::Tpb;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::library::{ClientLibrary, DbHandle, TrHandle};
use crate::registry::TransactionRegistry;
use crate::status;

pub use fb_protocol::tpb::IsolationLevel;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Inner {
    id: u64,
    library: Arc<dyn ClientLibrary>,
    handle: Mutex<Option<TrHandle>>,
    owners: SmallVec<[Weak<TransactionRegistry>; 1]>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            if let Err(status) = self.library.rollback_transaction(handle) {
                tracing::warn!(
                    transaction = self.id,
                    error = %status,
                    "failed to roll back abandoned transaction"
                );
            }
        }
    }
}

/// A unit of work on one or more connections.
///
/// Clones refer to the same native transaction. Two values compare equal
/// when they refer to the same transaction.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

impl Transaction {
    /// Start a transaction spanning every connection in `connections`.
    ///
    /// The transaction is registered with each connection.
    pub fn start(connections: &[&Connection]) -> Result<Self> {
        Self::start_with(connections, &Tpb::new())
    }

    /// Start a transaction with explicit options.
    pub fn start_with(connections: &[&Connection], options: &Tpb) -> Result<Self> {
        let first = connections
            .first()
            .ok_or_else(|| Error::usage("a transaction must span at least one connection"))?;

        let mut databases: SmallVec<[DbHandle; 1]> = SmallVec::with_capacity(connections.len());
        for connection in connections {
            if connection.is_closed() {
                return Err(Error::usage(
                    "cannot start a transaction on a closed connection",
                ));
            }
            if !Arc::ptr_eq(connection.library(), first.library()) {
                return Err(Error::usage(
                    "every connection in a transaction must use the same client library",
                ));
            }
            databases.push(connection.handle());
        }

        let library = first.library().clone();
        let handle = library
            .start_transaction(&databases, &options.encode())
            .map_err(|s| Error::Database(status::raise(&s, "Error starting transaction.")))?;

        let registries: SmallVec<[&Arc<TransactionRegistry>; 1]> =
            connections.iter().map(|c| c.registry()).collect();
        let transaction = Self::from_parts(library, handle, &registries);
        for registry in registries {
            registry.register(transaction.clone());
        }

        tracing::debug!(
            transaction = transaction.id(),
            %handle,
            connections = connections.len(),
            "transaction started"
        );
        Ok(transaction)
    }

    pub(crate) fn from_parts(
        library: Arc<dyn ClientLibrary>,
        handle: TrHandle,
        owners: &[&Arc<TransactionRegistry>],
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                library,
                handle: Mutex::new(Some(handle)),
                owners: owners.iter().map(|r| Arc::downgrade(r)).collect(),
            }),
        }
    }

    /// Process-unique identifier, for logging.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether the transaction can still be committed or rolled back.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.handle.lock().is_some()
    }

    /// The native handle, if still active.
    #[must_use]
    pub fn handle(&self) -> Option<TrHandle> {
        *self.inner.handle.lock()
    }

    /// Whether the transaction spans `connection`.
    #[must_use]
    pub fn spans(&self, connection: &Connection) -> bool {
        let target = Arc::as_ptr(connection.registry());
        self.inner
            .owners
            .iter()
            .any(|owner| std::ptr::eq(owner.as_ptr(), target))
    }

    /// Number of connections the transaction spans.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.owners.len()
    }

    /// Commit.
    ///
    /// On failure the transaction stays active and registered.
    pub fn commit(&self) -> Result<()> {
        self.finish("commit", |library, handle| {
            library
                .commit_transaction(handle)
                .map_err(|s| Error::Database(status::raise(&s, "Error committing transaction.")))
        })
    }

    /// Roll back.
    ///
    /// On failure the transaction stays active and registered.
    pub fn rollback(&self) -> Result<()> {
        self.finish("rollback", |library, handle| {
            library.rollback_transaction(handle).map_err(|s| {
                Error::Database(status::raise(&s, "Error rolling back transaction."))
            })
        })
    }

    /// Commit, falling back to rollback, and discard the transaction.
    ///
    /// The transaction is inactive and deregistered afterwards whatever the
    /// outcome. A failed commit is reported even when the rollback that
    /// follows it succeeds. Calling this on an inactive transaction does
    /// nothing.
    pub fn force_commit(&self) -> Result<()> {
        let mut guard = self.inner.handle.lock();
        let Some(handle) = guard.take() else {
            return Ok(());
        };
        drop(guard);

        let library = &self.inner.library;
        let result = match library.commit_transaction(handle) {
            Ok(()) => Ok(()),
            Err(commit) => {
                let error = Error::Database(status::raise(&commit, "Error committing transaction."));
                match library.rollback_transaction(handle) {
                    Ok(()) => tracing::warn!(
                        transaction = self.id(),
                        %error,
                        "forced commit failed, transaction rolled back"
                    ),
                    Err(rollback) => tracing::warn!(
                        transaction = self.id(),
                        %error,
                        rollback_error = %rollback,
                        "forced commit failed and rollback failed, transaction discarded"
                    ),
                }
                Err(error)
            }
        };

        self.release_from_owners();
        tracing::debug!(transaction = self.id(), ok = result.is_ok(), "transaction force-committed");
        result
    }

    fn finish<F>(&self, action: &'static str, end: F) -> Result<()>
    where
        F: FnOnce(&dyn ClientLibrary, TrHandle) -> Result<()>,
    {
        let mut guard = self.inner.handle.lock();
        let handle = (*guard).ok_or_else(|| {
            Error::usage(format!("cannot {action} a transaction that is no longer active"))
        })?;
        end(self.inner.library.as_ref(), handle)?;
        *guard = None;
        drop(guard);

        self.release_from_owners();
        tracing::debug!(transaction = self.id(), action, "transaction ended");
        Ok(())
    }

    /// Tell every spanning connection the transaction is over.
    fn release_from_owners(&self) {
        for owner in &self.inner.owners {
            if let Some(registry) = owner.upgrade() {
                registry.deregister(self);
            }
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Transaction {}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .field("connections", &self.inner.owners.len())
            .finish()
    }
}
