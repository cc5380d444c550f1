//! Per-connection registry of live transactions.
//!
//! A connection tracks every transaction that spans it so it can roll them
//! back before detaching. Transactions register on start and deregister
//! themselves from every spanning registry once they reach a terminal
//! state.

use parking_lot::Mutex;

use crate::error::Result;
use crate::transaction::Transaction;

/// Ordered collection of the live transactions of one connection.
///
/// The lock is never held while calling into the client library.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    entries: Mutex<Vec<Transaction>>,
}

impl TransactionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction. Duplicates are kept.
    pub fn register(&self, transaction: Transaction) {
        self.entries.lock().push(transaction);
    }

    /// Remove the first entry for `transaction`. Absent entries are a no-op.
    pub fn deregister(&self, transaction: &Transaction) {
        let mut entries = self.entries.lock();
        if let Some(index) = entries.iter().position(|t| t == transaction) {
            entries.remove(index);
        }
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no transaction is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the entries in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.entries.lock().clone()
    }

    fn pop(&self) -> Option<Transaction> {
        self.entries.lock().pop()
    }

    /// Roll back every registered transaction, most recent first, until the
    /// registry is empty.
    ///
    /// Entries that are no longer active are dropped without a native call.
    /// If a rollback fails the transaction is put back and the error is
    /// returned, leaving the remaining entries registered.
    pub fn drain_and_rollback(&self) -> Result<()> {
        while let Some(transaction) = self.pop() {
            if !transaction.is_active() {
                continue;
            }
            if let Err(error) = transaction.rollback() {
                self.register(transaction);
                return Err(error);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::library::TrHandle;
    use crate::testing::FakeLibrary;

    fn detached(library: &Arc<FakeLibrary>, handle: u32) -> Transaction {
        Transaction::from_parts(library.clone(), TrHandle(handle), &[])
    }

    #[test]
    fn test_register_keeps_order_and_duplicates() {
        let library = Arc::new(FakeLibrary::default());
        let registry = TransactionRegistry::new();
        let a = detached(&library, 1);
        let b = detached(&library, 2);

        registry.register(a.clone());
        registry.register(b.clone());
        registry.register(a.clone());

        assert_eq!(registry.snapshot(), vec![a.clone(), b.clone(), a.clone()]);

        registry.deregister(&a);
        assert_eq!(registry.snapshot(), vec![b.clone(), a.clone()]);

        let c = detached(&library, 3);
        registry.deregister(&c);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_drain_rolls_back_most_recent_first() {
        let library = Arc::new(FakeLibrary::default());
        let registry = TransactionRegistry::new();
        for handle in 1..=3 {
            registry.register(detached(&library, handle));
        }

        registry.drain_and_rollback().unwrap();

        assert!(registry.is_empty());
        assert_eq!(library.rollbacks(), vec![TrHandle(3), TrHandle(2), TrHandle(1)]);
    }

    #[test]
    fn test_drain_skips_inactive() {
        let library = Arc::new(FakeLibrary::default());
        let registry = TransactionRegistry::new();
        let committed = detached(&library, 1);
        committed.commit().unwrap();
        registry.register(committed);
        registry.register(detached(&library, 2));

        registry.drain_and_rollback().unwrap();

        assert!(registry.is_empty());
        assert_eq!(library.rollbacks(), vec![TrHandle(2)]);
    }

    #[test]
    fn test_drain_stops_on_failure() {
        let library = Arc::new(FakeLibrary::default());
        let registry = TransactionRegistry::new();
        registry.register(detached(&library, 1));
        registry.register(detached(&library, 2));
        library.fail_rollback(true);

        assert!(registry.drain_and_rollback().is_err());
        assert_eq!(registry.len(), 2);

        library.fail_rollback(false);
        registry.drain_and_rollback().unwrap();
        assert!(registry.is_empty());
    }
}
