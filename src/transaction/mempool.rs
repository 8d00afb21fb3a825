use log::debug;
use std::collections::HashSet;

use super::error::MempoolError;
use super::model::Transaction;

/// Pending transactions, unique by hash, kept in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    txs: Vec<Transaction>,
    hashes: HashSet<String>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append. Rejects malformed and duplicate transactions.
    pub fn admit(&mut self, tx: Transaction) -> Result<(), MempoolError> {
        tx.validate()?;
        self.insert(tx)
    }

    /// Append a transaction the caller has already validated.
    pub fn insert(&mut self, tx: Transaction) -> Result<(), MempoolError> {
        if self.hashes.contains(&tx.hash) {
            return Err(MempoolError::Duplicate(tx.hash));
        }
        self.hashes.insert(tx.hash.clone());
        self.txs.push(tx);
        Ok(())
    }

    /// First `n` transactions in arrival order. Does not remove them.
    pub fn take_up_to(&self, n: usize) -> Vec<Transaction> {
        self.txs.iter().take(n).cloned().collect()
    }

    /// Remove exactly the given hashes.
    pub fn evict(&mut self, hashes: &HashSet<String>) {
        if hashes.is_empty() {
            return;
        }
        let before = self.txs.len();
        self.txs.retain(|t| !hashes.contains(&t.hash));
        self.hashes.retain(|h| !hashes.contains(h));
        debug!(
            "Mempool cleaned: {} -> {} (removed {})",
            before,
            self.txs.len(),
            before.saturating_sub(self.txs.len())
        );
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Pending transactions sent by `address`, in arrival order.
    pub fn from_sender<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a Transaction> {
        self.txs.iter().filter(move |t| t.from == address)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Keypair, signed_transfer};
    use crate::transaction::TransactionError;

    #[test]
    fn admitting_same_hash_twice_fails_once() {
        let alice = Keypair::generate();
        let tx = signed_transfer(&alice, "bob", 10, 0, 0);
        let mut pool = Mempool::new();

        assert_eq!(pool.admit(tx.clone()), Ok(()));
        assert_eq!(
            pool.admit(tx.clone()),
            Err(MempoolError::Duplicate(tx.hash.clone()))
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn rejects_invalid_transactions() {
        let alice = Keypair::generate();
        let mut tx = signed_transfer(&alice, "bob", 10, 0, 0);
        tx.value = 11;
        let mut pool = Mempool::new();
        assert!(matches!(
            pool.admit(tx),
            Err(MempoolError::Invalid(TransactionError::HashMismatch { .. }))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn take_preserves_arrival_order_without_removing() {
        let alice = Keypair::generate();
        let mut pool = Mempool::new();
        let txs: Vec<_> = (0..4)
            .map(|n| signed_transfer(&alice, "bob", 1 + n, n, 0))
            .collect();
        for tx in &txs {
            pool.admit(tx.clone()).unwrap();
        }

        let first = pool.take_up_to(3);
        assert_eq!(first, txs[..3].to_vec());
        assert_eq!(pool.take_up_to(10).len(), 4);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn evict_removes_exactly_given_hashes() {
        let alice = Keypair::generate();
        let mut pool = Mempool::new();
        let txs: Vec<_> = (0..3)
            .map(|n| signed_transfer(&alice, "bob", 1, n, 0))
            .collect();
        for tx in &txs {
            pool.admit(tx.clone()).unwrap();
        }

        let gone: HashSet<String> = [txs[1].hash.clone(), "unknown".to_string()].into();
        pool.evict(&gone);

        assert_eq!(pool.transactions(), &[txs[0].clone(), txs[2].clone()]);
        assert!(!pool.contains(&txs[1].hash));
        // Evicted hash may be admitted again.
        pool.admit(txs[1].clone()).unwrap();
        assert_eq!(pool.from_sender(&alice.address).count(), 3);
    }
}
