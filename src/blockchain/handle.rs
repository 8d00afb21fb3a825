use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::ChainResult;
use super::model::{ChainExport, ChainManager};
use super::Block;
use crate::transaction::{AccountState, Transaction};

/// Cloneable handle to the node's single chain resource.
///
/// Readers share the lock; anything that mutates chain, state or mempool
/// takes it exclusively. Guards must never be held across an `.await`.
#[derive(Debug, Clone)]
pub struct ChainHandle {
    inner: Arc<RwLock<ChainManager>>,
}

impl ChainHandle {
    pub fn new(manager: ChainManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ChainManager> {
        self.inner.read().expect("chain lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ChainManager> {
        self.inner.write().expect("chain lock poisoned")
    }

    pub fn add_block(&self, block: Block) -> ChainResult<()> {
        self.write().add_block(block)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> ChainResult<()> {
        self.write().submit_transaction(tx)
    }

    pub fn create_transaction(&self, from: &str, to: &str, value: u64, data: Vec<u8>) -> Transaction {
        self.read().create_transaction(from, to, value, data)
    }

    pub fn latest_block(&self) -> Block {
        self.read().latest_block().clone()
    }

    pub fn height(&self) -> u64 {
        self.read().height()
    }

    pub fn balance(&self, address: &str) -> u64 {
        self.read().balance(address)
    }

    pub fn account(&self, address: &str) -> AccountState {
        self.read().account(address)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.read().pending_transactions().to_vec()
    }

    pub fn export(&self) -> ChainExport {
        self.read().export()
    }
}
