use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::error::{BlockError, ChainError, ChainResult};
use super::{Block, ChainConfig, GENESIS_TIMESTAMP};
use crate::transaction::{
    AccountState, Mempool, MempoolError, SIMPLE_TRANSFER_GAS, StateStore, Transaction,
};

/// Serialized snapshot of the whole node: chain, accounts and mempool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainExport {
    pub chain: Vec<Block>,
    pub state: BTreeMap<String, AccountState>,
    pub pending_txs: Vec<Transaction>,
}

/// Owns the block list, the account store and the mempool, and keeps
/// them consistent: a block is appended only together with its effects.
#[derive(Debug)]
pub struct ChainManager {
    chain: Vec<Block>,
    state: StateStore,
    mempool: Mempool,
    config: ChainConfig,
}

impl ChainManager {
    /// Build genesis from `config` and seed the genesis accounts.
    pub fn new(config: ChainConfig) -> Self {
        let genesis = Block::genesis(&config);
        let state = genesis_state(&config, genesis.header.timestamp);
        info!(
            "CHAIN - genesis {} with {} funded accounts (chain_id={})",
            genesis.hash(),
            config.genesis_accounts.len(),
            config.chain_id
        );

        Self {
            chain: vec![genesis],
            state,
            mempool: Mempool::new(),
            config,
        }
    }

    /// Rebuild from an exported snapshot. The chain must start with this
    /// config's genesis and verify end to end. Account state is replayed
    /// from genesis and must agree with the exported balances, nonces and
    /// stakes. Pending transactions that no longer admit are dropped.
    pub fn restore(config: ChainConfig, export: ChainExport) -> ChainResult<Self> {
        let expected_genesis = Block::genesis(&config);
        match export.chain.first() {
            None => return Err(ChainError::Restore("empty chain".into())),
            Some(g) if g.hash() != expected_genesis.hash() => {
                return Err(ChainError::Restore("genesis does not match config".into()));
            }
            Some(_) => {}
        }
        verify_blocks(&export.chain, &config).map_err(|e| ChainError::Restore(e.to_string()))?;

        let mut state = replay_state(&config, &export.chain)?;
        let addresses: BTreeSet<&String> = export
            .state
            .keys()
            .chain(state.iter().map(|(addr, _)| addr))
            .collect();
        for address in addresses {
            let replayed = state.get(address);
            let exported = export.state.get(address).copied().unwrap_or_default();
            if (replayed.balance, replayed.nonce, replayed.stake)
                != (exported.balance, exported.nonce, exported.stake)
            {
                return Err(ChainError::Restore(format!(
                    "state for {} does not match chain (balance {} vs {}, nonce {} vs {})",
                    address, exported.balance, replayed.balance, exported.nonce, replayed.nonce
                )));
            }
        }
        // Activity times are wall-clock and not derivable from blocks.
        for (address, exported) in &export.state {
            if !state.contains(address) {
                continue;
            }
            let mut account = state.get(address);
            account.last_active = exported.last_active;
            state.insert(address.clone(), account);
        }

        let mut manager = Self {
            chain: export.chain,
            state,
            mempool: Mempool::new(),
            config,
        };

        for tx in export.pending_txs {
            let hash = tx.hash.clone();
            if let Err(e) = manager.submit_transaction(tx) {
                warn!("RESTORE - dropped pending tx {}: {}", hash, e);
            }
        }
        info!(
            "RESTORE - restored chain at #{} ({} accounts, {} pending)",
            manager.height(),
            manager.state.len(),
            manager.mempool.len()
        );
        Ok(manager)
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Return the last block in the chain.
    pub fn latest_block(&self) -> &Block {
        // `new` and `restore` never leave the chain empty.
        &self.chain[self.chain.len() - 1]
    }

    /// Height of the head block (genesis is 0).
    pub fn height(&self) -> u64 {
        self.latest_block().header.height
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn block_at(&self, height: u64) -> Option<&Block> {
        self.chain.get(usize::try_from(height).ok()?)
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn account(&self, address: &str) -> AccountState {
        self.state.get(address)
    }

    pub fn balance(&self, address: &str) -> u64 {
        self.state.get(address).balance
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.transactions()
    }

    /// Committed nonce plus the sender's transactions already pending.
    pub fn next_nonce(&self, address: &str) -> u64 {
        self.state.get(address).nonce + self.mempool.from_sender(address).count() as u64
    }

    /// Prepare an unsigned transfer at the configured minimum gas price.
    /// Signing is left to the caller's wallet.
    pub fn create_transaction(
        &self,
        from: &str,
        to: &str,
        value: u64,
        data: Vec<u8>,
    ) -> Transaction {
        Transaction::new(
            self.next_nonce(from),
            from,
            to,
            value,
            self.config.min_gas_price,
            SIMPLE_TRANSFER_GAS,
            data,
            Utc::now().timestamp(),
        )
    }

    /// Admit a submitted transaction: structural validation, duplicate
    /// check, then a dry run after the sender's already-pending
    /// transactions so nonce gaps and overdrafts are refused up front.
    pub fn submit_transaction(&mut self, tx: Transaction) -> ChainResult<()> {
        tx.validate().map_err(MempoolError::Invalid)?;
        if self.mempool.contains(&tx.hash) {
            return Err(MempoolError::Duplicate(tx.hash).into());
        }

        {
            let now = Utc::now().timestamp();
            let mut staged = self.state.stage();
            for pending in self.mempool.from_sender(&tx.from) {
                // Stale entries fail here and are skipped; they never reach a block.
                let _ = staged.apply_transaction(pending, now);
            }
            staged.apply_transaction(&tx, now)?;
        }

        let hash = tx.hash.clone();
        self.mempool.insert(tx)?;
        debug!(
            "MEMPOOL - admitted tx {} (size={})",
            hash,
            self.mempool.len()
        );
        Ok(())
    }

    /// Pick up to `limit` pending transactions, in arrival order, that
    /// apply cleanly one after another on a staged copy of current state
    /// and fit the block gas limit. Also returns hashes that can never
    /// apply again because their nonce is already used.
    pub fn select_transactions(&self, limit: usize) -> (Vec<Transaction>, HashSet<String>) {
        let now = Utc::now().timestamp();
        let mut staged = self.state.stage();
        let mut picked = Vec::new();
        let mut stale = HashSet::new();
        let mut gas: u64 = 0;

        for tx in self.mempool.transactions() {
            if picked.len() >= limit {
                break;
            }
            if tx.nonce < self.state.get(&tx.from).nonce {
                stale.insert(tx.hash.clone());
                continue;
            }
            let Some(next_gas) = gas.checked_add(tx.gas_limit) else {
                continue;
            };
            if next_gas > self.config.max_gas_limit {
                continue;
            }
            if staged.apply_transaction(tx, now).is_ok() {
                gas = next_gas;
                picked.push(tx.clone());
            }
        }

        (picked, stale)
    }

    /// Drop transactions from the mempool without a block (stale entries).
    pub fn evict_transactions(&mut self, hashes: &HashSet<String>) {
        self.mempool.evict(hashes);
    }

    /// Assemble an unsigned candidate on top of the current head with the
    /// configured base reward. The timestamp is kept strictly after the head.
    pub fn build_block(&self, validator: &str, transactions: Vec<Transaction>) -> Block {
        let head = self.latest_block();
        let timestamp = Utc::now().timestamp().max(head.header.timestamp + 1);
        let mut block = Block::new(
            head.header.height + 1,
            head.hash(),
            transactions,
            validator.to_string(),
            timestamp,
        );
        block.header.difficulty = self.config.difficulty;
        block.header.gas_limit = self.config.max_gas_limit;
        block.header.reward = self.config.block_reward;
        block
    }

    /// Validate against the head and apply atomically at wall-clock time.
    pub fn add_block(&mut self, block: Block) -> ChainResult<()> {
        self.add_block_at(block, Utc::now().timestamp())
    }

    /// Validate `block` against the head at time `now`, then apply every
    /// transaction and the reward on a staged state. Only if all of it
    /// succeeds are state, chain and mempool updated together. Pending
    /// transactions the block made stale leave the mempool with it.
    pub fn add_block_at(&mut self, block: Block, now: i64) -> ChainResult<()> {
        self.check_block(&block, now)?;

        let mut staged = self.state.stage();
        for tx in &block.transactions {
            staged
                .apply_transaction(tx, now)
                .map_err(|source| ChainError::TransactionRejected {
                    hash: tx.hash.clone(),
                    source,
                })?;
        }
        staged.apply_validator_reward(&block.header.validator, block.header.reward, now);
        let changes = staged.into_changes();

        let included: HashSet<String> =
            block.transactions.iter().map(|t| t.hash.clone()).collect();

        self.state.commit(changes);
        info!(
            "CHAIN - appended block #{} (hash={}, txs={}, validator={}, reward={})",
            block.header.height,
            block.hash(),
            block.transactions.len(),
            block.header.validator,
            block.header.reward
        );
        self.chain.push(block);
        self.mempool.evict(&included);

        let stale = self.stale_transactions();
        if !stale.is_empty() {
            debug!("MEMPOOL - dropping {} stale pending txs", stale.len());
            self.mempool.evict(&stale);
        }
        Ok(())
    }

    /// Pending transactions whose nonce the committed state already used.
    fn stale_transactions(&self) -> HashSet<String> {
        self.mempool
            .transactions()
            .iter()
            .filter(|tx| tx.nonce < self.state.get(&tx.from).nonce)
            .map(|tx| tx.hash.clone())
            .collect()
    }

    fn check_block(&self, block: &Block, now: i64) -> Result<(), BlockError> {
        if block.header.reward > self.config.block_reward {
            return Err(BlockError::RewardTooHigh {
                reward: block.header.reward,
                max: self.config.block_reward,
            });
        }
        block.validate(Some(self.latest_block()), now)
    }

    /// Re-check linkage, roots and transaction validity of the whole chain.
    pub fn verify_chain(&self) -> Result<(), BlockError> {
        verify_blocks(&self.chain, &self.config)
    }

    pub fn is_valid_chain(&self) -> bool {
        self.verify_chain().is_ok()
    }

    /// Snapshot of chain, state and mempool.
    pub fn export(&self) -> ChainExport {
        ChainExport {
            chain: self.chain.clone(),
            state: self
                .state
                .iter()
                .map(|(addr, acc)| (addr.clone(), *acc))
                .collect(),
            pending_txs: self.mempool.transactions().to_vec(),
        }
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }
}

/// Accounts funded by `config` at genesis, stamped active at `timestamp`.
fn genesis_state(config: &ChainConfig, timestamp: i64) -> StateStore {
    let mut state = StateStore::new();
    for acc in &config.genesis_accounts {
        state.insert(
            acc.address.clone(),
            AccountState {
                balance: acc.balance,
                nonce: 0,
                stake: acc.stake,
                last_active: timestamp,
            },
        );
    }
    state
}

/// Re-execute every block after genesis on the genesis accounts.
fn replay_state(config: &ChainConfig, blocks: &[Block]) -> ChainResult<StateStore> {
    let mut state = genesis_state(config, GENESIS_TIMESTAMP);
    for block in blocks.iter().skip(1) {
        let at = block.header.timestamp;
        for tx in &block.transactions {
            state.apply_transaction(tx, at).map_err(|e| {
                ChainError::Restore(format!(
                    "block #{} tx {} does not apply: {}",
                    block.header.height, tx.hash, e
                ))
            })?;
        }
        state.apply_validator_reward(&block.header.validator, block.header.reward, at);
    }
    Ok(state)
}

/// Check linkage, roots, rewards and transaction validity of `blocks`,
/// starting from a genesis at index 0. Works on a snapshot so callers can
/// run it without holding the chain lock.
pub fn verify_blocks(blocks: &[Block], config: &ChainConfig) -> Result<(), BlockError> {
    let Some(genesis) = blocks.first() else {
        return Err(BlockError::PrevHashMismatch);
    };
    if genesis.header.height != 0 || genesis.header.merkle_root != genesis.compute_merkle_root() {
        return Err(BlockError::MerkleRootMismatch);
    }

    for pair in blocks.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        if current.header.reward > config.block_reward {
            return Err(BlockError::RewardTooHigh {
                reward: current.header.reward,
                max: config.block_reward,
            });
        }
        // Historical blocks are judged at their own timestamp.
        current.validate(Some(prev), current.header.timestamp)?;
    }
    Ok(())
}
