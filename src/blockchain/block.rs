use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::BlockError;
use super::merkle::compute_merkle_root;
use super::{
    BLOCK_VERSION, DEFAULT_BLOCK_REWARD, DEFAULT_MAX_GAS_LIMIT, GENESIS_DIFFICULTY,
    GENESIS_PREV_HASH, GENESIS_TIMESTAMP, GENESIS_VALIDATOR, MAX_FUTURE_SKEW_SECS, NULL_ADDRESS,
};
use crate::blockchain::config::ChainConfig;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u64,
    pub height: u64,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub prev_hash: String,
    pub merkle_root: String,
    pub state_root: String,
    pub validator: String,
    pub nonce: u64,
    pub difficulty: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub reward: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra_data: String,
}

/// A block: header plus the transactions its `merkle_root` commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

/// Placeholder state commitment preimage. Binds only height, timestamp
/// and transaction count; it does not commit to account contents, so two
/// blocks agreeing on these three fields share a state root regardless
/// of state. Replace with an authenticated trie root to make it real.
#[derive(Serialize)]
struct StateRootPayload {
    height: u64,
    timestamp: i64,
    tx_count: usize,
}

impl Block {
    /// Create the genesis block: fixed timestamp and difficulty, one
    /// funding transaction per genesis account from the null address.
    pub fn genesis(config: &ChainConfig) -> Self {
        let transactions = config
            .genesis_accounts
            .iter()
            .map(|acc| {
                Transaction::new(
                    0,
                    NULL_ADDRESS,
                    acc.address.clone(),
                    acc.balance,
                    0,
                    0,
                    Vec::new(),
                    GENESIS_TIMESTAMP,
                )
            })
            .collect();

        let mut block = Self::new(
            0,
            GENESIS_PREV_HASH.to_string(),
            transactions,
            GENESIS_VALIDATOR.to_string(),
            GENESIS_TIMESTAMP,
        );
        block.header.difficulty = GENESIS_DIFFICULTY;
        block.header.gas_limit = config.max_gas_limit;
        block.header.reward = 0;
        block
    }

    /// Assemble an unsigned block and compute its roots and gas usage.
    pub fn new(
        height: u64,
        prev_hash: String,
        transactions: Vec<Transaction>,
        validator: String,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            header: BlockHeader {
                version: BLOCK_VERSION,
                height,
                timestamp,
                prev_hash,
                merkle_root: String::new(),
                state_root: String::new(),
                validator,
                nonce: 0,
                difficulty: 1_000_000,
                gas_limit: DEFAULT_MAX_GAS_LIMIT,
                gas_used: 0,
                reward: DEFAULT_BLOCK_REWARD,
                extra_data: String::new(),
            },
            transactions,
            signature: String::new(),
        };
        block.header.gas_used = block.total_gas();
        block.header.merkle_root = block.compute_merkle_root();
        block.header.state_root = block.compute_state_root();
        block
    }

    /// SHA-256 (hex) of the canonical JSON of the header only.
    pub fn hash(&self) -> String {
        // A header of integers and strings always serializes.
        let bytes = serde_json::to_vec(&self.header).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    pub fn compute_merkle_root(&self) -> String {
        let hashes: Vec<&str> = self.transactions.iter().map(|t| t.hash.as_str()).collect();
        compute_merkle_root(&hashes)
    }

    pub fn compute_state_root(&self) -> String {
        let payload = StateRootPayload {
            height: self.header.height,
            timestamp: self.header.timestamp,
            tx_count: self.transactions.len(),
        };
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Sum of the gas limits of all transactions (transfers consume their limit).
    pub fn total_gas(&self) -> u64 {
        self.transactions
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.gas_limit))
    }

    /// Senders of this block's transactions, first occurrence order.
    pub fn senders(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for tx in &self.transactions {
            if !seen.contains(&tx.from.as_str()) {
                seen.push(tx.from.as_str());
            }
        }
        seen
    }

    /// Validate this block as the successor of `head` (`None` for genesis)
    /// at local time `now`. Cheap header checks run before per-transaction
    /// work. Does not touch account state.
    pub fn validate(&self, head: Option<&Block>, now: i64) -> Result<(), BlockError> {
        let header = &self.header;

        if let Some(head) = head {
            let expected = head.header.height + 1;
            if header.height != expected {
                return Err(BlockError::HeightMismatch {
                    expected,
                    actual: header.height,
                });
            }
            if header.prev_hash != head.hash() {
                return Err(BlockError::PrevHashMismatch);
            }
        }

        if header.timestamp > now + MAX_FUTURE_SKEW_SECS {
            return Err(BlockError::FutureTimestamp {
                timestamp: header.timestamp,
                now,
            });
        }

        if let Some(head) = head {
            if header.timestamp <= head.header.timestamp {
                return Err(BlockError::NonIncreasingTimestamp {
                    timestamp: header.timestamp,
                    head: head.header.timestamp,
                });
            }
        }

        if header.gas_used != self.total_gas() || header.gas_used > header.gas_limit {
            return Err(BlockError::GasLimitExceeded {
                used: header.gas_used,
                limit: header.gas_limit,
            });
        }

        if header.merkle_root != self.compute_merkle_root() {
            return Err(BlockError::MerkleRootMismatch);
        }

        for tx in &self.transactions {
            tx.validate().map_err(|source| BlockError::InvalidTransaction {
                hash: tx.hash.clone(),
                source,
            })?;
        }

        Ok(())
    }
}
