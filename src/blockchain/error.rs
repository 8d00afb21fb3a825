use thiserror::Error;

use crate::transaction::{MempoolError, StateError, TransactionError};

/// Reasons a block fails validation against the current head.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("invalid block height: expected {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("previous block hash mismatch")]
    PrevHashMismatch,

    #[error("block timestamp {timestamp} is ahead of validation time {now}")]
    FutureTimestamp { timestamp: i64, now: i64 },

    #[error("block timestamp {timestamp} is not after head timestamp {head}")]
    NonIncreasingTimestamp { timestamp: i64, head: i64 },

    #[error("merkle root mismatch")]
    MerkleRootMismatch,

    #[error("transaction {hash} is invalid: {source}")]
    InvalidTransaction {
        hash: String,
        source: TransactionError,
    },

    #[error("gas used {used} does not match transactions or exceeds limit {limit}")]
    GasLimitExceeded { used: u64, limit: u64 },

    #[error("block reward {reward} exceeds configured maximum {max}")]
    RewardTooHigh { reward: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("invalid block: {0}")]
    InvalidBlock(#[from] BlockError),

    /// A transaction inside a proposed block cannot be applied; the whole
    /// block is rejected.
    #[error("failed to apply transaction {hash}: {source}")]
    TransactionRejected { hash: String, source: StateError },

    #[error(transparent)]
    Mempool(#[from] MempoolError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("cannot restore chain: {0}")]
    Restore(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
