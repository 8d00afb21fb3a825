use thiserror::Error;

/// Why a transaction is malformed. Malformed transactions never enter
/// the mempool or a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction sender is empty")]
    EmptySender,

    #[error("transaction value must be > 0")]
    ZeroValue,

    #[error("transaction hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("transaction is not signed")]
    MissingSignature,

    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),

    #[error("sender {0} is not a canonical address")]
    NonCanonicalSender(String),
}

/// Failures applying a transaction to account state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid nonce: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("transaction cost overflows")]
    CostOverflow,

    #[error("receiver balance would overflow")]
    BalanceOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("invalid transaction: {0}")]
    Invalid(#[from] TransactionError),

    #[error("transaction {0} already in mempool")]
    Duplicate(String),
}
