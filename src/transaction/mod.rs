pub mod error;
pub mod mempool;
pub mod model;
pub mod state;

pub use error::{MempoolError, StateError, TransactionError};
pub use mempool::Mempool;
pub use model::Transaction;
pub use state::{AccountState, StagedState, StateChanges, StateStore};

/// Gas charged for a plain value transfer.
pub const SIMPLE_TRANSFER_GAS: u64 = 21_000;
