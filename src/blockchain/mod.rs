pub mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod merkle;
pub mod model;

pub use block::{Block, BlockHeader};
pub use config::{ChainConfig, GenesisAccount};
pub use error::{BlockError, ChainError, ChainResult};
pub use handle::ChainHandle;
pub use merkle::compute_merkle_root;
pub use model::{ChainExport, ChainManager, verify_blocks};

/// Header format version.
pub const BLOCK_VERSION: u64 = 1;

/// Fixed genesis timestamp (2023-12-01T00:00:00Z).
pub const GENESIS_TIMESTAMP: i64 = 1_701_388_800;

pub const GENESIS_DIFFICULTY: u64 = 1;

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";

pub const GENESIS_VALIDATOR: &str = "genesis";

/// Sender of the synthetic genesis funding transactions.
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// How far ahead of local time a block timestamp may be (seconds).
pub const MAX_FUTURE_SKEW_SECS: i64 = 10;

/// 2 whole coins at 18 decimals.
pub const DEFAULT_BLOCK_REWARD: u64 = 2_000_000_000_000_000_000;

/// 1 gwei.
pub const DEFAULT_MIN_GAS_PRICE: u64 = 1_000_000_000;

pub const DEFAULT_MAX_GAS_LIMIT: u64 = 8_000_000;

/// Cap on transactions pulled from the mempool per block.
pub const MAX_TXS_PER_BLOCK: usize = 100;
