pub mod anti_whale;
pub mod engine;
pub mod oracle;
pub mod rewards;
pub mod selection;
pub mod validator;

pub use anti_whale::{
    AntiWhaleAssessment, AntiWhalePolicy, BlockThreshold, RewardPolicy, WalletSchedule, WhaleTier,
    anti_whale_check, scale_reward, supply_percentage,
};
pub use engine::{ConsensusConfig, DEFAULT_TOTAL_SUPPLY, PovcEngine, ProducerHandle};
pub use oracle::{HttpOracle, OracleError, RewardData, ScoringOracle, UserData};
pub use rewards::RewardCalculator;
pub use selection::{SelectionPolicy, TurnBased, ValidatorSelection, WeightedRandom};
pub use validator::{Validator, ValidatorRegistry};
