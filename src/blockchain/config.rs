use serde::{Deserialize, Serialize};

use super::{DEFAULT_BLOCK_REWARD, DEFAULT_MAX_GAS_LIMIT, DEFAULT_MIN_GAS_PRICE};

/// Account funded at chain initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    pub balance: u64,
    #[serde(default)]
    pub stake: u64,
}

/// Static chain parameters, consumed once to build genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Seconds between production ticks.
    pub block_time: u64,
    pub difficulty: u64,
    pub max_gas_limit: u64,
    pub min_gas_price: u64,
    /// Base (unadjusted) reward minted per block.
    pub block_reward: u64,
    #[serde(default)]
    pub genesis_accounts: Vec<GenesisAccount>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 2024,
            block_time: 5,
            difficulty: 1_000_000,
            max_gas_limit: DEFAULT_MAX_GAS_LIMIT,
            min_gas_price: DEFAULT_MIN_GAS_PRICE,
            block_reward: DEFAULT_BLOCK_REWARD,
            genesis_accounts: Vec::new(),
        }
    }
}

impl ChainConfig {
    pub fn with_genesis(mut self, address: impl Into<String>, balance: u64, stake: u64) -> Self {
        self.genesis_accounts.push(GenesisAccount {
            address: address.into(),
            balance,
            stake,
        });
        self
    }

    pub fn genesis_supply(&self) -> u128 {
        self.genesis_accounts
            .iter()
            .map(|a| a.balance as u128)
            .sum()
    }
}
