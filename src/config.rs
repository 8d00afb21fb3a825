//! Node configuration from the environment (optionally seeded by `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::{ChainConfig, GenesisAccount};
use crate::consensus::ConsensusConfig;

pub const DEFAULT_ORACLE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
    #[error("invalid genesis account entry '{0}' (expected address:balance[:stake])")]
    GenesisEntry(String),
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub oracle_url: String,
    /// Stake this node registers with at startup.
    pub validator_stake: u64,
    pub chain: ChainConfig,
    pub consensus: ConsensusConfig,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults_chain = ChainConfig::default();
        let defaults_consensus = ConsensusConfig::default();

        let block_time: u64 = parse_nonzero(&lookup, "BLOCK_TIME_SECS", defaults_chain.block_time)?;
        let oracle_timeout: u64 = parse_nonzero(
            &lookup,
            "ORACLE_TIMEOUT_SECS",
            defaults_consensus.oracle_timeout.as_secs(),
        )?;

        let genesis_accounts = match lookup("GENESIS_ACCOUNTS") {
            Some(raw) => parse_genesis_accounts(&raw)?,
            None => Vec::new(),
        };

        let chain = ChainConfig {
            chain_id: parse_or(&lookup, "CHAIN_ID", defaults_chain.chain_id)?,
            block_time,
            difficulty: defaults_chain.difficulty,
            max_gas_limit: parse_or(&lookup, "MAX_GAS_LIMIT", defaults_chain.max_gas_limit)?,
            min_gas_price: parse_or(&lookup, "MIN_GAS_PRICE", defaults_chain.min_gas_price)?,
            block_reward: parse_or(&lookup, "BLOCK_REWARD", defaults_chain.block_reward)?,
            genesis_accounts,
        };

        let consensus = ConsensusConfig {
            validator_address: lookup("VALIDATOR_ADDRESS").unwrap_or_default(),
            block_time: Duration::from_secs(block_time),
            max_txs_per_block: parse_or(
                &lookup,
                "MAX_TXS_PER_BLOCK",
                defaults_consensus.max_txs_per_block,
            )?,
            total_supply: parse_or(&lookup, "TOTAL_SUPPLY", defaults_consensus.total_supply)?,
            oracle_timeout: Duration::from_secs(oracle_timeout),
            selection: parse_or(&lookup, "SELECTION_POLICY", defaults_consensus.selection)?,
            anti_whale: parse_or(&lookup, "ANTI_WHALE_POLICY", defaults_consensus.anti_whale)?,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            oracle_url: lookup("ORACLE_URL").unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
            validator_stake: parse_or(&lookup, "VALIDATOR_STAKE", 0)?,
            chain,
            consensus,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

/// Like `parse_or`, but zero is refused: these values become timer periods.
fn parse_nonzero<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, var, default)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: lookup(var).unwrap_or_default(),
        }),
        secs => Ok(secs),
    }
}

/// `addr:balance[:stake]` entries separated by commas.
pub fn parse_genesis_accounts(raw: &str) -> Result<Vec<GenesisAccount>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let bad = || ConfigError::GenesisEntry(entry.to_string());
            let mut parts = entry.split(':');
            let address = parts.next().filter(|a| !a.is_empty()).ok_or_else(bad)?;
            let balance = parts
                .next()
                .and_then(|b| b.parse::<u64>().ok())
                .ok_or_else(bad)?;
            let stake = match parts.next() {
                Some(s) => s.parse::<u64>().map_err(|_| bad())?,
                None => 0,
            };
            if parts.next().is_some() {
                return Err(bad());
            }
            Ok(GenesisAccount {
                address: address.to_string(),
                balance,
                stake,
            })
        })
        .collect()
}
