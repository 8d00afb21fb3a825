use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::ChainHandle;
use crate::consensus::{AntiWhaleAssessment, AntiWhalePolicy, PovcEngine, SelectionPolicy, Validator};
use crate::transaction::AccountState;

/// Shared application state: the engine, which owns the chain handle.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PovcEngine>,
}

impl AppState {
    pub fn new(engine: Arc<PovcEngine>) -> Self {
        Self { engine }
    }

    pub fn chain(&self) -> &ChainHandle {
        self.engine.chain()
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub height: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct BlockAcceptedResponse {
    pub height: u64,
    pub hash: String,
}

/* ---------- Account API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub address: String,
    #[serde(flatten)]
    pub account: AccountState,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct BuildTxRequest {
    pub from: String,
    pub to: String,
    pub value: u64,
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub hash: String,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<String>, // hashes, arrival order
}

/* ---------- Validator API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterValidatorRequest {
    pub address: String,
    pub stake: u64,
}

#[derive(Serialize)]
pub struct RegisterValidatorResponse {
    pub validator: Validator,
    /// Set when the oracle could not score the validator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct ValidatorsResponse {
    pub total: usize,
    pub active: usize,
    pub validators: Vec<Validator>,
}

/* ---------- Stats API Models ---------- */

#[derive(Serialize)]
pub struct StatsResponse {
    pub chain_id: u64,
    pub height: u64,
    pub latest_hash: String,
    pub latest_timestamp: i64,
    pub mempool_size: usize,
    pub accounts: usize,
    pub total_balance: u128,
    pub total_supply: u128,
    pub block_time_secs: u64,
    pub block_reward: u64,
    pub validators: usize,
    pub active_validators: usize,
    pub selection_policy: SelectionPolicy,
    pub anti_whale_policy: AntiWhalePolicy,
}

#[derive(Serialize)]
pub struct AntiWhaleResponse {
    pub balance: u64,
    #[serde(flatten)]
    pub assessment: AntiWhaleAssessment,
}
