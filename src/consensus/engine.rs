use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::anti_whale::{AntiWhalePolicy, RewardPolicy, scale_reward, supply_percentage};
use super::oracle::{DEFAULT_VALIDATOR_SCORE, OracleError, ScoringOracle, bounded};
use super::rewards::RewardCalculator;
use super::selection::{SelectionPolicy, ValidatorSelection};
use super::validator::{Validator, ValidatorRegistry};
use crate::blockchain::{Block, ChainHandle, ChainResult, MAX_TXS_PER_BLOCK};

/// 25M tokens with 18 decimals.
pub const DEFAULT_TOTAL_SUPPLY: u128 = 25_000_000 * 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Identity this node produces blocks as.
    pub validator_address: String,
    pub block_time: Duration,
    pub max_txs_per_block: usize,
    pub total_supply: u128,
    pub oracle_timeout: Duration,
    pub selection: SelectionPolicy,
    pub anti_whale: AntiWhalePolicy,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            validator_address: String::new(),
            block_time: Duration::from_secs(5),
            max_txs_per_block: MAX_TXS_PER_BLOCK,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            oracle_timeout: Duration::from_secs(10),
            selection: SelectionPolicy::default(),
            anti_whale: AntiWhalePolicy::default(),
        }
    }
}

/// Proof of Value Contribution: decides who may produce, builds and seals
/// blocks from the mempool, and adjusts their reward from oracle scores
/// and the anti-whale policy.
pub struct PovcEngine {
    chain: ChainHandle,
    validators: RwLock<ValidatorRegistry>,
    oracle: Arc<dyn ScoringOracle>,
    selection: Box<dyn ValidatorSelection>,
    reward_policy: Box<dyn RewardPolicy>,
    rewards: RewardCalculator,
    config: ConsensusConfig,
}

impl PovcEngine {
    pub fn new(chain: ChainHandle, oracle: Arc<dyn ScoringOracle>, config: ConsensusConfig) -> Self {
        let rewards = RewardCalculator::new(oracle.clone(), config.total_supply, config.oracle_timeout);
        Self {
            chain,
            validators: RwLock::new(ValidatorRegistry::new()),
            oracle,
            selection: config.selection.strategy(),
            reward_policy: config.anti_whale.strategy(),
            rewards,
            config,
        }
    }

    pub fn chain(&self) -> &ChainHandle {
        &self.chain
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn rewards(&self) -> &RewardCalculator {
        &self.rewards
    }

    fn registry(&self) -> RwLockReadGuard<'_, ValidatorRegistry> {
        self.validators.read().expect("validator lock poisoned")
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, ValidatorRegistry> {
        self.validators.write().expect("validator lock poisoned")
    }

    /// Score `address` once and insert or refresh it as active. If the oracle
    /// fails the validator is still registered with the default score, and
    /// the failure is returned.
    pub async fn register_validator(&self, address: &str, stake: u64) -> Result<Validator, OracleError> {
        let balance = self.chain.balance(address);
        let scored = bounded(
            self.config.oracle_timeout,
            self.oracle.score_wallet(address, balance),
        )
        .await;

        let score = match &scored {
            Ok(score) => *score,
            Err(e) => {
                warn!(
                    "VALIDATOR - scoring failed for {}, using {}: {}",
                    address, DEFAULT_VALIDATOR_SCORE, e
                );
                DEFAULT_VALIDATOR_SCORE
            }
        };
        let validator = self
            .registry_mut()
            .upsert(address, stake, score, Utc::now().timestamp());
        info!(
            "VALIDATOR - registered {} (stake={}, score={:.3})",
            address, stake, score
        );
        scored.map(|_| validator)
    }

    pub fn deactivate_validator(&self, address: &str) -> bool {
        let found = self.registry_mut().deactivate(address);
        if found {
            info!("VALIDATOR - deactivated {}", address);
        }
        found
    }

    pub fn validator(&self, address: &str) -> Option<Validator> {
        self.registry().get(address).cloned()
    }

    pub fn validators(&self) -> Vec<Validator> {
        self.registry().all().to_vec()
    }

    pub fn active_validators(&self) -> Vec<Validator> {
        self.registry().active()
    }

    /// Validator the selection policy picks for `next_height`.
    pub fn select_validator(&self, next_height: u64) -> Option<String> {
        self.selection.select(&self.active_validators(), next_height)
    }

    /// Whether this node may produce `next_height`. With no active
    /// validators the node produces on its own.
    pub fn is_authorized(&self, next_height: u64) -> bool {
        match self.select_validator(next_height) {
            // Nobody is active.
            None => true,
            Some(selected) => selected == self.config.validator_address,
        }
    }

    async fn fetch_scores(&self, block_height: u64, active: &[Validator]) -> HashMap<String, f64> {
        if active.is_empty() {
            return HashMap::new();
        }
        match bounded(
            self.config.oracle_timeout,
            self.oracle.score_validators(block_height, active),
        )
        .await
        {
            Ok(scores) => scores,
            Err(e) => {
                warn!("PRODUCER - oracle unavailable, reward left unadjusted: {}", e);
                HashMap::new()
            }
        }
    }

    /// One production round. Returns the sealed block, or `None` when this
    /// node is not authorized or nothing is pending.
    pub async fn produce_block(&self) -> ChainResult<Option<Block>> {
        let next_height = self.chain.height() + 1;
        if !self.is_authorized(next_height) {
            debug!("PRODUCER - not our turn for #{}", next_height);
            return Ok(None);
        }

        let (mut block, sender_shares, stale) = {
            let chain = self.chain.read();
            if chain.mempool().is_empty() {
                return Ok(None);
            }
            let (txs, stale) = chain.select_transactions(self.config.max_txs_per_block);
            let block = chain.build_block(&self.config.validator_address, txs);
            let shares: Vec<f64> = block
                .senders()
                .into_iter()
                .map(|sender| supply_percentage(chain.balance(sender), self.config.total_supply))
                .collect();
            (block, shares, stale)
        };

        if !stale.is_empty() {
            self.chain.write().evict_transactions(&stale);
        }
        if block.transactions.is_empty() {
            return Ok(None);
        }

        let active = self.active_validators();
        let scores = self.fetch_scores(block.header.height, &active).await;
        if !scores.is_empty() {
            self.registry_mut()
                .update_scores(&scores, Utc::now().timestamp());
        }

        let base = block.header.reward;
        let mut reward = base;
        if let Some(score) = scores.get(&self.config.validator_address) {
            reward = scale_reward(reward, *score);
        }
        reward = self.reward_policy.adjust(reward, &sender_shares);
        block.header.reward = reward;

        match self.chain.add_block(block.clone()) {
            Ok(()) => {
                info!(
                    "PRODUCER - sealed block #{} (txs={}, reward={}, base={})",
                    block.header.height,
                    block.transactions.len(),
                    reward,
                    base
                );
                Ok(Some(block))
            }
            Err(e) => {
                warn!("PRODUCER - block #{} rejected: {}", block.header.height, e);
                Err(e)
            }
        }
    }

    /// Tick every `block_time` until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        if self.config.block_time.is_zero() {
            error!("PRODUCER - block_time must be non-zero, not starting");
            return;
        }
        let mut ticker = time::interval(self.config.block_time);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;
        info!(
            "PRODUCER - started (validator={}, block_time={:?})",
            self.config.validator_address, self.config.block_time
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.produce_block().await {
                        debug!("PRODUCER - round failed: {}", e);
                    }
                }
            }
        }
        info!("PRODUCER - stopped");
    }

    /// Spawn the periodic producer on the current runtime.
    pub fn start(self: &Arc<Self>) -> ProducerHandle {
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let engine = Arc::clone(self);
        let task = tokio::spawn(async move { engine.run(shutdown).await });
        ProducerHandle { token, task }
    }
}

/// Owns the background producer task.
pub struct ProducerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ProducerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the task to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!("PRODUCER - task ended abnormally: {}", e);
        }
    }
}
