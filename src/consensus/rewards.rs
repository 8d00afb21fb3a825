use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::anti_whale::{AntiWhaleAssessment, anti_whale_check, supply_percentage};
use super::oracle::{OracleError, RewardData, ScoringOracle, UserData, bounded};

/// Per-user activity rewards. The oracle proposes, the local anti-whale
/// schedule caps.
pub struct RewardCalculator {
    oracle: Arc<dyn ScoringOracle>,
    total_supply: u128,
    timeout: Duration,
}

impl RewardCalculator {
    pub fn new(oracle: Arc<dyn ScoringOracle>, total_supply: u128, timeout: Duration) -> Self {
        Self {
            oracle,
            total_supply,
            timeout,
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Schedule for a wallet holding `balance` base units.
    pub fn anti_whale_check(&self, balance: u64) -> AntiWhaleAssessment {
        anti_whale_check(supply_percentage(balance, self.total_supply))
    }

    pub async fn calculate_reward(&self, user: &UserData) -> Result<RewardData, OracleError> {
        let data = bounded(self.timeout, self.oracle.calculate_reward(user)).await?;
        Ok(self.cap(user.wallet_balance, data))
    }

    pub async fn batch_calculate(&self, users: &[UserData]) -> Result<Vec<RewardData>, OracleError> {
        let rewards = bounded(self.timeout, self.oracle.batch_rewards(users)).await?;
        let balances: HashMap<&str, f64> = users
            .iter()
            .map(|u| (u.wallet_address.as_str(), u.wallet_balance))
            .collect();
        Ok(rewards
            .into_iter()
            .map(|r| {
                let balance = balances.get(r.wallet.as_str()).copied().unwrap_or(0.0);
                self.cap(balance, r)
            })
            .collect())
    }

    fn cap(&self, balance: f64, mut data: RewardData) -> RewardData {
        let pct = if self.total_supply == 0 {
            0.0
        } else {
            balance * 100.0 / self.total_supply as f64
        };
        let ceiling = data.base_reward * anti_whale_check(pct).reward_multiplier;
        if data.final_reward > ceiling {
            data.final_reward = ceiling;
        }
        data
    }
}
