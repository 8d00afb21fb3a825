use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

/// Share of supply (percent) above which the warning tier starts.
pub const WARNING_TIER_PCT: f64 = 0.5;
/// Above this the high tier applies.
pub const HIGH_TIER_PCT: f64 = 1.0;
/// Above this rewards are zeroed.
pub const WHALE_TIER_PCT: f64 = 2.0;

/// Percent reduction per percent of supply above the warning threshold.
pub const WARNING_RAMP: f64 = 2.0;
/// Percent reduction per percent of supply above the high threshold.
pub const HIGH_RAMP: f64 = 25.0;
/// Cap on either ramp, in percent.
pub const MAX_RAMP_REDUCTION: f64 = 50.0;
/// Flat reduction entering the high tier, in percent.
pub const HIGH_BASE_REDUCTION: f64 = 50.0;

pub const FEE_NONE: u8 = 0;
pub const FEE_WARNING: u8 = 1;
pub const FEE_HIGH: u8 = 3;
pub const FEE_WHALE: u8 = 10;

const PPM: u128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleTier {
    None,
    Warning,
    High,
    Whale,
}

/// Result of the per-wallet schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntiWhaleAssessment {
    pub percentage: f64,
    pub reward_multiplier: f64,
    pub transfer_fee_percent: u8,
    pub tier: WhaleTier,
}

/// `balance` as a percentage of `total_supply`. Zero supply counts as no share.
pub fn supply_percentage(balance: u64, total_supply: u128) -> f64 {
    if total_supply == 0 {
        return 0.0;
    }
    (balance as f64 * 100.0) / total_supply as f64
}

/// Per-wallet ramp schedule over share of supply.
pub fn anti_whale_check(percentage: f64) -> AntiWhaleAssessment {
    let (reward_multiplier, transfer_fee_percent, tier) = if percentage > WHALE_TIER_PCT {
        (0.0, FEE_WHALE, WhaleTier::Whale)
    } else if percentage > HIGH_TIER_PCT {
        let reduction =
            HIGH_BASE_REDUCTION + ((percentage - HIGH_TIER_PCT) * HIGH_RAMP).min(MAX_RAMP_REDUCTION);
        (1.0 - reduction / 100.0, FEE_HIGH, WhaleTier::High)
    } else if percentage > WARNING_TIER_PCT {
        let reduction = ((percentage - WARNING_TIER_PCT) * WARNING_RAMP).min(MAX_RAMP_REDUCTION);
        (1.0 - reduction / 100.0, FEE_WARNING, WhaleTier::Warning)
    } else {
        (1.0, FEE_NONE, WhaleTier::None)
    };

    AntiWhaleAssessment {
        percentage,
        reward_multiplier,
        transfer_fee_percent,
        tier,
    }
}

/// Multiply an integer reward by a 0..=1 factor in parts-per-million.
pub fn scale_reward(reward: u64, multiplier: f64) -> u64 {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return 0;
    }
    if multiplier >= 1.0 {
        return reward;
    }
    let ppm = (multiplier * PPM as f64).round() as u128;
    (reward as u128 * ppm / PPM) as u64
}

/// Adjusts a block reward given the supply share of every sender in the block.
pub trait RewardPolicy: Debug + Send + Sync {
    fn adjust(&self, reward: u64, sender_percentages: &[f64]) -> u64;
}

fn strictest(percentages: &[f64]) -> Option<f64> {
    percentages
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))))
}

/// Zero above the whale tier, halve above the warning tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockThreshold;

impl RewardPolicy for BlockThreshold {
    fn adjust(&self, reward: u64, sender_percentages: &[f64]) -> u64 {
        match strictest(sender_percentages) {
            Some(p) if p > WHALE_TIER_PCT => 0,
            Some(p) if p > WARNING_TIER_PCT => reward - reward / 2,
            _ => reward,
        }
    }
}

/// Per-wallet ramp multiplier of the largest sender.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletSchedule;

impl RewardPolicy for WalletSchedule {
    fn adjust(&self, reward: u64, sender_percentages: &[f64]) -> u64 {
        match strictest(sender_percentages) {
            Some(p) => scale_reward(reward, anti_whale_check(p).reward_multiplier),
            None => reward,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AntiWhalePolicy {
    #[default]
    BlockThreshold,
    WalletSchedule,
}

impl AntiWhalePolicy {
    pub fn strategy(self) -> Box<dyn RewardPolicy> {
        match self {
            AntiWhalePolicy::BlockThreshold => Box::new(BlockThreshold),
            AntiWhalePolicy::WalletSchedule => Box::new(WalletSchedule),
        }
    }
}

impl FromStr for AntiWhalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block-threshold" | "block_threshold" | "block" => Ok(AntiWhalePolicy::BlockThreshold),
            "wallet-schedule" | "wallet_schedule" | "wallet" => Ok(AntiWhalePolicy::WalletSchedule),
            other => Err(format!("unknown anti-whale policy '{other}'")),
        }
    }
}
