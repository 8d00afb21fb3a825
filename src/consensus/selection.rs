use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

use super::validator::Validator;

/// Decides which active validator may produce the block at `next_height`.
pub trait ValidatorSelection: Debug + Send + Sync {
    /// `active` is in registration order. `None` when it is empty.
    fn select(&self, active: &[Validator], next_height: u64) -> Option<String>;
}

/// Round robin: index `next_height mod len`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnBased;

impl ValidatorSelection for TurnBased {
    fn select(&self, active: &[Validator], next_height: u64) -> Option<String> {
        if active.is_empty() {
            return None;
        }
        let idx = (next_height % active.len() as u64) as usize;
        Some(active[idx].address.clone())
    }
}

/// Draw proportional to `nvs_score` (clamped to 0..=1); uniform if every
/// score is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRandom;

impl WeightedRandom {
    pub fn select_with<R: Rng + ?Sized>(&self, active: &[Validator], rng: &mut R) -> Option<String> {
        if active.is_empty() {
            return None;
        }

        // Scores live in 0..=1; anything outside is clamped, NaN counts as 0.
        let weight = |v: &Validator| {
            if v.nvs_score.is_nan() {
                0.0
            } else {
                v.nvs_score.clamp(0.0, 1.0)
            }
        };
        let total: f64 = active.iter().map(weight).sum();
        if total <= 0.0 {
            let idx = rng.gen_range(0..active.len());
            return Some(active[idx].address.clone());
        }

        let r = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for v in active {
            cumulative += weight(v);
            if r < cumulative {
                return Some(v.address.clone());
            }
        }
        // Float rounding can leave `r` just past the last bucket.
        active
            .iter()
            .rev()
            .find(|v| weight(v) > 0.0)
            .map(|v| v.address.clone())
    }
}

impl ValidatorSelection for WeightedRandom {
    fn select(&self, active: &[Validator], _next_height: u64) -> Option<String> {
        self.select_with(active, &mut rand::thread_rng())
    }
}

/// Which selection strategy authorizes production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    #[default]
    TurnBased,
    WeightedRandom,
}

impl SelectionPolicy {
    pub fn strategy(self) -> Box<dyn ValidatorSelection> {
        match self {
            SelectionPolicy::TurnBased => Box::new(TurnBased),
            SelectionPolicy::WeightedRandom => Box::new(WeightedRandom),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turn-based" | "turn_based" | "round-robin" => Ok(SelectionPolicy::TurnBased),
            "weighted-random" | "weighted_random" | "weighted" => Ok(SelectionPolicy::WeightedRandom),
            other => Err(format!("unknown selection policy '{other}'")),
        }
    }
}
