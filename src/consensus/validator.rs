use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registry entry for a block producer. Lives only in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub stake: u64,
    pub nvs_score: f64,
    pub last_active: i64,
    pub is_active: bool,
}

impl Validator {
    /// Active and staked.
    pub fn is_eligible(&self) -> bool {
        self.is_active && self.stake > 0
    }
}

/// Validators in registration order. Re-registering keeps the original
/// position, so turn order is stable.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: Vec<Validator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an entry and mark it active.
    pub fn upsert(&mut self, address: &str, stake: u64, nvs_score: f64, now: i64) -> Validator {
        let entry = Validator {
            address: address.to_string(),
            stake,
            nvs_score,
            last_active: now,
            is_active: true,
        };
        match self.validators.iter_mut().find(|v| v.address == address) {
            Some(existing) => *existing = entry.clone(),
            None => self.validators.push(entry.clone()),
        }
        entry
    }

    /// Returns false if the address is unknown.
    pub fn deactivate(&mut self, address: &str) -> bool {
        match self.validators.iter_mut().find(|v| v.address == address) {
            Some(v) => {
                v.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Apply a batch of fresh scores; unknown addresses are ignored.
    pub fn update_scores(&mut self, scores: &HashMap<String, f64>, now: i64) {
        for v in &mut self.validators {
            if let Some(score) = scores.get(&v.address) {
                v.nvs_score = *score;
                v.last_active = now;
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.address == address)
    }

    pub fn all(&self) -> &[Validator] {
        &self.validators
    }

    /// Eligible validators, registration order.
    pub fn active(&self) -> Vec<Validator> {
        self.validators
            .iter()
            .filter(|v| v.is_eligible())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
