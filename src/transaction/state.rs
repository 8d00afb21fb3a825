use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::StateError;
use super::model::Transaction;

/// Per-address account record. A missing address reads as all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: u64,
    pub nonce: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stake: u64,
    #[serde(default)]
    pub last_active: i64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Account store keyed by address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStore {
    accounts: HashMap<String, AccountState>,
}

/// Account entries written by a [`StagedState`], ready to be committed.
#[derive(Debug, Default)]
pub struct StateChanges {
    accounts: HashMap<String, AccountState>,
}

impl StateChanges {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Read an account; absent addresses yield the zero state. Never inserts.
    pub fn get(&self, address: &str) -> AccountState {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.accounts.contains_key(address)
    }

    /// Overwrite an account (genesis seeding, restore).
    pub fn insert(&mut self, address: impl Into<String>, state: AccountState) {
        self.accounts.insert(address.into(), state);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AccountState)> {
        self.accounts.iter()
    }

    /// Sum of all balances. Widened so it cannot overflow.
    pub fn total_balance(&self) -> u128 {
        self.accounts.values().map(|a| a.balance as u128).sum()
    }

    /// Apply one transaction. On error nothing is mutated.
    pub fn apply_transaction(&mut self, tx: &Transaction, now: i64) -> Result<(), StateError> {
        let mut staged = self.stage();
        staged.apply_transaction(tx, now)?;
        let changes = staged.into_changes();
        self.commit(changes);
        Ok(())
    }

    /// Credit a minted reward. Touches neither nonce nor any sender.
    pub fn apply_validator_reward(&mut self, validator: &str, reward: u64, now: i64) {
        let account = self.accounts.entry(validator.to_string()).or_default();
        account.balance = account.balance.saturating_add(reward);
        account.last_active = now;
    }

    /// Start a copy-on-write view over this store.
    pub fn stage(&self) -> StagedState<'_> {
        StagedState {
            base: self,
            touched: HashMap::new(),
        }
    }

    /// Swap in every account written by a staged view.
    pub fn commit(&mut self, changes: StateChanges) {
        self.accounts.extend(changes.accounts);
    }
}

/// Copy-on-write overlay: reads fall through to the base store, writes
/// land in a private map. Dropping it discards everything.
#[derive(Debug)]
pub struct StagedState<'a> {
    base: &'a StateStore,
    touched: HashMap<String, AccountState>,
}

impl StagedState<'_> {
    pub fn get(&self, address: &str) -> AccountState {
        match self.touched.get(address) {
            Some(account) => *account,
            None => self.base.get(address),
        }
    }

    /// Same rules as [`StateStore::apply_transaction`], against the overlay.
    pub fn apply_transaction(&mut self, tx: &Transaction, now: i64) -> Result<(), StateError> {
        let mut sender = self.get(&tx.from);
        if tx.nonce != sender.nonce {
            return Err(StateError::NonceMismatch {
                expected: sender.nonce,
                got: tx.nonce,
            });
        }

        let cost = tx.total_cost().ok_or(StateError::CostOverflow)?;
        if sender.balance < cost {
            return Err(StateError::InsufficientBalance {
                required: cost,
                available: sender.balance,
            });
        }

        sender.balance -= cost;
        sender.nonce += 1;
        sender.last_active = now;

        // Self-transfers credit the already-debited sender record.
        let mut receiver = if tx.to == tx.from {
            sender
        } else {
            self.get(&tx.to)
        };
        receiver.balance = receiver
            .balance
            .checked_add(tx.value)
            .ok_or(StateError::BalanceOverflow)?;
        receiver.last_active = now;

        if tx.to != tx.from {
            self.touched.insert(tx.from.clone(), sender);
        }
        self.touched.insert(tx.to.clone(), receiver);
        Ok(())
    }

    pub fn apply_validator_reward(&mut self, validator: &str, reward: u64, now: i64) {
        let mut account = self.get(validator);
        account.balance = account.balance.saturating_add(reward);
        account.last_active = now;
        self.touched.insert(validator.to_string(), account);
    }

    pub fn into_changes(self) -> StateChanges {
        StateChanges {
            accounts: self.touched,
        }
    }
}
