//! Fixtures shared by unit tests: keys, signed transactions, configs and
//! scripted scoring oracles.

use async_trait::async_trait;
use rand::rngs::OsRng;
use secp256k1::{Message, Secp256k1, SecretKey};
use std::collections::HashMap;
use std::time::Duration;

use crate::blockchain::ChainConfig;
use crate::consensus::{OracleError, RewardData, ScoringOracle, UserData, Validator};
use crate::transaction::{SIMPLE_TRANSFER_GAS, Transaction};

pub struct Keypair {
    pub secret: SecretKey,
    /// Hex of the compressed public key.
    pub address: String,
}

impl Keypair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        Self {
            secret,
            address: hex::encode(public.serialize()),
        }
    }
}

/// Hex DER signature over a 32-byte digest.
pub fn sign_digest(key: &Keypair, digest: [u8; 32]) -> String {
    let secp = Secp256k1::signing_only();
    let sig = secp.sign_ecdsa(&Message::from_digest(digest), &key.secret);
    hex::encode(sig.serialize_der())
}

/// Sign `tx` over its hash.
pub fn sign(key: &Keypair, mut tx: Transaction) -> Transaction {
    let mut digest = [0u8; 32];
    let bytes = hex::decode(&tx.hash).expect("transaction hash is hex");
    digest.copy_from_slice(&bytes);
    tx.signature = sign_digest(key, digest);
    tx
}

/// Signed simple transfer from `key`.
pub fn signed_transfer(key: &Keypair, to: &str, value: u64, nonce: u64, gas_price: u64) -> Transaction {
    let tx = Transaction::new(
        nonce,
        &key.address,
        to,
        value,
        gas_price,
        SIMPLE_TRANSFER_GAS,
        Vec::new(),
        1_701_400_000 + nonce as i64,
    );
    sign(key, tx)
}

/// Single funded account, free gas.
pub fn test_config(address: &str, balance: u64) -> ChainConfig {
    let mut config = ChainConfig::default().with_genesis(address, balance, 0);
    config.min_gas_price = 0;
    config
}

/// Answers every call from fixed tables.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    pub wallet_score: f64,
    pub scores: HashMap<String, f64>,
    pub base_reward: f64,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self {
            wallet_score: 0.8,
            scores: HashMap::new(),
            base_reward: 100.0,
        }
    }
}

impl ScriptedOracle {
    pub fn with_scores<'a>(scores: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            scores: scores
                .into_iter()
                .map(|(a, s)| (a.to_string(), s))
                .collect(),
            ..Self::default()
        }
    }

    fn reward_for(&self, user: &UserData) -> RewardData {
        RewardData {
            wallet: user.wallet_address.clone(),
            nvs_score: self.wallet_score,
            base_reward: self.base_reward,
            final_reward: self.base_reward,
            timestamp: String::new(),
        }
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn score_wallet(&self, address: &str, _balance: u64) -> Result<f64, OracleError> {
        Ok(self.scores.get(address).copied().unwrap_or(self.wallet_score))
    }

    async fn score_validators(
        &self,
        _block_height: u64,
        validators: &[Validator],
    ) -> Result<HashMap<String, f64>, OracleError> {
        Ok(validators
            .iter()
            .filter_map(|v| self.scores.get(&v.address).map(|s| (v.address.clone(), *s)))
            .collect())
    }

    async fn calculate_reward(&self, user: &UserData) -> Result<RewardData, OracleError> {
        Ok(self.reward_for(user))
    }

    async fn batch_rewards(&self, users: &[UserData]) -> Result<Vec<RewardData>, OracleError> {
        Ok(users.iter().map(|u| self.reward_for(u)).collect())
    }
}

/// Rejects every call.
#[derive(Debug, Clone, Copy)]
pub struct FailingOracle;

#[async_trait]
impl ScoringOracle for FailingOracle {
    async fn score_wallet(&self, _: &str, _: u64) -> Result<f64, OracleError> {
        Err(OracleError::Rejected("/povc/calculate"))
    }

    async fn score_validators(&self, _: u64, _: &[Validator]) -> Result<HashMap<String, f64>, OracleError> {
        Err(OracleError::Rejected("/povc/batch"))
    }

    async fn calculate_reward(&self, _: &UserData) -> Result<RewardData, OracleError> {
        Err(OracleError::Rejected("/povc/calculate"))
    }

    async fn batch_rewards(&self, _: &[UserData]) -> Result<Vec<RewardData>, OracleError> {
        Err(OracleError::Rejected("/povc/batch"))
    }
}

/// Sleeps before failing; used to trip timeouts.
#[derive(Debug, Clone, Copy)]
pub struct SlowOracle(pub Duration);

#[async_trait]
impl ScoringOracle for SlowOracle {
    async fn score_wallet(&self, a: &str, b: u64) -> Result<f64, OracleError> {
        tokio::time::sleep(self.0).await;
        FailingOracle.score_wallet(a, b).await
    }

    async fn score_validators(&self, h: u64, v: &[Validator]) -> Result<HashMap<String, f64>, OracleError> {
        tokio::time::sleep(self.0).await;
        FailingOracle.score_validators(h, v).await
    }

    async fn calculate_reward(&self, u: &UserData) -> Result<RewardData, OracleError> {
        tokio::time::sleep(self.0).await;
        FailingOracle.calculate_reward(u).await
    }

    async fn batch_rewards(&self, u: &[UserData]) -> Result<Vec<RewardData>, OracleError> {
        tokio::time::sleep(self.0).await;
        FailingOracle.batch_rewards(u).await
    }
}
