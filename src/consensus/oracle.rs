use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use super::validator::Validator;

/// Score assumed for a validator whose initial scoring failed.
pub const DEFAULT_VALIDATOR_SCORE: f64 = 0.5;
pub const SINGLE_CALL_TIMEOUT: Duration = Duration::from_secs(5);
pub const BATCH_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// The oracle could not produce an answer. Always mapped to a fallback by
/// block production.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
    #[error("oracle rejected request to {0}")]
    Rejected(&'static str),
    #[error("oracle response could not be decoded: {0}")]
    Decode(String),
}

/// Activity profile submitted for a user reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub wallet_address: String,
    pub wallet_balance: f64,
    #[serde(default)]
    pub daily_activity: f64,
    #[serde(default)]
    pub contributions: u32,
    #[serde(default)]
    pub community_score: f64,
    #[serde(default = "default_quality")]
    pub quality_score: f64,
    #[serde(default)]
    pub days_active: u32,
}

fn default_quality() -> f64 {
    0.5
}

impl UserData {
    pub fn new(wallet_address: impl Into<String>, wallet_balance: f64) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            wallet_balance,
            daily_activity: 0.0,
            contributions: 0,
            community_score: 0.0,
            quality_score: default_quality(),
            days_active: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardData {
    pub wallet: String,
    pub nvs_score: f64,
    pub base_reward: f64,
    pub final_reward: f64,
    #[serde(default)]
    pub timestamp: String,
}

/// External NVS scoring service.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Initial score for one wallet.
    async fn score_wallet(&self, address: &str, balance: u64) -> Result<f64, OracleError>;

    /// Scores for a validator set at `block_height`, keyed by address.
    async fn score_validators(
        &self,
        block_height: u64,
        validators: &[Validator],
    ) -> Result<HashMap<String, f64>, OracleError>;

    async fn calculate_reward(&self, user: &UserData) -> Result<RewardData, OracleError>;

    async fn batch_rewards(&self, users: &[UserData]) -> Result<Vec<RewardData>, OracleError>;
}

/// Run an oracle call with a hard deadline, whatever the implementation.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, OracleError>
where
    F: Future<Output = Result<T, OracleError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(limit)),
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

#[derive(Deserialize)]
struct WalletScore {
    nvs_score: f64,
}

#[derive(Deserialize)]
struct ValidatorScores {
    scores: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct UserRewards {
    individual_rewards: Vec<RewardData>,
}

#[derive(Serialize)]
struct WalletRequest<'a> {
    wallet_address: &'a str,
    wallet_balance: u64,
}

#[derive(Serialize)]
struct ValidatorBatchRequest<'a> {
    block_height: u64,
    validators: &'a [Validator],
}

#[derive(Serialize)]
struct UserBatchRequest<'a> {
    users: &'a [UserData],
}

/// `ScoringOracle` over the AI engine's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    base_url: String,
    client: reqwest::Client,
    single_timeout: Duration,
    batch_timeout: Duration,
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(base_url, SINGLE_CALL_TIMEOUT, BATCH_CALL_TIMEOUT)
    }

    pub fn with_timeouts(base_url: impl Into<String>, single: Duration, batch: Duration) -> Self {
        HttpOracle {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            single_timeout: single,
            batch_timeout: batch,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, endpoint: &'static str, body: &B, timeout: Duration) -> Result<T, OracleError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("ORACLE - POST {}", url);
        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(timeout)
                } else {
                    OracleError::Transport(e)
                }
            })?;
        if !resp.status().is_success() {
            return Err(OracleError::Rejected(endpoint));
        }
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| OracleError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(OracleError::Rejected(endpoint));
        }
        envelope
            .data
            .ok_or_else(|| OracleError::Decode(format!("{endpoint}: missing data")))
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    async fn score_wallet(&self, address: &str, balance: u64) -> Result<f64, OracleError> {
        let body = WalletRequest {
            wallet_address: address,
            wallet_balance: balance,
        };
        let data: WalletScore = self.post("/povc/calculate", &body, self.single_timeout).await?;
        Ok(data.nvs_score)
    }

    async fn score_validators(
        &self,
        block_height: u64,
        validators: &[Validator],
    ) -> Result<HashMap<String, f64>, OracleError> {
        let body = ValidatorBatchRequest {
            block_height,
            validators,
        };
        let data: ValidatorScores = self.post("/povc/batch", &body, self.batch_timeout).await?;
        Ok(data.scores)
    }

    async fn calculate_reward(&self, user: &UserData) -> Result<RewardData, OracleError> {
        self.post("/povc/calculate", user, self.single_timeout).await
    }

    async fn batch_rewards(&self, users: &[UserData]) -> Result<Vec<RewardData>, OracleError> {
        let data: UserRewards = self
            .post("/povc/batch", &UserBatchRequest { users }, self.batch_timeout)
            .await?;
        Ok(data.individual_rewards)
    }
}
