use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;

use povc_chain::api::{self, AppState};
use povc_chain::blockchain::{ChainHandle, ChainManager};
use povc_chain::config::NodeConfig;
use povc_chain::consensus::oracle::SINGLE_CALL_TIMEOUT;
use povc_chain::consensus::{HttpOracle, PovcEngine};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("CONFIG - {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let chain = ChainHandle::new(ChainManager::new(config.chain.clone()));
    let oracle = Arc::new(HttpOracle::with_timeouts(
        config.oracle_url.clone(),
        SINGLE_CALL_TIMEOUT,
        config.consensus.oracle_timeout,
    ));
    let engine = Arc::new(PovcEngine::new(chain, oracle, config.consensus.clone()));

    let validator = config.consensus.validator_address.clone();
    if !validator.is_empty() && config.validator_stake > 0 {
        if let Err(e) = engine.register_validator(&validator, config.validator_stake).await {
            warn!("NODE - oracle unavailable at startup, registered {} with default score: {}", validator, e);
        }
    }

    let state = web::Data::new(AppState::new(engine.clone()));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?;

    info!(
        "⛓️ Starting PoVC node API at http://{}:{} (chain_id={}, validator={})",
        config.host, config.port, config.chain.chain_id, validator
    );
    let producer = engine.start();
    let served = server.run().await;

    producer.stop().await;
    served
}
