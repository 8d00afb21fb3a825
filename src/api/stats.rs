use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AntiWhaleResponse, AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let engine = &state.engine;
    let config = engine.config();

    // Chain snapshot under one short read lock
    let (chain_id, height, latest_hash, latest_timestamp, mempool_size, accounts, total_balance, block_reward) = {
        let chain = state.chain().read();
        let head = chain.latest_block();
        (
            chain.config().chain_id,
            chain.height(),
            head.hash(),
            head.header.timestamp,
            chain.mempool().len(),
            chain.state().len(),
            chain.state().total_balance(),
            chain.config().block_reward,
        )
    };

    let validators = engine.validators();
    let active_validators = validators.iter().filter(|v| v.is_eligible()).count();

    HttpResponse::Ok().json(StatsResponse {
        chain_id,
        height,
        latest_hash,
        latest_timestamp,
        mempool_size,
        accounts,
        total_balance,
        total_supply: config.total_supply,
        block_time_secs: config.block_time.as_secs(),
        block_reward,
        validators: validators.len(),
        active_validators,
        selection_policy: config.selection,
        anti_whale_policy: config.anti_whale,
    })
}

/// Per-wallet anti-whale schedule for a balance in base units.
#[get("/anti-whale/{balance}/")]
pub async fn anti_whale(state: web::Data<AppState>, path: web::Path<(u64,)>) -> impl Responder {
    let balance = path.into_inner().0;
    HttpResponse::Ok().json(AntiWhaleResponse {
        balance,
        assessment: state.engine.rewards().anti_whale_check(balance),
    })
}
