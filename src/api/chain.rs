use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::error_response;
use super::models::{AppState, BlockAcceptedResponse, ValidateResponse};
use crate::blockchain::{Block, verify_blocks};

/// Export snapshot: `{chain, state, pending_txs}`.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.chain().export())
}

/// Re-verify the whole chain on a snapshot, outside the lock.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let (blocks, config) = {
        let chain = state.chain().read();
        (chain.blocks().to_vec(), chain.config().clone())
    };
    let result = verify_blocks(&blocks, &config);
    HttpResponse::Ok().json(ValidateResponse {
        valid: result.is_ok(),
        height: blocks.last().map_or(0, |b| b.header.height),
        error: result.err().map(|e| e.to_string()),
    })
}

#[get("/blocks/latest/")]
pub async fn latest_block(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.chain().latest_block())
}

#[get("/blocks/{height}/")]
pub async fn block_at(state: web::Data<AppState>, path: web::Path<u64>) -> impl Responder {
    let height = path.into_inner();
    match state.chain().read().block_at(height) {
        Some(block) => HttpResponse::Ok().json(block),
        None => HttpResponse::NotFound().body(format!("no block at height {}", height)),
    }
}

/// Inbound block from a peer or tool. Applied atomically or not at all.
#[post("/blocks/")]
pub async fn post_block(state: web::Data<AppState>, body: web::Json<Block>) -> impl Responder {
    let block = body.into_inner();
    let height = block.header.height;
    let hash = block.hash();
    debug!(
        "POST /blocks/ - received #{} (hash={}, txs={})",
        height,
        hash,
        block.transactions.len()
    );

    match state.chain().add_block(block) {
        Ok(()) => HttpResponse::Ok().json(BlockAcceptedResponse { height, hash }),
        Err(e) => {
            warn!("POST /blocks/ - rejected #{}: {}", height, e);
            error_response(&e)
        }
    }
}
