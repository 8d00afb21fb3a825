use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::error_response;
use super::models::{AppState, BuildTxRequest, MempoolResponse, NewTxResponse};
use crate::transaction::Transaction;
use crate::wallet::normalize_address;

/// Submit a signed transaction to the mempool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<Transaction>,
) -> impl Responder {
    let tx = body.into_inner();
    let hash = tx.hash.clone();
    debug!(
        "POST /tx/ - received: hash={}, from={}, nonce={}",
        hash, tx.from, tx.nonce
    );

    match state.chain().submit_transaction(tx) {
        Ok(()) => {
            info!("POST /tx/ - accepted {}", hash);
            HttpResponse::Ok().json(NewTxResponse { hash })
        }
        Err(e) => {
            warn!("POST /tx/ - rejected {}: {}", hash, e);
            error_response(&e)
        }
    }
}

/// Prepare an unsigned transfer with the sender's next nonce. `from` is
/// normalised to its canonical address. The caller signs the returned
/// hash and submits via `POST /tx/`.
#[post("/tx/build/")]
pub async fn build_transaction(
    state: web::Data<AppState>,
    body: web::Json<BuildTxRequest>,
) -> impl Responder {
    let req = body.into_inner();
    if req.from.trim().is_empty() {
        return HttpResponse::BadRequest().body("from required");
    }
    if req.value == 0 {
        return HttpResponse::BadRequest().body("value must be > 0");
    }
    let from = match normalize_address(&req.from) {
        Ok(from) => from,
        Err(reason) => return HttpResponse::BadRequest().body(format!("from: {}", reason)),
    };
    let tx = state
        .chain()
        .create_transaction(&from, req.to.trim(), req.value, req.data);
    HttpResponse::Ok().json(tx)
}

#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain().read();
    let hashes = chain
        .pending_transactions()
        .iter()
        .map(|t| t.hash.clone())
        .collect::<Vec<_>>();
    HttpResponse::Ok().json(MempoolResponse {
        size: hashes.len(),
        transactions: hashes,
    })
}
