use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AccountResponse, AppState, BalanceResponse};

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let balance = state.chain().balance(&address);
    HttpResponse::Ok().json(BalanceResponse { address, balance })
}

/// Full account record; unknown addresses read as zero.
#[get("/account/{address}/")]
pub async fn get_account(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let account = state.chain().account(&address);
    HttpResponse::Ok().json(AccountResponse { address, account })
}
