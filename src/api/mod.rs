mod balance;
mod chain;
mod health;
pub mod models;
mod stats;
mod tx;
mod validators;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::blockchain::ChainError;
use crate::transaction::MempoolError;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::latest_block)
            .service(chain::block_at)
            .service(chain::post_block)
            .service(balance::get_balance)
            .service(balance::get_account)
            .service(tx::build_transaction)
            .service(tx::post_transaction)
            .service(tx::get_mempool)
            .service(validators::list_validators)
            .service(validators::register_validator)
            .service(stats::get_stats)
            .service(stats::anti_whale),
    );
}

/// Duplicates are a conflict; everything else the caller sent is bad input.
fn error_response(err: &ChainError) -> HttpResponse {
    match err {
        ChainError::Mempool(MempoolError::Duplicate(_)) => HttpResponse::Conflict().body(err.to_string()),
        _ => HttpResponse::BadRequest().body(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{ChainHandle, ChainManager};
    use crate::consensus::{ConsensusConfig, PovcEngine};
    use crate::testing::{FailingOracle, Keypair, ScriptedOracle, signed_transfer, test_config};
    use crate::transaction::Transaction;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;
    use std::sync::Arc;

    fn state_with(alice: &Keypair, oracle: Arc<dyn crate::consensus::ScoringOracle>) -> AppState {
        let chain = ChainHandle::new(ChainManager::new(test_config(&alice.address, 1_000)));
        let config = ConsensusConfig {
            validator_address: "node".to_string(),
            total_supply: 1_000_000,
            ..ConsensusConfig::default()
        };
        AppState::new(Arc::new(PovcEngine::new(chain, oracle, config)))
    }

    #[actix_web::test]
    async fn submit_then_query_mempool_and_balance() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(ScriptedOracle::default()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(init_routes),
        )
        .await;

        let tx = signed_transfer(&alice, "bob", 10, 0, 0);
        let req = test::TestRequest::post().uri("/api/v1/tx/").set_json(&tx).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["hash"], tx.hash);

        // Same transaction again is a conflict.
        let req = test::TestRequest::post().uri("/api/v1/tx/").set_json(&tx).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri("/api/v1/mempool/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 1);

        let uri = format!("/api/v1/balance/{}/", alice.address);
        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 1_000);
    }

    #[actix_web::test]
    async fn build_uses_next_nonce_and_rejects_bad_input() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(ScriptedOracle::default()));
        state
            .chain()
            .submit_transaction(signed_transfer(&alice, "bob", 1, 0, 0))
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/build/")
            .set_json(serde_json::json!({"from": alice.address, "to": "bob", "value": 5}))
            .to_request();
        let tx: Transaction = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tx.nonce, 1);
        assert!(tx.signature.is_empty());

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/build/")
            .set_json(serde_json::json!({"from": alice.address.to_uppercase(), "to": "bob", "value": 5}))
            .to_request();
        let tx: Transaction = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tx.from, alice.address);
        assert_eq!(tx.nonce, 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/build/")
            .set_json(serde_json::json!({"from": "alice", "to": "bob", "value": 5}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/build/")
            .set_json(serde_json::json!({"from": alice.address, "to": "bob", "value": 0}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn inbound_block_accepted_then_stale_copy_rejected() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(ScriptedOracle::default()));
        let block = {
            let chain = state.chain().read();
            chain.build_block("peer", vec![signed_transfer(&alice, "bob", 7, 0, 0)])
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/blocks/").set_json(&block).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["height"], 1);
        assert_eq!(state.chain().balance("bob"), 7);

        let req = test::TestRequest::post().uri("/api/v1/blocks/").set_json(&block).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/v1/validate/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["height"], 1);

        let req = test::TestRequest::get().uri("/api/v1/blocks/1/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["header"]["height"], 1);
        assert_eq!(body["header"]["validator"], "peer");

        let req = test::TestRequest::get().uri("/api/v1/blocks/latest/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["header"]["height"], 1);

        let req = test::TestRequest::get().uri("/api/v1/blocks/9/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn export_has_exactly_three_keys() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(ScriptedOracle::default()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/chain/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["chain", "pending_txs", "state"]);
    }

    #[actix_web::test]
    async fn validator_registration_reports_oracle_failure() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(FailingOracle));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/validators/")
            .set_json(serde_json::json!({"address": "v1", "stake": 10}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["validator"]["nvs_score"], 0.5);
        assert!(body["warning"].is_string());

        let req = test::TestRequest::get().uri("/api/v1/validators/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["active"], 1);
    }

    #[actix_web::test]
    async fn anti_whale_and_stats() {
        let alice = Keypair::generate();
        let state = state_with(&alice, Arc::new(ScriptedOracle::default()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        // 3% of supply
        let uri = "/api/v1/anti-whale/30000/";
        let req = test::TestRequest::get().uri(uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["percentage"], 3.0);
        assert_eq!(body["reward_multiplier"], 0.0);
        assert_eq!(body["transfer_fee_percent"], 10);

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["height"], 0);
        assert_eq!(body["total_balance"], 1_000);
        assert_eq!(body["selection_policy"], "turn-based");
    }
}
