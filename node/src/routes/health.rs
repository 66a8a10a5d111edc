use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use vaxchain::TxPool;

use crate::state::SharedState;

/// Health-check response with a short summary of the local chain.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub public_key: String,
    pub admitted: bool,
    pub blocks: usize,
    pub leaves: usize,
    pub dangling: usize,
    pub pooled_transactions: usize,
    pub invalid_transactions: usize,
    pub judged_blocks: usize,
}

/// `GET /health`
///
/// Returns a JSON document indicating liveness.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let engine = state.engine.lock().await;
    let chain = engine.chain();
    let body = HealthResponse {
        status: "ok",
        public_key: engine.public_key().to_string(),
        admitted: engine.is_admitted(),
        blocks: chain.len(),
        leaves: chain.leaves().len(),
        dangling: chain.dangling_count(),
        pooled_transactions: engine.pool().len(),
        invalid_transactions: engine.invalid_transactions().len(),
        judged_blocks: engine.judgements().block_count(),
    };
    (StatusCode::OK, Json(body))
}
