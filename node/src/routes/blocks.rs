use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use vaxchain::BlockHash;

use crate::state::SharedState;

/// `POST /new_block`
///
/// Accepts a wire-serialized block. Malformed or known blocks are dropped
/// silently; the peer always gets `200 OK`.
pub async fn new_block(State(state): State<SharedState>, body: String) -> StatusCode {
    let out = {
        let mut engine = state.engine.lock().await;
        engine.receive_block(&body)
    };
    state.dispatch(out);
    StatusCode::OK
}

/// `GET /latest_block`
pub async fn latest_block(State(state): State<SharedState>) -> Result<String, StatusCode> {
    let engine = state.engine.lock().await;
    engine.latest_block().ok_or(StatusCode::NOT_FOUND)
}

/// `GET /request_block/index/{index}`
pub async fn block_by_index(
    State(state): State<SharedState>,
    Path(index): Path<u64>,
) -> Result<String, StatusCode> {
    let engine = state.engine.lock().await;
    engine.block_by_index(index).ok_or(StatusCode::NOT_FOUND)
}

/// `GET /request_block/hash/{hash}`
pub async fn block_by_hash(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
) -> Result<String, (StatusCode, String)> {
    let hash: BlockHash = hash
        .parse()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid block hash: {e}")))?;
    let engine = state.engine.lock().await;
    engine
        .block_by_hash(&hash)
        .ok_or((StatusCode::NOT_FOUND, "unknown block".to_string()))
}
