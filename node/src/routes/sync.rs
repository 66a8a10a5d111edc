use axum::{Json, extract::State, http::StatusCode};

use vaxchain::SyncBundle;

use crate::state::SharedState;

/// `POST /sync`
///
/// The body is the requester's first branching block. Answers with the
/// blocks and judgements the requester needs to catch up.
pub async fn sync(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<SyncBundle>, (StatusCode, String)> {
    let engine = state.engine.lock().await;
    engine
        .sync_response(&body)
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}
