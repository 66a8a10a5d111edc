use axum::{extract::State, http::StatusCode};

use crate::state::SharedState;

/// `POST /new_judgement`
///
/// Records a JSON judgement and re-broadcasts it if it was new.
pub async fn new_judgement(State(state): State<SharedState>, body: String) -> StatusCode {
    let out = {
        let mut engine = state.engine.lock().await;
        engine.receive_judgement(&body)
    };
    state.dispatch(out);
    StatusCode::OK
}
