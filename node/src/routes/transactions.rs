use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use vaxchain::{Outbound, Transaction, TxDisposition};

use crate::state::SharedState;

/// Response body for `POST /new_transaction`.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransactionResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            reason: None,
        }
    }
}

/// `POST /new_transaction`
///
/// Accepts one JSON transaction line. A transaction that enters the pool
/// for the first time is forwarded to the neighbours.
pub async fn new_transaction(
    State(state): State<SharedState>,
    body: String,
) -> (StatusCode, Json<TransactionResponse>) {
    let tx = match Transaction::from_line(body.trim()) {
        Ok(tx) => tx,
        Err(e) => {
            tracing::warn!("received transaction but couldn't process it: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(TransactionResponse {
                    status: "malformed",
                    reason: Some(e.to_string()),
                }),
            );
        }
    };
    let disposition = {
        let mut engine = state.engine.lock().await;
        engine.handle_transaction(tx.clone())
    };

    match disposition {
        TxDisposition::Pooled => {
            state.dispatch(vec![Outbound::Transaction(tx)]);
            (StatusCode::ACCEPTED, Json(TransactionResponse::status("pooled")))
        }
        TxDisposition::AlreadyPooled => (
            StatusCode::OK,
            Json(TransactionResponse::status("already_pooled")),
        ),
        TxDisposition::AlreadyInChain => (
            StatusCode::OK,
            Json(TransactionResponse::status("already_in_chain")),
        ),
        TxDisposition::NotAdmitted => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(TransactionResponse::status("not_admitted")),
        ),
        TxDisposition::Invalid(e) => (
            StatusCode::BAD_REQUEST,
            Json(TransactionResponse {
                status: "invalid",
                reason: Some(e.reason().to_string()),
            }),
        ),
    }
}
