//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use vaxchain::{DefaultConsensusEngine, HttpPeerClient, Outbound};

/// Shared state held by the HTTP handlers and background tasks.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Embedded consensus engine. Chain, pool, invalid set and judgements
    /// all live behind this one lock.
    pub engine: Mutex<DefaultConsensusEngine>,
    /// Client for the neighbour nodes.
    pub peers: HttpPeerClient,
}

impl AppState {
    /// Broadcasts `msgs` in the background so handlers return without
    /// waiting on slow neighbours.
    ///
    /// Must be called after the engine lock has been released.
    pub fn dispatch(&self, msgs: Vec<Outbound>) {
        if msgs.is_empty() {
            return;
        }
        let peers = self.peers.clone();
        tokio::spawn(async move {
            peers.dispatch(msgs).await;
        });
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
