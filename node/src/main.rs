// node/src/main.rs

//! Peer node binary.
//!
//! This binary exposes the peer protocol over HTTP on top of the
//! `vaxchain` crate:
//!
//! - `GET /health`
//! - `POST /new_block`, `POST /new_transaction`, `POST /new_judgement`
//! - `POST /sync`
//! - `GET /latest_block`, `GET /request_block/index/{index}`,
//!   `GET /request_block/hash/{hash}`
//!
//! It embeds a `DefaultConsensusEngine` (file-backed), a background
//! election driver, startup synchronisation with the neighbours, and a
//! Prometheus metrics exporter on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use vaxchain::{
    ChainConfig, ConsensusEngine, DefaultConsensusEngine, FileBlockStore, HttpPeerClient,
    MetricsRegistry, crypto, current_unix_timestamp, default_validator,
    run_prometheus_http_server,
};

use config::NodeConfig;
use routes::{blocks, health, judgements, sync, transactions};
use state::{AppState, SharedState};

/// Rounds over all neighbours before startup sync gives up.
const SYNC_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vaxchain=info,vaxchain_node=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let node_cfg = NodeConfig::from_env()?;
    let chain_cfg = ChainConfig::from_env().map_err(|e| e.to_string())?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if chain_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = chain_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Identity + storage + consensus engine
    // ---------------------------

    let keypair = crypto::load_or_generate(&chain_cfg.key_file)
        .map_err(|e| format!("cannot establish node identity: {e}"))?;

    let store = FileBlockStore::open(&chain_cfg.storage, chain_cfg.consensus.wire).map_err(|e| {
        format!(
            "failed to open block store at {}: {e}",
            chain_cfg.storage.dir.display()
        )
    })?;

    let validator = default_validator(&chain_cfg.consensus);
    let mut engine: DefaultConsensusEngine =
        ConsensusEngine::new(chain_cfg.consensus.clone(), store, validator, keypair)
            .with_metrics(metrics.consensus.clone());

    let loaded = engine
        .rehydrate()
        .map_err(|e| format!("failed to load chain: {e}"))?;
    if loaded == 0 && node_cfg.create_genesis {
        engine
            .create_genesis(current_unix_timestamp())
            .map_err(|e| format!("failed to create genesis: {e}"))?;
    }

    let peers = HttpPeerClient::new(&chain_cfg.peers)
        .map_err(|e| format!("failed to create peer client: {e}"))?;

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        engine: tokio::sync::Mutex::new(engine),
        peers,
    });

    // ---------------------------
    // Startup sync + registration
    // ---------------------------

    let startup_state = app_state.clone();
    let register = node_cfg.register_as_admission;
    let block_time = chain_cfg.consensus.block_time_secs;
    tokio::spawn(async move {
        synchronise(&startup_state, block_time).await;
        if register {
            register_as_admission(&startup_state).await;
        }
    });

    // ---------------------------
    // Election driver
    // ---------------------------

    let driver_state = app_state.clone();
    let interval = chain_cfg.consensus.election_interval();
    tokio::spawn(async move {
        run_election_driver(driver_state, interval).await;
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/new_block", post(blocks::new_block))
        .route("/new_transaction", post(transactions::new_transaction))
        .route("/new_judgement", post(judgements::new_judgement))
        .route("/sync", post(sync::sync))
        .route("/latest_block", get(blocks::latest_block))
        .route("/request_block/index/{index}", get(blocks::block_by_index))
        .route("/request_block/hash/{hash}", get(blocks::block_by_hash))
        .with_state(app_state);

    tracing::info!("peer node listening on http://{}", node_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(node_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", node_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("HTTP server error: {e}"))?;

    Ok(())
}

/// Catches up with the first neighbour that answers.
///
/// A node without any chain first fetches a genesis block; afterwards it
/// sends its first branching block and applies the returned bundle.
async fn synchronise(state: &SharedState, block_time: u64) {
    for attempt in 1..=SYNC_ATTEMPTS {
        for node in state.peers.neighbors() {
            let request = {
                let engine = state.engine.lock().await;
                engine.sync_request_block()
            };
            let request = match request {
                Some(block) => block,
                None => match state.peers.request_block_by_index(node, 0).await {
                    Ok(genesis) => {
                        let out = state.engine.lock().await.receive_block(&genesis);
                        state.dispatch(out);
                        genesis
                    }
                    Err(e) => {
                        tracing::debug!(peer = %node, "cannot fetch genesis: {e}");
                        continue;
                    }
                },
            };

            match state.peers.request_sync(node, request).await {
                Ok(bundle) => {
                    let received = bundle.blocks.len();
                    let out = state.engine.lock().await.apply_sync_bundle(bundle);
                    state.dispatch(out);
                    tracing::info!(peer = %node, blocks = received, "synchronised with neighbour");
                    return;
                }
                Err(e) => tracing::debug!(peer = %node, "sync request failed: {e}"),
            }
        }
        tracing::warn!(attempt, "no neighbour answered the sync request");
        tokio::time::sleep(Duration::from_secs(block_time.max(1))).await;
    }
}

/// Broadcasts a signed admission request unless this node already holds
/// an admission.
async fn register_as_admission(state: &SharedState) {
    let out = {
        let mut engine = state.engine.lock().await;
        match engine.self_registration(current_unix_timestamp()) {
            Some(tx) => {
                let (disposition, out) = engine.submit_transaction(tx);
                tracing::info!(?disposition, "requested admission");
                out
            }
            None => Vec::new(),
        }
    };
    state.dispatch(out);
}

/// Background election driver.
///
/// Wakes every half block time and produces a block on every branch
/// whose elected creator is this node. Failures are logged and the loop
/// carries on.
async fn run_election_driver(state: SharedState, interval: Duration) {
    tracing::info!(
        "election driver running with interval {}ms",
        interval.as_millis()
    );

    loop {
        let out = {
            let mut engine = state.engine.lock().await;
            match engine.run_election_round(current_unix_timestamp()) {
                Ok(out) => out,
                Err(e) => {
                    engine.note_election_error();
                    tracing::warn!("election round failed: {e}");
                    Vec::new()
                }
            }
        };
        state.dispatch(out);

        tokio::time::sleep(interval).await;
    }
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
