// src/main.rs
//
// Minimal single-node devnet that wires up the chain library:
//
// - file-backed block storage
// - base + permission validity
// - Prometheus metrics exporter on /metrics
// - election loop producing blocks whenever this node is the elected creator
//
// There is no HTTP peer surface here; use the `vaxchain-node` binary for
// a networked node.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vaxchain::{
    ChainConfig, ConsensusEngine, FileBlockStore, MetricsRegistry, crypto, current_unix_timestamp,
    default_validator, run_prometheus_http_server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vaxchain=info")),
        )
        .init();

    if let Err(err) = run_node().await {
        tracing::error!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    let cfg = ChainConfig::from_env().map_err(|e| e.to_string())?;

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{addr}/metrics");
    }

    // ---------------------------
    // Identity, storage, engine
    // ---------------------------

    let keypair = crypto::load_or_generate(&cfg.key_file)
        .map_err(|e| format!("cannot establish node identity: {e}"))?;

    let store = FileBlockStore::open(&cfg.storage, cfg.consensus.wire).map_err(|e| {
        format!(
            "failed to open block store at {}: {e}",
            cfg.storage.dir.display()
        )
    })?;

    let validator = default_validator(&cfg.consensus);
    let mut engine = ConsensusEngine::new(cfg.consensus.clone(), store, validator, keypair)
        .with_metrics(metrics.consensus.clone());

    let loaded = engine
        .rehydrate()
        .map_err(|e| format!("failed to load chain: {e}"))?;
    if loaded == 0 {
        engine
            .create_genesis(current_unix_timestamp())
            .map_err(|e| format!("failed to create genesis: {e}"))?;
    }

    // ---------------------------
    // Election loop
    // ---------------------------

    let tick = cfg.consensus.election_interval();
    tracing::info!(
        key = %engine.public_key().short(),
        block_time_secs = cfg.consensus.block_time_secs,
        "starting single-node election loop"
    );

    loop {
        match engine.run_election_round(current_unix_timestamp()) {
            Ok(produced) => {
                if !produced.is_empty() {
                    tracing::debug!(blocks = produced.len(), "election round produced blocks");
                }
            }
            Err(e) => {
                engine.note_election_error();
                tracing::warn!("election round failed: {e}");
            }
        }

        tokio::time::sleep(tick).await;
    }
}
