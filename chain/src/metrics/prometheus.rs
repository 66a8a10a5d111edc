//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed consensus metrics, and an
//! async HTTP exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

/// Consensus-related Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated by the
/// consensus engine. Cloning shares the underlying collectors.
#[derive(Clone)]
pub struct ConsensusMetrics {
    /// Latency of full block validation (structure + permissions), in seconds.
    pub block_validation_seconds: Histogram,
    /// Received blocks attached to the tree.
    pub blocks_accepted: IntCounter,
    /// Received blocks rejected by the creator check or validation.
    pub blocks_rejected: IntCounter,
    /// Blocks produced by this node.
    pub blocks_produced: IntCounter,
    /// Judgements signed by this node.
    pub judgements_emitted: IntCounter,
    /// Branches pruned after a rejection quorum.
    pub branches_pruned: IntCounter,
    /// Election rounds that failed.
    pub election_errors: IntCounter,
    /// Current number of leaves in the block tree.
    pub live_branches: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let c = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl ConsensusMetrics {
    /// Registers consensus metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let block_validation_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "consensus_block_validation_seconds",
                "Time to validate a received block in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(block_validation_seconds.clone()))?;

        let live_branches = IntGauge::with_opts(Opts::new(
            "consensus_live_branches",
            "Number of leaves in the block tree",
        ))?;
        registry.register(Box::new(live_branches.clone()))?;

        Ok(Self {
            block_validation_seconds,
            blocks_accepted: counter(
                registry,
                "consensus_blocks_accepted",
                "Total number of received blocks attached to the tree",
            )?,
            blocks_rejected: counter(
                registry,
                "consensus_blocks_rejected",
                "Total number of received blocks rejected",
            )?,
            blocks_produced: counter(
                registry,
                "consensus_blocks_produced",
                "Total number of blocks produced by this node",
            )?,
            judgements_emitted: counter(
                registry,
                "consensus_judgements_emitted",
                "Total number of judgements signed by this node",
            )?,
            branches_pruned: counter(
                registry,
                "consensus_branches_pruned",
                "Total number of branches pruned after a rejection quorum",
            )?,
            election_errors: counter(
                registry,
                "consensus_election_errors",
                "Total number of failed creator election rounds",
            )?,
            live_branches,
        })
    }
}

/// Wrapper around a Prometheus registry and the consensus metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub consensus: ConsensusMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the consensus metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("vaxchain".to_string()), None)?;
        let consensus = ConsensusMetrics::register(&registry)?;
        Ok(Self {
            registry,
            consensus,
        })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!("prometheus HTTP server error: {err}");
            }
        });
    }
}

fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = status;
    resp
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = text_response(StatusCode::OK, metrics.gather_text());
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            Ok(resp)
        }
        _ => Ok(text_response(StatusCode::NOT_FOUND, "not found".to_string())),
    }
}
