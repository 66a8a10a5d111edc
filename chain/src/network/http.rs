//! HTTP transport to neighbouring nodes.
//!
//! Every node exposes the same text-body routes:
//!
//! ```text
//! POST /new_block          wire-serialized block
//! POST /new_transaction    one JSON transaction line
//! POST /new_judgement      JSON judgement
//! POST /sync               wire-serialized block -> JSON SyncBundle
//! GET  /latest_block       wire-serialized block
//! GET  /request_block/index/{index}
//! GET  /request_block/hash/{hash}
//! ```
//!
//! Delivery is best effort: a failing neighbour is logged and skipped.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::consensus::sync::SyncBundle;

use super::Outbound;

/// Errors raised while talking to a neighbour.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Transport-level error (connect failure, timeout, bad body).
    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The neighbour answered with a non-success status.
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },
}

/// Neighbour list and request timeout.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Base URLs of the neighbours, e.g. `"http://127.0.0.1:9000"`.
    pub neighbors: Vec<String>,
    pub timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            neighbors: vec!["http://127.0.0.1:9000".to_string()],
            timeout: Duration::from_secs(2),
        }
    }
}

impl PeerConfig {
    /// Parses a comma-separated `host:port` list into base URLs.
    pub fn parse_neighbors(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("http://{s}"))
            .collect()
    }
}

/// Async HTTP client for the peer protocol.
#[derive(Clone)]
pub struct HttpPeerClient {
    neighbors: Vec<String>,
    client: Client,
}

impl HttpPeerClient {
    pub fn new(cfg: &PeerConfig) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|source| PeerError::Transport {
                url: "<client>".to_string(),
                source,
            })?;
        Ok(Self {
            neighbors: cfg.neighbors.clone(),
            client,
        })
    }

    pub fn neighbors(&self) -> &[String] {
        &self.neighbors
    }

    fn endpoint(base: &str, path: &str) -> String {
        // Avoid accidental double slashes.
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post(&self, base: &str, path: &str, body: String) -> Result<String, PeerError> {
        let url = Self::endpoint(base, path);
        let resp = self
            .client
            .post(&url)
            .body(body)
            .send()
            .await
            .map_err(|source| PeerError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PeerError::Status {
                url,
                status: status.as_u16(),
            });
        }
        resp.text()
            .await
            .map_err(|source| PeerError::Transport { url, source })
    }

    /// Sends one message to every neighbour.
    pub async fn broadcast(&self, msg: &Outbound) {
        let body = msg.body();
        for node in &self.neighbors {
            if let Err(e) = self.post(node, msg.route(), body.clone()).await {
                tracing::debug!(peer = %node, route = msg.route(), "broadcast failed: {e}");
            }
        }
    }

    /// Sends every message to every neighbour, in order.
    pub async fn dispatch(&self, msgs: Vec<Outbound>) {
        for msg in &msgs {
            self.broadcast(msg).await;
        }
    }

    /// Asks `node` for everything it has since `block`.
    pub async fn request_sync(&self, node: &str, block: String) -> Result<SyncBundle, PeerError> {
        let url = Self::endpoint(node, "/sync");
        let resp = self
            .client
            .post(&url)
            .body(block)
            .send()
            .await
            .map_err(|source| PeerError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PeerError::Status {
                url,
                status: status.as_u16(),
            });
        }
        resp.json::<SyncBundle>()
            .await
            .map_err(|source| PeerError::Transport { url, source })
    }

    /// Fetches the block at `index` on the first branch of `node` that
    /// reaches it.
    pub async fn request_block_by_index(&self, node: &str, index: u64) -> Result<String, PeerError> {
        self.get_text(node, &format!("/request_block/index/{index}")).await
    }

    async fn get_text(&self, node: &str, path: &str) -> Result<String, PeerError> {
        let url = Self::endpoint(node, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PeerError::Transport {
                url: url.clone(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(PeerError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.text()
            .await
            .map_err(|source| PeerError::Transport { url, source })
    }
}
