//! Top-level configuration for a chain node.
//!
//! This module aggregates configuration for:
//!
//! - consensus parameters (`ConsensusConfig`),
//! - storage (block directory),
//! - peers (neighbour list + request timeout),
//! - metrics exporter (enable flag + listen address),
//! - and the node identity key file.
//!
//! The goal is to have a single `ChainConfig` struct that higher-level
//! binaries (e.g. `main.rs`) can construct from defaults, optionally
//! overlaid with environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::consensus::ConsensusConfig;
use crate::network::PeerConfig;
use crate::storage::FileStoreConfig;

/// An environment variable holding a value that cannot be used.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Top-level configuration for a chain node.
///
/// This aggregates all the sub-configs needed to wire up a typical node:
///
/// - consensus tuning (`consensus`),
/// - persistent storage (`storage`),
/// - neighbours (`peers`),
/// - Prometheus metrics exporter (`metrics`),
/// - identity key location (`key_file`).
#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub consensus: ConsensusConfig,
    pub storage: FileStoreConfig,
    pub peers: PeerConfig,
    pub metrics: MetricsConfig,
    pub key_file: PathBuf,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            consensus: ConsensusConfig::default(),
            storage: FileStoreConfig::default(),
            peers: PeerConfig::default(),
            metrics: MetricsConfig::default(),
            key_file: PathBuf::from("data/keys/node.key"),
        }
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: e.to_string(),
        value,
    })
}

/// Interprets `1`/`true`/`yes`/`on` (any case) as enabled.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ChainConfig {
    /// Builds the configuration from the defaults overlaid with the
    /// process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from the defaults overlaid with whatever
    /// `lookup` returns for each known variable.
    ///
    /// `VAXCHAIN_DATA_DIR` moves both the block directory and the key
    /// file; `VAXCHAIN_KEY_FILE` then overrides the key location.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("VAXCHAIN_BLOCK_TIME") {
            cfg.consensus.block_time_secs = parse("VAXCHAIN_BLOCK_TIME", v)?;
            if cfg.consensus.block_time_secs == 0 {
                return Err(ConfigError {
                    var: "VAXCHAIN_BLOCK_TIME",
                    value: "0".to_string(),
                    reason: "block time must be positive".to_string(),
                });
            }
        }
        if let Some(v) = lookup("VAXCHAIN_BLOCK_SIZE") {
            cfg.consensus.block_size = parse("VAXCHAIN_BLOCK_SIZE", v)?;
        }
        if let Some(v) = lookup("VAXCHAIN_VERSION") {
            cfg.consensus.version = v;
        }
        if let Some(v) = lookup("VAXCHAIN_DATA_DIR") {
            let data = PathBuf::from(v);
            cfg.storage.dir = data.join("blocks");
            cfg.key_file = data.join("keys").join("node.key");
        }
        if let Some(v) = lookup("VAXCHAIN_KEY_FILE") {
            cfg.key_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("NEIGHBORS_HOST_PORT") {
            cfg.peers.neighbors = PeerConfig::parse_neighbors(&v);
        }
        if let Some(v) = lookup("VAXCHAIN_METRICS_ADDR") {
            cfg.metrics.listen_addr = parse("VAXCHAIN_METRICS_ADDR", v)?;
        }
        if let Some(v) = lookup("VAXCHAIN_METRICS_ENABLED") {
            cfg.metrics.enabled = is_truthy(&v);
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_match_reference_constants() {
        let cfg = ChainConfig::default();
        assert_eq!(cfg.consensus.block_time_secs, 5);
        assert_eq!(cfg.consensus.block_size, 1024);
        assert_eq!(cfg.storage.dir, PathBuf::from("data/blocks"));
        assert_eq!(cfg.key_file, PathBuf::from("data/keys/node.key"));
        assert!(cfg.metrics.enabled);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let cfg = ChainConfig::from_lookup(lookup_from(&[
            ("VAXCHAIN_BLOCK_TIME", "3"),
            ("VAXCHAIN_DATA_DIR", "/var/lib/vax"),
            ("NEIGHBORS_HOST_PORT", "a:9000,b:9001"),
            ("VAXCHAIN_METRICS_ENABLED", "off"),
        ]))
        .expect("valid overrides");

        assert_eq!(cfg.consensus.block_time_secs, 3);
        assert_eq!(cfg.storage.dir, PathBuf::from("/var/lib/vax/blocks"));
        assert_eq!(cfg.key_file, PathBuf::from("/var/lib/vax/keys/node.key"));
        assert_eq!(cfg.peers.neighbors.len(), 2);
        assert!(!cfg.metrics.enabled);
    }

    #[test]
    fn malformed_values_are_reported() {
        let err = ChainConfig::from_lookup(lookup_from(&[("VAXCHAIN_BLOCK_SIZE", "lots")]))
            .expect_err("non-numeric block size must fail");
        assert!(err.to_string().contains("VAXCHAIN_BLOCK_SIZE"));

        let err = ChainConfig::from_lookup(lookup_from(&[("VAXCHAIN_BLOCK_TIME", "0")]))
            .expect_err("zero block time must fail");
        assert!(err.reason.contains("positive"));
    }
}
