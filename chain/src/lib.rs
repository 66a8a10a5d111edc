//! Vaccination ledger library crate.
//!
//! This crate provides the core building blocks of a permissioned
//! blockchain for vaccination records, maintained by admission nodes that
//! take turns producing blocks:
//!
//! - strongly-typed domain types (`types`),
//! - key material handling (`crypto`),
//! - the branching block tree and its registration caches (`ledger`),
//! - a modular consensus engine with creator election and judgements (`consensus`),
//! - block and transaction validity predicates (`validation`),
//! - storage backends (`storage`),
//! - the peer transport (`network`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries can compose these pieces to build peer nodes and
//! local devnets.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod ledger;
pub mod metrics;
pub mod network;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export top-level configuration types.
pub use config::{ChainConfig, ConfigError, MetricsConfig};

// Re-export "core" consensus types and traits.
pub use consensus::{
    BlockContext, BlockStore, BlockValidator, CombinedValidator, ConsensusConfig, ConsensusEngine,
    ConsensusError, InvalidTransactions, JudgementBook, Proposer, SyncBundle, TransactionPool,
    TxDisposition, TxPool, ValidationError,
};

pub use crypto::{KeyError, Keypair};
pub use ledger::{AttachOutcome, Chain, ChainError, Registrations};
pub use network::{HttpPeerClient, Outbound, PeerConfig, PeerError};

// Re-export storage backends.
pub use storage::{FileBlockStore, FileStoreConfig, InMemoryBlockStore, StorageError};

pub use validation::{BaseValidity, PermissionValidity};

// Re-export metrics registry and consensus metrics.
pub use metrics::{ConsensusMetrics, MetricsRegistry, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default block validator stack used by a "typical" node.
///
/// This composes:
///
/// - [`BaseValidity`] for structural checks, and
/// - [`PermissionValidity`] for transaction permission checks.
pub type DefaultBlockValidator = CombinedValidator<BaseValidity, PermissionValidity>;

/// Type alias for the default block store backend.
pub type DefaultBlockStore = FileBlockStore;

/// Type alias for the default consensus engine stack.
///
/// This uses:
///
/// - [`DefaultBlockStore`] (one file per block),
/// - [`DefaultBlockValidator`] (base + permissions).
pub type DefaultConsensusEngine = ConsensusEngine<DefaultBlockStore, DefaultBlockValidator>;

/// Builds the default validator stack for `cfg`.
pub fn default_validator(cfg: &ConsensusConfig) -> DefaultBlockValidator {
    CombinedValidator::new(BaseValidity::new(cfg), PermissionValidity)
}

/// Returns the current wall-clock time as seconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
pub fn current_unix_timestamp() -> u64 {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
