//! Consensus engine and related abstractions.
//!
//! This module provides a modular, testable consensus layer consisting of:
//!
//! - configuration parameters ([`config::ConsensusConfig`]),
//! - the time-based creator election ([`election`]),
//! - judgement bookkeeping and rejection quorums ([`judgement::JudgementBook`]),
//! - a pending-transaction pool ([`pool::TxPool`]),
//! - block proposal logic ([`proposer::Proposer`]),
//! - a pluggable block validator interface ([`validator::BlockValidator`]),
//! - a storage abstraction ([`store::BlockStore`]),
//! - and the engine tying them together ([`engine::ConsensusEngine`]).

pub mod config;
pub mod election;
pub mod engine;
pub mod error;
pub mod judgement;
pub mod pool;
pub mod proposer;
pub mod store;
pub mod sync;
pub mod validator;

pub use config::ConsensusConfig;
pub use engine::{ConsensusEngine, TxDisposition};
pub use error::{ConsensusError, ValidationError};
pub use judgement::{JudgementBook, RecordOutcome};
pub use pool::{InvalidTransactions, TransactionPool, TxPool};
pub use proposer::Proposer;
pub use store::BlockStore;
pub use sync::SyncBundle;
pub use validator::{BlockContext, BlockValidator, CombinedValidator};
