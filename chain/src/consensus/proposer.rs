//! Block proposal logic.
//!
//! The proposer assembles a candidate block on top of a given leaf: it
//! drains the transaction pool up to the block size, keeps transactions
//! that are valid against the leaf's registrations and diverts the rest
//! into the invalid set so that they never block production. A vaccine
//! name already registered earlier in the same block counts as invalid.

use std::collections::HashSet;

use crate::crypto::Keypair;
use crate::ledger::Registrations;
use crate::types::{Block, BlockError, Transaction, WireFormat};

use super::config::ConsensusConfig;
use super::pool::{InvalidTransactions, TxPool};

/// Configurable block proposer.
///
/// This struct is stateless with respect to the chain; the parent block,
/// its registrations and the pool are provided at call time.
#[derive(Clone, Debug)]
pub struct Proposer {
    pub version: String,
    pub block_size: usize,
    pub wire: WireFormat,
}

impl Proposer {
    /// Constructs a proposer from a [`ConsensusConfig`].
    pub fn from_config(cfg: &ConsensusConfig) -> Self {
        Self {
            version: cfg.version.clone(),
            block_size: cfg.block_size,
            wire: cfg.wire,
        }
    }

    /// Builds, signs and seals a new block on top of `parent`.
    ///
    /// This does not attach or persist anything; callers should re-validate
    /// the result before importing it.
    pub fn build_block<P>(
        &self,
        parent: &Block,
        registrations: &Registrations,
        creator: &Keypair,
        tx_pool: &mut P,
        invalid: &mut InvalidTransactions,
        timestamp: u64,
    ) -> Result<Block, BlockError>
    where
        P: TxPool,
    {
        let mut block =
            Block::successor_of(parent, self.version.clone(), creator.public_key().clone(), timestamp)?;

        let mut vaccines = HashSet::new();
        while block.transactions.len() < self.block_size {
            let Some(tx) = tx_pool.pop() else {
                break;
            };
            if let Err(e) = tx.validate(registrations) {
                tracing::debug!(kind = tx.kind(), reason = e.reason(), "not adding invalid transaction to block");
                invalid.insert(tx);
                continue;
            }
            if let Transaction::Vaccine(v) = &tx {
                if !vaccines.insert(v.vaccine.clone()) {
                    tracing::debug!(vaccine = %v.vaccine, "vaccine already registered in this block");
                    invalid.insert(tx);
                    continue;
                }
            }
            block.add_transaction(tx)?;
        }

        block.sign(creator, &self.wire)?;
        block.update_hash(&self.wire)?;
        Ok(block)
    }
}
