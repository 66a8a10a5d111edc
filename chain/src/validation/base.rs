//! Structural validity predicate for blocks.
//!
//! This validator enforces cheap, deterministic invariants that only need
//! the block and its parent:
//!
//! - linkage (index and previous hash),
//! - protocol version continuity,
//! - seal and creator signature,
//! - transaction count limit and absence of duplicate transactions.

use std::collections::HashSet;

use crate::consensus::config::ConsensusConfig;
use crate::consensus::error::ValidationError;
use crate::consensus::validator::{BlockContext, BlockValidator};
use crate::types::{Block, WireFormat};

/// Structural validity predicate for blocks.
#[derive(Clone, Debug)]
pub struct BaseValidity {
    block_size: usize,
    wire: WireFormat,
}

impl BaseValidity {
    /// Constructs a new `BaseValidity` from the consensus configuration.
    pub fn new(cfg: &ConsensusConfig) -> Self {
        Self {
            block_size: cfg.block_size,
            wire: cfg.wire,
        }
    }

    fn check_linkage(&self, block: &Block, parent: &Block) -> Result<(), ValidationError> {
        if block.header.index != parent.header.index + 1 {
            return Err(ValidationError::Custom(format!(
                "wrong index: expected {}, got {}",
                parent.header.index + 1,
                block.header.index
            )));
        }
        if parent.hash != Some(block.header.previous_hash) {
            return Err(ValidationError::Invalid(
                "block does not reference previous block",
            ));
        }
        if block.header.version != parent.header.version {
            return Err(ValidationError::Custom(format!(
                "different versions: parent {}, block {}",
                parent.header.version, block.header.version
            )));
        }
        Ok(())
    }

    fn check_seal(&self, block: &Block) -> Result<(), ValidationError> {
        let Some(hash) = block.hash else {
            return Err(ValidationError::Invalid("block is not sealed"));
        };
        if block.compute_hash(&self.wire) != hash {
            return Err(ValidationError::Invalid("block hash does not match content"));
        }
        if !block.verify_signature(&self.wire) {
            return Err(ValidationError::Invalid("creator signature is not valid"));
        }
        Ok(())
    }

    fn check_transactions(&self, block: &Block) -> Result<(), ValidationError> {
        let tx_count = block.transactions.len();
        if tx_count > self.block_size {
            return Err(ValidationError::Custom(format!(
                "block has {} txs, exceeds block_size={}",
                tx_count, self.block_size
            )));
        }

        let mut seen = HashSet::new();
        for tx in &block.transactions {
            if !seen.insert(tx) {
                return Err(ValidationError::Custom(format!(
                    "duplicate {} transaction in block",
                    tx.kind()
                )));
            }
        }
        Ok(())
    }
}

impl BlockValidator for BaseValidity {
    fn validate(&self, block: &Block, ctx: &BlockContext<'_>) -> Result<(), ValidationError> {
        self.check_linkage(block, ctx.parent)?;
        self.check_seal(block)?;
        self.check_transactions(block)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::ledger::Registrations;
    use crate::types::{
        BlockHash, Hash256, Permission, PermissionTransaction, Transaction, VaccineTransaction,
    };

    const VERSION: &str = "0.0.1";

    fn dummy_keypair() -> Keypair {
        Keypair::from_seed(&[7u8; 32])
    }

    fn dummy_cfg(block_size: usize) -> ConsensusConfig {
        ConsensusConfig {
            block_size,
            ..ConsensusConfig::default()
        }
    }

    fn dummy_genesis(kp: &Keypair) -> Block {
        Block::genesis(kp, VERSION, 1_700_000_000, &WireFormat::default())
    }

    /// Unsealed successor of `genesis` with a vaccine and a doctor request.
    fn dummy_successor(genesis: &Block, kp: &Keypair) -> Block {
        let mut block = Block::successor_of(genesis, VERSION, kp.public_key().clone(), 1_700_000_005)
            .expect("genesis sealed");
        let vaccine: Transaction =
            VaccineTransaction::new(VERSION, 1, "a vaccine", kp.public_key().clone())
                .sign(kp)
                .into();
        let doctor: Transaction =
            PermissionTransaction::new(VERSION, 2, Permission::Doctor, kp.public_key().clone())
                .sign(kp)
                .into();
        block.add_transaction(vaccine).expect("unsealed");
        block.add_transaction(doctor).expect("unsealed");
        block
    }

    fn seal(block: &mut Block, kp: &Keypair) {
        let fmt = WireFormat::default();
        block.sign(kp, &fmt).expect("sign");
        block.update_hash(&fmt).expect("seal");
    }

    fn check(v: &BaseValidity, block: &Block, parent: &Block) -> Result<(), ValidationError> {
        let registrations = Registrations::new();
        v.validate(
            block,
            &BlockContext {
                parent,
                registrations: &registrations,
            },
        )
    }

    #[test]
    fn successor_of_genesis_is_valid() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        seal(&mut block, &kp);

        let v = BaseValidity::new(&dummy_cfg(10));
        assert_eq!(check(&v, &block, &genesis), Ok(()));
    }

    #[test]
    fn wrong_index_is_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        block.header.index = 2000;
        seal(&mut block, &kp);

        let err = check(&BaseValidity::new(&dummy_cfg(10)), &block, &genesis).unwrap_err();
        assert!(err.reason().contains("wrong index"), "unexpected message: {err}");
    }

    #[test]
    fn foreign_previous_hash_is_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        block.header.previous_hash = BlockHash(Hash256::compute(b"some random hash"));
        seal(&mut block, &kp);

        let err = check(&BaseValidity::new(&dummy_cfg(10)), &block, &genesis).unwrap_err();
        assert!(
            err.reason().contains("does not reference previous"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn version_change_is_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        block.header.version = "0".to_string();
        seal(&mut block, &kp);

        let err = check(&BaseValidity::new(&dummy_cfg(10)), &block, &genesis).unwrap_err();
        assert!(err.reason().contains("different versions"), "unexpected message: {err}");
    }

    #[test]
    fn tampered_content_and_missing_signature_are_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let v = BaseValidity::new(&dummy_cfg(10));

        let mut tampered = dummy_successor(&genesis, &kp);
        seal(&mut tampered, &kp);
        tampered.header.timestamp += 1;
        let err = check(&v, &tampered, &genesis).unwrap_err();
        assert!(err.reason().contains("hash does not match"), "unexpected message: {err}");

        let mut unsigned = dummy_successor(&genesis, &kp);
        unsigned.update_hash(&WireFormat::default()).expect("seal");
        let err = check(&v, &unsigned, &genesis).unwrap_err();
        assert!(err.reason().contains("signature"), "unexpected message: {err}");
    }

    #[test]
    fn too_many_txs_are_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        seal(&mut block, &kp);

        let err = check(&BaseValidity::new(&dummy_cfg(1)), &block, &genesis).unwrap_err();
        match err {
            ValidationError::Custom(msg) => {
                assert!(msg.contains("exceeds block_size"), "unexpected message: {msg}");
            }
            _ => panic!("unexpected error variant: {err:?}"),
        }
    }

    #[test]
    fn duplicate_transaction_in_block_is_rejected() {
        let kp = dummy_keypair();
        let genesis = dummy_genesis(&kp);
        let mut block = dummy_successor(&genesis, &kp);
        let dup = block.transactions[0].clone();
        block.add_transaction(dup).expect("unsealed");
        seal(&mut block, &kp);

        let err = check(&BaseValidity::new(&dummy_cfg(10)), &block, &genesis).unwrap_err();
        assert!(err.reason().contains("duplicate vaccine"), "unexpected message: {err}");
    }
}
