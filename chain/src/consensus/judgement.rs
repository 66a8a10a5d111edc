//! Judgement bookkeeping and the pruning quorum.
//!
//! Judgements are stored per block and per judge. A branch is pruned once
//! a strict majority of the admission set of the block's parent state has
//! rejected its root. Judges outside that set are never counted.
//!
//! Judgements may arrive before the block they are about. Those are held
//! as unsettled, for at most [`UNSETTLED_CAPACITY`] blocks, until the
//! block is processed and [`JudgementBook::settle`] filters them against
//! the parent state.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::ledger::Registrations;
use crate::types::{BlockHash, Judgement, PublicKey};

/// Blocks with unsettled judgements held before the oldest is dropped.
pub const UNSETTLED_CAPACITY: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// Outcome of [`JudgementBook::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First judgement of this judge on this block.
    New,
    /// The judge already spoke on this block; the judgement was dropped.
    Duplicate,
    /// The signature does not verify; the judgement was dropped.
    BadSignature,
}

/// All judgements known to this node.
pub struct JudgementBook {
    by_block: HashMap<BlockHash, HashMap<PublicKey, Judgement>>,
    /// Blocks this node has already formed its own verdict on.
    judged: HashSet<BlockHash>,
    /// Blocks not yet processed here that already have judgements.
    unsettled: LruCache<BlockHash, ()>,
}

impl Default for JudgementBook {
    fn default() -> Self {
        Self::with_capacity(UNSETTLED_CAPACITY)
    }
}

impl JudgementBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding unsettled judgements for at most `cap` blocks.
    pub fn with_capacity(cap: NonZeroUsize) -> Self {
        Self {
            by_block: HashMap::new(),
            judged: HashSet::new(),
            unsettled: LruCache::new(cap),
        }
    }

    /// Records a judgement if its signature verifies and the judge has
    /// not judged the block before.
    pub fn record(&mut self, judgement: Judgement) -> RecordOutcome {
        if !judgement.verify_signature() {
            return RecordOutcome::BadSignature;
        }
        let per_judge = self.by_block.entry(judgement.block_hash).or_default();
        if per_judge.contains_key(&judgement.judge) {
            return RecordOutcome::Duplicate;
        }
        per_judge.insert(judgement.judge.clone(), judgement);
        RecordOutcome::New
    }

    /// Records a judgement about a block this node has not processed.
    ///
    /// When more blocks are unsettled than the book holds, the judgements
    /// of the least recently touched one are dropped.
    pub fn record_unsettled(&mut self, judgement: Judgement) -> RecordOutcome {
        let hash = judgement.block_hash;
        let outcome = self.record(judgement);
        if outcome != RecordOutcome::New {
            return outcome;
        }
        if let Some((evicted, ())) = self.unsettled.push(hash, ()) {
            if evicted != hash {
                tracing::debug!(block = %evicted, "dropping judgements on a block that never arrived");
                self.by_block.remove(&evicted);
            }
        }
        outcome
    }

    /// Ends the unsettled period of `hash`, keeping only the judges
    /// admitted in `electorate`.
    pub fn settle(&mut self, hash: &BlockHash, electorate: &Registrations) {
        if self.unsettled.pop(hash).is_none() {
            return;
        }
        if let Some(per_judge) = self.by_block.get_mut(hash) {
            per_judge.retain(|judge, _| electorate.is_admission(judge));
        }
    }

    /// Drops everything known about `hash`.
    pub fn forget(&mut self, hash: &BlockHash) {
        self.by_block.remove(hash);
        self.judged.remove(hash);
        self.unsettled.pop(hash);
    }

    /// The judgement `judge` gave on `hash`, if any.
    pub fn verdict(&self, hash: &BlockHash, judge: &PublicKey) -> Option<&Judgement> {
        self.by_block.get(hash)?.get(judge)
    }

    /// Number of blocks with judgements on record.
    pub fn block_count(&self) -> usize {
        self.by_block.len()
    }

    /// Marks `hash` as judged by this node. Returns `false` if it was
    /// already judged.
    pub fn mark_judged(&mut self, hash: BlockHash) -> bool {
        self.judged.insert(hash)
    }

    pub fn has_judged(&self, hash: &BlockHash) -> bool {
        self.judged.contains(hash)
    }

    /// Every judgement recorded for `hash`.
    pub fn for_block(&self, hash: &BlockHash) -> Vec<Judgement> {
        self.by_block
            .get(hash)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct rejecting judges admitted in `electorate`.
    pub fn rejections(&self, hash: &BlockHash, electorate: &Registrations) -> usize {
        self.by_block.get(hash).map_or(0, |m| {
            m.values()
                .filter(|j| !j.accepted && electorate.is_admission(&j.judge))
                .count()
        })
    }

    /// Returns `true` once rejections outweigh half the electorate.
    pub fn has_rejection_quorum(&self, hash: &BlockHash, electorate: &Registrations) -> bool {
        let rejections = self.rejections(hash, electorate);
        rejections > 0 && 2 * rejections > electorate.admission_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::{Block, Hash256, Permission, PermissionTransaction, WireFormat};

    fn dummy_hash(seed: &[u8]) -> BlockHash {
        BlockHash(Hash256::compute(seed))
    }

    fn electorate(keys: &[&Keypair]) -> Registrations {
        let fmt = WireFormat::default();
        let mut genesis = Block::genesis(keys[0], "0.0.1", 1, &fmt);
        for k in &keys[1..] {
            genesis.transactions.push(
                PermissionTransaction::new("0.0.1", 1, Permission::Admission, k.public_key().clone())
                    .sign(k)
                    .into(),
            );
        }
        let mut reg = Registrations::new();
        reg.apply_block(&genesis);
        reg
    }

    #[test]
    fn duplicate_and_forged_judgements_are_dropped() {
        let judge = Keypair::from_seed(&[1; 32]);
        let block = dummy_hash(b"b");
        let mut book = JudgementBook::new();

        assert_eq!(book.record(Judgement::new(block, false, &judge)), RecordOutcome::New);
        assert_eq!(book.record(Judgement::new(block, true, &judge)), RecordOutcome::Duplicate);

        let mut forged = Judgement::new(block, false, &Keypair::from_seed(&[2; 32]));
        forged.accepted = true;
        assert_eq!(book.record(forged), RecordOutcome::BadSignature);
        assert_eq!(book.for_block(&block).len(), 1);
    }

    #[test]
    fn strict_majority_of_admitted_judges_is_required() {
        let keys: Vec<Keypair> = (1..=4).map(|i| Keypair::from_seed(&[i; 32])).collect();
        let refs: Vec<&Keypair> = keys.iter().collect();
        let reg = electorate(&refs);
        let outsider = Keypair::from_seed(&[9; 32]);
        let block = dummy_hash(b"bad");
        let mut book = JudgementBook::new();

        book.record(Judgement::new(block, false, &keys[0]));
        book.record(Judgement::new(block, false, &keys[1]));
        book.record(Judgement::new(block, false, &outsider));
        book.record(Judgement::new(block, true, &keys[2]));
        // 2 of 4 is not a strict majority; the outsider does not count.
        assert_eq!(book.rejections(&block, &reg), 2);
        assert!(!book.has_rejection_quorum(&block, &reg));

        book.record(Judgement::new(block, false, &keys[3]));
        assert!(book.has_rejection_quorum(&block, &reg));
    }

    #[test]
    fn own_verdict_is_tracked_once() {
        let mut book = JudgementBook::new();
        let block = dummy_hash(b"x");
        assert!(book.mark_judged(block));
        assert!(!book.mark_judged(block));
        assert!(book.has_judged(&block));
    }

    #[test]
    fn unsettled_judgements_are_capped() {
        let judge = Keypair::from_seed(&[1; 32]);
        let mut book = JudgementBook::with_capacity(NonZeroUsize::new(2).expect("non-zero"));
        let blocks: Vec<BlockHash> = [b"a", b"b", b"c"].iter().map(|s| dummy_hash(*s)).collect();

        for block in &blocks {
            assert_eq!(book.record_unsettled(Judgement::new(*block, false, &judge)), RecordOutcome::New);
        }

        assert_eq!(book.block_count(), 2);
        assert!(book.for_block(&blocks[0]).is_empty());
        assert_eq!(book.for_block(&blocks[2]).len(), 1);
    }

    #[test]
    fn settling_keeps_only_admitted_judges_and_stops_eviction() {
        let keys: Vec<Keypair> = (1..=2).map(|i| Keypair::from_seed(&[i; 32])).collect();
        let reg = electorate(&[&keys[0], &keys[1]]);
        let outsider = Keypair::from_seed(&[9; 32]);
        let mut book = JudgementBook::with_capacity(NonZeroUsize::new(1).expect("non-zero"));
        let block = dummy_hash(b"early");

        book.record_unsettled(Judgement::new(block, false, &keys[0]));
        book.record_unsettled(Judgement::new(block, false, &outsider));
        book.settle(&block, &reg);
        assert_eq!(book.for_block(&block).len(), 1);
        assert!(book.verdict(&block, outsider.public_key()).is_none());

        // A later unsettled block no longer pushes the settled one out.
        book.record_unsettled(Judgement::new(dummy_hash(b"other"), false, &keys[1]));
        assert_eq!(book.for_block(&block).len(), 1);
    }

    #[test]
    fn forgetting_a_block_drops_its_verdicts() {
        let judge = Keypair::from_seed(&[1; 32]);
        let block = dummy_hash(b"gone");
        let mut book = JudgementBook::new();
        book.record(Judgement::new(block, false, &judge));
        book.mark_judged(block);

        book.forget(&block);
        assert!(book.for_block(&block).is_empty());
        assert!(!book.has_judged(&block));
        assert_eq!(book.block_count(), 0);
    }
}
