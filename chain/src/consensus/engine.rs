//! High-level consensus engine orchestration.
//!
//! The consensus engine wires together:
//!
//! - the block tree ([`Chain`]) and its registration caches,
//! - a [`BlockStore`] for persistence,
//! - a [`BlockValidator`] for structural and permission checks,
//! - the pending [`TransactionPool`] and the invalid-transaction set,
//! - the [`JudgementBook`], and
//! - a [`Proposer`] for block construction.
//!
//! All of them form one consistency domain: every method takes `&mut
//! self`, so a caller holding the engine (behind one lock in the node)
//! observes a linear sequence of attach, prune and judgement operations.
//! Methods that have something to tell peers return [`Outbound`]
//! messages instead of sending them.
//!
//! Blocks descending from a rejected or pruned block are never buffered:
//! they are rejected or filed under the dead branch as soon as they
//! arrive. Rejected blocks are remembered for [`REJECTED_CAPACITY`]
//! entries, after which their judgements are forgotten.

use std::num::NonZeroUsize;
use std::time::Instant;

use lru::LruCache;

use crate::crypto::Keypair;
use crate::ledger::{AttachOutcome, Chain};
use crate::metrics::ConsensusMetrics;
use crate::network::Outbound;
use crate::types::{
    Block, BlockHash, Judgement, Permission, PermissionTransaction, PublicKey, Transaction,
};

use super::config::ConsensusConfig;
use super::election;
use super::error::{ConsensusError, ValidationError};
use super::judgement::{JudgementBook, RecordOutcome};
use super::pool::{InvalidTransactions, TransactionPool, TxPool};
use super::proposer::Proposer;
use super::store::BlockStore;
use super::sync::SyncBundle;
use super::validator::{BlockContext, BlockValidator};

/// Rejected blocks remembered before the oldest is forgotten.
pub const REJECTED_CAPACITY: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// What happened to a transaction handed to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxDisposition {
    Pooled,
    AlreadyPooled,
    /// This node holds no admission on any branch.
    NotAdmitted,
    /// The transaction is in one of the recent blocks of some branch.
    AlreadyInChain,
    Invalid(ValidationError),
}

/// Fully-configurable consensus engine.
///
/// This struct is generic over:
///
/// - `S`: storage backend implementing [`BlockStore`],
/// - `V`: block validator implementing [`BlockValidator`].
pub struct ConsensusEngine<S, V> {
    pub config: ConsensusConfig,
    chain: Chain,
    store: S,
    validator: V,
    proposer: Proposer,
    keypair: Keypair,
    pool: TransactionPool,
    invalid: InvalidTransactions,
    judgements: JudgementBook,
    /// Rejected block hash to its parent hash.
    rejected: LruCache<BlockHash, BlockHash>,
    metrics: Option<ConsensusMetrics>,
}

impl<S, V> ConsensusEngine<S, V>
where
    S: BlockStore,
    V: BlockValidator,
{
    /// Creates a new consensus engine with an empty chain.
    pub fn new(config: ConsensusConfig, store: S, validator: V, keypair: Keypair) -> Self {
        let proposer = Proposer::from_config(&config);
        Self {
            config,
            chain: Chain::new(),
            store,
            validator,
            proposer,
            keypair,
            pool: TransactionPool::new(),
            invalid: InvalidTransactions::new(),
            judgements: JudgementBook::new(),
            rejected: LruCache::new(REJECTED_CAPACITY),
            metrics: None,
        }
    }

    /// Attaches Prometheus metrics updated by every operation.
    pub fn with_metrics(mut self, metrics: ConsensusMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Returns a reference to the underlying block store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    /// Transactions recently dropped while building blocks.
    pub fn invalid_transactions(&self) -> &InvalidTransactions {
        &self.invalid
    }

    pub fn judgements(&self) -> &JudgementBook {
        &self.judgements
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// Returns `true` if this node is admitted on at least one branch.
    pub fn is_admitted(&self) -> bool {
        let me = self.keypair.public_key();
        self.chain
            .get_admissions()
            .iter()
            .any(|(_, admissions)| admissions.contains(me))
    }

    fn update_branch_gauge(&self) {
        if let Some(m) = &self.metrics {
            m.live_branches.set(self.chain.leaves().len() as i64);
        }
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Replays persisted blocks into the tree without validation, then
    /// prunes the recorded dead branches again.
    ///
    /// Returns the number of blocks left in the tree; zero if the store
    /// holds no loadable chain.
    pub fn rehydrate(&mut self) -> Result<usize, ConsensusError> {
        let Some(blocks) = self.store.load_blocks()? else {
            return Ok(0);
        };
        for block in blocks {
            let index = block.header.index;
            if self.chain.attach(block)? == AttachOutcome::Dangling {
                tracing::warn!(index, "persisted block has no persisted parent");
            }
        }
        for root in self.store.load_pruned_roots()? {
            if self.chain.find_by_hash(&root).is_none() {
                continue;
            }
            match self.chain.prune_branch(&root) {
                Ok(pruned) => tracing::debug!(%root, removed = pruned.removed.len(), "pruned persisted dead branch"),
                Err(e) => tracing::warn!(%root, "cannot prune persisted dead branch: {e}"),
            }
        }
        self.update_branch_gauge();
        let loaded = self.chain.len();
        tracing::info!(loaded, "finished loading chain from disk");
        Ok(loaded)
    }

    /// Creates, persists and attaches a genesis block signed by this
    /// node. Returns the existing genesis if there is one.
    pub fn create_genesis(&mut self, timestamp: u64) -> Result<Block, ConsensusError> {
        if let Some(genesis) = self.chain.genesis() {
            return Ok(genesis.clone());
        }
        let genesis = Block::genesis(
            &self.keypair,
            &self.config.version,
            timestamp,
            &self.config.wire,
        );
        self.store.put_block(&genesis)?;
        self.chain.attach(genesis.clone())?;
        self.update_branch_gauge();
        tracing::info!(hash = ?genesis.hash, "created genesis block");
        Ok(genesis)
    }

    /// Signed admission request for this node, or `None` if it is
    /// already admitted somewhere.
    pub fn self_registration(&self, timestamp: u64) -> Option<Transaction> {
        if self.is_admitted() {
            tracing::debug!("already an admission node; no need to register");
            return None;
        }
        let tx = PermissionTransaction::new(
            self.config.version.clone(),
            timestamp,
            Permission::Admission,
            self.keypair.public_key().clone(),
        )
        .sign(&self.keypair);
        Some(tx.into())
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Handles a wire-serialized block received from a peer.
    ///
    /// Malformed and already known blocks are dropped silently. A new
    /// block is re-broadcast first and then processed.
    pub fn receive_block(&mut self, data: &str) -> Vec<Outbound> {
        let block = match Block::deserialize(data, &self.config.wire) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!("received block but couldn't process it: {e}");
                return Vec::new();
            }
        };
        let Some(hash) = block.hash else {
            tracing::warn!(index = block.header.index, "received unsealed block; dropping");
            return Vec::new();
        };
        if self.chain.find_by_hash(&hash).is_some()
            || self.chain.is_dangling(&hash)
            || self.chain.is_pruned(&hash)
            || self.judgements.has_judged(&hash)
        {
            tracing::debug!(index = block.header.index, %hash, "block already known");
            return Vec::new();
        }

        let mut out = vec![Outbound::Block(block.serialize(&self.config.wire))];
        self.process_block(block, &mut out);
        out
    }

    /// Processes a block and, transitively, every dangling block waiting
    /// on it.
    fn process_block(&mut self, block: Block, out: &mut Vec<Outbound>) {
        let mut pending = vec![block];
        while let Some(block) = pending.pop() {
            let Some(hash) = block.hash else {
                continue;
            };
            let index = block.header.index;
            let parent_hash = block.header.previous_hash;

            if self.chain.is_empty() && index == 0 {
                if let Err(e) = self.accept(block) {
                    tracing::error!(%hash, "failed to accept genesis: {e}");
                    continue;
                }
                pending.extend(self.chain.take_dangling_children(&hash));
                continue;
            }

            if self.chain.discard_pruned_descendant(&block) {
                tracing::debug!(index, %hash, "parent of received block was pruned; dropping it");
                continue;
            }

            if self.rejected.contains(&parent_hash) {
                tracing::info!(index, %hash, "parent of received block was rejected");
                self.reject_descendant(&block, out);
                pending.extend(self.chain.take_dangling_children(&hash));
                continue;
            }

            if self.chain.find_by_hash(&parent_hash).is_none() {
                tracing::debug!(index, %hash, "parent of received block unknown; keeping it dangling");
                if let Err(e) = self.chain.attach(block) {
                    tracing::warn!(index, %hash, "cannot keep block: {e}");
                }
                continue;
            }

            self.judgements.mark_judged(hash);
            if let Some(electorate) = self.chain.registrations_at(&parent_hash) {
                self.judgements.settle(&hash, &electorate);
            }

            if !election::is_created_by_expected_creator(&self.chain, &block, self.config.block_time_secs) {
                tracing::info!(index, %hash, creator = %block.header.creator.short(), "creator of received block is not the elected one");
                self.reject(&block, out);
                pending.extend(self.chain.take_dangling_children(&hash));
                continue;
            }

            if let Err(e) = self.validate_against_parent(&block) {
                tracing::info!(index, %hash, reason = e.reason(), "received block is not valid");
                self.reject(&block, out);
                pending.extend(self.chain.take_dangling_children(&hash));
                continue;
            }

            let txs = block.transactions.clone();
            if let Err(e) = self.accept(block) {
                tracing::error!(index, %hash, "failed to attach valid block: {e}");
                continue;
            }
            if let Some(m) = &self.metrics {
                m.blocks_accepted.inc();
            }
            self.pool.discard_multiple(&txs);
            self.judge(hash, parent_hash, true, out);
            self.evaluate_quorum(&hash);
            pending.extend(self.chain.take_dangling_children(&hash));
        }
        self.update_branch_gauge();
    }

    fn validate_against_parent(&self, block: &Block) -> Result<(), ValidationError> {
        let started = Instant::now();
        let parent_hash = block.header.previous_hash;
        let parent = self
            .chain
            .find_by_hash(&parent_hash)
            .ok_or(ValidationError::Invalid("parent block is unknown"))?;
        let registrations = self
            .chain
            .registrations_at(&parent_hash)
            .ok_or(ValidationError::Invalid("parent block is unknown"))?;
        let result = self.validator.validate(
            block,
            &BlockContext {
                parent,
                registrations: &registrations,
            },
        );
        if let Some(m) = &self.metrics {
            m.block_validation_seconds
                .observe(started.elapsed().as_secs_f64());
        }
        result
    }

    /// Persists and attaches a block that passed every check.
    fn accept(&mut self, block: Block) -> Result<(), ConsensusError> {
        if let Err(e) = self.store.put_block(&block) {
            tracing::error!(index = block.header.index, "failed to persist block: {e}");
        }
        self.chain.attach(block)?;
        Ok(())
    }

    fn reject(&mut self, block: &Block, out: &mut Vec<Outbound>) {
        if let Some(m) = &self.metrics {
            m.blocks_rejected.inc();
        }
        if let Some(hash) = block.hash {
            self.remember_rejected(hash, block.header.previous_hash);
            self.judge(hash, block.header.previous_hash, false, out);
        }
    }

    /// Rejects a block whose parent was rejected here. A rejection is
    /// emitted only if this node also rejected the parent.
    fn reject_descendant(&mut self, block: &Block, out: &mut Vec<Outbound>) {
        let Some(hash) = block.hash else {
            return;
        };
        let parent = block.header.previous_hash;
        self.judgements.mark_judged(hash);
        self.remember_rejected(hash, parent);
        if let Some(m) = &self.metrics {
            m.blocks_rejected.inc();
        }

        let rejected_parent = self
            .judgements
            .verdict(&parent, self.keypair.public_key())
            .is_some_and(|j| !j.accepted);
        if !rejected_parent {
            return;
        }
        let judgement = Judgement::new(hash, false, &self.keypair);
        self.judgements.record(judgement.clone());
        if let Some(m) = &self.metrics {
            m.judgements_emitted.inc();
        }
        tracing::debug!(%hash, "emitting judgement on descendant of rejected block");
        out.push(Outbound::Judgement(judgement));
    }

    fn remember_rejected(&mut self, hash: BlockHash, parent: BlockHash) {
        if let Some((evicted, _)) = self.rejected.push(hash, parent) {
            if evicted != hash {
                self.judgements.forget(&evicted);
            }
        }
    }

    /// Signs, records and emits this node's verdict, if it is admitted
    /// in the parent state of the block.
    fn judge(&mut self, hash: BlockHash, parent: BlockHash, accepted: bool, out: &mut Vec<Outbound>) {
        let admitted = self
            .chain
            .registrations_at(&parent)
            .is_some_and(|r| r.is_admission(self.keypair.public_key()));
        if !admitted {
            tracing::debug!(%hash, "no admission in branch of block; not judging");
            return;
        }
        let judgement = Judgement::new(hash, accepted, &self.keypair);
        self.judgements.record(judgement.clone());
        if let Some(m) = &self.metrics {
            m.judgements_emitted.inc();
        }
        tracing::debug!(%hash, accepted, "emitting judgement");
        out.push(Outbound::Judgement(judgement));
    }

    /// Prunes the subtree rooted at `hash` once a rejection quorum of the
    /// parent state's admissions is reached.
    fn evaluate_quorum(&mut self, hash: &BlockHash) {
        let Some(block) = self.chain.find_by_hash(hash) else {
            return;
        };
        if block.header.index == 0 {
            return;
        }
        let Some(electorate) = self.chain.registrations_at(&block.header.previous_hash) else {
            return;
        };
        if !self.judgements.has_rejection_quorum(hash, &electorate) {
            return;
        }
        match self.chain.prune_branch(hash) {
            Ok(pruned) => {
                tracing::info!(%hash, removed = pruned.removed.len(), "rejection quorum reached; branch pruned");
                // The root keeps its judgements for syncing peers.
                for gone in pruned.removed.iter().skip(1).chain(&pruned.forgotten) {
                    self.judgements.forget(gone);
                }
                if let Err(e) = self.store.put_pruned_root(hash) {
                    tracing::error!(%hash, "failed to persist pruned branch: {e}");
                }
                if let Some(m) = &self.metrics {
                    m.branches_pruned.inc();
                }
                self.update_branch_gauge();
            }
            Err(e) => tracing::warn!(%hash, "failed to prune branch: {e}"),
        }
    }

    // ------------------------------------------------------------------
    // Judgements
    // ------------------------------------------------------------------

    /// Handles a JSON judgement received from a peer.
    ///
    /// New judgements are re-broadcast and may trigger pruning.
    pub fn receive_judgement(&mut self, body: &str) -> Vec<Outbound> {
        let judgement = match Judgement::from_json(body) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("received judgement but couldn't process it: {e}");
                return Vec::new();
            }
        };
        self.handle_judgement(judgement)
    }

    /// Records a judgement and re-evaluates the quorum of its block.
    ///
    /// A judgement on a block this node knows counts only if the judge is
    /// admitted in the block's parent state. Judgements inside pruned
    /// branches, other than on the root, are dropped. Judgements on
    /// blocks not processed yet are held as unsettled.
    pub fn handle_judgement(&mut self, judgement: Judgement) -> Vec<Outbound> {
        let hash = judgement.block_hash;
        let outcome = match self.judged_parent(&hash) {
            Some(parent) => match self.chain.registrations_at(&parent) {
                Some(electorate) if !electorate.is_admission(&judgement.judge) => {
                    tracing::debug!(%hash, judge = %judgement.judge.short(), "judge holds no admission for this block; dropping judgement");
                    return Vec::new();
                }
                Some(_) => self.judgements.record(judgement.clone()),
                None => self.judgements.record_unsettled(judgement.clone()),
            },
            None if self.chain.is_pruned(&hash) => {
                tracing::debug!(%hash, "judgement on a pruned descendant; dropping it");
                return Vec::new();
            }
            None => self.judgements.record_unsettled(judgement.clone()),
        };
        match outcome {
            RecordOutcome::New => {
                self.evaluate_quorum(&hash);
                vec![Outbound::Judgement(judgement)]
            }
            RecordOutcome::Duplicate => Vec::new(),
            RecordOutcome::BadSignature => {
                tracing::warn!(%hash, judge = %judgement.judge.short(), "dropping judgement with invalid signature");
                Vec::new()
            }
        }
    }

    /// Parent of a block this node has processed: attached, rejected, or
    /// the root of a remembered dead branch.
    fn judged_parent(&self, hash: &BlockHash) -> Option<BlockHash> {
        if let Some(block) = self.chain.find_by_hash(hash) {
            return Some(block.header.previous_hash);
        }
        if let Some(parent) = self.rejected.peek(hash) {
            return Some(*parent);
        }
        self.chain.dead_branch(hash).map(|d| d.parent)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Handles a transaction line received from a peer.
    pub fn receive_transaction(&mut self, line: &str) -> TxDisposition {
        match Transaction::from_line(line) {
            Ok(tx) => self.handle_transaction(tx),
            Err(e) => {
                tracing::warn!("received transaction but couldn't process it: {e}");
                TxDisposition::Invalid(ValidationError::Invalid("malformed transaction"))
            }
        }
    }

    /// Submits a locally created transaction: it is broadcast to peers
    /// and then handled like a received one.
    pub fn submit_transaction(&mut self, tx: Transaction) -> (TxDisposition, Vec<Outbound>) {
        let out = vec![Outbound::Transaction(tx.clone())];
        (self.handle_transaction(tx), out)
    }

    /// Routes a transaction into the pool if this node is admitted and
    /// the transaction is new and valid on at least one branch.
    pub fn handle_transaction(&mut self, tx: Transaction) -> TxDisposition {
        if self.pool.contains(&tx) {
            return TxDisposition::AlreadyPooled;
        }
        if !self.is_admitted() {
            tracing::debug!("received transaction but this node is no admission node");
            return TxDisposition::NotAdmitted;
        }
        if self.is_in_recent_blocks(&tx) {
            tracing::debug!(kind = tx.kind(), "transaction is already part of the chain");
            return TxDisposition::AlreadyInChain;
        }

        let mut first_error = None;
        for leaf in self.chain.leaves() {
            let Some(registrations) = leaf.hash.and_then(|h| self.chain.tip_registrations(&h)) else {
                continue;
            };
            match tx.validate(registrations) {
                Ok(()) => {
                    first_error = None;
                    break;
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            tracing::debug!(kind = tx.kind(), reason = e.reason(), "transaction is not valid on any branch");
            return TxDisposition::Invalid(e);
        }

        self.pool.add(tx);
        TxDisposition::Pooled
    }

    /// Looks for `tx` in the last `n` blocks of every branch, `n` being
    /// the branch's admission count.
    fn is_in_recent_blocks(&self, tx: &Transaction) -> bool {
        self.chain.get_admissions().iter().any(|(leaf, admissions)| {
            self.chain
                .ancestors(leaf, admissions.len())
                .into_iter()
                .any(|block| block.transactions.contains(tx))
        })
    }

    // ------------------------------------------------------------------
    // Creator election
    // ------------------------------------------------------------------

    /// Runs one election round at `now`.
    ///
    /// For every branch whose elected creator is this node a block is
    /// built, re-validated, persisted, attached and returned for
    /// broadcast. A block failing its own re-validation is dropped and
    /// its transactions go back to the pool.
    pub fn run_election_round(&mut self, now: u64) -> Result<Vec<Outbound>, ConsensusError> {
        if !self.is_admitted() {
            tracing::debug!("currently no admission in any branch");
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let due = election::due_creators(&self.chain, now, self.config.block_time_secs);
        for (leaf, creator) in due {
            if &creator != self.keypair.public_key() {
                tracing::trace!(%leaf, "next creator is other");
                continue;
            }
            tracing::debug!(%leaf, "next creator is self");
            let parent = self
                .chain
                .find_by_hash(&leaf)
                .cloned()
                .ok_or(ConsensusError::UnknownBlock(leaf))?;
            let registrations = self
                .chain
                .registrations_at(&leaf)
                .ok_or(ConsensusError::UnknownBlock(leaf))?;

            let block = self.proposer.build_block(
                &parent,
                &registrations,
                &self.keypair,
                &mut self.pool,
                &mut self.invalid,
                now,
            )?;
            let hash = block.hash.ok_or(ConsensusError::UnknownBlock(leaf))?;

            if let Err(e) = self.validate_against_parent(&block) {
                tracing::error!(index = block.header.index, reason = e.reason(), "newly generated block is not valid");
                self.pool.add_multiple(block.transactions);
                continue;
            }

            if let Err(e) = self.store.put_block(&block) {
                self.pool.add_multiple(block.transactions);
                return Err(e.into());
            }
            let data = block.serialize(&self.config.wire);
            tracing::info!(index = block.header.index, %hash, txs = block.transactions.len(), "produced block");
            self.chain.attach(block)?;
            self.judgements.mark_judged(hash);
            if let Some(m) = &self.metrics {
                m.blocks_produced.inc();
            }
            out.push(Outbound::Block(data));
        }
        self.update_branch_gauge();
        Ok(out)
    }

    /// Records a failed election round.
    pub fn note_election_error(&self) {
        if let Some(m) = &self.metrics {
            m.election_errors.inc();
        }
    }

    // ------------------------------------------------------------------
    // Synchronisation and lookups
    // ------------------------------------------------------------------

    /// Block this node sends when asking peers to sync: the first
    /// branching block, or the tip of a linear chain.
    pub fn sync_request_block(&self) -> Option<String> {
        self.chain
            .first_branching_block()
            .map(|b| b.serialize(&self.config.wire))
    }

    /// Everything a peer that sent `requested` should receive.
    ///
    /// The subtree is rooted at the lower of our first branching block and
    /// the requested block, or at genesis if the requested block is not
    /// part of our tree.
    pub fn sync_response(&self, requested: &str) -> Result<SyncBundle, ConsensusError> {
        let requested = Block::deserialize(requested, &self.config.wire)?;
        let first_branch = self
            .chain
            .first_branching_block()
            .ok_or(ConsensusError::NoGenesis)?;

        let candidate = if first_branch.header.index < requested.header.index {
            first_branch
        } else {
            &requested
        };
        let root = match candidate.hash.and_then(|h| self.chain.find_by_hash(&h)) {
            Some(block) => block,
            None => self.chain.genesis().ok_or(ConsensusError::NoGenesis)?,
        };
        let root_hash = root.hash.ok_or(ConsensusError::NoGenesis)?;
        let root_index = root.header.index;

        let mut bundle = SyncBundle::default();
        for block in self.chain.subtree(&root_hash) {
            bundle.blocks.push(block.serialize(&self.config.wire));
            if let Some(hash) = block.hash {
                bundle.judgements.extend(self.judgements.for_block(&hash));
            }
        }
        for dead in self.chain.dead_branches_since(root_index) {
            bundle
                .dead_branch_judgements
                .extend(self.judgements.for_block(&dead));
        }
        Ok(bundle)
    }

    /// Applies a sync response: blocks first, then judgements.
    pub fn apply_sync_bundle(&mut self, bundle: SyncBundle) -> Vec<Outbound> {
        let mut out = Vec::new();
        for data in &bundle.blocks {
            out.extend(self.receive_block(data));
        }
        for judgement in bundle
            .judgements
            .into_iter()
            .chain(bundle.dead_branch_judgements)
        {
            out.extend(self.handle_judgement(judgement));
        }
        out
    }

    /// Highest-index leaf, wire-serialized.
    pub fn latest_block(&self) -> Option<String> {
        self.chain
            .latest_block()
            .map(|b| b.serialize(&self.config.wire))
    }

    pub fn block_by_index(&self, index: u64) -> Option<String> {
        self.chain
            .find_by_index(index)
            .map(|b| b.serialize(&self.config.wire))
    }

    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<String> {
        self.chain
            .find_by_hash(hash)
            .map(|b| b.serialize(&self.config.wire))
    }
}
