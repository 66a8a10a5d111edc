//! Synchronisation payload for peers that appear to be behind.

use serde::{Deserialize, Serialize};

use crate::types::Judgement;

/// Blocks and judgements resent to a syncing peer.
///
/// `blocks` are wire-serialized, parents before children. Judgements on
/// pruned branches travel separately so the peer also learns what was
/// rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBundle {
    pub blocks: Vec<String>,
    pub judgements: Vec<Judgement>,
    pub dead_branch_judgements: Vec<Judgement>,
}
