use std::time::Duration;

use crate::types::WireFormat;

/// Consensus configuration parameters.
///
/// This includes both protocol-level knobs (e.g. protocol version, block
/// time) and implementation-level limits (e.g. maximum transactions per
/// block). Every node of a network must agree on all of them.
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// Protocol version stamped into every block and transaction.
    pub version: String,
    /// Maximum number of transactions per block.
    pub block_size: usize,
    /// Length of one creator election window, in seconds.
    pub block_time_secs: u64,
    /// Separator and terminator of the block wire format.
    pub wire: WireFormat,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            version: "0.0.1".to_string(),
            block_size: 1024,
            block_time_secs: 5,
            wire: WireFormat::default(),
        }
    }
}

impl ConsensusConfig {
    /// Pause between two election rounds: half a block time, never
    /// shorter than 500ms.
    pub fn election_interval(&self) -> Duration {
        Duration::from_millis(self.block_time_secs.saturating_mul(500).max(500))
    }
}
