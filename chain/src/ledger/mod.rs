//! The block tree and the registration state derived from it.

/// Admission rotation, doctor and vaccine sets.
pub mod registry;
/// Arena-backed block tree.
pub mod tree;

pub use registry::Registrations;
pub use tree::{AttachOutcome, Chain, ChainError, DeadBranch, MAX_DEAD_BRANCHES, Pruned};
