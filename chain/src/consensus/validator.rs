//! Block validity predicates used by consensus.

use crate::ledger::Registrations;
use crate::types::Block;

use super::error::ValidationError;

/// Chain state a received block is judged against.
pub struct BlockContext<'a> {
    /// The block's declared parent, already attached.
    pub parent: &'a Block,
    /// Registrations as of `parent`.
    pub registrations: &'a Registrations,
}

/// Pluggable validity predicate for blocks.
///
/// Implementations should be deterministic and side-effect free. The
/// creator election check is not part of this trait; the engine runs it
/// before any validator.
pub trait BlockValidator {
    fn validate(&self, block: &Block, ctx: &BlockContext<'_>) -> Result<(), ValidationError>;
}

/// A validator that composes two other validators.
///
/// `CombinedValidator { base, permissions }` runs `base.validate` and then
/// `permissions.validate`, failing fast on the first error.
pub struct CombinedValidator<B, P> {
    pub base: B,
    pub permissions: P,
}

impl<B, P> CombinedValidator<B, P> {
    pub fn new(base: B, permissions: P) -> Self {
        Self { base, permissions }
    }
}

impl<B, P> BlockValidator for CombinedValidator<B, P>
where
    B: BlockValidator,
    P: BlockValidator,
{
    fn validate(&self, block: &Block, ctx: &BlockContext<'_>) -> Result<(), ValidationError> {
        self.base.validate(block, ctx)?;
        self.permissions.validate(block, ctx)?;
        Ok(())
    }
}
