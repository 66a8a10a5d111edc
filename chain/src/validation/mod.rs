//! Block and transaction validity predicates for the chain.
//!
//! This module implements concrete block validators that plug into the
//! consensus layer via [`crate::consensus::validator::BlockValidator`].
//!
//! It currently provides:
//!
//! - [`base::BaseValidity`]: linkage, seal, signature and size checks.
//! - [`permission::PermissionValidity`]: per-transaction checks against
//!   the registrations of the parent state. The per-variant rules are
//!   inherent `validate` methods on the transaction types.

pub mod base;
pub mod permission;

pub use base::BaseValidity;
pub use permission::PermissionValidity;
