//! HTTP handlers for the peer protocol.

pub mod blocks;
pub mod health;
pub mod judgements;
pub mod sync;
pub mod transactions;
