//! Storage layer of the ledger.
//!
//! This crate provides:
//! - The in-process multi-tenant row store with row locks and atomic commits
//! - Repositories per aggregate, each write audited in the same commit
//! - [`LedgerEngine`], the facade over all of them

pub mod engine;
pub mod repositories;
pub mod store;

pub use engine::{ChainVerification, LedgerEngine};
pub use store::{Database, RowLock};
