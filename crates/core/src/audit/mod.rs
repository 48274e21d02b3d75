//! Tamper-evident audit trail.
//!
//! Every mutation emits one [`AuditEvent`], hash-chained per tenant:
//! - `types` holds actions, payloads, request context and events
//! - `hash` builds the canonical form and the SHA-256 digest
//! - `chain` seals drafts onto a tip and verifies a stored chain

pub mod chain;
pub mod hash;
pub mod types;

#[cfg(test)]
mod chain_props;

pub use chain::{ChainTip, verify_chain};
pub use hash::{GENESIS_HASH, canonical_json, compute_event_hash, format_timestamp};
pub use types::{AuditAction, AuditDraft, AuditEvent, AuditPayload, RequestContext};
