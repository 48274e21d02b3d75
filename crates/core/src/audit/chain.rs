//! Hash chain sealing and verification.
//!
//! Each tenant has one chain. An event's `prev_hash` is the `event_hash` of the
//! tenant's previous event (the genesis hash for the first one), so editing any
//! stored field breaks every later link.

use chrono::{DateTime, SubsecRound, Utc};
use lyne_shared::types::{AuditEventId, TenantId};

use super::hash::{GENESIS_HASH, compute_event_hash};
use super::types::{AuditDraft, AuditEvent, AuditPayload};
use crate::ledger::LedgerError;

/// Tip of a tenant chain: what the next event links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    /// `event_hash` of the last event, or the genesis hash.
    pub hash: String,
    /// `created_at` of the last event.
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for ChainTip {
    fn default() -> Self {
        Self {
            hash: GENESIS_HASH.to_string(),
            created_at: None,
        }
    }
}

impl ChainTip {
    /// Tip after `event`.
    #[must_use]
    pub fn after(event: &AuditEvent) -> Self {
        Self {
            hash: event.event_hash.clone(),
            created_at: Some(event.created_at),
        }
    }

    /// Truncates `now` to microseconds and clamps it so timestamps never go
    /// backwards within a chain.
    #[must_use]
    pub fn timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = now.trunc_subsecs(6);
        match self.created_at {
            Some(last) if last > now => last,
            _ => now,
        }
    }

    /// Chains and hashes a draft.
    #[must_use]
    pub fn seal(&self, tenant_id: TenantId, draft: AuditDraft, now: DateTime<Utc>) -> AuditEvent {
        let mut event = AuditEvent {
            id: AuditEventId::new(),
            tenant_id,
            actor: draft.actor,
            action: draft.action,
            model_label: draft.model_label,
            object_id: draft.object_id,
            object_repr: draft.object_repr,
            before: draft.before,
            after: draft.after,
            meta: AuditPayload::from_value(&serde_json::Value::Object(draft.meta)),
            created_at: self.timestamp(now),
            prev_hash: self.hash.clone(),
            event_hash: String::new(),
        };
        event.event_hash = compute_event_hash(&event);
        event
    }
}

/// Replays a tenant chain in creation order.
///
/// For every event, checks that `prev_hash` equals the previous stored
/// `event_hash` and that the recomputed hash equals the stored one.
///
/// # Errors
///
/// Returns `ChainTampered` with the first divergent event.
pub fn verify_chain(events: &[AuditEvent]) -> Result<usize, LedgerError> {
    let mut expected_prev = GENESIS_HASH;

    for (position, event) in events.iter().enumerate() {
        if event.prev_hash != expected_prev || compute_event_hash(event) != event.event_hash {
            return Err(LedgerError::ChainTampered {
                event_id: event.id,
                position,
            });
        }
        expected_prev = event.event_hash.as_str();
    }

    Ok(events.len())
}
