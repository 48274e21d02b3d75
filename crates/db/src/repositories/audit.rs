//! Audit trail repository.
//!
//! Events are written by the other repositories inside their commits; this
//! repository only reads the chain, verifies it and releases a halt.

use lyne_core::LedgerError;
use lyne_core::audit::{self, AuditAction, AuditDraft, AuditEvent, RequestContext};
use lyne_shared::types::{AuditEventId, TenantId};
use tracing::{info, warn};

use crate::store::Database;

/// Model label of the audit trail itself, used for halt releases.
pub const AUDIT_EVENT_MODEL: &str = "audit.AuditEvent";

/// Audit trail repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: Database,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Replays the tenant chain and returns the number of verified events.
    ///
    /// A tamper halts the chain: every later write fails with `ChainHalted`
    /// until [`Self::release_chain_halt`] is called.
    ///
    /// # Errors
    ///
    /// Returns `ChainTampered` with the first divergent event.
    pub async fn verify_chain(&self, tenant_id: TenantId) -> Result<usize, LedgerError> {
        let store = self.db.tenant(tenant_id);
        let mut chain = self.db.lock_chain(&store).await?;

        match audit::verify_chain(&chain.events) {
            Ok(count) => {
                info!(tenant_id = %tenant_id, events = count, "Audit chain verified");
                Ok(count)
            }
            Err(e) => {
                if let LedgerError::ChainTampered { event_id, position } = &e {
                    warn!(tenant_id = %tenant_id, %event_id, position, "Audit chain tampered, halting writes");
                    chain.halted = Some(*event_id);
                }
                Err(e)
            }
        }
    }

    /// Lifts a chain halt, recording who did it and why.
    ///
    /// Returns the tampered event id, or `None` when the chain was not halted
    /// (nothing is recorded then).
    pub async fn release_chain_halt(
        &self,
        ctx: &RequestContext,
        note: &str,
    ) -> Result<Option<AuditEventId>, LedgerError> {
        let released = self
            .db
            .release_halt(ctx, |event_id| {
                Ok(
                    AuditDraft::new(ctx, AuditAction::Other, AUDIT_EVENT_MODEL, event_id, "chain halt release")
                        .with_meta("note", note)
                        .with_meta("tampered_event_id", event_id.to_string()),
                )
            })
            .await?;

        if let Some(event_id) = released {
            info!(tenant_id = %ctx.tenant_id, %event_id, actor = ?ctx.actor, "Audit chain halt released");
        }
        Ok(released)
    }

    /// Event that halted the chain, if any.
    pub async fn halted(&self, tenant_id: TenantId) -> Result<Option<AuditEventId>, LedgerError> {
        let store = self.db.tenant(tenant_id);
        let chain = self.db.lock_chain(&store).await?;
        Ok(chain.halted)
    }

    /// Full tenant log in chain order.
    pub async fn events(&self, tenant_id: TenantId) -> Result<Vec<AuditEvent>, LedgerError> {
        let store = self.db.tenant(tenant_id);
        let chain = self.db.lock_chain(&store).await?;
        Ok(chain.events.clone())
    }

    /// Events of one object, in chain order.
    pub async fn events_for(
        &self,
        tenant_id: TenantId,
        model_label: &str,
        object_id: &str,
    ) -> Result<Vec<AuditEvent>, LedgerError> {
        let store = self.db.tenant(tenant_id);
        let chain = self.db.lock_chain(&store).await?;
        Ok(chain
            .events
            .iter()
            .filter(|e| e.model_label == model_label && e.object_id == object_id)
            .cloned()
            .collect())
    }
}
