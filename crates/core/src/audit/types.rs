//! Audit trail types: actions, opaque payloads, request context and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use lyne_shared::types::{AuditEventId, TenantId, UserId};

use super::hash::canonical_json;
use crate::ledger::LedgerError;

/// Kind of mutation recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// Row created.
    Create,
    /// Row updated.
    Update,
    /// Row deleted.
    Delete,
    /// Entry posted.
    Post,
    /// Entry reversed.
    Reverse,
    /// Period or rate locked.
    Lock,
    /// Period unlocked.
    Unlock,
    /// Period or fiscal year closed.
    Close,
    /// External synchronisation.
    Sync,
    /// Bulk import.
    Import,
    /// Export.
    Export,
    /// Sign-in.
    Login,
    /// Anything else (e.g., chain halt release).
    Other,
}

impl AuditAction {
    /// Upper-case label, as hashed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Reverse => "REVERSE",
            Self::Lock => "LOCK",
            Self::Unlock => "UNLOCK",
            Self::Close => "CLOSE",
            Self::Sync => "SYNC",
            Self::Import => "IMPORT",
            Self::Export => "EXPORT",
            Self::Login => "LOGIN",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema-less JSON blob stored in canonical form (sorted keys, compact).
///
/// The core never interprets it; it only needs a stable byte form to hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditPayload(String);

impl AuditPayload {
    /// The empty object `{}`.
    #[must_use]
    pub fn empty() -> Self {
        Self("{}".to_string())
    }

    /// Canonical form of a JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(canonical_json(value))
    }

    /// Canonical form of any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if serialization fails.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, LedgerError> {
        serde_json::to_value(value)
            .map(|v| Self::from_value(&v))
            .map_err(|e| LedgerError::Internal(format!("audit payload serialization failed: {e}")))
    }

    /// The stored text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the stored text back into JSON.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the stored text is not JSON.
    pub fn to_value(&self) -> Result<Value, LedgerError> {
        serde_json::from_str(&self.0)
            .map_err(|e| LedgerError::Internal(format!("audit payload is not JSON: {e}")))
    }
}

impl Default for AuditPayload {
    fn default() -> Self {
        Self::empty()
    }
}

/// Who is acting, for which tenant, through which channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Tenant the operation runs for.
    pub tenant_id: TenantId,
    /// Authenticated user, if any.
    pub actor: Option<UserId>,
    /// Calling channel (e.g., "api", "admin", "seeder").
    pub source: String,
    /// Caller-provided correlation id.
    pub correlation_id: Option<String>,
}

impl RequestContext {
    /// Anonymous system context for a tenant.
    #[must_use]
    pub fn system(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            actor: None,
            source: "system".to_string(),
            correlation_id: None,
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the calling channel.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// An audit event before it is chained and hashed.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    /// Acting user.
    pub actor: Option<UserId>,
    /// Kind of mutation.
    pub action: AuditAction,
    /// Mutated model (e.g., "finance.JournalEntry").
    pub model_label: String,
    /// Mutated object id.
    pub object_id: String,
    /// Human-readable object name.
    pub object_repr: String,
    /// State before the mutation.
    pub before: AuditPayload,
    /// State after the mutation.
    pub after: AuditPayload,
    /// Request metadata plus operation extras.
    pub meta: Map<String, Value>,
}

impl AuditDraft {
    /// Starts a draft from the request context. `meta` is seeded with the
    /// source and correlation id.
    #[must_use]
    pub fn new(
        ctx: &RequestContext,
        action: AuditAction,
        model_label: &str,
        object_id: impl ToString,
        object_repr: impl Into<String>,
    ) -> Self {
        let mut meta = Map::new();
        meta.insert("source".to_string(), Value::String(ctx.source.clone()));
        if let Some(correlation_id) = &ctx.correlation_id {
            meta.insert("correlation_id".to_string(), Value::String(correlation_id.clone()));
        }

        Self {
            actor: ctx.actor,
            action,
            model_label: model_label.to_string(),
            object_id: object_id.to_string(),
            object_repr: object_repr.into(),
            before: AuditPayload::empty(),
            after: AuditPayload::empty(),
            meta,
        }
    }

    /// Records the state before the mutation.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if serialization fails.
    pub fn with_before<T: Serialize>(mut self, value: &T) -> Result<Self, LedgerError> {
        self.before = AuditPayload::of(value)?;
        Ok(self)
    }

    /// Records the state after the mutation.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if serialization fails.
    pub fn with_after<T: Serialize>(mut self, value: &T) -> Result<Self, LedgerError> {
        self.after = AuditPayload::of(value)?;
        Ok(self)
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

/// A sealed, chained audit event. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier.
    pub id: AuditEventId,
    /// Tenant whose chain holds the event.
    pub tenant_id: TenantId,
    /// Acting user.
    pub actor: Option<UserId>,
    /// Kind of mutation.
    pub action: AuditAction,
    /// Mutated model.
    pub model_label: String,
    /// Mutated object id.
    pub object_id: String,
    /// Human-readable object name.
    pub object_repr: String,
    /// State before.
    pub before: AuditPayload,
    /// State after.
    pub after: AuditPayload,
    /// Request metadata.
    pub meta: AuditPayload,
    /// Write time, microsecond precision, non-decreasing per tenant.
    pub created_at: DateTime<Utc>,
    /// Hash of the previous event of the tenant, or the genesis hash.
    pub prev_hash: String,
    /// SHA-256 of every other field.
    pub event_hash: String,
}
