//! Canonical JSON and SHA-256 event hashing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use super::types::AuditEvent;

/// `prev_hash` of the first event of every tenant chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Compact JSON with object keys sorted recursively.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Timestamp form used in the hash: RFC 3339, microseconds, `Z` suffix.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SHA-256 (lower-case hex) over the canonical JSON of every stored field
/// except `event_hash`.
#[must_use]
pub fn compute_event_hash(event: &AuditEvent) -> String {
    let material = json!({
        "id": event.id,
        "tenant_id": event.tenant_id,
        "actor_id": event.actor,
        "action": event.action.as_str(),
        "model_label": event.model_label,
        "object_id": event.object_id,
        "object_repr": event.object_repr,
        "before": event.before.as_str(),
        "after": event.after.as_str(),
        "meta": event.meta.as_str(),
        "created_at": format_timestamp(event.created_at),
        "prev_hash": event.prev_hash,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&material).as_bytes());
    format!("{:x}", hasher.finalize())
}
