//! Property-based tests for the audit hash chain.
//!
//! - Property 1: any untouched chain verifies with its full length
//! - Property 2: mutating one stored field is reported at that exact event

use chrono::{Duration, TimeZone, Utc};
use lyne_shared::types::TenantId;
use proptest::prelude::*;
use serde_json::json;

use super::chain::{ChainTip, verify_chain};
use super::types::{AuditAction, AuditDraft, AuditEvent, AuditPayload, RequestContext};
use crate::ledger::LedgerError;

const ACTIONS: [AuditAction; 5] = [
    AuditAction::Create,
    AuditAction::Update,
    AuditAction::Post,
    AuditAction::Reverse,
    AuditAction::Lock,
];

/// Builds a chain whose clock may jump backwards between events.
fn build(steps: &[(usize, i64, u32)]) -> Vec<AuditEvent> {
    let tenant = TenantId::new();
    let ctx = RequestContext::system(tenant).with_source("prop");
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let mut tip = ChainTip::default();

    steps
        .iter()
        .enumerate()
        .map(|(i, (action, offset_ms, amount))| {
            let draft = AuditDraft::new(&ctx, ACTIONS[*action], "finance.JournalEntry", i, format!("entry {i}"))
                .with_after(&json!({"amount": amount}))
                .unwrap();
            let event = tip.seal(tenant, draft, start + Duration::milliseconds(*offset_ms));
            tip = ChainTip::after(&event);
            event
        })
        .collect()
}

fn steps() -> impl Strategy<Value = Vec<(usize, i64, u32)>> {
    prop::collection::vec((0usize..ACTIONS.len(), -5_000i64..5_000, any::<u32>()), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_untouched_chain_verifies(steps in steps()) {
        let events = build(&steps);
        prop_assert_eq!(verify_chain(&events).unwrap(), events.len());

        for pair in events.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
            prop_assert_eq!(&pair[1].prev_hash, &pair[0].event_hash);
        }
    }

    #[test]
    fn prop_tamper_reports_first_divergence(
        steps in steps(),
        pick in any::<prop::sample::Index>(),
        field in 0usize..3,
    ) {
        let mut events = build(&steps);
        let position = pick.index(events.len());
        let forged = AuditPayload::from_value(&json!({"forged": true}));
        match field {
            0 => events[position].before = forged,
            1 => events[position].after = forged,
            _ => events[position].meta = forged,
        }

        match verify_chain(&events) {
            Err(LedgerError::ChainTampered { event_id, position: at }) => {
                prop_assert_eq!(at, position);
                prop_assert_eq!(event_id, events[position].id);
            }
            other => prop_assert!(false, "expected tamper, got {:?}", other),
        }
    }
}
