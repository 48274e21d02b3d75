//! Concurrent posting stress tests.
//!
//! These tests verify that:
//! - References within a journal stay gap-free and strictly increasing
//! - The audit chain stays a single valid total order under contention
//! - Tenants do not share counters or chains

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use lyne_core::audit::RequestContext;
use lyne_db::ChainVerification;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

mod common;

use common::fixture;

const WRITERS: usize = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_postings_are_gap_free() {
    let fx = Arc::new(fixture().await);
    let barrier = Arc::new(Barrier::new(WRITERS));
    let before = fx.event_count().await;

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let fx = Arc::clone(&fx);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                let day = u32::try_from(i % 28).unwrap() + 1;
                let input = fx.sale("2026-01", day, dec!(100));
                barrier.wait().await;
                fx.engine.post_entry(&fx.ctx, input).await
            })
        })
        .collect();

    let results = join_all(handles).await;
    let references: BTreeSet<String> = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().reference)
        .collect();

    let expected: BTreeSet<String> = (1..=WRITERS).map(|n| format!("VT-2026-01-{n:06}")).collect();
    assert_eq!(references, expected);

    assert_eq!(fx.event_count().await, before + WRITERS);
    let verification = fx.engine.verify_audit_chain(fx.ctx.tenant_id).await.unwrap();
    assert_eq!(verification, ChainVerification::Intact { events: before + WRITERS });

    let receivable = fx
        .engine
        .entries()
        .account_balance(fx.ctx.tenant_id, fx.fy2026.fiscal_year.id, "411")
        .await
        .unwrap();
    assert_eq!(receivable.debit, dec!(5000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_journals_sequence_independently_under_contention() {
    let fx = Arc::new(fixture().await);
    let barrier = Arc::new(Barrier::new(20));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let fx = Arc::clone(&fx);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                let input = if i % 2 == 0 {
                    fx.sale("2026-02", 10, dec!(10))
                } else {
                    fx.purchase("2026-02", 10, dec!(10))
                };
                barrier.wait().await;
                fx.engine.post_entry(&fx.ctx, input).await.unwrap().reference
            })
        })
        .collect();

    let references: BTreeSet<String> = join_all(handles).await.into_iter().map(Result::unwrap).collect();
    for journal in ["VT", "AC"] {
        let expected: BTreeSet<String> = (1..=10).map(|n| format!("{journal}-2026-02-{n:06}")).collect();
        assert!(expected.is_subset(&references), "{journal} references not gap-free");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tenants_are_isolated() {
    let a = Arc::new(fixture().await);
    let b = Arc::new(fixture().await);
    let engine_b = b.engine.clone();

    // tenant b's context against tenant a's store sees an empty tenant
    let foreign = RequestContext::system(b.ctx.tenant_id);
    let err = a.engine.post_entry(&foreign, a.sale("2026-01", 5, dec!(10))).await;
    assert!(err.is_err());

    let (ra, rb) = tokio::join!(
        a.engine.post_entry(&a.ctx, a.sale("2026-01", 5, dec!(10))),
        engine_b.post_entry(&b.ctx, b.sale("2026-01", 5, dec!(10))),
    );
    assert_eq!(ra.unwrap().reference, "VT-2026-01-000001");
    assert_eq!(rb.unwrap().reference, "VT-2026-01-000001");
}
