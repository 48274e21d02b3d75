//! Period lifecycle: lock, unlock, close, and the postings each status accepts.

mod common;

use common::{date, fixture};
use lyne_core::LedgerError;
use lyne_core::audit::AuditAction;
use lyne_core::fiscal::PeriodStatus;
use lyne_db::repositories::{CreateExchangeRateInput, CreateFiscalYearInput, PERIOD_MODEL, PeriodPlan};
use lyne_shared::types::{Currency, UserId};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_locked_period_rejects_new_entries_but_posts_drafts() {
    let fx = fixture().await;
    let draft = fx
        .engine
        .entries()
        .create_draft(&fx.ctx, fx.sale("2026-01", 20, dec!(300)))
        .await
        .unwrap();

    let locked = fx.engine.lock_period(&fx.ctx, fx.period("2026-01")).await.unwrap();
    assert_eq!(locked.status, PeriodStatus::Locked);

    let err = fx
        .engine
        .post_entry(&fx.ctx, fx.sale("2026-01", 21, dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodNotOpen { status: PeriodStatus::Locked, .. }));

    let posted = fx.engine.entries().post_draft(&fx.ctx, draft.id).await.unwrap();
    assert_eq!(posted.reference, "VT-2026-01-000001");
}

#[tokio::test]
async fn test_closed_period_is_immutable() {
    let fx = fixture().await;
    let draft = fx
        .engine
        .entries()
        .create_draft(&fx.ctx, fx.sale("2026-02", 20, dec!(300)))
        .await
        .unwrap();
    let period_id = fx.period("2026-02");
    fx.engine.lock_period(&fx.ctx, period_id).await.unwrap();

    let err = fx.engine.fiscal().close_period(&fx.ctx, period_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::DraftEntriesRemain { count: 1, .. }));

    fx.engine.entries().cancel_draft(&fx.ctx, draft.id).await.unwrap();
    let closed = fx.engine.fiscal().close_period(&fx.ctx, period_id).await.unwrap();
    assert_eq!(closed.status, PeriodStatus::Closed);

    let unlock = fx
        .engine
        .unlock_period(&fx.ctx, period_id, UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(
        unlock,
        LedgerError::InvalidPeriodTransition { from: PeriodStatus::Closed, to: PeriodStatus::Open, .. }
    ));
}

#[tokio::test]
async fn test_unlock_is_audited_with_approver() {
    let fx = fixture().await;
    let period_id = fx.period("2026-03");
    let approver = UserId::new();
    fx.engine.lock_period(&fx.ctx, period_id).await.unwrap();

    let reopened = fx.engine.unlock_period(&fx.ctx, period_id, approver).await.unwrap();
    assert_eq!(reopened.status, PeriodStatus::Open);
    fx.post(fx.sale("2026-03", 2, dec!(10))).await;

    let events = fx
        .engine
        .audit()
        .events_for(fx.ctx.tenant_id, PERIOD_MODEL, &period_id.to_string())
        .await
        .unwrap();
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Lock, AuditAction::Unlock]);
    let unlock = events.last().unwrap();
    assert_eq!(unlock.meta.to_value().unwrap()["authorized_by"], approver.to_string());
}

#[tokio::test]
async fn test_open_period_cannot_be_unlocked_or_closed() {
    let fx = fixture().await;
    let period_id = fx.period("2026-04");

    let unlock = fx.engine.unlock_period(&fx.ctx, period_id, UserId::new()).await;
    assert!(matches!(unlock, Err(LedgerError::InvalidPeriodTransition { .. })));
    let close = fx.engine.fiscal().close_period(&fx.ctx, period_id).await;
    assert!(matches!(close, Err(LedgerError::InvalidPeriodTransition { .. })));
}

#[tokio::test]
async fn test_lock_period_locks_rates_inside_it() {
    let fx = fixture().await;
    let rates = fx.engine.rates();
    for (day, month) in [(15, 5), (1, 6)] {
        rates
            .create_rate(
                &fx.ctx,
                CreateExchangeRateInput {
                    date: date(2026, month, day),
                    base: Currency::Xof,
                    quote: Currency::Eur,
                    rate: dec!(655.957),
                    source: "BCEAO".to_string(),
                },
            )
            .await
            .unwrap();
    }

    fx.engine.lock_period(&fx.ctx, fx.period("2026-05")).await.unwrap();

    let tenant = fx.ctx.tenant_id;
    let may = rates.get_rate(tenant, date(2026, 5, 15), Currency::Xof, Currency::Eur).await.unwrap();
    let june = rates.get_rate(tenant, date(2026, 6, 1), Currency::Xof, Currency::Eur).await.unwrap();
    assert!(may.is_locked);
    assert!(!june.is_locked);

    let err = rates
        .update_rate(&fx.ctx, date(2026, 5, 15), Currency::Xof, Currency::Eur, dec!(656))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::RateLocked { .. }));
}

#[tokio::test]
async fn test_fiscal_years_cannot_overlap() {
    let fx = fixture().await;
    let err = fx
        .engine
        .fiscal()
        .create_fiscal_year(
            &fx.ctx,
            CreateFiscalYearInput::monthly("FY2026b", date(2026, 7, 1), date(2027, 6, 30)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::OverlappingFiscalYear(_)));
}

#[tokio::test]
async fn test_explicit_periods() {
    let fx = fixture().await;
    let year = fx
        .engine
        .fiscal()
        .create_fiscal_year(
            &fx.ctx,
            CreateFiscalYearInput {
                name: "FY2027".to_string(),
                date_start: date(2027, 1, 1),
                date_end: date(2027, 12, 31),
                periods: PeriodPlan::Explicit(vec![
                    ("2027-S1".to_string(), date(2027, 1, 1), date(2027, 6, 30)),
                    ("2027-S2".to_string(), date(2027, 7, 1), date(2027, 12, 31)),
                ]),
            },
        )
        .await
        .unwrap();
    assert_eq!(year.periods.len(), 2);

    let err = fx
        .engine
        .fiscal()
        .add_period(&fx.ctx, year.fiscal_year.id, "2028-01", date(2028, 1, 1), date(2028, 1, 31))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodOutsideYear { .. }));
}
