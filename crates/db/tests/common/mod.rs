//! Shared fixtures: a seeded tenant with fiscal years 2026 (and optionally 2027).

#![allow(dead_code)]

use chrono::NaiveDate;
use lyne_core::audit::RequestContext;
use lyne_core::ledger::{EntryInput, LineInput, PostedEntry};
use lyne_db::LedgerEngine;
use lyne_db::repositories::{CreateFiscalYearInput, FiscalYearWithPeriods};
use lyne_shared::LedgerConfig;
use lyne_shared::types::{TenantId, UserId};
use rust_decimal::Decimal;

pub struct Fixture {
    pub engine: LedgerEngine,
    pub ctx: RequestContext,
    pub fy2026: FiscalYearWithPeriods,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn fixture() -> Fixture {
    fixture_with(LedgerConfig::default()).await
}

pub async fn fixture_with(config: LedgerConfig) -> Fixture {
    let engine = LedgerEngine::new(config);
    let ctx = RequestContext::system(TenantId::new())
        .with_actor(UserId::new())
        .with_source("test");
    engine.seed().seed_syscohada(&ctx).await.unwrap();
    let fy2026 = engine
        .fiscal()
        .create_fiscal_year(&ctx, CreateFiscalYearInput::monthly("FY2026", date(2026, 1, 1), date(2026, 12, 31)))
        .await
        .unwrap();
    Fixture { engine, ctx, fy2026 }
}

impl Fixture {
    pub async fn add_fy2027(&self) -> FiscalYearWithPeriods {
        self.engine
            .fiscal()
            .create_fiscal_year(
                &self.ctx,
                CreateFiscalYearInput::monthly("FY2027", date(2027, 1, 1), date(2027, 12, 31)),
            )
            .await
            .unwrap()
    }

    pub fn period(&self, name: &str) -> lyne_shared::types::AccountingPeriodId {
        self.fy2026.period(name).unwrap().id
    }

    /// A balanced sale: 411 debit / 701 credit.
    pub fn sale(&self, period: &str, day: u32, amount: Decimal) -> EntryInput {
        let month: u32 = period[5..].parse().unwrap();
        EntryInput::new("VT", self.period(period), "Vente")
            .on(date(2026, month, day))
            .line(LineInput::debit("411", amount))
            .line(LineInput::credit("701", amount))
    }

    /// A balanced purchase: 601 debit / 401 credit.
    pub fn purchase(&self, period: &str, day: u32, amount: Decimal) -> EntryInput {
        let month: u32 = period[5..].parse().unwrap();
        EntryInput::new("AC", self.period(period), "Achat")
            .on(date(2026, month, day))
            .line(LineInput::debit("601", amount))
            .line(LineInput::credit("401", amount))
    }

    pub async fn post(&self, input: EntryInput) -> PostedEntry {
        self.engine.post_entry(&self.ctx, input).await.unwrap()
    }

    pub async fn event_count(&self) -> usize {
        self.engine.audit().events(self.ctx.tenant_id).await.unwrap().len()
    }

    /// Locks every period of FY2026.
    pub async fn lock_fy2026(&self) {
        for period in &self.fy2026.periods {
            self.engine.lock_period(&self.ctx, period.id).await.unwrap();
        }
    }
}
