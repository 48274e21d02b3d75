//! Exchange rate repository.
//!
//! Rates are exact-date: a lookup never falls back to an older rate.

use chrono::NaiveDate;
use lyne_core::LedgerError;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_core::currency::ExchangeRate;
use lyne_shared::types::{Currency, TenantId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::store::{Change, Database, Staged};

/// Model label of exchange rates in audit events.
pub const EXCHANGE_RATE_MODEL: &str = "finance.ExchangeRate";

/// Input for creating an exchange rate. Convention: `1 quote = rate × base`.
#[derive(Debug, Clone)]
pub struct CreateExchangeRateInput {
    /// Effective date.
    pub date: NaiveDate,
    /// Base (ledger) currency.
    pub base: Currency,
    /// Quoted currency.
    pub quote: Currency,
    /// Rate, strictly positive.
    pub rate: Decimal,
    /// Where the rate comes from (e.g., "BCEAO", "manual").
    pub source: String,
}

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: Database,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExchangeRate`, `SameCurrencyExchange` or `DuplicateCode`.
    pub async fn create_rate(
        &self,
        ctx: &RequestContext,
        input: CreateExchangeRateInput,
    ) -> Result<ExchangeRate, LedgerError> {
        let rate = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let rate = ExchangeRate::new(input.date, input.base, input.quote, input.rate, input.source.clone())?;
                tables.rates.check_new(&rate)?;
                let draft = AuditDraft::new(ctx, AuditAction::Create, EXCHANGE_RATE_MODEL, rate.id, rate.label())
                    .with_after(&rate)?;
                Ok(Staged::new(vec![Change::PutRate(rate.clone())], draft, rate))
            })
            .await?;

        info!(tenant_id = %ctx.tenant_id, rate = %rate.label(), value = %rate.rate, "Exchange rate created");
        Ok(rate)
    }

    /// Changes the value of an unlocked rate.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate`, `RateLocked` or `InvalidExchangeRate`.
    pub async fn update_rate(
        &self,
        ctx: &RequestContext,
        date: NaiveDate,
        base: Currency,
        quote: Currency,
        rate: Decimal,
    ) -> Result<ExchangeRate, LedgerError> {
        let updated = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let existing = tables.rates.require(date, base, quote)?;
                let updated = tables.rates.updated(date, base, quote, rate)?;
                let draft = AuditDraft::new(ctx, AuditAction::Update, EXCHANGE_RATE_MODEL, existing.id, existing.label())
                    .with_before(existing)?
                    .with_after(&updated)?;
                Ok(Staged::new(vec![Change::PutRate(updated.clone())], draft, updated))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %date, %base, %quote, error = %e, "Exchange rate update rejected"))?;

        info!(tenant_id = %ctx.tenant_id, rate = %updated.label(), value = %updated.rate, "Exchange rate updated");
        Ok(updated)
    }

    /// Makes a rate immutable. Locking a locked rate is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate`.
    pub async fn lock_rate(
        &self,
        ctx: &RequestContext,
        date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> Result<ExchangeRate, LedgerError> {
        let locked = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let existing = tables.rates.require(date, base, quote)?;
                if existing.is_locked {
                    return Ok(Staged::unchanged(existing.clone()));
                }
                let locked = ExchangeRate {
                    is_locked: true,
                    ..existing.clone()
                };
                let draft = AuditDraft::new(ctx, AuditAction::Lock, EXCHANGE_RATE_MODEL, existing.id, existing.label())
                    .with_before(existing)?
                    .with_after(&locked)?;
                Ok(Staged::new(vec![Change::PutRate(locked.clone())], draft, locked))
            })
            .await?;

        info!(tenant_id = %ctx.tenant_id, rate = %locked.label(), "Exchange rate locked");
        Ok(locked)
    }

    /// Rate for the exact date.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate` when no rate exists for that date.
    pub async fn rate(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> Result<Decimal, LedgerError> {
        self.db.read(tenant_id, |tables| tables.rates.rate(date, base, quote))
    }

    /// Full rate row for the exact date.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate`.
    pub async fn get_rate(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> Result<ExchangeRate, LedgerError> {
        self.db
            .read(tenant_id, |tables| tables.rates.require(date, base, quote).cloned())
    }

    /// Rates dated within `[start, end]`.
    pub async fn list_rates(
        &self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExchangeRate>, LedgerError> {
        self.db.read(tenant_id, |tables| {
            Ok(tables.rates.rates_between(start, end).into_iter().cloned().collect())
        })
    }
}
