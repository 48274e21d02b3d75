//! Fiscal year and period repository.
//!
//! Period status moves OPEN → LOCKED → CLOSED, with an audited unlock back to
//! OPEN. Locking a period also locks the exchange rates dated inside it.

use chrono::NaiveDate;
use lyne_core::LedgerError;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_core::closing::ClosingStatus;
use lyne_core::currency::ExchangeRate;
use lyne_core::fiscal::{AccountingPeriod, FiscalYear, PeriodStatus, generate_monthly_periods};
use lyne_shared::types::{AccountingPeriodId, FiscalYearId, TenantId, UserId};
use tracing::{info, warn};

use crate::store::{Change, Database, RowLock, Staged, Tables};

/// Model label of fiscal years in audit events.
pub const FISCAL_YEAR_MODEL: &str = "finance.FiscalYear";
/// Model label of accounting periods in audit events.
pub const PERIOD_MODEL: &str = "finance.AccountingPeriod";

/// How the periods of a new fiscal year are laid out.
#[derive(Debug, Clone, Default)]
pub enum PeriodPlan {
    /// One period per calendar month, named `YYYY-MM`.
    #[default]
    Monthly,
    /// Caller-supplied `(name, start, end)` periods.
    Explicit(Vec<(String, NaiveDate, NaiveDate)>),
    /// No periods yet.
    Empty,
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Fiscal year name (e.g., "FY2026"), unique per tenant.
    pub name: String,
    /// First day.
    pub date_start: NaiveDate,
    /// Last day.
    pub date_end: NaiveDate,
    /// Period layout.
    pub periods: PeriodPlan,
}

impl CreateFiscalYearInput {
    /// A year with monthly periods.
    #[must_use]
    pub fn monthly(name: impl Into<String>, date_start: NaiveDate, date_end: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date_start,
            date_end,
            periods: PeriodPlan::Monthly,
        }
    }
}

/// Fiscal year with nested periods.
#[derive(Debug, Clone)]
pub struct FiscalYearWithPeriods {
    /// The fiscal year record.
    pub fiscal_year: FiscalYear,
    /// Its periods ordered by start date.
    pub periods: Vec<AccountingPeriod>,
}

impl FiscalYearWithPeriods {
    /// Period by name.
    #[must_use]
    pub fn period(&self, name: &str) -> Option<&AccountingPeriod> {
        self.periods.iter().find(|p| p.name == name)
    }
}

/// Fiscal year and period repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: Database,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a fiscal year and its periods. Every row is audited.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `DuplicateCode`, `OverlappingFiscalYear` or
    /// `PeriodOutsideYear`.
    pub async fn create_fiscal_year(
        &self,
        ctx: &RequestContext,
        input: CreateFiscalYearInput,
    ) -> Result<FiscalYearWithPeriods, LedgerError> {
        let created = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let year = FiscalYear::new(input.name.clone(), input.date_start, input.date_end)?;
                tables.calendar.check_new_year(&year)?;

                let periods = match &input.periods {
                    PeriodPlan::Monthly => generate_monthly_periods(&year),
                    PeriodPlan::Explicit(specs) => specs
                        .iter()
                        .map(|(name, start, end)| AccountingPeriod::new(&year, name.clone(), *start, *end))
                        .collect::<Result<Vec<_>, _>>()?,
                    PeriodPlan::Empty => Vec::new(),
                };

                let mut audit = vec![
                    AuditDraft::new(ctx, AuditAction::Create, FISCAL_YEAR_MODEL, year.id, &year.name)
                        .with_after(&year)?
                        .with_meta("periods", periods.len()),
                ];
                let mut changes = vec![Change::PutFiscalYear(year.clone())];
                for period in &periods {
                    audit.push(
                        AuditDraft::new(ctx, AuditAction::Create, PERIOD_MODEL, period.id, &period.name)
                            .with_after(period)?,
                    );
                    changes.push(Change::PutPeriod(period.clone()));
                }

                Ok(Staged::batch(
                    changes,
                    audit,
                    FiscalYearWithPeriods {
                        fiscal_year: year,
                        periods,
                    },
                ))
            })
            .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            fiscal_year_id = %created.fiscal_year.id,
            name = %created.fiscal_year.name,
            periods = created.periods.len(),
            "Fiscal year created"
        );
        Ok(created)
    }

    /// Adds a period to a fiscal year whose closing has not started.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound`, `AlreadyClosed` (year closed or closing
    /// generated), `InvalidDateRange` or `PeriodOutsideYear`.
    pub async fn add_period(
        &self,
        ctx: &RequestContext,
        year_id: FiscalYearId,
        name: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<AccountingPeriod, LedgerError> {
        let period = self
            .db
            .commit(ctx, vec![RowLock::FiscalYear(year_id)], |tables, _| {
                let year = tables.calendar.year(year_id)?;
                ensure_closing_not_started(tables, year)?;
                let period = AccountingPeriod::new(year, name, date_start, date_end)?;
                let draft = AuditDraft::new(ctx, AuditAction::Create, PERIOD_MODEL, period.id, &period.name)
                    .with_after(&period)?;
                Ok(Staged::new(vec![Change::PutPeriod(period.clone())], draft, period))
            })
            .await?;

        info!(tenant_id = %ctx.tenant_id, period_id = %period.id, name = %period.name, "Period added");
        Ok(period)
    }

    /// OPEN → LOCKED. Also locks every exchange rate dated inside the period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `InvalidPeriodTransition`.
    pub async fn lock_period(&self, ctx: &RequestContext, period_id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        let locks = self.period_locks(ctx.tenant_id, period_id)?;
        let (period, locked_rates) = self
            .db
            .commit(ctx, locks, |tables, _| {
                let period = tables.calendar.period(period_id)?;
                let locked = period.transitioned(PeriodStatus::Locked)?;

                let rates: Vec<ExchangeRate> = tables
                    .rates
                    .rates_between(period.date_start, period.date_end)
                    .into_iter()
                    .filter(|r| !r.is_locked)
                    .map(|r| ExchangeRate {
                        is_locked: true,
                        ..r.clone()
                    })
                    .collect();
                let rate_labels: Vec<String> = rates.iter().map(ExchangeRate::label).collect();

                let draft = AuditDraft::new(ctx, AuditAction::Lock, PERIOD_MODEL, period.id, &period.name)
                    .with_before(period)?
                    .with_after(&locked)?
                    .with_meta("locked_rates", rate_labels);

                let count = rates.len();
                let mut changes = vec![Change::PutPeriod(locked.clone())];
                changes.extend(rates.into_iter().map(Change::PutRate));
                Ok(Staged::new(changes, draft, (locked, count)))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %period_id, error = %e, "Period lock rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            period_id = %period.id,
            name = %period.name,
            locked_rates,
            "Period locked"
        );
        Ok(period)
    }

    /// LOCKED → OPEN. `authorized_by` is the user who approved the unlock;
    /// the approval itself is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidPeriodTransition`, or `AlreadyClosed`
    /// when the year is closed or its closing has been generated.
    pub async fn unlock_period(
        &self,
        ctx: &RequestContext,
        period_id: AccountingPeriodId,
        authorized_by: UserId,
    ) -> Result<AccountingPeriod, LedgerError> {
        let locks = self.period_locks(ctx.tenant_id, period_id)?;
        let period = self
            .db
            .commit(ctx, locks, |tables, _| {
                let period = tables.calendar.period(period_id)?;
                ensure_closing_not_started(tables, tables.calendar.year(period.fiscal_year_id)?)?;
                let unlocked = period.transitioned(PeriodStatus::Open)?;

                let draft = AuditDraft::new(ctx, AuditAction::Unlock, PERIOD_MODEL, period.id, &period.name)
                    .with_before(period)?
                    .with_after(&unlocked)?
                    .with_meta("authorized_by", authorized_by.to_string());
                Ok(Staged::new(vec![Change::PutPeriod(unlocked.clone())], draft, unlocked))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %period_id, error = %e, "Period unlock rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            period_id = %period.id,
            authorized_by = %authorized_by,
            "Period unlocked"
        );
        Ok(period)
    }

    /// LOCKED → CLOSED. The period must hold no drafts. The last period of a
    /// year receives the closing entry, so only the fiscal closing closes it.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidPeriodTransition`, `DraftEntriesRemain`
    /// or `LastPeriodReserved`.
    pub async fn close_period(&self, ctx: &RequestContext, period_id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        let locks = self.period_locks(ctx.tenant_id, period_id)?;
        let period = self
            .db
            .commit(ctx, locks, |tables, _| {
                let period = tables.calendar.period(period_id)?;
                let closed = period.transitioned(PeriodStatus::Closed)?;
                let is_last = tables
                    .calendar
                    .last_period(period.fiscal_year_id)
                    .is_some_and(|last| last.id == period.id);
                if is_last {
                    return Err(LedgerError::LastPeriodReserved {
                        period_id: period.id,
                        fiscal_year_id: period.fiscal_year_id,
                    });
                }
                let drafts = tables.book.draft_count(&[period.id]);
                if drafts > 0 {
                    return Err(LedgerError::DraftEntriesRemain {
                        fiscal_year_id: period.fiscal_year_id,
                        count: drafts,
                    });
                }

                let draft = AuditDraft::new(ctx, AuditAction::Close, PERIOD_MODEL, period.id, &period.name)
                    .with_before(period)?
                    .with_after(&closed)?;
                Ok(Staged::new(vec![Change::PutPeriod(closed.clone())], draft, closed))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %period_id, error = %e, "Period close rejected"))?;

        info!(tenant_id = %ctx.tenant_id, period_id = %period.id, name = %period.name, "Period closed");
        Ok(period)
    }

    /// A fiscal year with its periods.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound`.
    pub async fn get_fiscal_year(&self, tenant_id: TenantId, year_id: FiscalYearId) -> Result<FiscalYearWithPeriods, LedgerError> {
        self.db.read(tenant_id, |tables| {
            Ok(FiscalYearWithPeriods {
                fiscal_year: tables.calendar.year(year_id)?.clone(),
                periods: tables.calendar.periods_of(year_id).into_iter().cloned().collect(),
            })
        })
    }

    /// All fiscal years ordered by start date.
    pub async fn list_fiscal_years(&self, tenant_id: TenantId) -> Result<Vec<FiscalYear>, LedgerError> {
        self.db
            .read(tenant_id, |tables| Ok(tables.calendar.years().into_iter().cloned().collect()))
    }

    /// A period by id.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`.
    pub async fn get_period(&self, tenant_id: TenantId, period_id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        self.db.read(tenant_id, |tables| tables.calendar.period(period_id).cloned())
    }

    fn period_locks(&self, tenant_id: TenantId, period_id: AccountingPeriodId) -> Result<Vec<RowLock>, LedgerError> {
        let year_id = self
            .db
            .read(tenant_id, |tables| Ok(tables.calendar.period(period_id)?.fiscal_year_id))?;
        Ok(vec![RowLock::FiscalYear(year_id), RowLock::Period(period_id)])
    }
}

/// Fails once the year is closed or its closing has been generated: the
/// closing entry was computed from the periods as they stood.
fn ensure_closing_not_started(tables: &Tables, year: &FiscalYear) -> Result<(), LedgerError> {
    let closing_started = tables
        .closing_of_year(year.id)
        .is_some_and(|c| c.status != ClosingStatus::Draft);
    if year.is_closed || closing_started {
        return Err(LedgerError::AlreadyClosed(year.id));
    }
    Ok(())
}
