//! Fiscal year and accounting period types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use lyne_shared::types::{AccountingPeriodId, FiscalYearId};

use crate::ledger::LedgerError;

/// Mutability state of an accounting period.
///
/// Forward transitions are `OPEN → LOCKED → CLOSED`. The only backward move is
/// the audited unlock `LOCKED → OPEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodStatus {
    /// New drafts and postings allowed.
    Open,
    /// No new drafts; existing drafts may still be posted or cancelled.
    Locked,
    /// Fully immutable.
    Closed,
}

impl PeriodStatus {
    /// Returns true if new draft entries may be created.
    #[must_use]
    pub fn accepts_drafts(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if already-drafted entries may be posted or cancelled.
    #[must_use]
    pub fn accepts_postings(self) -> bool {
        matches!(self, Self::Open | Self::Locked)
    }

    /// Returns true if `self → to` is a permitted transition.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::Locked) | (Self::Locked, Self::Closed) | (Self::Locked, Self::Open)
        )
    }

    /// Upper-case label used in messages and audit payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Locked => "LOCKED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fiscal year definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier.
    pub id: FiscalYearId,
    /// Year name (e.g., "FY2026"), unique per tenant.
    pub name: String,
    /// First day of the year.
    pub date_start: NaiveDate,
    /// Last day of the year.
    pub date_end: NaiveDate,
    /// Set once the closing has been posted.
    pub is_closed: bool,
}

impl FiscalYear {
    /// Creates an open fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `date_end < date_start`.
    pub fn new(
        name: impl Into<String>,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Self, LedgerError> {
        validate_date_range(date_start, date_end)?;
        Ok(Self {
            id: FiscalYearId::new(),
            name: name.into(),
            date_start,
            date_end,
            is_closed: false,
        })
    }

    /// Returns true if `date` falls within the year.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.date_start && date <= self.date_end
    }

    /// Returns true if the two years share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.date_start <= other.date_end && other.date_start <= self.date_end
    }
}

/// An accounting period within a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: AccountingPeriodId,
    /// Owning fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// Period name (e.g., "2026-01"); used in entry references.
    pub name: String,
    /// First day of the period.
    pub date_start: NaiveDate,
    /// Last day of the period.
    pub date_end: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
}

impl AccountingPeriod {
    /// Creates an open period for `year`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` for an inverted range and `PeriodOutsideYear`
    /// when the period does not lie within the year.
    pub fn new(
        year: &FiscalYear,
        name: impl Into<String>,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Self, LedgerError> {
        validate_date_range(date_start, date_end)?;
        let name = name.into();
        if !year.contains(date_start) || !year.contains(date_end) {
            return Err(LedgerError::PeriodOutsideYear {
                name,
                start: date_start,
                end: date_end,
            });
        }
        Ok(Self {
            id: AccountingPeriodId::new(),
            fiscal_year_id: year.id,
            name,
            date_start,
            date_end,
            status: PeriodStatus::Open,
        })
    }

    /// Returns true if `date` falls within the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.date_start && date <= self.date_end
    }

    /// Clamps `date` into the period's range.
    #[must_use]
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.date_start, self.date_end)
    }

    /// Returns the period moved to status `to`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodTransition` when the move is not permitted.
    pub fn transitioned(&self, to: PeriodStatus) -> Result<Self, LedgerError> {
        if !self.status.can_transition_to(to) {
            return Err(LedgerError::InvalidPeriodTransition {
                period_id: self.id,
                from: self.status,
                to,
            });
        }
        Ok(Self {
            status: to,
            ..self.clone()
        })
    }
}

/// Validates that `end >= start`.
///
/// # Errors
///
/// Returns `InvalidDateRange` otherwise.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), LedgerError> {
    if end < start {
        return Err(LedgerError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Splits a fiscal year into calendar-month periods named `YYYY-MM`.
///
/// The first and last periods are truncated to the year's bounds.
#[must_use]
pub fn generate_monthly_periods(year: &FiscalYear) -> Vec<AccountingPeriod> {
    let mut periods = Vec::new();
    let mut current = year.date_start;

    while current <= year.date_end {
        let period_end = last_day_of_month(current).min(year.date_end);

        periods.push(AccountingPeriod {
            id: AccountingPeriodId::new(),
            fiscal_year_id: year.id,
            name: format!("{:04}-{:02}", current.year(), current.month()),
            date_start: current,
            date_end: period_end,
            status: PeriodStatus::Open,
        });

        match period_end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    periods
}

/// Returns the last day of the month containing `date`.
fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };

    first_of_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
