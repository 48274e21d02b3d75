//! Per-tenant fiscal calendar: fiscal years and their ordered periods.

use std::collections::HashMap;

use chrono::NaiveDate;
use lyne_shared::types::{AccountingPeriodId, FiscalYearId};

use super::period::{AccountingPeriod, FiscalYear, PeriodStatus};
use crate::ledger::LedgerError;

/// Fiscal years and accounting periods of one tenant.
#[derive(Debug, Clone, Default)]
pub struct FiscalCalendar {
    years: HashMap<FiscalYearId, FiscalYear>,
    periods: HashMap<AccountingPeriodId, AccountingPeriod>,
}

impl FiscalCalendar {
    /// Creates an empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound` if it does not exist.
    pub fn year(&self, id: FiscalYearId) -> Result<&FiscalYear, LedgerError> {
        self.years.get(&id).ok_or(LedgerError::FiscalYearNotFound(id))
    }

    /// Looks up a period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if it does not exist.
    pub fn period(&self, id: AccountingPeriodId) -> Result<&AccountingPeriod, LedgerError> {
        self.periods.get(&id).ok_or(LedgerError::PeriodNotFound(id))
    }

    /// Looks up a fiscal year by name.
    #[must_use]
    pub fn year_by_name(&self, name: &str) -> Option<&FiscalYear> {
        self.years.values().find(|y| y.name == name)
    }

    /// All fiscal years ordered by start date.
    #[must_use]
    pub fn years(&self) -> Vec<&FiscalYear> {
        let mut years: Vec<_> = self.years.values().collect();
        years.sort_by_key(|y| y.date_start);
        years
    }

    /// Periods of a fiscal year ordered by start date.
    #[must_use]
    pub fn periods_of(&self, year_id: FiscalYearId) -> Vec<&AccountingPeriod> {
        let mut periods: Vec<_> = self
            .periods
            .values()
            .filter(|p| p.fiscal_year_id == year_id)
            .collect();
        periods.sort_by_key(|p| p.date_start);
        periods
    }

    /// Fiscal year owning a period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `FiscalYearNotFound`.
    pub fn year_of(&self, period_id: AccountingPeriodId) -> Result<&FiscalYear, LedgerError> {
        let period = self.period(period_id)?;
        self.year(period.fiscal_year_id)
    }

    /// The year starting after `year_id` ends, nearest first.
    #[must_use]
    pub fn next_year(&self, year_id: FiscalYearId) -> Option<&FiscalYear> {
        let current = self.years.get(&year_id)?;
        self.years
            .values()
            .filter(|y| y.date_start > current.date_end)
            .min_by_key(|y| y.date_start)
    }

    /// First period of a year.
    #[must_use]
    pub fn first_period(&self, year_id: FiscalYearId) -> Option<&AccountingPeriod> {
        self.periods_of(year_id).into_iter().next()
    }

    /// Last period of a year.
    #[must_use]
    pub fn last_period(&self, year_id: FiscalYearId) -> Option<&AccountingPeriod> {
        self.periods_of(year_id).into_iter().last()
    }

    /// The open period containing `date`, if any.
    #[must_use]
    pub fn open_period_containing(&self, date: NaiveDate) -> Option<&AccountingPeriod> {
        self.periods
            .values()
            .filter(|p| p.status == PeriodStatus::Open && p.contains(date))
            .min_by_key(|p| p.date_start)
    }

    /// The earliest open period starting after `date`.
    #[must_use]
    pub fn first_open_period_after(&self, date: NaiveDate) -> Option<&AccountingPeriod> {
        self.periods
            .values()
            .filter(|p| p.status == PeriodStatus::Open && p.date_start > date)
            .min_by_key(|p| p.date_start)
    }

    /// Checks a new fiscal year against the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` for a reused name and `OverlappingFiscalYear` when
    /// the date range intersects an existing year.
    pub fn check_new_year(&self, year: &FiscalYear) -> Result<(), LedgerError> {
        if self.year_by_name(&year.name).is_some() {
            return Err(LedgerError::DuplicateCode {
                kind: "fiscal year",
                code: year.name.clone(),
            });
        }
        if let Some(existing) = self.years.values().find(|y| y.overlaps(year)) {
            return Err(LedgerError::OverlappingFiscalYear(existing.name.clone()));
        }
        Ok(())
    }

    /// Inserts or replaces a fiscal year.
    pub fn put_year(&mut self, year: FiscalYear) {
        self.years.insert(year.id, year);
    }

    /// Inserts or replaces a period.
    pub fn put_period(&mut self, period: AccountingPeriod) {
        self.periods.insert(period.id, period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::generate_monthly_periods;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar_with(years: &[(&str, i32)]) -> (FiscalCalendar, Vec<FiscalYearId>) {
        let mut calendar = FiscalCalendar::new();
        let mut ids = Vec::new();
        for (name, y) in years {
            let year = FiscalYear::new(*name, date(*y, 1, 1), date(*y, 12, 31)).unwrap();
            for period in generate_monthly_periods(&year) {
                calendar.put_period(period);
            }
            ids.push(year.id);
            calendar.put_year(year);
        }
        (calendar, ids)
    }

    #[test]
    fn test_periods_are_ordered() {
        let (calendar, ids) = calendar_with(&[("FY2026", 2026)]);
        let names: Vec<_> = calendar.periods_of(ids[0]).iter().map(|p| p.name.clone()).collect();
        assert_eq!(names.first().map(String::as_str), Some("2026-01"));
        assert_eq!(names.last().map(String::as_str), Some("2026-12"));
        assert_eq!(calendar.first_period(ids[0]).unwrap().name, "2026-01");
        assert_eq!(calendar.last_period(ids[0]).unwrap().name, "2026-12");
    }

    #[test]
    fn test_next_year() {
        let (calendar, ids) = calendar_with(&[("FY2027", 2027), ("FY2026", 2026), ("FY2029", 2029)]);
        assert_eq!(calendar.next_year(ids[1]).unwrap().name, "FY2027");
        assert_eq!(calendar.next_year(ids[0]).unwrap().name, "FY2029");
        assert!(calendar.next_year(ids[2]).is_none());
    }

    #[test]
    fn test_open_period_lookup_skips_locked() {
        let (mut calendar, ids) = calendar_with(&[("FY2026", 2026)]);
        let march = calendar
            .periods_of(ids[0])
            .into_iter()
            .find(|p| p.name == "2026-03")
            .cloned()
            .unwrap();
        calendar.put_period(AccountingPeriod {
            status: PeriodStatus::Locked,
            ..march
        });

        assert!(calendar.open_period_containing(date(2026, 3, 15)).is_none());
        assert_eq!(
            calendar.open_period_containing(date(2026, 4, 15)).unwrap().name,
            "2026-04"
        );
        assert_eq!(
            calendar.first_open_period_after(date(2026, 2, 28)).unwrap().name,
            "2026-04"
        );
    }

    #[test]
    fn test_check_new_year() {
        let (calendar, _) = calendar_with(&[("FY2026", 2026)]);

        let dup = FiscalYear::new("FY2026", date(2030, 1, 1), date(2030, 12, 31)).unwrap();
        assert!(matches!(
            calendar.check_new_year(&dup),
            Err(LedgerError::DuplicateCode { .. })
        ));

        let overlapping = FiscalYear::new("mid", date(2026, 6, 1), date(2027, 5, 31)).unwrap();
        assert!(matches!(
            calendar.check_new_year(&overlapping),
            Err(LedgerError::OverlappingFiscalYear(name)) if name == "FY2026"
        ));

        let next = FiscalYear::new("FY2027", date(2027, 1, 1), date(2027, 12, 31)).unwrap();
        assert!(calendar.check_new_year(&next).is_ok());
    }
}
