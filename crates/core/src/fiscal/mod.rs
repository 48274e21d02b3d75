//! Fiscal year and period management.

pub mod calendar;
pub mod period;

pub use calendar::FiscalCalendar;
pub use period::{
    AccountingPeriod, FiscalYear, PeriodStatus, generate_monthly_periods, validate_date_range,
};
