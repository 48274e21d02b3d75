//! Repositories over the tenant store.
//!
//! Every mutating method runs as one [`crate::store::Database::commit`]: the
//! row change and its audit event land together or not at all.

pub mod account;
pub mod audit;
pub mod closing;
pub mod entry;
pub mod exchange_rate;
pub mod fiscal;
pub mod journal;
pub mod seed;

pub use account::{ACCOUNT_MODEL, AccountRepository};
pub use audit::{AUDIT_EVENT_MODEL, AuditRepository};
pub use closing::ClosingRepository;
pub use entry::EntryRepository;
pub use exchange_rate::{CreateExchangeRateInput, EXCHANGE_RATE_MODEL, ExchangeRateRepository};
pub use fiscal::{
    CreateFiscalYearInput, FISCAL_YEAR_MODEL, FiscalRepository, FiscalYearWithPeriods, PERIOD_MODEL, PeriodPlan,
};
pub use journal::{JOURNAL_MODEL, JournalRepository};
pub use seed::{SeedReport, SeedRepository};
