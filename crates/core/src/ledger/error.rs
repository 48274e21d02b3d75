//! Ledger error types for validation, state, lookup and integrity failures.
//!
//! Every variant carries enough structured detail (entry id, period id, computed
//! totals, codes) for the caller to render a precise message.

use chrono::NaiveDate;
use lyne_shared::AppError;
use lyne_shared::types::{
    AccountId, AccountingPeriodId, AuditEventId, Currency, FiscalClosingId, FiscalYearId,
    JournalEntryId, JournalId,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::fiscal::PeriodStatus;
use crate::ledger::types::EntryStatus;

/// Broad classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input rejected locally; nothing was applied.
    Validation,
    /// Operation not allowed in the current state.
    State,
    /// Referenced row does not exist.
    NotFound,
    /// Audit chain integrity violated. Fatal to the tenant's audit subsystem.
    Integrity,
    /// Lock could not be acquired in time or a uniqueness conflict occurred.
    Concurrency,
    /// Unexpected internal failure.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal entry has no lines.
    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    /// Journal entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// The entry, when it already exists.
        entry_id: Option<JournalEntryId>,
        /// Total debit amount in base currency.
        debit: Decimal,
        /// Total credit amount in base currency.
        credit: Decimal,
    },

    /// Line has a negative amount or both a debit and a credit.
    #[error("Line {line} must have either a debit or a credit, never both or negative (debit: {debit}, credit: {credit})")]
    InvalidLineSign {
        /// Zero-based index of the offending line.
        line: usize,
        /// Debit amount given.
        debit: Decimal,
        /// Credit amount given.
        credit: Decimal,
    },

    /// Entry date does not fall within the entry's period.
    #[error("Entry date {date} is outside period {period_id} ({start} to {end})")]
    EntryDateOutsidePeriod {
        /// The entry date.
        date: NaiveDate,
        /// The target period.
        period_id: AccountingPeriodId,
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// End date is before start date.
    #[error("Invalid date range: {start} to {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Code (or name) already used within the tenant.
    #[error("Duplicate {kind} code: {code}")]
    DuplicateCode {
        /// What kind of row ("account", "journal", "fiscal year", ...).
        kind: &'static str,
        /// The duplicated code.
        code: String,
    },

    /// Fiscal year overlaps an existing one.
    #[error("Fiscal year overlaps with existing year: {0}")]
    OverlappingFiscalYear(String),

    /// Period does not lie within its fiscal year.
    #[error("Period {name} ({start} to {end}) lies outside its fiscal year")]
    PeriodOutsideYear {
        /// Period name.
        name: String,
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive, got {0}")]
    InvalidExchangeRate(Decimal),

    /// Base and quote currencies must differ.
    #[error("Base and quote currencies must be different ({0})")]
    SameCurrencyExchange(Currency),

    /// Account hierarchy contains a cycle.
    #[error("Account hierarchy contains a cycle at account {0}")]
    AccountCycle(AccountId),

    /// Supplied reference uses the journal's generated numbering.
    #[error("Reference {reference} follows the automatic numbering of journal {journal}")]
    ReservedReference {
        /// The reference.
        reference: String,
        /// Journal code.
        journal: String,
    },

    /// Designated result account is not an equity account.
    #[error("Result account {0} must be an equity account")]
    InvalidResultAccount(String),

    // ========== State Errors ==========
    /// Period does not accept the requested operation in its current status.
    #[error("Period {period_id} is {status}, operation requires an open period")]
    PeriodNotOpen {
        /// The period.
        period_id: AccountingPeriodId,
        /// Its current status.
        status: PeriodStatus,
    },

    /// Period status transition not allowed.
    #[error("Invalid period transition for {period_id} from {from} to {to}")]
    InvalidPeriodTransition {
        /// The period.
        period_id: AccountingPeriodId,
        /// Current status.
        from: PeriodStatus,
        /// Requested status.
        to: PeriodStatus,
    },

    /// Operation requires a draft entry.
    #[error("Journal entry {entry_id} is {status}, only draft entries can be changed")]
    EntryNotDraft {
        /// The entry.
        entry_id: JournalEntryId,
        /// Its current status.
        status: EntryStatus,
    },

    /// Operation requires a posted entry.
    #[error("Journal entry {entry_id} is {status}, only posted entries can be reversed")]
    EntryNotPosted {
        /// The entry.
        entry_id: JournalEntryId,
        /// Its current status.
        status: EntryStatus,
    },

    /// Entry was generated by a fiscal closing and only changes through it.
    #[error("Journal entry {entry_id} belongs to fiscal closing {closing_id}")]
    EntryManagedByClosing {
        /// The entry.
        entry_id: JournalEntryId,
        /// The owning closing.
        closing_id: String,
    },

    /// The last period of a year is closed by the fiscal closing only.
    #[error("Period {period_id} is the last period of fiscal year {fiscal_year_id}; the fiscal closing closes it")]
    LastPeriodReserved {
        /// The period.
        period_id: AccountingPeriodId,
        /// Its fiscal year.
        fiscal_year_id: FiscalYearId,
    },

    /// Fiscal year already closed or closing already generated.
    #[error("Fiscal year {0} is already closed or its closing was already generated")]
    AlreadyClosed(FiscalYearId),

    /// Some periods of the fiscal year are still open.
    #[error("Fiscal year {fiscal_year_id} still has {} open period(s)", open_periods.len())]
    OpenPeriodsRemain {
        /// The fiscal year.
        fiscal_year_id: FiscalYearId,
        /// The periods still open.
        open_periods: Vec<AccountingPeriodId>,
    },

    /// Draft entries remain in the fiscal year.
    #[error("Fiscal year {fiscal_year_id} still has {count} draft entries")]
    DraftEntriesRemain {
        /// The fiscal year.
        fiscal_year_id: FiscalYearId,
        /// Number of draft entries.
        count: usize,
    },

    /// Fiscal year has no accounting period.
    #[error("Fiscal year {0} has no accounting period")]
    NoPeriods(FiscalYearId),

    /// The following fiscal year (or its first period) does not exist yet.
    #[error("No fiscal year follows {0}; create it before posting the closing")]
    NextYearMissing(FiscalYearId),

    /// Closing has not been generated yet.
    #[error("Fiscal closing {0} has not been generated")]
    ClosingNotGenerated(FiscalClosingId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Account does not accept manual postings.
    #[error("Account {0} does not allow manual posting")]
    AccountManualPostingDisabled(String),

    /// Account is referenced by journal lines.
    #[error("Account {code} ({account_id}) is referenced by journal lines")]
    AccountInUse {
        /// The account.
        account_id: AccountId,
        /// Its code.
        code: String,
    },

    /// Journal is inactive.
    #[error("Journal {0} is inactive")]
    JournalInactive(String),

    /// Journal owns entries and cannot be deleted.
    #[error("Journal {code} ({journal_id}) owns entries and cannot be deleted")]
    JournalInUse {
        /// The journal.
        journal_id: JournalId,
        /// Its code.
        code: String,
    },

    /// Exchange rate is locked.
    #[error("Exchange rate {base}/{quote} on {date} is locked")]
    RateLocked {
        /// Base currency.
        base: Currency,
        /// Quote currency.
        quote: Currency,
        /// Rate date.
        date: NaiveDate,
    },

    // ========== Not Found Errors ==========
    /// Account not found (by code or id).
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Journal not found (by code or id).
    #[error("Journal not found: {0}")]
    JournalNotFound(String),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Accounting period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(AccountingPeriodId),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(FiscalYearId),

    /// Fiscal closing not found.
    #[error("Fiscal closing not found: {0}")]
    ClosingNotFound(FiscalClosingId),

    /// No exchange rate found for the currency pair on the exact date.
    #[error("No exchange rate found for {base}/{quote} on {date}")]
    NoExchangeRate {
        /// Base currency.
        base: Currency,
        /// Quote currency.
        quote: Currency,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    // ========== Integrity Errors ==========
    /// Audit chain verification failed at this event.
    #[error("Audit chain tampered at event {event_id} (position {position})")]
    ChainTampered {
        /// First divergent event.
        event_id: AuditEventId,
        /// Its position in the chain (zero-based).
        position: usize,
    },

    /// Audit chain halted after tampering was detected; writes are refused.
    #[error("Audit chain halted since tampering at event {0}; manual resolution required")]
    ChainHalted(AuditEventId),

    // ========== Concurrency Errors ==========
    /// Lock could not be acquired within the configured timeout.
    #[error("Timed out waiting for lock on {0}")]
    LockTimeout(String),

    /// Reference already used in the journal.
    #[error("Reference {reference} already used by entry {existing_entry_id}")]
    DuplicateReference {
        /// The reference.
        reference: String,
        /// Entry already holding it.
        existing_entry_id: JournalEntryId,
    },

    // ========== Internal Errors ==========
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidLineSign { .. } => "INVALID_LINE_SIGN",
            Self::EntryDateOutsidePeriod { .. } => "ENTRY_DATE_OUTSIDE_PERIOD",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::DuplicateCode { .. } => "DUPLICATE_CODE",
            Self::OverlappingFiscalYear(_) => "OVERLAPPING_FISCAL_YEAR",
            Self::PeriodOutsideYear { .. } => "PERIOD_OUTSIDE_YEAR",
            Self::InvalidExchangeRate(_) => "INVALID_EXCHANGE_RATE",
            Self::SameCurrencyExchange(_) => "SAME_CURRENCY_EXCHANGE",
            Self::AccountCycle(_) => "ACCOUNT_CYCLE",
            Self::ReservedReference { .. } => "RESERVED_REFERENCE",
            Self::InvalidResultAccount(_) => "INVALID_RESULT_ACCOUNT",
            Self::PeriodNotOpen { .. } => "PERIOD_NOT_OPEN",
            Self::InvalidPeriodTransition { .. } => "INVALID_PERIOD_TRANSITION",
            Self::EntryNotDraft { .. } => "ENTRY_NOT_DRAFT",
            Self::EntryNotPosted { .. } => "ENTRY_NOT_POSTED",
            Self::EntryManagedByClosing { .. } => "ENTRY_MANAGED_BY_CLOSING",
            Self::LastPeriodReserved { .. } => "LAST_PERIOD_RESERVED",
            Self::AlreadyClosed(_) => "ALREADY_CLOSED",
            Self::OpenPeriodsRemain { .. } => "OPEN_PERIODS_REMAIN",
            Self::DraftEntriesRemain { .. } => "DRAFT_ENTRIES_REMAIN",
            Self::NoPeriods(_) => "NO_PERIODS",
            Self::NextYearMissing(_) => "NEXT_YEAR_MISSING",
            Self::ClosingNotGenerated(_) => "CLOSING_NOT_GENERATED",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountManualPostingDisabled(_) => "ACCOUNT_MANUAL_POSTING_DISABLED",
            Self::AccountInUse { .. } => "ACCOUNT_IN_USE",
            Self::JournalInactive(_) => "JOURNAL_INACTIVE",
            Self::JournalInUse { .. } => "JOURNAL_IN_USE",
            Self::RateLocked { .. } => "RATE_LOCKED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::FiscalYearNotFound(_) => "FISCAL_YEAR_NOT_FOUND",
            Self::ClosingNotFound(_) => "CLOSING_NOT_FOUND",
            Self::NoExchangeRate { .. } => "NO_EXCHANGE_RATE",
            Self::ChainTampered { .. } => "CHAIN_TAMPERED",
            Self::ChainHalted(_) => "CHAIN_HALTED",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyEntry
            | Self::UnbalancedEntry { .. }
            | Self::InvalidLineSign { .. }
            | Self::EntryDateOutsidePeriod { .. }
            | Self::InvalidDateRange { .. }
            | Self::DuplicateCode { .. }
            | Self::OverlappingFiscalYear(_)
            | Self::PeriodOutsideYear { .. }
            | Self::InvalidExchangeRate(_)
            | Self::SameCurrencyExchange(_)
            | Self::AccountCycle(_)
            | Self::ReservedReference { .. }
            | Self::InvalidResultAccount(_) => ErrorCategory::Validation,

            Self::PeriodNotOpen { .. }
            | Self::InvalidPeriodTransition { .. }
            | Self::EntryNotDraft { .. }
            | Self::EntryNotPosted { .. }
            | Self::EntryManagedByClosing { .. }
            | Self::LastPeriodReserved { .. }
            | Self::AlreadyClosed(_)
            | Self::OpenPeriodsRemain { .. }
            | Self::DraftEntriesRemain { .. }
            | Self::NoPeriods(_)
            | Self::NextYearMissing(_)
            | Self::ClosingNotGenerated(_)
            | Self::AccountInactive(_)
            | Self::AccountManualPostingDisabled(_)
            | Self::AccountInUse { .. }
            | Self::JournalInactive(_)
            | Self::JournalInUse { .. }
            | Self::RateLocked { .. } => ErrorCategory::State,

            Self::AccountNotFound(_)
            | Self::JournalNotFound(_)
            | Self::EntryNotFound(_)
            | Self::PeriodNotFound(_)
            | Self::FiscalYearNotFound(_)
            | Self::ClosingNotFound(_)
            | Self::NoExchangeRate { .. } => ErrorCategory::NotFound,

            Self::ChainTampered { .. } | Self::ChainHalted(_) => ErrorCategory::Integrity,

            Self::LockTimeout(_) | Self::DuplicateReference { .. } => ErrorCategory::Concurrency,

            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Concurrency => 409,
            ErrorCategory::State => 422,
            ErrorCategory::Integrity | ErrorCategory::Internal => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => Self::Validation(message),
            ErrorCategory::State => Self::State(message),
            ErrorCategory::NotFound => Self::NotFound(message),
            ErrorCategory::Integrity => Self::Integrity(message),
            ErrorCategory::Concurrency => Self::Conflict(message),
            ErrorCategory::Internal => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::EmptyEntry, "EMPTY_ENTRY", ErrorCategory::Validation)]
    #[case(
        LedgerError::PeriodNotOpen { period_id: AccountingPeriodId::new(), status: PeriodStatus::Locked },
        "PERIOD_NOT_OPEN",
        ErrorCategory::State
    )]
    #[case(
        LedgerError::NoExchangeRate {
            base: Currency::Xof,
            quote: Currency::Usd,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        },
        "NO_EXCHANGE_RATE",
        ErrorCategory::NotFound
    )]
    #[case(
        LedgerError::ChainTampered { event_id: AuditEventId::new(), position: 3 },
        "CHAIN_TAMPERED",
        ErrorCategory::Integrity
    )]
    #[case(LedgerError::LockTimeout("journal".into()), "LOCK_TIMEOUT", ErrorCategory::Concurrency)]
    #[case(
        LedgerError::ReservedReference { reference: "VT-2026-01-000002".into(), journal: "VT".into() },
        "RESERVED_REFERENCE",
        ErrorCategory::Validation
    )]
    #[case(
        LedgerError::EntryManagedByClosing { entry_id: JournalEntryId::new(), closing_id: "c".into() },
        "ENTRY_MANAGED_BY_CLOSING",
        ErrorCategory::State
    )]
    fn test_codes_and_categories(
        #[case] err: LedgerError,
        #[case] code: &str,
        #[case] category: ErrorCategory,
    ) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.category(), category);
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::EmptyEntry.http_status_code(), 400);
        assert_eq!(
            LedgerError::AlreadyClosed(FiscalYearId::new()).http_status_code(),
            422
        );
        assert_eq!(
            LedgerError::EntryNotFound(JournalEntryId::new()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::LockTimeout("x".into()).http_status_code(), 409);
        assert_eq!(
            LedgerError::ChainHalted(AuditEventId::new()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::LockTimeout("journal".into()).is_retryable());
        assert!(!LedgerError::EmptyEntry.is_retryable());
        assert!(!LedgerError::ChainHalted(AuditEventId::new()).is_retryable());
    }

    #[test]
    fn test_error_display_carries_totals() {
        let err = LedgerError::UnbalancedEntry {
            entry_id: None,
            debit: Decimal::new(1000, 0),
            credit: Decimal::new(900, 0),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 1000, Credit: 900"
        );

        let err = LedgerError::NoExchangeRate {
            base: Currency::Xof,
            quote: Currency::Eur,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        };
        assert_eq!(err.to_string(), "No exchange rate found for XOF/EUR on 2026-01-15");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::EmptyEntry.into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = LedgerError::ChainHalted(AuditEventId::new()).into();
        assert_eq!(app.error_code(), "INTEGRITY_ERROR");

        let app: AppError = LedgerError::LockTimeout("journal".into()).into();
        assert_eq!(app.error_code(), "CONFLICT");
    }
}
