//! Ledger domain types: journals, journal entries and their lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use lyne_shared::types::{
    AccountId, AccountingPeriodId, Currency, JournalEntryId, JournalId, JournalLineId,
};

/// Model label of journal entries in audit events and source references.
pub const JOURNAL_ENTRY_MODEL: &str = "finance.JournalEntry";

/// Journal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalType {
    /// Sales journal.
    Sales,
    /// Purchase journal.
    Purchase,
    /// Bank journal.
    Bank,
    /// Cash journal.
    Cash,
    /// Miscellaneous operations.
    General,
}

/// A journal: a named, sequenced stream of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// Unique identifier.
    pub id: JournalId,
    /// Code, unique per tenant (e.g., "VT"); prefixes entry references.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub journal_type: JournalType,
    /// Suggested debit account.
    pub default_debit_account_id: Option<AccountId>,
    /// Suggested credit account.
    pub default_credit_account_id: Option<AccountId>,
    /// Inactive journals reject manual postings.
    pub is_active: bool,
}

/// Input for creating a journal.
#[derive(Debug, Clone)]
pub struct NewJournal {
    /// Journal code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub journal_type: JournalType,
    /// Code of the default debit account.
    pub default_debit_code: Option<String>,
    /// Code of the default credit account.
    pub default_credit_code: Option<String>,
}

impl NewJournal {
    /// Journal without default accounts.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, journal_type: JournalType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            journal_type,
            default_debit_code: None,
            default_credit_code: None,
        }
    }

    /// Sets the default accounts.
    #[must_use]
    pub fn with_defaults(mut self, debit: Option<&str>, credit: Option<&str>) -> Self {
        self.default_debit_code = debit.map(str::to_string);
        self.default_credit_code = credit.map(str::to_string);
        self
    }
}

/// Stored status of a journal entry.
///
/// A reversed entry is stored as `Cancelled` with `reversed_by` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    /// Editable.
    Draft,
    /// Booked and immutable.
    Posted,
    /// Reversed (lines kept, still booked).
    Cancelled,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Who is creating an entry. System entries (reversals, closing, opening)
/// bypass the active and manual-posting checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingOrigin {
    /// User-initiated.
    Manual,
    /// Engine-generated.
    System,
}

/// A line of a journal entry. Amounts are in base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Posted account.
    pub account_id: AccountId,
    /// Line label.
    pub label: String,
    /// Debit in base currency.
    pub debit: Decimal,
    /// Credit in base currency.
    pub credit: Decimal,
    /// Transaction currency.
    pub currency: Currency,
    /// Signed amount in transaction currency (informational only).
    pub amount_currency: Decimal,
}

impl JournalLine {
    /// Returns true for a zero placeholder line.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }
}

/// A journal entry with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning journal.
    pub journal_id: JournalId,
    /// Accounting period.
    pub period_id: AccountingPeriodId,
    /// Accounting date, inside the period.
    pub entry_date: NaiveDate,
    /// Journal-scoped reference, assigned at posting unless supplied.
    pub reference: Option<String>,
    /// Entry label.
    pub label: String,
    /// Stored status.
    pub status: EntryStatus,
    /// Model of the originating object (e.g., the reversed entry).
    pub source_model: Option<String>,
    /// Id of the originating object.
    pub source_object_id: Option<String>,
    /// The reversal that compensates this entry.
    pub reversed_by: Option<JournalEntryId>,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Posting timestamp.
    pub posted_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Booked entries count in balances: posted or reversed.
    #[must_use]
    pub fn is_booked(&self) -> bool {
        self.status == EntryStatus::Posted || self.reversed_by.is_some()
    }

    /// Returns true for a reversed entry.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed_by.is_some()
    }

    /// Debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::new(
            self.lines.iter().map(|l| l.debit).sum(),
            self.lines.iter().map(|l| l.credit).sum(),
        )
    }

    /// Reference if assigned, else the label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.label)
    }
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Creates totals.
    #[must_use]
    pub const fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Exact equality, no tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// Input for a single line.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// Account code.
    pub account_code: String,
    /// Line label; the entry label is used when empty.
    pub label: String,
    /// Debit in base currency.
    pub debit: Decimal,
    /// Credit in base currency.
    pub credit: Decimal,
    /// Transaction currency; base currency when `None`.
    pub currency: Option<Currency>,
    /// Signed amount in transaction currency.
    pub amount_currency: Option<Decimal>,
}

impl LineInput {
    /// Debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_code, amount, Decimal::ZERO)
    }

    /// Credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_code, Decimal::ZERO, amount)
    }

    /// Zero placeholder line.
    #[must_use]
    pub fn placeholder(account_code: impl Into<String>) -> Self {
        Self::new(account_code, Decimal::ZERO, Decimal::ZERO)
    }

    /// Line with explicit debit and credit.
    #[must_use]
    pub fn new(account_code: impl Into<String>, debit: Decimal, credit: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            label: String::new(),
            debit,
            credit,
            currency: None,
            amount_currency: None,
        }
    }

    /// Foreign-currency line; base amounts derived from the day's rate.
    /// Positive amounts are debits, negative amounts credits.
    #[must_use]
    pub fn foreign(account_code: impl Into<String>, currency: Currency, amount_currency: Decimal) -> Self {
        Self::placeholder(account_code).in_currency(currency, amount_currency)
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the transaction currency and amount.
    #[must_use]
    pub fn in_currency(mut self, currency: Currency, amount_currency: Decimal) -> Self {
        self.currency = Some(currency);
        self.amount_currency = Some(amount_currency);
        self
    }
}

/// Input for creating (and possibly posting) an entry.
#[derive(Debug, Clone)]
pub struct EntryInput {
    /// Journal code.
    pub journal_code: String,
    /// Target period.
    pub period_id: AccountingPeriodId,
    /// Accounting date; today clamped into the period when `None`.
    pub entry_date: Option<NaiveDate>,
    /// Entry label.
    pub label: String,
    /// Caller-supplied reference (idempotency key).
    pub reference: Option<String>,
    /// Lines.
    pub lines: Vec<LineInput>,
}

impl EntryInput {
    /// Creates an input without lines.
    #[must_use]
    pub fn new(journal_code: impl Into<String>, period_id: AccountingPeriodId, label: impl Into<String>) -> Self {
        Self {
            journal_code: journal_code.into(),
            period_id,
            entry_date: None,
            label: label.into(),
            reference: None,
            lines: Vec::new(),
        }
    }

    /// Sets the entry date.
    #[must_use]
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.entry_date = Some(date);
        self
    }

    /// Supplies a reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Appends a line.
    #[must_use]
    pub fn line(mut self, line: LineInput) -> Self {
        self.lines.push(line);
        self
    }

    /// Replaces all lines.
    #[must_use]
    pub fn with_lines(mut self, lines: Vec<LineInput>) -> Self {
        self.lines = lines;
        self
    }
}

/// Result of a successful posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedEntry {
    /// The posted entry.
    pub entry_id: JournalEntryId,
    /// Its reference.
    pub reference: String,
}
