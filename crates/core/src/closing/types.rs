//! Fiscal closing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use lyne_shared::types::{FiscalClosingId, FiscalYearId, JournalEntryId};

/// Model label of fiscal closings in audit events and source references.
pub const FISCAL_CLOSING_MODEL: &str = "finance.FiscalClosing";

/// Lifecycle of a fiscal closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClosingStatus {
    /// Created, nothing computed yet.
    Draft,
    /// Closing (and possibly opening) entries drafted.
    Generated,
    /// Entries posted, year closed.
    Posted,
}

/// The year-end closing of one fiscal year (1:1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalClosing {
    /// Unique identifier.
    pub id: FiscalClosingId,
    /// Closed fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// Current status.
    pub status: ClosingStatus,
    /// Entry zeroing revenue and expense accounts into the result account.
    pub closing_entry_id: Option<JournalEntryId>,
    /// Entry carrying balance-sheet balances into the next year.
    pub opening_entry_id: Option<JournalEntryId>,
    /// When the entries were generated.
    pub generated_at: Option<DateTime<Utc>>,
    /// When the closing was posted.
    pub posted_at: Option<DateTime<Utc>>,
}

impl FiscalClosing {
    /// New draft closing for a year.
    #[must_use]
    pub fn new(fiscal_year_id: FiscalYearId) -> Self {
        Self {
            id: FiscalClosingId::new(),
            fiscal_year_id,
            status: ClosingStatus::Draft,
            closing_entry_id: None,
            opening_entry_id: None,
            generated_at: None,
            posted_at: None,
        }
    }
}

/// Entries produced by a posted closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingResult {
    /// The posted closing.
    pub closing_id: FiscalClosingId,
    /// Posted closing entry.
    pub closing_entry_id: JournalEntryId,
    /// Posted opening entry of the next year.
    pub opening_entry_id: JournalEntryId,
}
