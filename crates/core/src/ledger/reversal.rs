//! Reversal of posted entries.
//!
//! A reversal never edits history: it creates a new entry whose lines swap
//! debit and credit, links it to the original through `source_model` /
//! `source_object_id`, and flags the original with `reversed_by`.

use chrono::{DateTime, NaiveDate, Utc};
use lyne_shared::types::{AccountingPeriodId, JournalEntryId, JournalLineId};

use super::error::LedgerError;
use super::types::{EntryStatus, JOURNAL_ENTRY_MODEL, JournalEntry, JournalLine};
use crate::fiscal::{AccountingPeriod, FiscalCalendar, PeriodStatus};

/// Reversal builder.
pub struct ReversalService;

impl ReversalService {
    /// Checks that an entry can be reversed.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotPosted` unless the entry is `POSTED` and not yet reversed.
    pub fn validate_can_reverse(entry: &JournalEntry) -> Result<(), LedgerError> {
        if entry.status != EntryStatus::Posted || entry.reversed_by.is_some() {
            return Err(LedgerError::EntryNotPosted {
                entry_id: entry.id,
                status: entry.status,
            });
        }
        Ok(())
    }

    /// Picks the period receiving the reversal.
    ///
    /// Order: the original period if open, else the open period containing
    /// `today`, else the earliest open period starting after the original one.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotOpen` (with the original period) when none qualifies.
    pub fn target_period<'a>(
        calendar: &'a FiscalCalendar,
        original_period: AccountingPeriodId,
        today: NaiveDate,
    ) -> Result<&'a AccountingPeriod, LedgerError> {
        let original = calendar.period(original_period)?;
        if original.status == PeriodStatus::Open {
            return Ok(original);
        }
        calendar
            .open_period_containing(today)
            .or_else(|| calendar.first_open_period_after(original.date_end))
            .ok_or(LedgerError::PeriodNotOpen {
                period_id: original.id,
                status: original.status,
            })
    }

    /// Builds the compensating `DRAFT` entry in `target`, dated `today` clamped
    /// into the target period.
    #[must_use]
    pub fn build(
        original: &JournalEntry,
        target: &AccountingPeriod,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> JournalEntry {
        let id = JournalEntryId::new();
        let lines = original
            .lines
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                entry_id: id,
                account_id: line.account_id,
                label: line.label.clone(),
                debit: line.credit,
                credit: line.debit,
                currency: line.currency,
                amount_currency: -line.amount_currency,
            })
            .collect();

        JournalEntry {
            id,
            journal_id: original.journal_id,
            period_id: target.id,
            entry_date: target.clamp(today),
            reference: None,
            label: format!("Reversal of {}", original.display_name()),
            status: EntryStatus::Draft,
            source_model: Some(JOURNAL_ENTRY_MODEL.to_string()),
            source_object_id: Some(original.id.to_string()),
            reversed_by: None,
            lines,
            created_at: now,
            posted_at: None,
        }
    }

    /// The original entry flagged as reversed. Lines are untouched.
    #[must_use]
    pub fn mark_reversed(original: &JournalEntry, reversal_id: JournalEntryId) -> JournalEntry {
        JournalEntry {
            status: EntryStatus::Cancelled,
            reversed_by: Some(reversal_id),
            ..original.clone()
        }
    }
}
