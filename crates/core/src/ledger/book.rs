//! Journal book: journals, their entries and the per-journal reference counters.

use std::collections::HashMap;

use lyne_shared::types::{AccountId, AccountingPeriodId, JournalEntryId, JournalId};

use super::error::LedgerError;
use super::types::{EntryStatus, Journal, JournalEntry, NewJournal};
use crate::accounts::ChartOfAccounts;

/// Journals and entries of one tenant.
#[derive(Debug, Clone, Default)]
pub struct JournalBook {
    journals: HashMap<JournalId, Journal>,
    by_code: HashMap<String, JournalId>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    sequences: HashMap<JournalId, u64>,
}

impl JournalBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a journal by id.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` if it does not exist.
    pub fn journal(&self, id: JournalId) -> Result<&Journal, LedgerError> {
        self.journals
            .get(&id)
            .ok_or_else(|| LedgerError::JournalNotFound(id.to_string()))
    }

    /// Looks up a journal by code.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` if no journal has this code.
    pub fn journal_by_code(&self, code: &str) -> Result<&Journal, LedgerError> {
        self.by_code
            .get(code)
            .and_then(|id| self.journals.get(id))
            .ok_or_else(|| LedgerError::JournalNotFound(code.to_string()))
    }

    /// All journals ordered by code.
    #[must_use]
    pub fn journals(&self) -> Vec<&Journal> {
        let mut journals: Vec<_> = self.journals.values().collect();
        journals.sort_by(|a, b| a.code.cmp(&b.code));
        journals
    }

    /// Validates a journal creation request and builds the journal.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` for a reused code and `AccountNotFound` for an
    /// unknown default account.
    pub fn prepare_journal(&self, input: &NewJournal, chart: &ChartOfAccounts) -> Result<Journal, LedgerError> {
        if self.by_code.contains_key(&input.code) {
            return Err(LedgerError::DuplicateCode {
                kind: "journal",
                code: input.code.clone(),
            });
        }
        let resolve = |code: &Option<String>| -> Result<Option<AccountId>, LedgerError> {
            code.as_deref().map(|c| chart.resolve(c).map(|a| a.id)).transpose()
        };

        Ok(Journal {
            id: JournalId::new(),
            code: input.code.clone(),
            name: input.name.clone(),
            journal_type: input.journal_type,
            default_debit_account_id: resolve(&input.default_debit_code)?,
            default_credit_account_id: resolve(&input.default_credit_code)?,
            is_active: true,
        })
    }

    /// Looks up an entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if it does not exist.
    pub fn entry(&self, id: JournalEntryId) -> Result<&JournalEntry, LedgerError> {
        self.entries.get(&id).ok_or(LedgerError::EntryNotFound(id))
    }

    /// All entries of a journal, oldest first.
    #[must_use]
    pub fn entries_of_journal(&self, journal_id: JournalId) -> Vec<&JournalEntry> {
        let mut entries: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.journal_id == journal_id)
            .collect();
        entries.sort_by_key(|e| (e.created_at, e.id));
        entries
    }

    /// Entries whose period is one of `periods`.
    pub fn entries_in_periods<'a>(
        &'a self,
        periods: &'a [AccountingPeriodId],
    ) -> impl Iterator<Item = &'a JournalEntry> + 'a {
        self.entries
            .values()
            .filter(move |e| periods.contains(&e.period_id))
    }

    /// Number of draft entries in the given periods.
    #[must_use]
    pub fn draft_count(&self, periods: &[AccountingPeriodId]) -> usize {
        self.entries_in_periods(periods)
            .filter(|e| e.status == EntryStatus::Draft)
            .count()
    }

    /// Entry already holding `reference` in the journal.
    #[must_use]
    pub fn find_reference(&self, journal_id: JournalId, reference: &str) -> Option<JournalEntryId> {
        self.entries
            .values()
            .find(|e| e.journal_id == journal_id && e.reference.as_deref() == Some(reference))
            .map(|e| e.id)
    }

    /// Fails if `reference` is already used in the journal by another entry.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateReference`.
    pub fn check_reference(
        &self,
        journal_id: JournalId,
        reference: &str,
        except: Option<JournalEntryId>,
    ) -> Result<(), LedgerError> {
        match self.find_reference(journal_id, reference) {
            Some(existing) if Some(existing) != except => Err(LedgerError::DuplicateReference {
                reference: reference.to_string(),
                existing_entry_id: existing,
            }),
            _ => Ok(()),
        }
    }

    /// Last allocated sequence number of a journal.
    #[must_use]
    pub fn sequence(&self, journal_id: JournalId) -> u64 {
        self.sequences.get(&journal_id).copied().unwrap_or(0)
    }

    /// Returns true if any entry belongs to the journal.
    #[must_use]
    pub fn journal_has_entries(&self, journal_id: JournalId) -> bool {
        self.entries.values().any(|e| e.journal_id == journal_id)
    }

    /// Returns true if any line of any entry uses the account.
    #[must_use]
    pub fn account_has_lines(&self, account_id: AccountId) -> bool {
        self.entries
            .values()
            .any(|e| e.lines.iter().any(|l| l.account_id == account_id))
    }

    /// Returns true if a booked entry has a line on the account.
    #[must_use]
    pub fn account_has_booked_lines(&self, account_id: AccountId) -> bool {
        self.entries
            .values()
            .filter(|e| e.is_booked())
            .any(|e| e.lines.iter().any(|l| l.account_id == account_id))
    }

    /// Inserts or replaces a journal.
    pub fn put_journal(&mut self, journal: Journal) {
        if let Some(previous) = self.journals.get(&journal.id)
            && previous.code != journal.code
        {
            self.by_code.remove(&previous.code);
        }
        self.by_code.insert(journal.code.clone(), journal.id);
        self.journals.insert(journal.id, journal);
    }

    /// Removes a journal and its counter.
    pub fn remove_journal(&mut self, id: JournalId) {
        if let Some(journal) = self.journals.remove(&id) {
            self.by_code.remove(&journal.code);
        }
        self.sequences.remove(&id);
    }

    /// Inserts or replaces an entry.
    pub fn put_entry(&mut self, entry: JournalEntry) {
        self.entries.insert(entry.id, entry);
    }

    /// Removes an entry with its lines.
    pub fn remove_entry(&mut self, id: JournalEntryId) {
        self.entries.remove(&id);
    }

    /// Stores the last allocated sequence number of a journal.
    pub fn set_sequence(&mut self, journal_id: JournalId, value: u64) {
        self.sequences.insert(journal_id, value);
    }
}

/// Formats a journal reference: `{code}-{period}-{sequence}` with the sequence
/// zero-padded to `padding` digits.
#[must_use]
pub fn format_reference(journal_code: &str, period_name: &str, sequence: u64, padding: usize) -> String {
    format!("{journal_code}-{period_name}-{sequence:0padding$}")
}

/// Returns true if `reference` has the shape of one generated for the journal,
/// `{code}-{period}-{digits}`. Such references are reserved for the counter.
#[must_use]
pub fn is_generated_reference(journal_code: &str, reference: &str) -> bool {
    let Some(rest) = reference
        .strip_prefix(journal_code)
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };
    rest.rsplit_once('-').is_some_and(|(period, digits)| {
        !period.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    })
}
