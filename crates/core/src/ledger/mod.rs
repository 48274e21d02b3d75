//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journals, journal entries and lines
//! - Entry construction and posting rules
//! - Reversals
//! - Balance accumulation
//! - Error types for every ledger operation

pub mod balance;
pub mod book;
pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use balance::{AccountBalance, AccountBalances};
pub use book::{JournalBook, format_reference, is_generated_reference};
pub use error::{ErrorCategory, LedgerError};
pub use reversal::ReversalService;
pub use service::{LedgerService, Posting, PostingContext};
pub use types::{
    EntryInput, EntryStatus, EntryTotals, JOURNAL_ENTRY_MODEL, Journal, JournalEntry, JournalLine,
    JournalType, LineInput, NewJournal, PostedEntry, PostingOrigin,
};
