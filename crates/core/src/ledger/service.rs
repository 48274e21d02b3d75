//! Ledger service for entry construction, validation and posting.
//!
//! This module provides the core business logic for turning entry inputs into
//! validated journal entries and for posting drafts. It holds no locks and
//! performs no I/O; callers supply a consistent snapshot of the tenant's chart,
//! rates and book.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use lyne_shared::types::{Currency, JournalEntryId, JournalLineId};

use super::book::{JournalBook, format_reference, is_generated_reference};
use super::error::LedgerError;
use super::types::{
    EntryInput, EntryStatus, Journal, JournalEntry, JournalLine, LineInput, PostingOrigin,
};
use super::validation::{check_line_sign, ensure_accepts_postings, ensure_date_in_period, validate_lines};
use crate::accounts::ChartOfAccounts;
use crate::currency::{CurrencyService, ExchangeRateTable};
use crate::fiscal::AccountingPeriod;

/// Read-only view of the tenant state needed to build entries.
#[derive(Debug, Clone, Copy)]
pub struct PostingContext<'a> {
    /// Chart of accounts.
    pub chart: &'a ChartOfAccounts,
    /// Exchange rates.
    pub rates: &'a ExchangeRateTable,
    /// Journals and entries.
    pub book: &'a JournalBook,
    /// Ledger currency.
    pub base_currency: Currency,
    /// Manual or engine-generated.
    pub origin: PostingOrigin,
}

/// Outcome of posting a draft.
#[derive(Debug, Clone)]
pub struct Posting {
    /// The entry in `POSTED` state.
    pub entry: JournalEntry,
    /// New value of the journal counter, when a reference was generated.
    pub sequence: Option<u64>,
}

/// Ledger service for entry validation and posting.
///
/// This service contains pure business logic with no storage dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Builds a validated `DRAFT` entry.
    ///
    /// Steps:
    /// 1. Manual entries require an active journal
    /// 2. The entry date defaults to `today` clamped into the period and must lie inside it
    /// 3. A supplied reference must be unused in the journal and must not take
    ///    the shape of a generated one
    /// 4. Each line is resolved (account, currency, base amounts) and sign-checked
    /// 5. The entry must be non-empty and balanced in base currency
    ///
    /// Period status is the caller's concern: new drafts need an open period,
    /// engine-generated entries may target locked ones.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn build_draft(
        ctx: &PostingContext<'_>,
        journal: &Journal,
        period: &AccountingPeriod,
        input: &EntryInput,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        if ctx.origin == PostingOrigin::Manual && !journal.is_active {
            return Err(LedgerError::JournalInactive(journal.code.clone()));
        }

        let entry_date = input.entry_date.unwrap_or_else(|| period.clamp(today));
        ensure_date_in_period(entry_date, period)?;

        if let Some(reference) = &input.reference {
            if is_generated_reference(&journal.code, reference) {
                return Err(LedgerError::ReservedReference {
                    reference: reference.clone(),
                    journal: journal.code.clone(),
                });
            }
            ctx.book.check_reference(journal.id, reference, None)?;
        }

        let id = JournalEntryId::new();
        let lines = Self::resolve_lines(ctx, id, entry_date, &input.label, &input.lines)?;
        validate_lines(None, &lines)?;

        Ok(JournalEntry {
            id,
            journal_id: journal.id,
            period_id: period.id,
            entry_date,
            reference: input.reference.clone(),
            label: input.label.clone(),
            status: EntryStatus::Draft,
            source_model: None,
            source_object_id: None,
            reversed_by: None,
            lines,
            created_at: now,
            posted_at: None,
        })
    }

    /// Replaces the label and lines of a draft, keeping its identity.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotDraft` for a non-draft entry and the validation errors
    /// of [`Self::build_draft`].
    pub fn rebuild_draft(
        ctx: &PostingContext<'_>,
        existing: &JournalEntry,
        label: &str,
        lines: &[LineInput],
    ) -> Result<JournalEntry, LedgerError> {
        if existing.status != EntryStatus::Draft {
            return Err(LedgerError::EntryNotDraft {
                entry_id: existing.id,
                status: existing.status,
            });
        }
        let resolved = Self::resolve_lines(ctx, existing.id, existing.entry_date, label, lines)?;
        validate_lines(Some(existing.id), &resolved)?;

        Ok(JournalEntry {
            label: label.to_string(),
            lines: resolved,
            ..existing.clone()
        })
    }

    /// Posts a draft.
    ///
    /// Re-validates the balance and the period at commit time, then assigns the
    /// next journal reference unless one was supplied.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotDraft`, `PeriodNotOpen` (closed period), the line
    /// validation errors, or `DuplicateReference`.
    pub fn post(
        book: &JournalBook,
        entry: &JournalEntry,
        journal: &Journal,
        period: &AccountingPeriod,
        padding: usize,
        now: DateTime<Utc>,
    ) -> Result<Posting, LedgerError> {
        if entry.status != EntryStatus::Draft {
            return Err(LedgerError::EntryNotDraft {
                entry_id: entry.id,
                status: entry.status,
            });
        }
        ensure_accepts_postings(period)?;
        validate_lines(Some(entry.id), &entry.lines)?;

        let (reference, sequence) = match &entry.reference {
            Some(reference) => (reference.clone(), None),
            None => {
                let next = book.sequence(journal.id) + 1;
                (format_reference(&journal.code, &period.name, next, padding), Some(next))
            }
        };
        book.check_reference(journal.id, &reference, Some(entry.id))?;

        Ok(Posting {
            entry: JournalEntry {
                reference: Some(reference),
                status: EntryStatus::Posted,
                posted_at: Some(now),
                ..entry.clone()
            },
            sequence,
        })
    }

    /// Resolves line inputs into base-currency journal lines.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLineSign`, `AccountNotFound`, `AccountInactive`,
    /// `AccountManualPostingDisabled` or `NoExchangeRate`.
    pub fn resolve_lines(
        ctx: &PostingContext<'_>,
        entry_id: JournalEntryId,
        entry_date: NaiveDate,
        entry_label: &str,
        inputs: &[LineInput],
    ) -> Result<Vec<JournalLine>, LedgerError> {
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| Self::resolve_line(ctx, entry_id, index, entry_date, entry_label, input))
            .collect()
    }

    fn resolve_line(
        ctx: &PostingContext<'_>,
        entry_id: JournalEntryId,
        index: usize,
        entry_date: NaiveDate,
        entry_label: &str,
        input: &LineInput,
    ) -> Result<JournalLine, LedgerError> {
        check_line_sign(index, input.debit, input.credit)?;

        let account = ctx.chart.resolve(&input.account_code)?;
        if ctx.origin == PostingOrigin::Manual {
            if !account.is_active {
                return Err(LedgerError::AccountInactive(account.code.clone()));
            }
            if !account.allow_manual {
                return Err(LedgerError::AccountManualPostingDisabled(account.code.clone()));
            }
        }

        let currency = input.currency.unwrap_or(ctx.base_currency);
        let (debit, credit, amount_currency) = if currency == ctx.base_currency {
            (
                input.debit,
                input.credit,
                input.amount_currency.unwrap_or(input.debit - input.credit),
            )
        } else {
            let rate = ctx.rates.rate(entry_date, ctx.base_currency, currency)?;
            let has_base_amounts = !(input.debit.is_zero() && input.credit.is_zero());

            match input.amount_currency {
                Some(amount) if !has_base_amounts => {
                    let base = CurrencyService::to_base(amount.abs(), rate, ctx.base_currency);
                    if amount < Decimal::ZERO {
                        (Decimal::ZERO, base, amount)
                    } else {
                        (base, Decimal::ZERO, amount)
                    }
                }
                Some(amount) => (input.debit, input.credit, amount),
                None => (
                    input.debit,
                    input.credit,
                    CurrencyService::from_base(input.debit - input.credit, rate, currency)?,
                ),
            }
        };

        let label = if input.label.is_empty() {
            entry_label.to_string()
        } else {
            input.label.clone()
        };

        Ok(JournalLine {
            id: JournalLineId::new(),
            entry_id,
            account_id: account.id,
            label,
            debit,
            credit,
            currency,
            amount_currency,
        })
    }
}
