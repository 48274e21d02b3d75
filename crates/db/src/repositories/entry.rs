//! Journal entry repository: drafts, posting, cancellation and reversal.
//!
//! Posting holds the journal row lock for the whole sequence allocation,
//! balance re-check, write and audit append, so references within a journal
//! are gap-free and strictly increasing.

use lyne_core::LedgerError;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_core::ledger::validation::{ensure_accepts_drafts, ensure_accepts_postings, ensure_not_closing_entry};
use lyne_core::ledger::{
    AccountBalance, AccountBalances, EntryInput, EntryStatus, JOURNAL_ENTRY_MODEL, JournalEntry, LedgerService,
    LineInput, PostedEntry, PostingOrigin, ReversalService,
};
use lyne_shared::types::{FiscalYearId, JournalEntryId, TenantId};
use serde_json::json;
use tracing::{info, warn};

use crate::store::{Change, Database, RowLock, Staged, Tables};

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    db: Database,
}

impl EntryRepository {
    /// Creates a new entry repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a `DRAFT` entry in an open period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotOpen`, the line validation errors, `NoExchangeRate` or
    /// `DuplicateReference`.
    pub async fn create_draft(&self, ctx: &RequestContext, input: EntryInput) -> Result<JournalEntry, LedgerError> {
        let entry = self
            .db
            .commit(ctx, vec![RowLock::Period(input.period_id)], |tables, now| {
                let journal = tables.book.journal_by_code(&input.journal_code)?;
                let period = tables.calendar.period(input.period_id)?;
                ensure_accepts_drafts(period)?;

                let posting_ctx = tables.posting_context(PostingOrigin::Manual);
                let entry = LedgerService::build_draft(&posting_ctx, journal, period, &input, now.date_naive(), now)?;
                let draft = AuditDraft::new(ctx, AuditAction::Create, JOURNAL_ENTRY_MODEL, entry.id, entry.display_name())
                    .with_after(&entry)?
                    .with_meta("journal", journal.code.clone());
                Ok(Staged::new(vec![Change::PutEntry(entry.clone())], draft, entry))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, journal = %input.journal_code, error = %e, "Draft rejected"))?;

        info!(tenant_id = %ctx.tenant_id, entry_id = %entry.id, "Draft entry created");
        Ok(entry)
    }

    /// Replaces the label and lines of a draft in an open period.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `EntryManagedByClosing`, `EntryNotDraft`,
    /// `PeriodNotOpen` or the line validation errors.
    pub async fn update_draft(
        &self,
        ctx: &RequestContext,
        entry_id: JournalEntryId,
        label: &str,
        lines: Vec<LineInput>,
    ) -> Result<JournalEntry, LedgerError> {
        let period_id = self.db.read(ctx.tenant_id, |tables| Ok(tables.book.entry(entry_id)?.period_id))?;
        let entry = self
            .db
            .commit(ctx, vec![RowLock::Period(period_id)], |tables, _| {
                let existing = tables.book.entry(entry_id)?;
                ensure_not_closing_entry(existing)?;
                let period = tables.calendar.period(existing.period_id)?;
                ensure_accepts_drafts(period)?;

                let posting_ctx = tables.posting_context(PostingOrigin::Manual);
                let updated = LedgerService::rebuild_draft(&posting_ctx, existing, label, &lines)?;
                let draft = AuditDraft::new(ctx, AuditAction::Update, JOURNAL_ENTRY_MODEL, existing.id, existing.display_name())
                    .with_before(existing)?
                    .with_after(&updated)?;
                Ok(Staged::new(vec![Change::PutEntry(updated.clone())], draft, updated))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %entry_id, error = %e, "Draft update rejected"))?;

        info!(tenant_id = %ctx.tenant_id, entry_id = %entry.id, "Draft entry updated");
        Ok(entry)
    }

    /// Posts an existing draft. Open and locked periods accept postings.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `EntryManagedByClosing`, `EntryNotDraft`,
    /// `PeriodNotOpen`, `UnbalancedEntry`, `DuplicateReference` or `LockTimeout`.
    pub async fn post_draft(&self, ctx: &RequestContext, entry_id: JournalEntryId) -> Result<PostedEntry, LedgerError> {
        let padding = self.db.config().reference_padding;
        let locks = self.db.read(ctx.tenant_id, |tables| {
            let entry = tables.book.entry(entry_id)?;
            Ok(vec![RowLock::Period(entry.period_id), RowLock::Journal(entry.journal_id)])
        })?;

        let posted = self
            .db
            .commit(ctx, locks, |tables, now| {
                let entry = tables.book.entry(entry_id)?;
                ensure_not_closing_entry(entry)?;
                let journal = tables.book.journal(entry.journal_id)?;
                let period = tables.calendar.period(entry.period_id)?;

                let posting = LedgerService::post(&tables.book, entry, journal, period, padding, now)?;
                stage_posting(ctx, &journal.code, posting.entry, posting.sequence, Some(entry))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %entry_id, error = %e, "Posting rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            entry_id = %posted.entry_id,
            reference = %posted.reference,
            "Entry posted"
        );
        Ok(posted)
    }

    /// Creates and posts an entry in one step. The period must be open.
    ///
    /// Emits a single POST event; a failure leaves no entry and no event.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound`, `PeriodNotOpen`, the line validation errors,
    /// `NoExchangeRate`, `DuplicateReference` or `LockTimeout`.
    pub async fn post_entry(&self, ctx: &RequestContext, input: EntryInput) -> Result<PostedEntry, LedgerError> {
        let padding = self.db.config().reference_padding;
        let journal_id = self
            .db
            .read(ctx.tenant_id, |tables| Ok(tables.book.journal_by_code(&input.journal_code)?.id))?;
        let locks = vec![RowLock::Period(input.period_id), RowLock::Journal(journal_id)];

        let posted = self
            .db
            .commit(ctx, locks, |tables, now| {
                let journal = tables.book.journal(journal_id)?;
                let period = tables.calendar.period(input.period_id)?;
                ensure_accepts_drafts(period)?;

                let posting_ctx = tables.posting_context(PostingOrigin::Manual);
                let draft = LedgerService::build_draft(&posting_ctx, journal, period, &input, now.date_naive(), now)?;
                let posting = LedgerService::post(&tables.book, &draft, journal, period, padding, now)?;
                stage_posting(ctx, &journal.code, posting.entry, posting.sequence, None)
            })
            .await
            .inspect_err(|e| {
                warn!(tenant_id = %ctx.tenant_id, journal = %input.journal_code, error = %e, "Posting rejected");
            })?;

        info!(
            tenant_id = %ctx.tenant_id,
            entry_id = %posted.entry_id,
            reference = %posted.reference,
            "Entry posted"
        );
        Ok(posted)
    }

    /// Deletes a draft and its lines. Closed periods are immutable.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `EntryManagedByClosing`, `EntryNotDraft` or
    /// `PeriodNotOpen`.
    pub async fn cancel_draft(&self, ctx: &RequestContext, entry_id: JournalEntryId) -> Result<(), LedgerError> {
        let period_id = self.db.read(ctx.tenant_id, |tables| Ok(tables.book.entry(entry_id)?.period_id))?;
        self.db
            .commit(ctx, vec![RowLock::Period(period_id)], |tables, _| {
                let entry = tables.book.entry(entry_id)?;
                ensure_not_closing_entry(entry)?;
                if entry.status != EntryStatus::Draft {
                    return Err(LedgerError::EntryNotDraft {
                        entry_id,
                        status: entry.status,
                    });
                }
                ensure_accepts_postings(tables.calendar.period(entry.period_id)?)?;

                let draft = AuditDraft::new(ctx, AuditAction::Delete, JOURNAL_ENTRY_MODEL, entry.id, entry.display_name())
                    .with_before(entry)?;
                Ok(Staged::new(vec![Change::RemoveEntry(entry.id)], draft, ()))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %entry_id, error = %e, "Cancellation rejected"))?;

        info!(tenant_id = %ctx.tenant_id, %entry_id, "Draft entry cancelled");
        Ok(())
    }

    /// Reverses a posted entry.
    ///
    /// The compensating entry is posted immediately in the original's journal,
    /// in the original period if open, else in the open period containing
    /// today, else in the earliest open period after the original one. The
    /// original is flagged reversed; its lines are never touched.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `EntryNotPosted`, `PeriodNotOpen` or `LockTimeout`.
    pub async fn reverse_entry(&self, ctx: &RequestContext, entry_id: JournalEntryId) -> Result<PostedEntry, LedgerError> {
        let padding = self.db.config().reference_padding;
        let locks = self.db.read(ctx.tenant_id, |tables| {
            let entry = tables.book.entry(entry_id)?;
            Ok(vec![RowLock::Period(entry.period_id), RowLock::Journal(entry.journal_id)])
        })?;

        let posted = self
            .db
            .commit(ctx, locks, |tables, now| {
                let original = tables.book.entry(entry_id)?;
                ReversalService::validate_can_reverse(original)?;

                let today = now.date_naive();
                let target = ReversalService::target_period(&tables.calendar, original.period_id, today)?;
                let journal = tables.book.journal(original.journal_id)?;
                let reversal = ReversalService::build(original, target, today, now);
                let posting = LedgerService::post(&tables.book, &reversal, journal, target, padding, now)?;

                let reversal = posting.entry;
                let reference = reversal.display_name().to_string();
                let marked = ReversalService::mark_reversed(original, reversal.id);
                let draft = AuditDraft::new(ctx, AuditAction::Reverse, JOURNAL_ENTRY_MODEL, original.id, original.display_name())
                    .with_before(original)?
                    .with_after(&marked)?
                    .with_meta("reversal_entry_id", reversal.id.to_string())
                    .with_meta("reversal_reference", reference.clone())
                    .with_meta("reversal_period", target.name.clone());

                let mut changes = vec![Change::PutEntry(marked), Change::PutEntry(reversal.clone())];
                if let Some(sequence) = posting.sequence {
                    changes.push(Change::SetSequence(journal.id, sequence));
                }
                Ok(Staged::new(
                    changes,
                    draft,
                    PostedEntry {
                        entry_id: reversal.id,
                        reference,
                    },
                ))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %entry_id, error = %e, "Reversal rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            original_entry_id = %entry_id,
            reversal_entry_id = %posted.entry_id,
            reference = %posted.reference,
            "Entry reversed"
        );
        Ok(posted)
    }

    /// An entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`.
    pub async fn get_entry(&self, tenant_id: TenantId, entry_id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        self.db.read(tenant_id, |tables| tables.book.entry(entry_id).cloned())
    }

    /// Entries of a journal, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound`.
    pub async fn entries_of_journal(&self, tenant_id: TenantId, journal_code: &str) -> Result<Vec<JournalEntry>, LedgerError> {
        self.db.read(tenant_id, |tables| {
            let journal = tables.book.journal_by_code(journal_code)?;
            Ok(tables.book.entries_of_journal(journal.id).into_iter().cloned().collect())
        })
    }

    /// Booked balances of every account over a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound`.
    pub async fn balances(&self, tenant_id: TenantId, year_id: FiscalYearId) -> Result<AccountBalances, LedgerError> {
        self.db.read(tenant_id, |tables| year_balances(tables, year_id))
    }

    /// Booked balance of one account over a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound` or `AccountNotFound`.
    pub async fn account_balance(
        &self,
        tenant_id: TenantId,
        year_id: FiscalYearId,
        code: &str,
    ) -> Result<AccountBalance, LedgerError> {
        self.db.read(tenant_id, |tables| {
            let account = tables.chart.resolve(code)?;
            Ok(year_balances(tables, year_id)?.get(account.id))
        })
    }
}

/// Booked balances over the periods of a year.
pub(crate) fn year_balances(tables: &Tables, year_id: FiscalYearId) -> Result<AccountBalances, LedgerError> {
    tables.calendar.year(year_id)?;
    let periods: Vec<_> = tables.calendar.periods_of(year_id).iter().map(|p| p.id).collect();
    Ok(AccountBalances::from_entries(tables.book.entries_in_periods(&periods)))
}

/// Stages a posted entry, its counter and its POST event.
fn stage_posting(
    ctx: &RequestContext,
    journal_code: &str,
    entry: JournalEntry,
    sequence: Option<u64>,
    before: Option<&JournalEntry>,
) -> Result<Staged<PostedEntry>, LedgerError> {
    let reference = entry.display_name().to_string();
    let totals = entry.totals();

    let mut draft = AuditDraft::new(ctx, AuditAction::Post, JOURNAL_ENTRY_MODEL, entry.id, &reference)
        .with_after(&entry)?
        .with_meta("journal", journal_code)
        .with_meta("totals", json!({"debit": totals.debit, "credit": totals.credit}));
    if let Some(before) = before {
        draft = draft.with_before(before)?;
    }

    let mut changes = Vec::with_capacity(2);
    if let Some(sequence) = sequence {
        changes.push(Change::SetSequence(entry.journal_id, sequence));
    }
    let entry_id = entry.id;
    changes.push(Change::PutEntry(entry));

    Ok(Staged::new(changes, draft, PostedEntry { entry_id, reference }))
}
