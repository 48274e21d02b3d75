//! Fiscal closing repository.
//!
//! `generate` drafts the closing entry (and the opening entry when the next
//! year already has a period); `post` posts both, closes every period of the
//! year and marks the year closed, all in one commit.

use chrono::{DateTime, NaiveDate, Utc};
use lyne_core::LedgerError;
use lyne_core::accounts::Account;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_core::closing::{ClosingResult, ClosingService, ClosingStatus, FISCAL_CLOSING_MODEL, FiscalClosing};
use lyne_core::fiscal::{AccountingPeriod, FiscalYear, PeriodStatus};
use lyne_core::ledger::validation::ensure_accepts_postings;
use lyne_core::ledger::{
    AccountBalances, EntryInput, Journal, JournalEntry, JournalType, LedgerService, NewJournal, PostingOrigin,
};
use lyne_shared::types::{FiscalClosingId, FiscalYearId, JournalEntryId, TenantId};
use tracing::{info, warn};

use super::entry::year_balances;
use super::journal::journal_or_stage;
use crate::store::{Change, Database, RowLock, Staged, Tables};

/// Fiscal closing repository.
#[derive(Debug, Clone)]
pub struct ClosingRepository {
    db: Database,
}

/// Journals and accounts a closing writes to, resolved inside the commit.
struct ClosingSetup {
    closing_journal: Journal,
    opening_journal: Journal,
    journal_changes: Vec<Change>,
    journal_audit: Vec<AuditDraft>,
}

impl ClosingRepository {
    /// Creates a new closing repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Generates the closing of a fiscal year.
    ///
    /// Missing closing/opening journals are created in the same commit. The
    /// generated entries stay drafts owned by the closing: the draft operations
    /// refuse them, and the year's periods are frozen until `post`.
    ///
    /// # Errors
    ///
    /// Returns `FiscalYearNotFound`, `AlreadyClosed`, `NoPeriods`,
    /// `OpenPeriodsRemain`, `DraftEntriesRemain`, `AccountNotFound` or
    /// `InvalidResultAccount`.
    pub async fn generate_closing(&self, ctx: &RequestContext, year_id: FiscalYearId) -> Result<FiscalClosing, LedgerError> {
        let config = self.db.config().clone();
        let locks = self.closing_locks(ctx.tenant_id, year_id)?;

        let closing = self
            .db
            .commit(ctx, locks, |tables, now| {
                let year = tables.calendar.year(year_id)?;
                let periods = tables.calendar.periods_of(year_id);
                let period_ids: Vec<_> = periods.iter().map(|p| p.id).collect();
                let existing = tables.closing_of_year(year_id);
                ClosingService::check_can_generate(year, existing, &periods, tables.book.draft_count(&period_ids))?;

                let last = tables.calendar.last_period(year_id).ok_or(LedgerError::NoPeriods(year_id))?;
                ensure_accepts_postings(last)?;
                let result = ClosingService::result_account(&tables.chart, &config.result_account_code)?;
                let setup = closing_setup(tables, ctx, &config.closing_journal_code, &config.opening_journal_code)?;

                let mut closing = existing.cloned().unwrap_or_else(|| FiscalClosing::new(year_id));
                let balances = year_balances(tables, year_id)?;
                let closing_entry = build_closing_entry(tables, &setup.closing_journal, year, last, result, &balances, closing.id, now)?;

                let opening_entry = match next_first_period(tables, year_id) {
                    Some(first) => Some(build_opening_entry(
                        tables,
                        &setup.opening_journal,
                        year,
                        first,
                        result,
                        balances,
                        &closing_entry,
                        closing.id,
                        now,
                    )?),
                    None => None,
                };

                closing.status = ClosingStatus::Generated;
                closing.closing_entry_id = Some(closing_entry.id);
                closing.opening_entry_id = opening_entry.as_ref().map(|e| e.id);
                closing.generated_at = Some(now);

                let mut audit = setup.journal_audit;
                audit.push(
                    AuditDraft::new(ctx, AuditAction::Create, FISCAL_CLOSING_MODEL, closing.id, &year.name)
                        .with_after(&closing)?
                        .with_meta("fiscal_year", year.name.clone())
                        .with_meta("closing_lines", closing_entry.lines.len())
                        .with_meta("opening_generated", opening_entry.is_some()),
                );

                let mut changes = setup.journal_changes;
                changes.push(Change::PutEntry(closing_entry));
                changes.extend(opening_entry.map(Change::PutEntry));
                changes.push(Change::PutClosing(closing.clone()));
                Ok(Staged::batch(changes, audit, closing))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, fiscal_year_id = %year_id, error = %e, "Closing generation rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            fiscal_year_id = %year_id,
            closing_id = %closing.id,
            opening_generated = closing.opening_entry_id.is_some(),
            "Fiscal closing generated"
        );
        Ok(closing)
    }

    /// Posts a generated closing.
    ///
    /// Re-posting a posted closing returns the existing entries and writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `ClosingNotFound`, `ClosingNotGenerated`, `NextYearMissing`,
    /// `PeriodNotOpen` or the posting errors.
    pub async fn post_closing(&self, ctx: &RequestContext, closing_id: FiscalClosingId) -> Result<ClosingResult, LedgerError> {
        let config = self.db.config().clone();
        let year_id = self
            .db
            .read(ctx.tenant_id, |tables| Ok(tables.closing(closing_id)?.fiscal_year_id))?;
        let locks = self.closing_locks(ctx.tenant_id, year_id)?;

        let result = self
            .db
            .commit(ctx, locks, |tables, now| {
                let closing = tables.closing(closing_id)?;
                match closing.status {
                    ClosingStatus::Draft => return Err(LedgerError::ClosingNotGenerated(closing_id)),
                    ClosingStatus::Posted => return Ok(Staged::unchanged(posted_result(closing)?)),
                    ClosingStatus::Generated => {}
                }

                let year = tables.calendar.year(year_id)?;
                let first = next_first_period(tables, year_id).ok_or(LedgerError::NextYearMissing(year_id))?;
                let setup = closing_setup(tables, ctx, &config.closing_journal_code, &config.opening_journal_code)?;

                let closing_draft = tables.book.entry(generated_entry_id(closing.closing_entry_id, closing_id)?)?;
                let opening_draft = match closing.opening_entry_id {
                    Some(id) => tables.book.entry(id)?.clone(),
                    None => {
                        let result_account = ClosingService::result_account(&tables.chart, &config.result_account_code)?;
                        build_opening_entry(
                            tables,
                            &setup.opening_journal,
                            year,
                            first,
                            result_account,
                            year_balances(tables, year_id)?,
                            closing_draft,
                            closing_id,
                            now,
                        )?
                    }
                };

                let closing_period = tables.calendar.period(closing_draft.period_id)?;
                let closing_journal = tables.book.journal(closing_draft.journal_id).unwrap_or(&setup.closing_journal);
                let opening_journal = tables.book.journal(opening_draft.journal_id).unwrap_or(&setup.opening_journal);
                let opening_period = tables.calendar.period(opening_draft.period_id)?;

                let padding = config.reference_padding;
                let closing_posting =
                    LedgerService::post(&tables.book, closing_draft, closing_journal, closing_period, padding, now)?;
                let opening_posting =
                    LedgerService::post(&tables.book, &opening_draft, opening_journal, opening_period, padding, now)?;

                let mut changes = setup.journal_changes;
                let mut audit = setup.journal_audit;

                for period in tables.calendar.periods_of(year_id) {
                    if period.status != PeriodStatus::Closed {
                        changes.push(Change::PutPeriod(period.transitioned(PeriodStatus::Closed)?));
                    }
                }
                changes.push(Change::PutFiscalYear(FiscalYear {
                    is_closed: true,
                    ..year.clone()
                }));

                let posted = FiscalClosing {
                    status: ClosingStatus::Posted,
                    opening_entry_id: Some(opening_posting.entry.id),
                    posted_at: Some(now),
                    ..closing.clone()
                };
                audit.push(
                    AuditDraft::new(ctx, AuditAction::Close, FISCAL_CLOSING_MODEL, closing.id, &year.name)
                        .with_before(closing)?
                        .with_after(&posted)?
                        .with_meta("fiscal_year", year.name.clone())
                        .with_meta("closing_reference", closing_posting.entry.display_name())
                        .with_meta("opening_reference", opening_posting.entry.display_name()),
                );

                let result = ClosingResult {
                    closing_id,
                    closing_entry_id: closing_posting.entry.id,
                    opening_entry_id: opening_posting.entry.id,
                };
                for posting in [closing_posting, opening_posting] {
                    if let Some(sequence) = posting.sequence {
                        changes.push(Change::SetSequence(posting.entry.journal_id, sequence));
                    }
                    changes.push(Change::PutEntry(posting.entry));
                }
                changes.push(Change::PutClosing(posted));
                Ok(Staged::batch(changes, audit, result))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, %closing_id, error = %e, "Closing post rejected"))?;

        info!(
            tenant_id = %ctx.tenant_id,
            %closing_id,
            closing_entry_id = %result.closing_entry_id,
            opening_entry_id = %result.opening_entry_id,
            "Fiscal closing posted"
        );
        Ok(result)
    }

    /// Closing of a fiscal year, if one exists.
    pub async fn closing_of_year(&self, tenant_id: TenantId, year_id: FiscalYearId) -> Result<Option<FiscalClosing>, LedgerError> {
        self.db.read(tenant_id, |tables| Ok(tables.closing_of_year(year_id).cloned()))
    }

    /// A closing by id.
    ///
    /// # Errors
    ///
    /// Returns `ClosingNotFound`.
    pub async fn get_closing(&self, tenant_id: TenantId, closing_id: FiscalClosingId) -> Result<FiscalClosing, LedgerError> {
        self.db.read(tenant_id, |tables| tables.closing(closing_id).cloned())
    }

    fn closing_locks(&self, tenant_id: TenantId, year_id: FiscalYearId) -> Result<Vec<RowLock>, LedgerError> {
        let config = self.db.config();
        self.db.read(tenant_id, |tables| {
            tables.calendar.year(year_id)?;
            let mut locks = vec![RowLock::FiscalYear(year_id)];
            locks.extend(tables.calendar.periods_of(year_id).iter().map(|p| RowLock::Period(p.id)));
            if let Some(first) = next_first_period(tables, year_id) {
                locks.push(RowLock::Period(first.id));
            }
            for code in [&config.closing_journal_code, &config.opening_journal_code] {
                if let Ok(journal) = tables.book.journal_by_code(code) {
                    locks.push(RowLock::Journal(journal.id));
                }
            }
            Ok(locks)
        })
    }
}

/// Resolves the closing and opening journals, staging the missing ones.
fn closing_setup(
    tables: &Tables,
    ctx: &RequestContext,
    closing_code: &str,
    opening_code: &str,
) -> Result<ClosingSetup, LedgerError> {
    let mut journal_changes = Vec::new();
    let mut journal_audit = Vec::new();

    let closing_input = NewJournal::new(closing_code, "Clôture de l'exercice", JournalType::General);
    let (closing_journal, created) = journal_or_stage(tables, ctx, &closing_input)?;
    if let Some(draft) = created {
        journal_changes.push(Change::PutJournal(closing_journal.clone()));
        journal_audit.push(draft);
    }

    let opening_journal = if opening_code == closing_code {
        closing_journal.clone()
    } else {
        let opening_input = NewJournal::new(opening_code, "À-nouveaux", JournalType::General);
        let (journal, created) = journal_or_stage(tables, ctx, &opening_input)?;
        if let Some(draft) = created {
            journal_changes.push(Change::PutJournal(journal.clone()));
            journal_audit.push(draft);
        }
        journal
    };

    Ok(ClosingSetup {
        closing_journal,
        opening_journal,
        journal_changes,
        journal_audit,
    })
}

/// First period of the year following `year_id`.
fn next_first_period(tables: &Tables, year_id: FiscalYearId) -> Option<&AccountingPeriod> {
    let next = tables.calendar.next_year(year_id)?;
    tables.calendar.first_period(next.id)
}

fn generated_entry_id(id: Option<JournalEntryId>, closing_id: FiscalClosingId) -> Result<JournalEntryId, LedgerError> {
    id.ok_or_else(|| LedgerError::Internal(format!("generated closing {closing_id} has no closing entry")))
}

fn posted_result(closing: &FiscalClosing) -> Result<ClosingResult, LedgerError> {
    Ok(ClosingResult {
        closing_id: closing.id,
        closing_entry_id: generated_entry_id(closing.closing_entry_id, closing.id)?,
        opening_entry_id: generated_entry_id(closing.opening_entry_id, closing.id)?,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_closing_entry(
    tables: &Tables,
    journal: &Journal,
    year: &FiscalYear,
    last: &AccountingPeriod,
    result: &Account,
    balances: &AccountBalances,
    closing_id: FiscalClosingId,
    now: DateTime<Utc>,
) -> Result<JournalEntry, LedgerError> {
    let lines = ClosingService::closing_lines(&tables.chart, balances, result);
    let input = EntryInput::new(&journal.code, last.id, format!("Clôture {}", year.name))
        .on(last.date_end)
        .with_lines(lines);
    build_system_entry(tables, journal, last, &input, last.date_end, closing_id, now)
}

#[allow(clippy::too_many_arguments)]
fn build_opening_entry(
    tables: &Tables,
    journal: &Journal,
    year: &FiscalYear,
    first: &AccountingPeriod,
    result: &Account,
    mut balances: AccountBalances,
    closing_entry: &JournalEntry,
    closing_id: FiscalClosingId,
    now: DateTime<Utc>,
) -> Result<JournalEntry, LedgerError> {
    balances.apply(&closing_entry.lines);
    let lines = ClosingService::opening_lines(&tables.chart, &balances, result);
    let input = EntryInput::new(&journal.code, first.id, format!("À-nouveaux {}", year.name))
        .on(first.date_start)
        .with_lines(lines);
    build_system_entry(tables, journal, first, &input, first.date_start, closing_id, now)
}

fn build_system_entry(
    tables: &Tables,
    journal: &Journal,
    period: &AccountingPeriod,
    input: &EntryInput,
    date: NaiveDate,
    closing_id: FiscalClosingId,
    now: DateTime<Utc>,
) -> Result<JournalEntry, LedgerError> {
    let posting_ctx = tables.posting_context(PostingOrigin::System);
    let entry = LedgerService::build_draft(&posting_ctx, journal, period, input, date, now)?;
    Ok(JournalEntry {
        source_model: Some(FISCAL_CLOSING_MODEL.to_string()),
        source_object_id: Some(closing_id.to_string()),
        ..entry
    })
}
