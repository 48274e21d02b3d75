//! Journal repository.

use lyne_core::LedgerError;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_core::ledger::{Journal, NewJournal};
use lyne_shared::types::TenantId;
use tracing::{info, warn};

use crate::store::{Change, Database, Staged, Tables};

/// Model label of journals in audit events.
pub const JOURNAL_MODEL: &str = "finance.Journal";

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: Database,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a journal.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` or `AccountNotFound` (unknown default account).
    pub async fn create_journal(&self, ctx: &RequestContext, input: NewJournal) -> Result<Journal, LedgerError> {
        let journal = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let (journal, draft) = stage_new_journal(tables, ctx, &input)?;
                Ok(Staged::new(vec![Change::PutJournal(journal.clone())], draft, journal))
            })
            .await?;

        info!(tenant_id = %ctx.tenant_id, journal_id = %journal.id, code = %journal.code, "Journal created");
        Ok(journal)
    }

    /// Sets `is_active = false`. Entries stay untouched.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound`.
    pub async fn deactivate_journal(&self, ctx: &RequestContext, code: &str) -> Result<Journal, LedgerError> {
        let journal = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let journal = tables.book.journal_by_code(code)?;
                if !journal.is_active {
                    return Ok(Staged::unchanged(journal.clone()));
                }
                let updated = Journal {
                    is_active: false,
                    ..journal.clone()
                };
                let draft = AuditDraft::new(ctx, AuditAction::Update, JOURNAL_MODEL, journal.id, &journal.code)
                    .with_before(journal)?
                    .with_after(&updated)?;
                Ok(Staged::new(vec![Change::PutJournal(updated.clone())], draft, updated))
            })
            .await?;

        info!(tenant_id = %ctx.tenant_id, journal_id = %journal.id, code, "Journal deactivated");
        Ok(journal)
    }

    /// Deletes a journal that owns no entries.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` or `JournalInUse`.
    pub async fn delete_journal(&self, ctx: &RequestContext, code: &str) -> Result<(), LedgerError> {
        self.db
            .commit(ctx, Vec::new(), |tables, _| {
                let journal = tables.book.journal_by_code(code)?;
                if tables.book.journal_has_entries(journal.id) {
                    return Err(LedgerError::JournalInUse {
                        journal_id: journal.id,
                        code: journal.code.clone(),
                    });
                }
                let draft = AuditDraft::new(ctx, AuditAction::Delete, JOURNAL_MODEL, journal.id, &journal.code)
                    .with_before(journal)?;
                Ok(Staged::new(vec![Change::RemoveJournal(journal.id)], draft, ()))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, code, error = %e, "Journal deletion rejected"))?;

        info!(tenant_id = %ctx.tenant_id, code, "Journal deleted");
        Ok(())
    }

    /// Looks up a journal by code.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound`.
    pub async fn get_journal(&self, tenant_id: TenantId, code: &str) -> Result<Journal, LedgerError> {
        self.db.read(tenant_id, |tables| tables.book.journal_by_code(code).cloned())
    }

    /// All journals ordered by code.
    pub async fn list_journals(&self, tenant_id: TenantId) -> Result<Vec<Journal>, LedgerError> {
        self.db
            .read(tenant_id, |tables| Ok(tables.book.journals().into_iter().cloned().collect()))
    }
}

/// Builds a journal and its CREATE event without writing anything.
pub(crate) fn stage_new_journal(
    tables: &Tables,
    ctx: &RequestContext,
    input: &NewJournal,
) -> Result<(Journal, AuditDraft), LedgerError> {
    let journal = tables.book.prepare_journal(input, &tables.chart)?;
    let draft =
        AuditDraft::new(ctx, AuditAction::Create, JOURNAL_MODEL, journal.id, &journal.code).with_after(&journal)?;
    Ok((journal, draft))
}

/// The journal with `code`, or a new one staged from `input` when missing.
pub(crate) fn journal_or_stage(
    tables: &Tables,
    ctx: &RequestContext,
    input: &NewJournal,
) -> Result<(Journal, Option<AuditDraft>), LedgerError> {
    match tables.book.journal_by_code(&input.code) {
        Ok(journal) => Ok((journal.clone(), None)),
        Err(LedgerError::JournalNotFound(_)) => {
            let (journal, draft) = stage_new_journal(tables, ctx, input)?;
            Ok((journal, Some(draft)))
        }
        Err(e) => Err(e),
    }
}
