//! SYSCOHADA starter data.

use std::collections::HashSet;

use lyne_core::LedgerError;
use lyne_core::accounts::syscohada;
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use tracing::info;

use super::account::ACCOUNT_MODEL;
use super::journal::JOURNAL_MODEL;
use crate::store::{Change, Database, Staged};

/// Rows created by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Accounts created.
    pub accounts_created: usize,
    /// Journals created.
    pub journals_created: usize,
}

impl SeedReport {
    /// True when the tenant was already seeded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accounts_created == 0 && self.journals_created == 0
    }
}

/// Seeds the starter chart and journals.
#[derive(Debug, Clone)]
pub struct SeedRepository {
    db: Database,
}

impl SeedRepository {
    /// Creates a new seed repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the missing starter accounts and journals in one commit.
    ///
    /// Existing codes are skipped, so seeding twice creates nothing the second
    /// time. Each created row gets its own CREATE event.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` or `ChainHalted`.
    pub async fn seed_syscohada(&self, ctx: &RequestContext) -> Result<SeedReport, LedgerError> {
        let config = self.db.config().clone();

        let report = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let mut chart = tables.chart.clone();
                let mut changes = Vec::new();
                let mut audit = Vec::new();
                let mut report = SeedReport::default();

                for input in syscohada::starter_accounts() {
                    if chart.resolve(&input.code).is_ok() {
                        continue;
                    }
                    let account = chart.prepare(&input)?;
                    audit.push(
                        AuditDraft::new(ctx, AuditAction::Create, ACCOUNT_MODEL, account.id, account.label())
                            .with_after(&account)?
                            .with_meta("seed", "syscohada"),
                    );
                    chart.put(account.clone());
                    changes.push(Change::PutAccount(account));
                    report.accounts_created += 1;
                }

                let mut staged_codes = HashSet::new();
                for input in syscohada::starter_journals(&config.closing_journal_code, &config.opening_journal_code) {
                    if tables.book.journal_by_code(&input.code).is_ok() || !staged_codes.insert(input.code.clone()) {
                        continue;
                    }
                    let journal = tables.book.prepare_journal(&input, &chart)?;
                    audit.push(
                        AuditDraft::new(ctx, AuditAction::Create, JOURNAL_MODEL, journal.id, &journal.code)
                            .with_after(&journal)?
                            .with_meta("seed", "syscohada"),
                    );
                    changes.push(Change::PutJournal(journal));
                    report.journals_created += 1;
                }

                Ok(Staged::batch(changes, audit, report))
            })
            .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            accounts_created = report.accounts_created,
            journals_created = report.journals_created,
            "SYSCOHADA starter data seeded"
        );
        Ok(report)
    }
}
