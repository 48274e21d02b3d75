//! Ledger engine facade.
//!
//! Bundles the repositories over one [`Database`] and exposes the operations
//! the surrounding application calls in-process.

use lyne_core::LedgerError;
use lyne_core::audit::RequestContext;
use lyne_core::closing::{ClosingResult, FiscalClosing};
use lyne_core::fiscal::AccountingPeriod;
use lyne_core::ledger::{EntryInput, PostedEntry};
use lyne_shared::LedgerConfig;
use lyne_shared::types::{AccountingPeriodId, AuditEventId, FiscalClosingId, FiscalYearId, JournalEntryId, TenantId, UserId};

use crate::repositories::{
    AccountRepository, AuditRepository, ClosingRepository, EntryRepository, ExchangeRateRepository,
    FiscalRepository, JournalRepository, SeedRepository,
};
use crate::store::Database;

/// Outcome of an audit chain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainVerification {
    /// Every event verified.
    Intact {
        /// Number of events replayed.
        events: usize,
    },
    /// First divergent event. The chain is halted.
    Tampered {
        /// Tampered event.
        event_id: AuditEventId,
        /// Its zero-based position.
        position: usize,
    },
}

impl ChainVerification {
    /// True for an untouched chain.
    #[must_use]
    pub const fn is_intact(&self) -> bool {
        matches!(self, Self::Intact { .. })
    }
}

/// The ledger and audit integrity engine.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    db: Database,
    accounts: AccountRepository,
    journals: JournalRepository,
    rates: ExchangeRateRepository,
    fiscal: FiscalRepository,
    entries: EntryRepository,
    closings: ClosingRepository,
    audit: AuditRepository,
    seed: SeedRepository,
}

impl LedgerEngine {
    /// Creates an engine over a fresh store.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self::from_database(Database::new(config))
    }

    /// Creates an engine over an existing store.
    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            journals: JournalRepository::new(db.clone()),
            rates: ExchangeRateRepository::new(db.clone()),
            fiscal: FiscalRepository::new(db.clone()),
            entries: EntryRepository::new(db.clone()),
            closings: ClosingRepository::new(db.clone()),
            audit: AuditRepository::new(db.clone()),
            seed: SeedRepository::new(db.clone()),
            db,
        }
    }

    /// Underlying store.
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Chart of accounts.
    pub const fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    /// Journals.
    pub const fn journals(&self) -> &JournalRepository {
        &self.journals
    }

    /// Exchange rates.
    pub const fn rates(&self) -> &ExchangeRateRepository {
        &self.rates
    }

    /// Fiscal years and periods.
    pub const fn fiscal(&self) -> &FiscalRepository {
        &self.fiscal
    }

    /// Journal entries.
    pub const fn entries(&self) -> &EntryRepository {
        &self.entries
    }

    /// Fiscal closings.
    pub const fn closings(&self) -> &ClosingRepository {
        &self.closings
    }

    /// Audit trail.
    pub const fn audit(&self) -> &AuditRepository {
        &self.audit
    }

    /// Starter data.
    pub const fn seed(&self) -> &SeedRepository {
        &self.seed
    }

    /// Creates and posts an entry. See [`EntryRepository::post_entry`].
    pub async fn post_entry(&self, ctx: &RequestContext, input: EntryInput) -> Result<PostedEntry, LedgerError> {
        self.entries.post_entry(ctx, input).await
    }

    /// Reverses a posted entry and returns the reversal id.
    pub async fn reverse_entry(&self, ctx: &RequestContext, entry_id: JournalEntryId) -> Result<JournalEntryId, LedgerError> {
        Ok(self.entries.reverse_entry(ctx, entry_id).await?.entry_id)
    }

    /// OPEN → LOCKED.
    pub async fn lock_period(&self, ctx: &RequestContext, period_id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        self.fiscal.lock_period(ctx, period_id).await
    }

    /// LOCKED → OPEN, approved by `authorized_by`.
    pub async fn unlock_period(
        &self,
        ctx: &RequestContext,
        period_id: AccountingPeriodId,
        authorized_by: UserId,
    ) -> Result<AccountingPeriod, LedgerError> {
        self.fiscal.unlock_period(ctx, period_id, authorized_by).await
    }

    /// Drafts the closing of a fiscal year.
    pub async fn generate_closing(&self, ctx: &RequestContext, year_id: FiscalYearId) -> Result<FiscalClosing, LedgerError> {
        self.closings.generate_closing(ctx, year_id).await
    }

    /// Posts a generated closing.
    pub async fn post_closing(&self, ctx: &RequestContext, closing_id: FiscalClosingId) -> Result<ClosingResult, LedgerError> {
        self.closings.post_closing(ctx, closing_id).await
    }

    /// Verifies the tenant chain. A tamper is reported, not raised, and
    /// halts further writes.
    pub async fn verify_audit_chain(&self, tenant_id: TenantId) -> Result<ChainVerification, LedgerError> {
        match self.audit.verify_chain(tenant_id).await {
            Ok(events) => Ok(ChainVerification::Intact { events }),
            Err(LedgerError::ChainTampered { event_id, position }) => {
                Ok(ChainVerification::Tampered { event_id, position })
            }
            Err(e) => Err(e),
        }
    }
}
