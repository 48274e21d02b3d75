//! In-process multi-tenant row store.
//!
//! Each tenant owns one table set and one audit chain. Writes go through
//! [`Database::commit`]:
//!
//! 1. Row locks are taken in a fixed order, each bounded by the lock timeout
//! 2. The tenant's chain mutex is taken (the append critical section)
//! 3. The caller stages its changes and audit drafts against a read snapshot
//! 4. Events are sealed onto the chain tip and the changes applied together
//!
//! A failure at any step leaves both the tables and the chain untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lyne_core::accounts::{Account, ChartOfAccounts};
use lyne_core::audit::{AuditDraft, AuditEvent, ChainTip, RequestContext};
use lyne_core::closing::FiscalClosing;
use lyne_core::currency::{ExchangeRate, ExchangeRateTable};
use lyne_core::fiscal::{AccountingPeriod, FiscalCalendar, FiscalYear};
use lyne_core::ledger::{Journal, JournalBook, JournalEntry, PostingContext, PostingOrigin};
use lyne_core::LedgerError;
use lyne_shared::LedgerConfig;
use lyne_shared::types::{
    AccountId, AccountingPeriodId, AuditEventId, Currency, FiscalClosingId, FiscalYearId,
    JournalEntryId, JournalId, TenantId,
};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Rows of one tenant.
#[derive(Debug, Clone)]
pub struct Tables {
    /// Ledger currency of the tenant.
    pub base_currency: Currency,
    /// Chart of accounts.
    pub chart: ChartOfAccounts,
    /// Exchange rates.
    pub rates: ExchangeRateTable,
    /// Fiscal years and periods.
    pub calendar: FiscalCalendar,
    /// Journals, entries and sequence counters.
    pub book: JournalBook,
    /// Fiscal closings by id.
    pub closings: HashMap<FiscalClosingId, FiscalClosing>,
}

impl Tables {
    fn new(base_currency: Currency) -> Self {
        Self {
            base_currency,
            chart: ChartOfAccounts::new(),
            rates: ExchangeRateTable::new(),
            calendar: FiscalCalendar::new(),
            book: JournalBook::new(),
            closings: HashMap::new(),
        }
    }

    /// Read-only view used to build entries.
    #[must_use]
    pub fn posting_context(&self, origin: PostingOrigin) -> PostingContext<'_> {
        PostingContext {
            chart: &self.chart,
            rates: &self.rates,
            book: &self.book,
            base_currency: self.base_currency,
            origin,
        }
    }

    /// Closing of a fiscal year, if one was created.
    #[must_use]
    pub fn closing_of_year(&self, year_id: FiscalYearId) -> Option<&FiscalClosing> {
        self.closings.values().find(|c| c.fiscal_year_id == year_id)
    }

    /// Closing by id.
    pub fn closing(&self, id: FiscalClosingId) -> Result<&FiscalClosing, LedgerError> {
        self.closings.get(&id).ok_or(LedgerError::ClosingNotFound(id))
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::PutAccount(account) => self.chart.put(account),
            Change::RemoveAccount(id) => self.chart.remove(id),
            Change::PutRate(rate) => self.rates.put(rate),
            Change::PutFiscalYear(year) => self.calendar.put_year(year),
            Change::PutPeriod(period) => self.calendar.put_period(period),
            Change::PutJournal(journal) => self.book.put_journal(journal),
            Change::RemoveJournal(id) => self.book.remove_journal(id),
            Change::PutEntry(entry) => self.book.put_entry(entry),
            Change::RemoveEntry(id) => self.book.remove_entry(id),
            Change::SetSequence(journal_id, value) => self.book.set_sequence(journal_id, value),
            Change::PutClosing(closing) => {
                self.closings.insert(closing.id, closing);
            }
        }
    }
}

/// One row-level write.
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert or replace an account.
    PutAccount(Account),
    /// Delete an account.
    RemoveAccount(AccountId),
    /// Insert or replace an exchange rate.
    PutRate(ExchangeRate),
    /// Insert or replace a fiscal year.
    PutFiscalYear(FiscalYear),
    /// Insert or replace a period.
    PutPeriod(AccountingPeriod),
    /// Insert or replace a journal.
    PutJournal(Journal),
    /// Delete a journal.
    RemoveJournal(JournalId),
    /// Insert or replace an entry with its lines.
    PutEntry(JournalEntry),
    /// Delete an entry with its lines.
    RemoveEntry(JournalEntryId),
    /// Set a journal's sequence counter.
    SetSequence(JournalId, u64),
    /// Insert or replace a fiscal closing.
    PutClosing(FiscalClosing),
}

/// Changes and audit drafts staged by a write, plus the caller's result.
#[derive(Debug)]
pub struct Staged<T> {
    changes: Vec<Change>,
    audit: Vec<AuditDraft>,
    output: T,
}

impl<T> Staged<T> {
    /// A mutation recorded by one audit event.
    #[must_use]
    pub fn new(changes: Vec<Change>, audit: AuditDraft, output: T) -> Self {
        Self {
            changes,
            audit: vec![audit],
            output,
        }
    }

    /// A mutation recorded by several audit events (one per row).
    #[must_use]
    pub fn batch(changes: Vec<Change>, audit: Vec<AuditDraft>, output: T) -> Self {
        Self {
            changes,
            audit,
            output,
        }
    }

    /// Nothing to write.
    #[must_use]
    pub fn unchanged(output: T) -> Self {
        Self {
            changes: Vec::new(),
            audit: Vec::new(),
            output,
        }
    }
}

/// Row lock keys. Locks are always taken in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowLock {
    /// Fiscal year row (closing, period transitions).
    FiscalYear(FiscalYearId),
    /// Period row (status).
    Period(AccountingPeriodId),
    /// Journal row (sequence counter).
    Journal(JournalId),
}

impl fmt::Display for RowLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FiscalYear(id) => write!(f, "fiscal_year:{id}"),
            Self::Period(id) => write!(f, "period:{id}"),
            Self::Journal(id) => write!(f, "journal:{id}"),
        }
    }
}

/// Audit chain of one tenant.
#[derive(Debug, Default)]
pub(crate) struct ChainState {
    /// Events in creation order.
    pub(crate) events: Vec<AuditEvent>,
    /// Cached tip.
    pub(crate) tip: ChainTip,
    /// First tampered event found by verification; blocks writes.
    pub(crate) halted: Option<AuditEventId>,
}

/// Storage of one tenant.
#[derive(Debug)]
pub(crate) struct TenantStore {
    pub(crate) tables: RwLock<Tables>,
    pub(crate) chain: Mutex<ChainState>,
    pub(crate) row_locks: DashMap<RowLock, Arc<Mutex<()>>>,
}

impl TenantStore {
    fn new(base_currency: Currency) -> Self {
        Self {
            tables: RwLock::new(Tables::new(base_currency)),
            chain: Mutex::new(ChainState::default()),
            row_locks: DashMap::new(),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, LedgerError> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Internal("tenant tables lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, LedgerError> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Internal("tenant tables lock poisoned".to_string()))
    }

    pub(crate) fn row_lock(&self, key: RowLock) -> Arc<Mutex<()>> {
        self.row_locks.entry(key).or_default().clone()
    }
}

struct DatabaseInner {
    tenants: DashMap<TenantId, Arc<TenantStore>>,
    config: LedgerConfig,
}

/// Shared handle to the store. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tenants", &self.inner.tenants.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Database {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                tenants: DashMap::new(),
                config,
            }),
        }
    }

    /// Engine settings.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.inner.config
    }

    fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.config.lock_timeout_ms)
    }

    /// Registers a tenant with its ledger currency (finance profile).
    ///
    /// Unregistered tenants are created on first use with the configured
    /// default currency.
    pub fn register_tenant(&self, tenant_id: TenantId, base_currency: Currency) -> Result<(), LedgerError> {
        let store = self.tenant(tenant_id);
        store.write()?.base_currency = base_currency;
        Ok(())
    }

    pub(crate) fn tenant(&self, tenant_id: TenantId) -> Arc<TenantStore> {
        self.inner
            .tenants
            .entry(tenant_id)
            .or_insert_with(|| Arc::new(TenantStore::new(self.inner.config.base_currency)))
            .clone()
    }

    /// Runs `f` against a consistent snapshot of the tenant tables.
    pub fn read<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&Tables) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let store = self.tenant(tenant_id);
        let tables = store.read()?;
        f(&tables)
    }

    /// Runs an all-or-nothing write for the context's tenant.
    ///
    /// `build` receives the tables and the commit time and stages its changes;
    /// it must not have side effects of its own.
    pub async fn commit<T, F>(&self, ctx: &RequestContext, locks: Vec<RowLock>, build: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Tables, DateTime<Utc>) -> Result<Staged<T>, LedgerError>,
    {
        let store = self.tenant(ctx.tenant_id);
        let _row_guards = self.acquire(&store, ctx.tenant_id, locks).await?;
        let mut chain = self.lock_chain(&store).await?;

        if let Some(event_id) = chain.halted {
            warn!(tenant_id = %ctx.tenant_id, %event_id, "Write refused on halted audit chain");
            return Err(LedgerError::ChainHalted(event_id));
        }

        let now = Utc::now();
        let staged = {
            let tables = store.read()?;
            build(&tables, now)?
        };
        Self::apply(&store, &mut chain, ctx.tenant_id, staged, now)
    }

    /// Records the release of a chain halt and clears it, in one critical
    /// section. Returns the tampered event id, or `None` if the chain was not
    /// halted.
    pub(crate) async fn release_halt<F>(&self, ctx: &RequestContext, build: F) -> Result<Option<AuditEventId>, LedgerError>
    where
        F: FnOnce(AuditEventId) -> Result<AuditDraft, LedgerError>,
    {
        let store = self.tenant(ctx.tenant_id);
        let mut chain = self.lock_chain(&store).await?;
        let Some(event_id) = chain.halted else {
            return Ok(None);
        };

        let draft = build(event_id)?;
        Self::apply(&store, &mut chain, ctx.tenant_id, Staged::new(Vec::new(), draft, ()), Utc::now())?;
        chain.halted = None;
        Ok(Some(event_id))
    }

    fn apply<T>(
        store: &TenantStore,
        chain: &mut MutexGuard<'_, ChainState>,
        tenant_id: TenantId,
        staged: Staged<T>,
        now: DateTime<Utc>,
    ) -> Result<T, LedgerError> {
        let Staged {
            changes,
            audit,
            output,
        } = staged;
        if changes.is_empty() && audit.is_empty() {
            return Ok(output);
        }

        let mut tables = store.write()?;
        for change in changes {
            tables.apply(change);
        }
        for draft in audit {
            let event = chain.tip.seal(tenant_id, draft, now);
            chain.tip = ChainTip::after(&event);
            chain.events.push(event);
        }
        Ok(output)
    }

    async fn acquire(
        &self,
        store: &TenantStore,
        tenant_id: TenantId,
        mut locks: Vec<RowLock>,
    ) -> Result<Vec<OwnedMutexGuard<()>>, LedgerError> {
        locks.sort();
        locks.dedup();

        let mut guards = Vec::with_capacity(locks.len());
        for key in locks {
            let mutex = store.row_lock(key);
            debug!(tenant_id = %tenant_id, lock = %key, "Acquiring row lock");
            let guard = timeout(self.lock_timeout(), mutex.lock_owned())
                .await
                .map_err(|_| {
                    warn!(tenant_id = %tenant_id, lock = %key, "Row lock timed out");
                    LedgerError::LockTimeout(key.to_string())
                })?;
            guards.push(guard);
        }
        Ok(guards)
    }

    pub(crate) async fn lock_chain<'a>(&self, store: &'a TenantStore) -> Result<MutexGuard<'a, ChainState>, LedgerError> {
        timeout(self.lock_timeout(), store.chain.lock())
            .await
            .map_err(|_| LedgerError::LockTimeout("audit_chain".to_string()))
    }
}
