//! Chart of accounts repository.

use lyne_core::LedgerError;
use lyne_core::accounts::{Account, ChartOfAccounts, NewAccount};
use lyne_core::audit::{AuditAction, AuditDraft, RequestContext};
use lyne_shared::types::TenantId;
use tracing::{info, warn};

use crate::store::{Change, Database, Staged};

/// Model label of accounts in audit events.
pub const ACCOUNT_MODEL: &str = "finance.Account";

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Database,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` or `AccountNotFound` (unknown parent).
    pub async fn create_account(&self, ctx: &RequestContext, input: NewAccount) -> Result<Account, LedgerError> {
        let account = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let account = tables.chart.prepare(&input)?;
                let draft = AuditDraft::new(ctx, AuditAction::Create, ACCOUNT_MODEL, account.id, account.label())
                    .with_after(&account)?;
                Ok(Staged::new(vec![Change::PutAccount(account.clone())], draft, account))
            })
            .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            account_id = %account.id,
            code = %account.code,
            "Account created"
        );
        Ok(account)
    }

    /// Soft-deactivates an account.
    ///
    /// Reconcilable control accounts with booked lines need `override_control`.
    /// Deactivating an inactive account is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AccountInUse`.
    pub async fn deactivate_account(
        &self,
        ctx: &RequestContext,
        code: &str,
        override_control: bool,
    ) -> Result<Account, LedgerError> {
        let account = self
            .db
            .commit(ctx, Vec::new(), |tables, _| {
                let account = tables.chart.resolve(code)?;
                if !account.is_active {
                    return Ok(Staged::unchanged(account.clone()));
                }
                ChartOfAccounts::check_deactivate(
                    account,
                    tables.book.account_has_booked_lines(account.id),
                    override_control,
                )?;

                let updated = Account {
                    is_active: false,
                    ..account.clone()
                };
                let draft = AuditDraft::new(ctx, AuditAction::Update, ACCOUNT_MODEL, account.id, account.label())
                    .with_before(account)?
                    .with_after(&updated)?
                    .with_meta("override_control", override_control);
                Ok(Staged::new(vec![Change::PutAccount(updated.clone())], draft, updated))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, code, error = %e, "Account deactivation rejected"))?;

        info!(tenant_id = %ctx.tenant_id, account_id = %account.id, code, "Account deactivated");
        Ok(account)
    }

    /// Deletes an account that no line references and no account has as parent.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AccountInUse`.
    pub async fn delete_account(&self, ctx: &RequestContext, code: &str) -> Result<(), LedgerError> {
        self.db
            .commit(ctx, Vec::new(), |tables, _| {
                let account = tables.chart.resolve(code)?;
                if tables.book.account_has_lines(account.id) || !tables.chart.children(account.id).is_empty() {
                    return Err(LedgerError::AccountInUse {
                        account_id: account.id,
                        code: account.code.clone(),
                    });
                }
                let draft = AuditDraft::new(ctx, AuditAction::Delete, ACCOUNT_MODEL, account.id, account.label())
                    .with_before(account)?;
                Ok(Staged::new(vec![Change::RemoveAccount(account.id)], draft, ()))
            })
            .await
            .inspect_err(|e| warn!(tenant_id = %ctx.tenant_id, code, error = %e, "Account deletion rejected"))?;

        info!(tenant_id = %ctx.tenant_id, code, "Account deleted");
        Ok(())
    }

    /// Resolves an account by code.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`.
    pub async fn get_account(&self, tenant_id: TenantId, code: &str) -> Result<Account, LedgerError> {
        self.db.read(tenant_id, |tables| tables.chart.resolve(code).cloned())
    }

    /// All accounts ordered by code.
    pub async fn list_accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, LedgerError> {
        self.db
            .read(tenant_id, |tables| Ok(tables.chart.accounts().into_iter().cloned().collect()))
    }

    /// Codes from the root down to the account, e.g. `"4 / 41 / 411"`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AccountCycle`.
    pub async fn full_path(&self, tenant_id: TenantId, code: &str) -> Result<String, LedgerError> {
        self.db.read(tenant_id, |tables| {
            let account = tables.chart.resolve(code)?;
            tables.chart.full_path(account.id)
        })
    }
}
