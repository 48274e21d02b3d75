//! Chart of accounts registry with code index and hierarchy traversal.

use std::collections::HashMap;

use lyne_shared::types::AccountId;

use super::types::{Account, NewAccount};
use crate::ledger::LedgerError;

/// Separator used by [`ChartOfAccounts::full_path`].
pub const PATH_SEPARATOR: &str = " / ";

/// Accounts of one tenant, indexed by id and by code.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, Account>,
    by_code: HashMap<String, AccountId>,
}

impl ChartOfAccounts {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Resolves an account by code.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account has this code.
    pub fn resolve(&self, code: &str) -> Result<&Account, LedgerError> {
        self.by_code
            .get(code)
            .and_then(|id| self.accounts.get(id))
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub fn get(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(&id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// All accounts ordered by code.
    #[must_use]
    pub fn accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    /// Direct children of an account, ordered by code.
    #[must_use]
    pub fn children(&self, id: AccountId) -> Vec<&Account> {
        let mut children: Vec<_> = self
            .accounts
            .values()
            .filter(|a| a.parent_id == Some(id))
            .collect();
        children.sort_by(|a, b| a.code.cmp(&b.code));
        children
    }

    /// Ancestors of an account, nearest parent first.
    ///
    /// The walk is bounded by the number of accounts.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for a dangling id and `AccountCycle` when the
    /// parent chain loops.
    pub fn ancestors(&self, id: AccountId) -> Result<Vec<&Account>, LedgerError> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id)?;

        while let Some(parent_id) = current.parent_id {
            if parent_id == id || ancestors.len() >= self.accounts.len() {
                return Err(LedgerError::AccountCycle(id));
            }
            current = self.get(parent_id)?;
            ancestors.push(current);
        }

        Ok(ancestors)
    }

    /// Codes from the root down to the account, joined by `" / "`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ancestors`].
    pub fn full_path(&self, id: AccountId) -> Result<String, LedgerError> {
        let account = self.get(id)?;
        let mut codes: Vec<&str> = self
            .ancestors(id)?
            .iter()
            .rev()
            .map(|a| a.code.as_str())
            .collect();
        codes.push(account.code.as_str());
        Ok(codes.join(PATH_SEPARATOR))
    }

    /// Validates an account creation request and builds the account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` for a reused code and `AccountNotFound` for an
    /// unknown parent code.
    pub fn prepare(&self, input: &NewAccount) -> Result<Account, LedgerError> {
        if self.by_code.contains_key(&input.code) {
            return Err(LedgerError::DuplicateCode {
                kind: "account",
                code: input.code.clone(),
            });
        }
        let parent_id = match &input.parent_code {
            Some(code) => Some(self.resolve(code)?.id),
            None => None,
        };

        Ok(Account {
            id: AccountId::new(),
            code: input.code.clone(),
            name: input.name.clone(),
            account_type: input.account_type,
            parent_id,
            is_active: true,
            is_reconcilable: input.is_reconcilable,
            allow_manual: input.allow_manual,
        })
    }

    /// Checks whether an account may be deactivated.
    ///
    /// Reconcilable control accounts with booked lines stay active unless the
    /// caller overrides.
    ///
    /// # Errors
    ///
    /// Returns `AccountInUse` when the rule above applies.
    pub fn check_deactivate(
        account: &Account,
        has_booked_lines: bool,
        override_control: bool,
    ) -> Result<(), LedgerError> {
        if account.is_reconcilable && has_booked_lines && !override_control {
            return Err(LedgerError::AccountInUse {
                account_id: account.id,
                code: account.code.clone(),
            });
        }
        Ok(())
    }

    /// Inserts or replaces an account.
    pub fn put(&mut self, account: Account) {
        if let Some(previous) = self.accounts.get(&account.id)
            && previous.code != account.code
        {
            self.by_code.remove(&previous.code);
        }
        self.by_code.insert(account.code.clone(), account.id);
        self.accounts.insert(account.id, account);
    }

    /// Removes an account.
    pub fn remove(&mut self, id: AccountId) {
        if let Some(account) = self.accounts.remove(&id) {
            self.by_code.remove(&account.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountType;

    fn chart() -> ChartOfAccounts {
        let mut chart = ChartOfAccounts::new();
        for input in [
            NewAccount::new("4", "Tiers", AccountType::Asset),
            NewAccount::new("41", "Clients et comptes rattachés", AccountType::Asset).with_parent("4"),
            NewAccount::new("411", "Clients", AccountType::Asset)
                .with_parent("41")
                .reconcilable(),
            NewAccount::new("701", "Ventes de marchandises", AccountType::Revenue),
        ] {
            let account = chart.prepare(&input).unwrap();
            chart.put(account);
        }
        chart
    }

    #[test]
    fn test_resolve_by_code() {
        let chart = chart();
        assert_eq!(chart.resolve("411").unwrap().name, "Clients");
        assert!(matches!(
            chart.resolve("999"),
            Err(LedgerError::AccountNotFound(code)) if code == "999"
        ));
    }

    #[test]
    fn test_full_path_and_ancestors() {
        let chart = chart();
        let id = chart.resolve("411").unwrap().id;

        let ancestors: Vec<_> = chart.ancestors(id).unwrap().iter().map(|a| a.code.clone()).collect();
        assert_eq!(ancestors, vec!["41", "4"]);
        assert_eq!(chart.full_path(id).unwrap(), "4 / 41 / 411");

        let root = chart.resolve("4").unwrap().id;
        assert_eq!(chart.full_path(root).unwrap(), "4");
        assert_eq!(chart.children(root).len(), 1);
    }

    #[test]
    fn test_cycle_detected() {
        let mut chart = chart();
        let root = chart.resolve("4").unwrap().clone();
        let leaf = chart.resolve("411").unwrap().id;
        chart.put(Account {
            parent_id: Some(leaf),
            ..root
        });

        assert!(matches!(chart.ancestors(leaf), Err(LedgerError::AccountCycle(_))));
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let chart = chart();
        let result = chart.prepare(&NewAccount::new("411", "Doublon", AccountType::Asset));
        assert!(matches!(result, Err(LedgerError::DuplicateCode { kind: "account", .. })));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let chart = chart();
        let result = chart.prepare(&NewAccount::new("4111", "x", AccountType::Asset).with_parent("499"));
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }

    #[test]
    fn test_deactivate_control_account_rules() {
        let chart = chart();
        let clients = chart.resolve("411").unwrap();
        let sales = chart.resolve("701").unwrap();

        assert!(matches!(
            ChartOfAccounts::check_deactivate(clients, true, false),
            Err(LedgerError::AccountInUse { .. })
        ));
        assert!(ChartOfAccounts::check_deactivate(clients, true, true).is_ok());
        assert!(ChartOfAccounts::check_deactivate(clients, false, false).is_ok());
        assert!(ChartOfAccounts::check_deactivate(sales, true, false).is_ok());
    }

    #[test]
    fn test_put_reindexes_changed_code() {
        let mut chart = chart();
        let sales = chart.resolve("701").unwrap().clone();
        chart.put(Account {
            code: "7011".into(),
            ..sales
        });
        assert!(chart.resolve("701").is_err());
        assert!(chart.resolve("7011").is_ok());
        assert_eq!(chart.len(), 4);
    }
}
