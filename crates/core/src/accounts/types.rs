//! Chart of accounts types.

use serde::{Deserialize, Serialize};
use lyne_shared::types::AccountId;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Asset.
    Asset,
    /// Liability.
    Liability,
    /// Equity.
    Equity,
    /// Revenue.
    Revenue,
    /// Expense.
    Expense,
}

impl AccountType {
    /// Balance-sheet accounts carry their balance into the next fiscal year.
    #[must_use]
    pub fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Income-statement accounts are zeroed into equity at year end.
    #[must_use]
    pub fn is_income_statement(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }
}

/// An account of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Account code, unique per tenant (e.g., "411").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Inactive accounts reject manual postings.
    pub is_active: bool,
    /// Control accounts (customers, suppliers, bank, cash).
    pub is_reconcilable: bool,
    /// Whether users may post to this account directly.
    pub allow_manual: bool,
}

impl Account {
    /// Short display form, `"411 - Clients"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Code of the parent account.
    pub parent_code: Option<String>,
    /// Control account flag.
    pub is_reconcilable: bool,
    /// Manual posting flag.
    pub allow_manual: bool,
}

impl NewAccount {
    /// Active, manual-posting, non-reconcilable account without parent.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_code: None,
            is_reconcilable: false,
            allow_manual: true,
        }
    }

    /// Sets the parent account code.
    #[must_use]
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    /// Marks the account reconcilable.
    #[must_use]
    pub fn reconcilable(mut self) -> Self {
        self.is_reconcilable = true;
        self
    }

    /// Disallows manual postings.
    #[must_use]
    pub fn system_only(mut self) -> Self {
        self.allow_manual = false;
        self
    }
}
