//! Account balance accumulation over booked entries.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use lyne_shared::types::AccountId;

use super::types::{JournalEntry, JournalLine};

/// Debit and credit totals of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    /// The account.
    pub account_id: AccountId,
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl AccountBalance {
    /// Zero balance.
    #[must_use]
    pub fn zero(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
        }
    }

    /// Debit minus credit. Positive means a debit balance.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Balances per account.
#[derive(Debug, Clone, Default)]
pub struct AccountBalances {
    balances: BTreeMap<AccountId, AccountBalance>,
}

impl AccountBalances {
    /// Accumulates the lines of every booked entry. Drafts and plain
    /// cancellations are ignored; reversed entries still count.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a JournalEntry>) -> Self {
        let mut balances = Self::default();
        for entry in entries.into_iter().filter(|e| e.is_booked()) {
            balances.apply(&entry.lines);
        }
        balances
    }

    /// Adds lines to the balances.
    pub fn apply(&mut self, lines: &[JournalLine]) {
        for line in lines {
            let balance = self
                .balances
                .entry(line.account_id)
                .or_insert_with(|| AccountBalance::zero(line.account_id));
            balance.debit += line.debit;
            balance.credit += line.credit;
        }
    }

    /// Balance of one account (zero when never posted).
    #[must_use]
    pub fn get(&self, account_id: AccountId) -> AccountBalance {
        self.balances
            .get(&account_id)
            .copied()
            .unwrap_or_else(|| AccountBalance::zero(account_id))
    }

    /// All non-empty balances.
    pub fn iter(&self) -> impl Iterator<Item = &AccountBalance> {
        self.balances.values()
    }
}
