//! Year-end closing computation.
//!
//! The closing entry zeroes every revenue and expense account against the
//! result account; the opening entry carries every balance-sheet account into
//! the first period of the next year. Both are plain line sets here; the
//! storage layer turns them into entries.

use rust_decimal::Decimal;

use super::types::{ClosingStatus, FiscalClosing};
use crate::accounts::{Account, AccountType, ChartOfAccounts};
use crate::fiscal::{AccountingPeriod, FiscalYear, PeriodStatus};
use crate::ledger::{AccountBalances, LedgerError, LineInput};

/// Closing computation service.
pub struct ClosingService;

impl ClosingService {
    /// Preconditions of `generate`.
    ///
    /// # Errors
    ///
    /// - `AlreadyClosed` if the year is closed or its closing is past `DRAFT`
    /// - `NoPeriods` if the year has no period
    /// - `OpenPeriodsRemain` unless every period is locked or closed
    /// - `DraftEntriesRemain` if drafts exist in the year
    pub fn check_can_generate(
        year: &FiscalYear,
        existing: Option<&FiscalClosing>,
        periods: &[&AccountingPeriod],
        draft_count: usize,
    ) -> Result<(), LedgerError> {
        if year.is_closed || existing.is_some_and(|c| c.status != ClosingStatus::Draft) {
            return Err(LedgerError::AlreadyClosed(year.id));
        }
        if periods.is_empty() {
            return Err(LedgerError::NoPeriods(year.id));
        }
        let open_periods: Vec<_> = periods
            .iter()
            .filter(|p| p.status == PeriodStatus::Open)
            .map(|p| p.id)
            .collect();
        if !open_periods.is_empty() {
            return Err(LedgerError::OpenPeriodsRemain {
                fiscal_year_id: year.id,
                open_periods,
            });
        }
        if draft_count > 0 {
            return Err(LedgerError::DraftEntriesRemain {
                fiscal_year_id: year.id,
                count: draft_count,
            });
        }
        Ok(())
    }

    /// Resolves the result account, which must be an equity account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `InvalidResultAccount`.
    pub fn result_account<'a>(chart: &'a ChartOfAccounts, code: &str) -> Result<&'a Account, LedgerError> {
        let account = chart.resolve(code)?;
        if account.account_type != AccountType::Equity {
            return Err(LedgerError::InvalidResultAccount(code.to_string()));
        }
        Ok(account)
    }

    /// Lines zeroing each revenue and expense account, balanced on the result
    /// account. Accounts are ordered by code; zero balances are skipped.
    #[must_use]
    pub fn closing_lines(chart: &ChartOfAccounts, balances: &AccountBalances, result: &Account) -> Vec<LineInput> {
        let mut lines = Vec::new();
        let mut net_total = Decimal::ZERO;

        for account in chart.accounts().into_iter().filter(|a| a.account_type.is_income_statement()) {
            let net = balances.get(account.id).net();
            if net.is_zero() {
                continue;
            }
            net_total += net;
            lines.push(Self::zeroing_line(account, net).with_label(format!("Clôture {}", account.code)));
        }

        // net_total > 0 is a loss (expenses exceed revenue)
        if net_total > Decimal::ZERO {
            lines.push(LineInput::debit(&result.code, net_total).with_label("Résultat de l'exercice"));
        } else if net_total < Decimal::ZERO {
            lines.push(LineInput::credit(&result.code, -net_total).with_label("Résultat de l'exercice"));
        }

        if lines.is_empty() {
            lines.push(LineInput::placeholder(&result.code).with_label("Résultat de l'exercice"));
        }
        lines
    }

    /// Lines reopening each balance-sheet account with its ending balance.
    ///
    /// `balances` must already include the closing entry.
    #[must_use]
    pub fn opening_lines(chart: &ChartOfAccounts, balances: &AccountBalances, result: &Account) -> Vec<LineInput> {
        let mut lines: Vec<LineInput> = chart
            .accounts()
            .into_iter()
            .filter(|a| a.account_type.is_balance_sheet())
            .filter_map(|account| {
                let net = balances.get(account.id).net();
                if net.is_zero() {
                    return None;
                }
                let line = if net > Decimal::ZERO {
                    LineInput::debit(&account.code, net)
                } else {
                    LineInput::credit(&account.code, -net)
                };
                Some(line.with_label(format!("À-nouveau {}", account.code)))
            })
            .collect();

        if lines.is_empty() {
            lines.push(LineInput::placeholder(&result.code).with_label("À-nouveaux"));
        }
        lines
    }

    /// Opposite of the account's net balance.
    fn zeroing_line(account: &Account, net: Decimal) -> LineInput {
        if net > Decimal::ZERO {
            LineInput::credit(&account.code, net)
        } else {
            LineInput::debit(&account.code, -net)
        }
    }
}
