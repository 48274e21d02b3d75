//! Business rule validation for ledger operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use lyne_shared::types::JournalEntryId;

use super::error::LedgerError;
use super::types::{EntryTotals, JournalEntry, JournalLine};
use crate::closing::FISCAL_CLOSING_MODEL;
use crate::fiscal::AccountingPeriod;

/// Checks a single line: no negative amount, never both sides positive.
///
/// # Errors
///
/// Returns `InvalidLineSign`.
pub fn check_line_sign(line: usize, debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
    let negative = debit < Decimal::ZERO || credit < Decimal::ZERO;
    let both = debit > Decimal::ZERO && credit > Decimal::ZERO;
    if negative || both {
        return Err(LedgerError::InvalidLineSign { line, debit, credit });
    }
    Ok(())
}

/// Validates the lines of an entry and returns its totals.
///
/// Placeholder lines (both amounts zero) are allowed and contribute nothing.
/// Balance is exact decimal equality.
///
/// # Errors
///
/// Returns `EmptyEntry`, `InvalidLineSign` or `UnbalancedEntry`.
pub fn validate_lines(
    entry_id: Option<JournalEntryId>,
    lines: &[JournalLine],
) -> Result<EntryTotals, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;
    for (index, line) in lines.iter().enumerate() {
        check_line_sign(index, line.debit, line.credit)?;
        debit += line.debit;
        credit += line.credit;
    }

    let totals = EntryTotals::new(debit, credit);
    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry {
            entry_id,
            debit,
            credit,
        });
    }
    Ok(totals)
}

/// New drafts require an open period.
///
/// # Errors
///
/// Returns `PeriodNotOpen`.
pub fn ensure_accepts_drafts(period: &AccountingPeriod) -> Result<(), LedgerError> {
    if !period.status.accepts_drafts() {
        return Err(LedgerError::PeriodNotOpen {
            period_id: period.id,
            status: period.status,
        });
    }
    Ok(())
}

/// Posting or cancelling an existing draft requires an open or locked period.
///
/// # Errors
///
/// Returns `PeriodNotOpen` for a closed period.
pub fn ensure_accepts_postings(period: &AccountingPeriod) -> Result<(), LedgerError> {
    if !period.status.accepts_postings() {
        return Err(LedgerError::PeriodNotOpen {
            period_id: period.id,
            status: period.status,
        });
    }
    Ok(())
}

/// The entry date must fall inside the period.
///
/// # Errors
///
/// Returns `EntryDateOutsidePeriod`.
pub fn ensure_date_in_period(date: NaiveDate, period: &AccountingPeriod) -> Result<(), LedgerError> {
    if !period.contains(date) {
        return Err(LedgerError::EntryDateOutsidePeriod {
            date,
            period_id: period.id,
            start: period.date_start,
            end: period.date_end,
        });
    }
    Ok(())
}

/// Entries generated by a fiscal closing are posted or discarded by the
/// closing alone.
///
/// # Errors
///
/// Returns `EntryManagedByClosing`.
pub fn ensure_not_closing_entry(entry: &JournalEntry) -> Result<(), LedgerError> {
    match (entry.source_model.as_deref(), &entry.source_object_id) {
        (Some(FISCAL_CLOSING_MODEL), Some(closing_id)) => Err(LedgerError::EntryManagedByClosing {
            entry_id: entry.id,
            closing_id: closing_id.clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::{FiscalYear, PeriodStatus};
    use crate::ledger::types::EntryStatus;
    use chrono::Utc;
    use lyne_shared::types::{AccountId, AccountingPeriodId, Currency, JournalId, JournalLineId};
    use rust_decimal_macros::dec;

    fn line(debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            entry_id: JournalEntryId::new(),
            account_id: AccountId::new(),
            label: String::new(),
            debit,
            credit,
            currency: Currency::Xof,
            amount_currency: debit - credit,
        }
    }

    fn period(status: PeriodStatus) -> AccountingPeriod {
        let year = FiscalYear::new(
            "FY2026",
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        )
        .unwrap();
        let mut period = AccountingPeriod::new(
            &year,
            "2026-01",
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
        .unwrap();
        period.status = status;
        period
    }

    #[test]
    fn test_balanced_lines() {
        let totals = validate_lines(None, &[line(dec!(1000), dec!(0)), line(dec!(0), dec!(1000))]).unwrap();
        assert_eq!(totals.debit, dec!(1000));
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_unbalanced_lines_report_totals() {
        let result = validate_lines(None, &[line(dec!(1000), dec!(0)), line(dec!(0), dec!(900))]);
        assert!(matches!(
            result,
            Err(LedgerError::UnbalancedEntry { debit, credit, .. }) if debit == dec!(1000) && credit == dec!(900)
        ));
    }

    #[test]
    fn test_no_rounding_tolerance() {
        let result = validate_lines(None, &[line(dec!(100.01), dec!(0)), line(dec!(0), dec!(100.00))]);
        assert!(matches!(result, Err(LedgerError::UnbalancedEntry { .. })));
    }

    #[test]
    fn test_empty_entry() {
        assert!(matches!(validate_lines(None, &[]), Err(LedgerError::EmptyEntry)));
    }

    #[test]
    fn test_placeholder_lines_allowed() {
        assert!(validate_lines(None, &[line(dec!(0), dec!(0))]).is_ok());
    }

    #[test]
    fn test_line_sign_rules() {
        assert!(matches!(
            validate_lines(None, &[line(dec!(10), dec!(10))]),
            Err(LedgerError::InvalidLineSign { line: 0, .. })
        ));
        assert!(matches!(
            validate_lines(None, &[line(dec!(10), dec!(0)), line(dec!(-10), dec!(0))]),
            Err(LedgerError::InvalidLineSign { line: 1, .. })
        ));
    }

    #[test]
    fn test_period_rules() {
        assert!(ensure_accepts_drafts(&period(PeriodStatus::Open)).is_ok());
        assert!(matches!(
            ensure_accepts_drafts(&period(PeriodStatus::Locked)),
            Err(LedgerError::PeriodNotOpen { status: PeriodStatus::Locked, .. })
        ));
        assert!(ensure_accepts_postings(&period(PeriodStatus::Locked)).is_ok());
        assert!(ensure_accepts_postings(&period(PeriodStatus::Closed)).is_err());
    }

    #[test]
    fn test_date_in_period() {
        let period = period(PeriodStatus::Open);
        assert!(ensure_date_in_period(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(), &period).is_ok());
        assert!(matches!(
            ensure_date_in_period(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), &period),
            Err(LedgerError::EntryDateOutsidePeriod { .. })
        ));
    }

    #[test]
    fn test_closing_entries_are_guarded() {
        let mut entry = JournalEntry {
            id: JournalEntryId::new(),
            journal_id: JournalId::new(),
            period_id: AccountingPeriodId::new(),
            entry_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            reference: None,
            label: "Clôture FY2026".into(),
            status: EntryStatus::Draft,
            source_model: None,
            source_object_id: None,
            reversed_by: None,
            lines: vec![line(dec!(0), dec!(0))],
            created_at: Utc::now(),
            posted_at: None,
        };
        assert!(ensure_not_closing_entry(&entry).is_ok());

        entry.source_model = Some(FISCAL_CLOSING_MODEL.to_string());
        entry.source_object_id = Some("closing-1".to_string());
        assert!(matches!(
            ensure_not_closing_entry(&entry),
            Err(LedgerError::EntryManagedByClosing { closing_id, .. }) if closing_id == "closing-1"
        ));
    }
}
