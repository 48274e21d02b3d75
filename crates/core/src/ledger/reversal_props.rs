//! Property-based tests for reversals.
//!
//! - Property 4: a reversal swaps every line and leaves the original untouched
//! - Property 5: original plus reversal nets every account to zero

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use lyne_shared::types::{
    AccountId, AccountingPeriodId, Currency, JournalEntryId, JournalId, JournalLineId,
};

use super::balance::AccountBalances;
use super::reversal::ReversalService;
use super::types::{EntryStatus, JournalEntry, JournalLine};
use crate::fiscal::{AccountingPeriod, FiscalYear};

/// Strategy to generate line amounts with two decimal places.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate one line as (debit side?, amount, account index).
fn line_spec() -> impl Strategy<Value = (bool, Decimal, usize)> {
    (any::<bool>(), amount(), 0usize..5)
}

fn posted(specs: &[(bool, Decimal, usize)], accounts: &[AccountId]) -> JournalEntry {
    let id = JournalEntryId::new();
    JournalEntry {
        id,
        journal_id: JournalId::new(),
        period_id: AccountingPeriodId::new(),
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        reference: Some("OD-2026-01-000001".into()),
        label: "prop".into(),
        status: EntryStatus::Posted,
        source_model: None,
        source_object_id: None,
        reversed_by: None,
        lines: specs
            .iter()
            .map(|(is_debit, amount, account)| {
                let (debit, credit) = if *is_debit {
                    (*amount, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, *amount)
                };
                JournalLine {
                    id: JournalLineId::new(),
                    entry_id: id,
                    account_id: accounts[*account],
                    label: String::new(),
                    debit,
                    credit,
                    currency: Currency::Eur,
                    amount_currency: debit - credit,
                }
            })
            .collect(),
        created_at: Utc::now(),
        posted_at: Some(Utc::now()),
    }
}

fn period() -> AccountingPeriod {
    let year = FiscalYear::new(
        "FY2026",
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    )
    .unwrap();
    AccountingPeriod::new(
        &year,
        "2026-02",
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 4: E.debit_i == E'.credit_i and E.credit_i == E'.debit_i.
    #[test]
    fn prop_reversal_swaps_lines(specs in prop::collection::vec(line_spec(), 1..10)) {
        let accounts: Vec<AccountId> = (0..5).map(|_| AccountId::new()).collect();
        let original = posted(&specs, &accounts);
        let snapshot = original.clone();
        let target = period();

        let reversal = ReversalService::build(&original, &target, target.date_start, Utc::now());

        prop_assert_eq!(&original, &snapshot);
        prop_assert_eq!(reversal.lines.len(), original.lines.len());
        for (o, r) in original.lines.iter().zip(&reversal.lines) {
            prop_assert_eq!(o.debit, r.credit);
            prop_assert_eq!(o.credit, r.debit);
            prop_assert_eq!(o.account_id, r.account_id);
        }
        prop_assert_eq!(reversal.period_id, target.id);

        let marked = ReversalService::mark_reversed(&original, reversal.id);
        prop_assert_eq!(&marked.lines, &original.lines);
    }

    /// Property 5: booked original + posted reversal cancel out per account.
    #[test]
    fn prop_reversal_nets_to_zero(specs in prop::collection::vec(line_spec(), 1..10)) {
        let accounts: Vec<AccountId> = (0..5).map(|_| AccountId::new()).collect();
        let original = posted(&specs, &accounts);
        let target = period();

        let mut reversal = ReversalService::build(&original, &target, target.date_start, Utc::now());
        reversal.status = EntryStatus::Posted;
        let marked = ReversalService::mark_reversed(&original, reversal.id);

        let balances = AccountBalances::from_entries([&marked, &reversal]);
        for balance in balances.iter() {
            prop_assert_eq!(balance.net(), Decimal::ZERO);
        }
    }
}
