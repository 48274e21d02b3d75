//! Property-based tests for LedgerService.
//!
//! - Property 1: accepted entries balance exactly
//! - Property 2: any imbalance is rejected with the computed totals
//! - Property 3: generated references are strictly increasing per journal

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use lyne_shared::types::Currency;

use super::book::JournalBook;
use super::error::LedgerError;
use super::service::{LedgerService, PostingContext};
use super::types::{EntryInput, Journal, JournalType, LineInput, NewJournal, PostingOrigin};
use crate::accounts::{AccountType, ChartOfAccounts, NewAccount};
use crate::currency::ExchangeRateTable;
use crate::fiscal::{AccountingPeriod, FiscalYear};

const CODES: [&str; 4] = ["411", "512", "601", "701"];

/// Strategy to generate positive XOF amounts (1 to 10,000,000).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(Decimal::from)
}

/// Strategy to generate one side of an entry as (account index, amount) pairs.
fn side() -> impl Strategy<Value = Vec<(usize, Decimal)>> {
    prop::collection::vec((0usize..CODES.len(), positive_amount()), 1..6)
}

struct Setup {
    chart: ChartOfAccounts,
    rates: ExchangeRateTable,
    book: JournalBook,
    journal: Journal,
    period: AccountingPeriod,
}

fn setup() -> Setup {
    let mut chart = ChartOfAccounts::new();
    for (code, account_type) in [
        ("411", AccountType::Asset),
        ("512", AccountType::Asset),
        ("601", AccountType::Expense),
        ("701", AccountType::Revenue),
    ] {
        let account = chart.prepare(&NewAccount::new(code, code, account_type)).unwrap();
        chart.put(account);
    }
    let mut book = JournalBook::new();
    let journal = book
        .prepare_journal(&NewJournal::new("OD", "Opérations diverses", JournalType::General), &chart)
        .unwrap();
    book.put_journal(journal.clone());

    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let year = FiscalYear::new("FY2026", start, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()).unwrap();
    let period = AccountingPeriod::new(&year, "2026-01", start, end).unwrap();

    Setup {
        chart,
        rates: ExchangeRateTable::new(),
        book,
        journal,
        period,
    }
}

fn build_input(period: &AccountingPeriod, debits: &[(usize, Decimal)], credits: &[(usize, Decimal)]) -> EntryInput {
    let mut input = EntryInput::new("OD", period.id, "prop");
    for (i, amount) in debits {
        input = input.line(LineInput::debit(CODES[*i], *amount));
    }
    for (i, amount) in credits {
        input = input.line(LineInput::credit(CODES[*i], *amount));
    }
    input
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1 and 2: a draft is accepted iff Σdebit == Σcredit.
    #[test]
    fn prop_balance_decides_acceptance(debits in side(), credits in side()) {
        let s = setup();
        let ctx = PostingContext {
            chart: &s.chart,
            rates: &s.rates,
            book: &s.book,
            base_currency: Currency::Xof,
            origin: PostingOrigin::Manual,
        };
        let input = build_input(&s.period, &debits, &credits);
        let total_debit: Decimal = debits.iter().map(|(_, a)| *a).sum();
        let total_credit: Decimal = credits.iter().map(|(_, a)| *a).sum();

        let result = LedgerService::build_draft(&ctx, &s.journal, &s.period, &input, s.period.date_start, Utc::now());

        if total_debit == total_credit {
            let entry = result.unwrap();
            let totals = entry.totals();
            prop_assert_eq!(totals.debit, totals.credit);
        } else {
            match result {
                Err(LedgerError::UnbalancedEntry { debit, credit, .. }) => {
                    prop_assert_eq!(debit, total_debit);
                    prop_assert_eq!(credit, total_credit);
                }
                other => prop_assert!(false, "expected UnbalancedEntry, got {:?}", other),
            }
        }
    }

    /// Balanced by construction: the credit side mirrors the debit side.
    #[test]
    fn prop_mirrored_entries_always_post(debits in side()) {
        let s = setup();
        let ctx = PostingContext {
            chart: &s.chart,
            rates: &s.rates,
            book: &s.book,
            base_currency: Currency::Xof,
            origin: PostingOrigin::Manual,
        };
        let input = build_input(&s.period, &debits, &debits);
        let draft = LedgerService::build_draft(&ctx, &s.journal, &s.period, &input, s.period.date_start, Utc::now()).unwrap();
        let posting = LedgerService::post(&s.book, &draft, &s.journal, &s.period, 6, Utc::now()).unwrap();

        let totals = posting.entry.totals();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert_eq!(posting.entry.lines.len(), debits.len() * 2);
    }

    /// Property 3: consecutive postings in one journal get consecutive references.
    #[test]
    fn prop_references_increase(count in 1usize..30) {
        let mut s = setup();
        let mut previous: Option<String> = None;

        for n in 1..=count {
            let input = build_input(&s.period, &[(0, Decimal::ONE)], &[(3, Decimal::ONE)]);
            let ctx = PostingContext {
                chart: &s.chart,
                rates: &s.rates,
                book: &s.book,
                base_currency: Currency::Xof,
                origin: PostingOrigin::Manual,
            };
            let draft = LedgerService::build_draft(&ctx, &s.journal, &s.period, &input, s.period.date_start, Utc::now()).unwrap();
            let posting = LedgerService::post(&s.book, &draft, &s.journal, &s.period, 6, Utc::now()).unwrap();

            let reference = posting.entry.reference.clone().unwrap();
            prop_assert_eq!(posting.sequence, Some(n as u64));
            prop_assert_eq!(&reference, &format!("OD-2026-01-{n:06}"));
            if let Some(prev) = &previous {
                prop_assert!(prev < &reference);
            }
            previous = Some(reference);

            s.book.set_sequence(s.journal.id, n as u64);
            s.book.put_entry(posting.entry);
        }
    }
}
