//! Property-based tests for currency conversion.
//!
//! - Banker's rounding to the currency minor unit
//! - Round trip through the base currency stays within one minor unit

use proptest::prelude::*;
use rust_decimal::Decimal;
use lyne_shared::types::Currency;

use super::service::CurrencyService;

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 0.0001 to 10,000.0000.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Xof),
        Just(Currency::Xaf),
        Just(Currency::Eur),
        Just(Currency::Usd),
        Just(Currency::Gbp),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The base amount never carries more decimals than the base currency.
    #[test]
    fn prop_to_base_respects_minor_unit(
        amount in positive_amount(),
        rate in positive_rate(),
        base in currency(),
    ) {
        let result = CurrencyService::to_base(amount, rate, base);
        prop_assert_eq!(result, result.round_dp(base.decimal_places()));
    }

    /// Rounding an already rounded amount changes nothing.
    #[test]
    fn prop_round_is_idempotent(amount in positive_amount(), currency in currency()) {
        let once = CurrencyService::round(amount, currency);
        prop_assert_eq!(CurrencyService::round(once, currency), once);
    }

    /// A unit rate preserves the amount up to rounding.
    #[test]
    fn prop_unit_rate_preserves_amount(amount in positive_amount(), base in currency()) {
        let result = CurrencyService::to_base(amount, Decimal::ONE, base);
        prop_assert_eq!(result, CurrencyService::round(amount, base));
    }

    /// A higher rate never yields a smaller base amount.
    #[test]
    fn prop_to_base_monotonic_in_rate(
        amount in positive_amount(),
        low in positive_rate(),
        delta in positive_rate(),
    ) {
        let a = CurrencyService::to_base(amount, low, Currency::Eur);
        let b = CurrencyService::to_base(amount, low + delta, Currency::Eur);
        prop_assert!(b >= a);
    }
}
