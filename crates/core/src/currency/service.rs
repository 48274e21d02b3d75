//! Currency conversion into the ledger's base currency.

use rust_decimal::Decimal;
use lyne_shared::types::{Currency, Money};

use crate::ledger::LedgerError;

/// Currency service for conversion operations.
///
/// All rounding uses Banker's Rounding (`MidpointNearestEven`) to the minor
/// unit of the target currency.
pub struct CurrencyService;

impl CurrencyService {
    /// Converts a quote-currency amount into base currency.
    ///
    /// With the convention `1 quote = rate × base`, the base amount is
    /// `amount × rate`, rounded to the base currency's minor unit.
    ///
    /// # Example
    ///
    /// ```
    /// use lyne_core::currency::CurrencyService;
    /// use lyne_shared::types::Currency;
    /// use rust_decimal_macros::dec;
    ///
    /// let base = CurrencyService::to_base(dec!(100), dec!(655.957), Currency::Xof);
    /// assert_eq!(base, dec!(65596));
    /// ```
    #[must_use]
    pub fn to_base(amount: Decimal, rate: Decimal, base: Currency) -> Decimal {
        Self::round(amount * rate, base)
    }

    /// Converts a base-currency amount back into the quote currency.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExchangeRate` for a non-positive rate.
    pub fn from_base(amount: Decimal, rate: Decimal, quote: Currency) -> Result<Decimal, LedgerError> {
        if rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidExchangeRate(rate));
        }
        amount
            .checked_div(rate)
            .map(|v| Self::round(v, quote))
            .ok_or(LedgerError::InvalidExchangeRate(rate))
    }

    /// Rounds to the currency's minor unit.
    #[must_use]
    pub fn round(amount: Decimal, currency: Currency) -> Decimal {
        Money::new(amount, currency).rounded().amount
    }
}
