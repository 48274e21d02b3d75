//! Exchange rate rows and the per-tenant exact-date rate table.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use lyne_shared::types::{Currency, ExchangeRateId};

use crate::ledger::LedgerError;

/// Exchange rate between two currencies on one date.
///
/// Convention: `1 quote = rate × base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Unique identifier.
    pub id: ExchangeRateId,
    /// Date this rate applies to.
    pub date: NaiveDate,
    /// Base currency.
    pub base: Currency,
    /// Quote currency.
    pub quote: Currency,
    /// Units of base per unit of quote.
    pub rate: Decimal,
    /// Where the rate came from (e.g., "BCEAO", "manual").
    pub source: String,
    /// Locked rates can no longer be changed.
    pub is_locked: bool,
}

impl ExchangeRate {
    /// Creates an unlocked rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExchangeRate` if `rate <= 0` and `SameCurrencyExchange`
    /// if `base == quote`.
    pub fn new(
        date: NaiveDate,
        base: Currency,
        quote: Currency,
        rate: Decimal,
        source: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        validate_rate(base, quote, rate)?;
        Ok(Self {
            id: ExchangeRateId::new(),
            date,
            base,
            quote,
            rate,
            source: source.into(),
            is_locked: false,
        })
    }

    /// Lookup key of this rate.
    #[must_use]
    pub fn key(&self) -> RateKey {
        RateKey {
            date: self.date,
            base: self.base,
            quote: self.quote,
        }
    }

    /// Display form, `"EUR/XOF 2026-01-15"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{} {}", self.quote, self.base, self.date)
    }
}

/// Unique key of a rate within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    /// Rate date.
    pub date: NaiveDate,
    /// Base currency.
    pub base: Currency,
    /// Quote currency.
    pub quote: Currency,
}

fn validate_rate(base: Currency, quote: Currency, rate: Decimal) -> Result<(), LedgerError> {
    if base == quote {
        return Err(LedgerError::SameCurrencyExchange(base));
    }
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidExchangeRate(rate));
    }
    Ok(())
}

/// Exchange rates of one tenant keyed by `(date, base, quote)`.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateTable {
    rates: HashMap<RateKey, ExchangeRate>,
}

impl ExchangeRateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-date lookup. No interpolation and no fallback to older rates.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate` if no rate exists for that exact date.
    pub fn rate(&self, date: NaiveDate, base: Currency, quote: Currency) -> Result<Decimal, LedgerError> {
        self.get(date, base, quote)
            .map(|r| r.rate)
            .ok_or(LedgerError::NoExchangeRate { base, quote, date })
    }

    /// The stored row for a key, if any.
    #[must_use]
    pub fn get(&self, date: NaiveDate, base: Currency, quote: Currency) -> Option<&ExchangeRate> {
        self.rates.get(&RateKey { date, base, quote })
    }

    /// Looks up a row that must exist.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate` when missing.
    pub fn require(&self, date: NaiveDate, base: Currency, quote: Currency) -> Result<&ExchangeRate, LedgerError> {
        self.get(date, base, quote)
            .ok_or(LedgerError::NoExchangeRate { base, quote, date })
    }

    /// Rates dated within `[start, end]`, ordered by key.
    #[must_use]
    pub fn rates_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&ExchangeRate> {
        let mut rates: Vec<_> = self
            .rates
            .values()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();
        rates.sort_by_key(|r| r.key());
        rates
    }

    /// Checks a new rate for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if a rate already exists for the key.
    pub fn check_new(&self, rate: &ExchangeRate) -> Result<(), LedgerError> {
        if self.rates.contains_key(&rate.key()) {
            return Err(LedgerError::DuplicateCode {
                kind: "exchange rate",
                code: rate.label(),
            });
        }
        Ok(())
    }

    /// Returns a copy of the stored rate with a new value.
    ///
    /// # Errors
    ///
    /// Returns `NoExchangeRate` when missing, `RateLocked` when the row is locked,
    /// and the validation errors of [`ExchangeRate::new`].
    pub fn updated(
        &self,
        date: NaiveDate,
        base: Currency,
        quote: Currency,
        rate: Decimal,
    ) -> Result<ExchangeRate, LedgerError> {
        let existing = self.require(date, base, quote)?;
        if existing.is_locked {
            return Err(LedgerError::RateLocked { base, quote, date });
        }
        validate_rate(base, quote, rate)?;
        Ok(ExchangeRate {
            rate,
            ..existing.clone()
        })
    }

    /// Inserts or replaces a rate.
    pub fn put(&mut self, rate: ExchangeRate) {
        self.rates.insert(rate.key(), rate);
    }
}
