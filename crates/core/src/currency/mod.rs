//! Multi-currency handling and exchange rates.

pub mod exchange;
pub mod service;

#[cfg(test)]
mod props;

pub use exchange::{ExchangeRate, ExchangeRateTable, RateKey};
pub use service::CurrencyService;
