//! Core ledger logic for Lyne.
//!
//! This crate contains pure business logic with ZERO storage or locking dependencies.
//! Domain types, validation rules, and audit hashing live here; `lyne-db` owns
//! persistence and transactions.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts and the SYSCOHADA starter set
//! - `audit` - Hash-chained audit events
//! - `closing` - Fiscal year closing and carry-forward
//! - `currency` - Exchange rates and base-currency conversion
//! - `fiscal` - Fiscal years and accounting periods
//! - `ledger` - Journals, entries, posting and reversal

pub mod accounts;
pub mod audit;
pub mod closing;
pub mod currency;
pub mod fiscal;
pub mod ledger;

pub use ledger::{ErrorCategory, LedgerError};
