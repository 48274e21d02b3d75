//! Chart of accounts: account types, the per-tenant registry and the
//! SYSCOHADA starter set.

pub mod chart;
pub mod syscohada;
pub mod types;

pub use chart::ChartOfAccounts;
pub use types::{Account, AccountType, NewAccount};
