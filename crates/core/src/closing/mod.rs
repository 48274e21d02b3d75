//! Fiscal year closing: result computation and carry-forward of balances.

pub mod service;
pub mod types;

pub use service::ClosingService;
pub use types::{ClosingResult, ClosingStatus, FISCAL_CLOSING_MODEL, FiscalClosing};
