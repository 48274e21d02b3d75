//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base (functional) currency for tenants without a finance profile.
    #[serde(default = "default_base_currency")]
    pub base_currency: Currency,
    /// Code of the journal receiving year-end closing entries.
    #[serde(default = "default_closing_journal_code")]
    pub closing_journal_code: String,
    /// Code of the journal receiving opening (carried-forward) entries.
    #[serde(default = "default_opening_journal_code")]
    pub opening_journal_code: String,
    /// Equity account receiving the net result at year end.
    #[serde(default = "default_result_account_code")]
    pub result_account_code: String,
    /// Zero-padding width of the journal sequence in references.
    #[serde(default = "default_reference_padding")]
    pub reference_padding: usize,
    /// How long a writer waits for a row lock before giving up.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_base_currency() -> Currency {
    Currency::Xof
}

fn default_closing_journal_code() -> String {
    "CLO".to_string()
}

fn default_opening_journal_code() -> String {
    "AN".to_string()
}

fn default_result_account_code() -> String {
    "12".to_string()
}

fn default_reference_padding() -> usize {
    6
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            closing_journal_code: default_closing_journal_code(),
            opening_journal_code: default_opening_journal_code(),
            result_account_code: default_result_account_code(),
            reference_padding: default_reference_padding(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "lyne=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LYNE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
