//! Ledger seeder for development and demos.
//!
//! Seeds the SYSCOHADA starter chart and journals for a tenant, opens a
//! fiscal year with monthly periods, posts one demo sale and verifies the
//! audit chain.
//!
//! Usage: cargo run --bin seeder [YEAR]

use anyhow::{Context, bail};
use chrono::NaiveDate;
use lyne_core::audit::RequestContext;
use lyne_core::ledger::{EntryInput, LineInput};
use lyne_db::repositories::CreateFiscalYearInput;
use lyne_db::{ChainVerification, LedgerEngine};
use lyne_shared::AppConfig;
use lyne_shared::types::TenantId;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Demo tenant (stable across runs).
const DEMO_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;

    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    let year: i32 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid year: {arg}"))?,
        None => 2026,
    };
    let start = NaiveDate::from_ymd_opt(year, 1, 1).context("year out of range")?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).context("year out of range")?;

    let tenant_id: TenantId = DEMO_TENANT_ID.parse()?;
    let engine = LedgerEngine::new(config.ledger.clone());
    engine
        .database()
        .register_tenant(tenant_id, config.ledger.base_currency)?;
    let ctx = RequestContext::system(tenant_id).with_source("seeder");

    let report = engine.seed().seed_syscohada(&ctx).await?;
    info!(
        accounts = report.accounts_created,
        journals = report.journals_created,
        "Starter data ready"
    );

    let fiscal_year = engine
        .fiscal()
        .create_fiscal_year(&ctx, CreateFiscalYearInput::monthly(format!("FY{year}"), start, end))
        .await?;
    let first = fiscal_year.periods.first().context("fiscal year has no period")?;

    let posted = engine
        .post_entry(
            &ctx,
            EntryInput::new("VT", first.id, "Vente de démonstration")
                .on(first.date_start)
                .line(LineInput::debit("411", dec!(118000)))
                .line(LineInput::credit("701", dec!(100000)))
                .line(LineInput::credit("4457", dec!(18000))),
        )
        .await?;
    info!(reference = %posted.reference, entry_id = %posted.entry_id, "Demo entry posted");

    match engine.verify_audit_chain(tenant_id).await? {
        ChainVerification::Intact { events } => info!(events, "Audit chain intact"),
        ChainVerification::Tampered { event_id, position } => {
            bail!("audit chain tampered at event {event_id} (position {position})")
        }
    }

    Ok(())
}
