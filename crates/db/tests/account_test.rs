//! Chart of accounts and journal maintenance.

mod common;

use common::fixture;
use lyne_core::LedgerError;
use lyne_core::accounts::{AccountType, NewAccount};
use lyne_core::audit::AuditAction;
use lyne_core::ledger::{EntryInput, JournalType, LineInput, NewJournal};
use lyne_db::repositories::{ACCOUNT_MODEL, JOURNAL_MODEL};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_hierarchy_full_path() {
    let fx = fixture().await;
    let accounts = fx.engine.accounts();
    accounts
        .create_account(&fx.ctx, NewAccount::new("4", "Tiers", AccountType::Asset))
        .await
        .unwrap();
    accounts
        .create_account(&fx.ctx, NewAccount::new("41", "Clients et comptes rattachés", AccountType::Asset).with_parent("4"))
        .await
        .unwrap();
    accounts
        .create_account(&fx.ctx, NewAccount::new("4111", "Clients export", AccountType::Asset).with_parent("41"))
        .await
        .unwrap();

    let path = accounts.full_path(fx.ctx.tenant_id, "4111").await.unwrap();
    assert_eq!(path, "4 / 41 / 4111");

    let err = accounts.delete_account(&fx.ctx, "41").await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInUse { code, .. } if code == "41"));
}

#[tokio::test]
async fn test_duplicate_and_unknown_parent_rejected() {
    let fx = fixture().await;
    let accounts = fx.engine.accounts();

    let duplicate = accounts
        .create_account(&fx.ctx, NewAccount::new("411", "Doublon", AccountType::Asset))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, LedgerError::DuplicateCode { kind: "account", .. }));

    let orphan = accounts
        .create_account(&fx.ctx, NewAccount::new("999", "Orphelin", AccountType::Asset).with_parent("99"))
        .await
        .unwrap_err();
    assert!(matches!(orphan, LedgerError::AccountNotFound(code) if code == "99"));
}

#[tokio::test]
async fn test_control_account_deactivation_needs_override() {
    let fx = fixture().await;
    fx.post(fx.sale("2026-01", 5, dec!(100))).await;
    let accounts = fx.engine.accounts();

    let err = accounts.deactivate_account(&fx.ctx, "411", false).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInUse { .. }));

    let deactivated = accounts.deactivate_account(&fx.ctx, "411", true).await.unwrap();
    assert!(!deactivated.is_active);

    let events = fx
        .engine
        .audit()
        .events_for(fx.ctx.tenant_id, ACCOUNT_MODEL, &deactivated.id.to_string())
        .await
        .unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.action, AuditAction::Update);
    assert_eq!(last.meta.to_value().unwrap()["override_control"], true);

    let posting = fx
        .engine
        .post_entry(&fx.ctx, fx.sale("2026-01", 6, dec!(100)))
        .await
        .unwrap_err();
    assert!(matches!(posting, LedgerError::AccountInactive(code) if code == "411"));
}

#[tokio::test]
async fn test_system_only_account_rejects_manual_lines() {
    let fx = fixture().await;
    fx.engine
        .accounts()
        .create_account(&fx.ctx, NewAccount::new("4711", "Compte d'attente", AccountType::Asset).system_only())
        .await
        .unwrap();

    let input = EntryInput {
        lines: vec![LineInput::debit("4711", dec!(10)), LineInput::credit("701", dec!(10))],
        ..fx.sale("2026-01", 5, dec!(10))
    };
    let err = fx.engine.post_entry(&fx.ctx, input).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountManualPostingDisabled(code) if code == "4711"));
}

#[tokio::test]
async fn test_account_with_lines_cannot_be_deleted() {
    let fx = fixture().await;
    fx.post(fx.sale("2026-01", 5, dec!(100))).await;

    let err = fx.engine.accounts().delete_account(&fx.ctx, "701").await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInUse { .. }));

    fx.engine.accounts().delete_account(&fx.ctx, "707").await.unwrap();
    let gone = fx.engine.accounts().get_account(fx.ctx.tenant_id, "707").await.unwrap_err();
    assert!(matches!(gone, LedgerError::AccountNotFound(_)));
}

#[tokio::test]
async fn test_journal_maintenance() {
    let fx = fixture().await;
    let journals = fx.engine.journals();

    let created = journals
        .create_journal(
            &fx.ctx,
            NewJournal::new("BQ2", "Banque secondaire", JournalType::Bank).with_defaults(Some("512"), None),
        )
        .await
        .unwrap();
    assert!(created.default_debit_account_id.is_some());

    let unknown = journals
        .create_journal(
            &fx.ctx,
            NewJournal::new("BQ3", "Banque", JournalType::Bank).with_defaults(Some("5129"), None),
        )
        .await
        .unwrap_err();
    assert!(matches!(unknown, LedgerError::AccountNotFound(_)));

    fx.post(fx.sale("2026-01", 5, dec!(100))).await;
    let in_use = journals.delete_journal(&fx.ctx, "VT").await.unwrap_err();
    assert!(matches!(in_use, LedgerError::JournalInUse { code, .. } if code == "VT"));

    journals.delete_journal(&fx.ctx, "BQ2").await.unwrap();
    let events = fx
        .engine
        .audit()
        .events_for(fx.ctx.tenant_id, JOURNAL_MODEL, &created.id.to_string())
        .await
        .unwrap();
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Delete]);
}
