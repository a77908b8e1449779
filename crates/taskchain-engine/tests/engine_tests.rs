/*
[INPUT]:  Connection, read, and write scenarios against mock providers
[OUTPUT]: Test results for the reconciliation engine's operation surface
[POS]:    Integration tests - connection manager, read synchronizer, writer
[UPDATE]: When engine semantics or the facade surface change
*/

mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use taskchain_adapter::provider::{created_event, MINT_AMOUNT};
use taskchain_adapter::{ChainError, RevokeOutcome, RpcFault, WalletNotification};

use common::{account, harness, other_account, settle, task};

#[tokio::test]
async fn test_start_loads_tasks_and_backfills_logs() {
    let h = harness();
    h.ledger.set_tasks(vec![task(1, "buy milk"), task(2, "water plants")]);
    h.ledger
        .set_past_events(vec![created_event(1, "buy milk", None)]);

    h.app.start().await.unwrap();

    let state = h.app.snapshot().await;
    assert_eq!(state.tasks.len(), 2);
    assert_eq!(state.logs.len(), 1);
    assert_eq!(state.logs[0].text, "Task #1 created: buy milk");
    // Backfill produces durable log entries only, no notices.
    assert!(state.notices.is_empty());
    assert!(!state.is_loading);
    h.app.stop().await;
}

#[tokio::test]
async fn test_idempotent_read() {
    let h = harness();
    h.ledger.set_tasks(vec![task(1, "buy milk")]);
    h.app.start().await.unwrap();

    h.app.load_tasks().await;
    let first = h.app.snapshot().await;
    h.app.load_tasks().await;
    let second = h.app.snapshot().await;

    assert_eq!(first.tasks, second.tasks);
    assert!(!first.is_loading);
    assert!(!second.is_loading);
    assert_eq!(second.error, "");
    h.app.stop().await;
}

#[tokio::test]
async fn test_read_failure_keeps_last_known_tasks() {
    let h = harness();
    h.ledger.set_tasks(vec![task(1, "buy milk")]);
    h.app.start().await.unwrap();

    h.ledger
        .fail_reads(RpcFault::with_short_message("call reverted"));
    h.app.load_tasks().await;

    let state = h.app.snapshot().await;
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.error, "call reverted");
    assert!(!state.is_loading);

    // The next attempt clears the prior error proactively.
    h.ledger.clear_read_fault();
    h.app.load_tasks().await;
    assert_eq!(h.app.snapshot().await.error, "");
    h.app.stop().await;
}

#[tokio::test]
async fn test_connect_sets_identity_and_notice() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    let state = h.app.snapshot().await;
    assert_eq!(state.account, Some(account()));
    assert_eq!(state.chain_id, Some(common::TEST_CHAIN_ID));
    assert!(state.has_signer);
    assert_eq!(state.notices[0].text, "Wallet connected: 0xf39F…2266");
    assert_eq!(h.app.chain_identity().await.label, "Ethereum");
    assert_eq!(
        h.app.chain_identity().await.explorer_base,
        "https://etherscan.io"
    );
    h.app.stop().await;
}

#[tokio::test]
async fn test_connect_without_wallet_is_silent_noop() {
    let h = harness();
    h.wallet.set_request_error(Some(ChainError::NoWallet));
    h.app.start().await.unwrap();

    assert!(h.app.connect().await.is_ok());
    let state = h.app.snapshot().await;
    assert_eq!(state.account, None);
    assert_eq!(state.error, "");
    h.app.stop().await;
}

#[tokio::test]
async fn test_connect_rejection_surfaces_error() {
    let h = harness();
    h.wallet
        .set_request_error(Some(ChainError::UserRejected(RpcFault::with_short_message(
            "User rejected the request",
        ))));
    h.app.start().await.unwrap();

    assert!(h.app.connect().await.is_err());
    let state = h.app.snapshot().await;
    assert_eq!(state.account, None);
    assert!(!state.has_signer);
    assert_eq!(state.error, "User rejected the request");
    h.app.stop().await;
}

#[tokio::test]
async fn test_disconnect_clears_identity_and_stops_reads() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();
    h.app.disconnect().await.unwrap();

    let state = h.app.snapshot().await;
    assert_eq!(state.account, None);
    assert_eq!(state.chain_id, None);
    assert!(!state.has_signer);

    // No read client remains installed; further reloads are no-ops.
    let reads_before = h.ledger.read_calls();
    h.app.load_tasks().await;
    assert_eq!(h.ledger.read_calls(), reads_before);
    h.app.stop().await;
}

#[tokio::test]
async fn test_failed_revoke_leaves_identity_intact() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.wallet.set_revoke_outcome(RevokeOutcome::Failed(RpcFault::with_message(
        "revocation rejected",
    )));
    assert!(h.app.disconnect().await.is_err());

    let state = h.app.snapshot().await;
    assert_eq!(state.account, Some(account()));
    assert!(state.has_signer);
    assert_eq!(state.error, "revocation rejected");
    h.app.stop().await;
}

#[tokio::test]
async fn test_unsupported_revoke_leaves_identity_intact() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.wallet.set_revoke_outcome(RevokeOutcome::Unsupported);
    assert!(h.app.disconnect().await.is_err());

    let state = h.app.snapshot().await;
    assert_eq!(state.account, Some(account()));
    assert_eq!(state.error, "wallet does not support permission revocation");
    h.app.stop().await;
}

#[tokio::test]
async fn test_account_changed_notification_updates_identity() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.wallet
        .notify(WalletNotification::AccountsChanged(vec![other_account()]))
        .await;
    settle().await;
    assert_eq!(h.app.snapshot().await.account, Some(other_account()));

    h.wallet
        .notify(WalletNotification::ChainChanged(17000))
        .await;
    settle().await;
    let state = h.app.snapshot().await;
    assert_eq!(state.chain_id, Some(17000));
    assert_eq!(h.app.chain_identity().await.label, "Holesky");
    h.app.stop().await;
}

#[tokio::test]
async fn test_empty_account_list_is_full_disconnect() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.wallet
        .notify(WalletNotification::AccountsChanged(Vec::new()))
        .await;
    settle().await;

    let state = h.app.snapshot().await;
    assert_eq!(state.account, None);
    assert!(!state.has_signer);

    // Writes are no longer permitted.
    let err = h
        .app
        .create_task("buy milk".to_string(), || async {})
        .await
        .unwrap_err();
    assert_eq!(err, ChainError::NotConnected);
    h.app.stop().await;
}

#[tokio::test]
async fn test_write_without_connection_fails_fast() {
    let h = harness();
    h.ledger.set_tasks(vec![task(1, "buy milk")]);
    h.app.start().await.unwrap();
    let reads_before = h.ledger.read_calls();

    let continued = AtomicBool::new(false);
    let err = h
        .app
        .create_task("buy milk".to_string(), || async {
            continued.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    assert_eq!(err, ChainError::NotConnected);
    let state = h.app.snapshot().await;
    assert!(!state.tx_pending);
    assert_eq!(state.error, "Wallet not connected");
    assert!(!continued.load(Ordering::SeqCst));
    assert_eq!(h.ledger.write_calls(), 0);
    assert_eq!(h.ledger.read_calls(), reads_before);
    h.app.stop().await;
}

#[tokio::test]
async fn test_write_success_runs_continuation_and_clears_pending() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.app
        .create_task("buy milk".to_string(), || h.app.reload_on_success())
        .await
        .unwrap();

    let state = h.app.snapshot().await;
    assert!(!state.tx_pending);
    assert_eq!(state.error, "");
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.tasks[0].description, "buy milk");

    h.app
        .complete_task(state.tasks[0].id, || h.app.reload_on_success())
        .await
        .unwrap();
    assert!(h.app.snapshot().await.tasks[0].completed);
    h.app.stop().await;
}

#[tokio::test]
async fn test_receipt_failure_skips_continuation() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();
    h.ledger.set_receipt_failure(true);

    let continued = AtomicBool::new(false);
    let err = h
        .app
        .create_task("buy milk".to_string(), || async {
            continued.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    assert_eq!(err, ChainError::TransactionFailed);
    let state = h.app.snapshot().await;
    assert!(!state.tx_pending);
    assert_eq!(state.error, "Transaction failed");
    assert!(!continued.load(Ordering::SeqCst));
    h.app.stop().await;
}

#[tokio::test]
async fn test_submission_exception_clears_pending() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();
    h.ledger.fail_writes(ChainError::Provider(RpcFault::with_short_message(
        "insufficient funds",
    )));

    let err = h
        .app
        .update_task(1, "new text".to_string(), || async {})
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::Provider(_)));
    let state = h.app.snapshot().await;
    assert!(!state.tx_pending);
    assert_eq!(state.error, "insufficient funds");
    h.app.stop().await;
}

#[tokio::test]
async fn test_token_mint_and_transfer() {
    let h = harness();
    h.app.start().await.unwrap();
    h.app.connect().await.unwrap();

    h.app.mint(account(), || async {}).await.unwrap();
    assert_eq!(h.app.balance_of(&account()).await, MINT_AMOUNT);

    h.app
        .transfer(other_account(), 400, || async {})
        .await
        .unwrap();
    assert_eq!(h.app.balance_of(&account()).await, MINT_AMOUNT - 400);
    assert_eq!(h.app.balance_of(&other_account()).await, 400);
    h.app.stop().await;
}

#[tokio::test]
async fn test_balance_degrades_to_zero() {
    let h = harness();
    h.ledger.set_balance(account(), 900);
    h.app.start().await.unwrap();

    // Not connected: balance reads degrade to zero rather than erroring.
    assert_eq!(h.app.balance_of(&account()).await, 0);

    h.app.connect().await.unwrap();
    assert_eq!(h.app.balance_of(&account()).await, 900);

    h.ledger.fail_reads(RpcFault::with_message("node unavailable"));
    assert_eq!(h.app.balance_of(&account()).await, 0);
    h.app.stop().await;
}
