//! Swap Flow Integration Tests
//!
//! Drive the public app surface end to end against the in-memory wallet:
//! 1. Connect -> approve -> swap on the required network
//! 2. Input validation and failure ordering (nothing reaches the router early)
//! 3. Wallet notifications (account switch, network switch, disconnect)
//! 4. Wallet selection through the modal and config-driven routes
//!
//! All tests are deterministic (no real network calls).

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, U256};
use serde_json::json;
use tempfile::NamedTempFile;

use enoc_swap::adapters::modal::{PreferredWallet, WalletModal};
use enoc_swap::application::{SwapApp, SwapFlowError};
use enoc_swap::config::{load_config, Config, ENOC_ADDRESS, QUICKSWAP_ROUTER, USDT_ADDRESS};
use enoc_swap::domain::{ConnectionState, FailureKind, Phase, DEFAULT_DEADLINE_SECS};
use enoc_swap::ports::contracts;
use enoc_swap::ports::mocks::{MockConnector, MockWallet};
use enoc_swap::ports::{ProviderError, ProviderEvent, ProviderKind, WalletProvider};

// ============================================================================
// Test Fixtures
// ============================================================================

const ACCOUNT: Address = address!("00000000000000000000000000000000000000a1");
const SECOND_ACCOUNT: Address = address!("00000000000000000000000000000000000000b2");

fn app_for(wallet: &Arc<MockWallet>) -> SwapApp {
    SwapApp::from_config(&Config::default(), Arc::new(MockConnector::new(wallet.clone())))
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

/// Wait until the app reports `expected`
async fn wait_for_phase(app: &SwapApp, expected: Phase) {
    let mut rx = app.subscribe();
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if *rx.borrow_and_update() == expected {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never reached {:?}, stuck at {:?}", expected, app.status()));
}

async fn wait_for_account(app: &SwapApp, account: Address) {
    for _ in 0..100 {
        if app.session().await.map(|s| s.account()) == Some(account) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never switched to {}", account);
}

// ============================================================================
// End-to-end purchase
// ============================================================================

#[tokio::test]
async fn test_purchase_on_polygon() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, "0x89"));
    let app = app_for(&wallet);

    let session = app.connect().await.unwrap();
    assert_eq!(session.account(), ACCOUNT);
    assert_eq!(session.chain_id(), 137);
    assert_eq!(app.status(), Phase::Connected { chain_id: 137 });

    let before = unix_now();
    let outcome = app.buy("10").await.unwrap();
    let after = unix_now();

    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 2);

    // Approval: USDT.approve(router, 10 * 10^6) from the account
    let expected_approval = contracts::approve(USDT_ADDRESS, ACCOUNT, QUICKSWAP_ROUTER, U256::from(10_000_000u64));
    assert_eq!(sent[0], expected_approval);

    // Swap: exact-in along [USDT, ENOC] to the account, no output floor
    let request = &outcome.request;
    assert_eq!(request.amount_in, U256::from(10_000_000u64));
    assert_eq!(request.amount_out_min, U256::ZERO);
    assert_eq!(request.path, vec![USDT_ADDRESS, ENOC_ADDRESS]);
    assert_eq!(request.recipient, ACCOUNT);
    assert!(request.deadline >= before + DEFAULT_DEADLINE_SECS);
    assert!(request.deadline <= after + DEFAULT_DEADLINE_SECS);
    assert_eq!(sent[1], contracts::swap_exact_tokens_for_tokens(QUICKSWAP_ROUTER, ACCOUNT, request));

    assert!(outcome.approval.success);
    assert!(outcome.swap.success);
    assert_eq!(app.status(), Phase::SwapComplete);
}

#[tokio::test]
async fn test_fractional_amount_scales_to_six_decimals() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let outcome = app.buy("0.000001").await.unwrap();

    assert_eq!(outcome.request.amount_in, U256::from(1u64));
}

#[tokio::test]
async fn test_wrong_network_warns_without_disconnecting() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 80001u64));
    let app = app_for(&wallet);

    app.connect().await.unwrap();

    assert_eq!(app.status(), Phase::WrongNetwork { chain_id: 80001, required: 137 });
    assert_eq!(
        app.connection().state().await,
        ConnectionState::WrongNetwork { chain_id: 80001, required: 137 }
    );
    assert!(app.session().await.is_some());
    assert_eq!(wallet.close_calls(), 0);
}

// ============================================================================
// Validation and failure ordering
// ============================================================================

#[tokio::test]
async fn test_invalid_amounts_never_reach_the_wallet() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    for amount in [
        "",
        "   ",
        "abc",
        "0",
        "-1",
        "1.0000001",
        "1_000",
        "1.00000000000000000000000000001",
    ] {
        let result = app.buy(amount).await;
        assert!(
            matches!(result, Err(SwapFlowError::InvalidAmount(_))),
            "{:?} gave {:?}",
            amount,
            result
        );
        assert!(matches!(
            app.status(),
            Phase::Failed { kind: FailureKind::InvalidAmount, .. }
        ));
    }

    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_buy_before_connect_is_no_session() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);

    // Session is checked before the amount
    assert_eq!(app.buy("abc").await.err(), Some(SwapFlowError::NoSession));
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_rejected_approval_never_calls_router() {
    let wallet = Arc::new(
        MockWallet::new(ACCOUNT, 137u64).failing_approval(ProviderError::UserRejected("User denied".into())),
    );
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let result = app.buy("10").await;

    assert_eq!(
        result.err(),
        Some(SwapFlowError::Approval(ProviderError::UserRejected("User denied".into())))
    );
    assert_eq!(wallet.calls_to(USDT_ADDRESS).len(), 1);
    assert!(wallet.calls_to(QUICKSWAP_ROUTER).is_empty());
    assert!(matches!(app.status(), Phase::Failed { kind: FailureKind::Approval, .. }));
}

#[tokio::test]
async fn test_reverted_swap_reports_swap_error() {
    let hash = alloy_primitives::B256::repeat_byte(0x42);
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64).failing_swap(ProviderError::Reverted(hash)));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let result = app.buy("10").await;

    assert_eq!(result.err(), Some(SwapFlowError::Swap(ProviderError::Reverted(hash))));
    assert!(matches!(app.status(), Phase::Failed { kind: FailureKind::Swap, .. }));
    // The approval already went through and is not undone
    assert_eq!(wallet.calls_to(USDT_ADDRESS).len(), 1);
}

#[tokio::test]
async fn test_purchase_while_busy() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64).with_send_delay(Duration::from_millis(200)));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let first = {
        let app = app.clone();
        tokio::spawn(async move { app.buy("10").await })
    };
    wait_for_phase(&app, Phase::ApprovalPending).await;

    assert_eq!(app.buy("5").await.err(), Some(SwapFlowError::Busy));
    assert!(app.status().is_pending());

    first.await.unwrap().unwrap();
    assert_eq!(wallet.sent_transactions().len(), 2);
    assert!(!app.is_busy());

    // Free again once the first purchase resolved
    app.buy("5").await.unwrap();
    assert_eq!(wallet.sent_transactions().len(), 4);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_disconnect_clears_session() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    app.disconnect().await;
    app.disconnect().await;

    assert!(app.session().await.is_none());
    assert_eq!(app.status(), Phase::Disconnected);
    assert_eq!(wallet.close_calls(), 1);
    assert_eq!(app.buy("10").await.err(), Some(SwapFlowError::NoSession));
}

#[tokio::test]
async fn test_connect_failure_leaves_no_session() {
    let app = SwapApp::from_config(
        &Config::default(),
        Arc::new(MockConnector::failing(ProviderError::NoProvider)),
    );

    let result = app.connect().await;

    assert_eq!(result.err(), Some(SwapFlowError::Connection(ProviderError::NoProvider)));
    assert!(matches!(app.status(), Phase::Failed { kind: FailureKind::Connection, .. }));
    assert_eq!(app.buy("10").await.err(), Some(SwapFlowError::NoSession));
}

#[tokio::test]
async fn test_account_switch_changes_recipient() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    wallet.emit(ProviderEvent::AccountsChanged(vec![SECOND_ACCOUNT]));
    wait_for_account(&app, SECOND_ACCOUNT).await;

    let outcome = app.buy("1").await.unwrap();

    assert_eq!(outcome.request.recipient, SECOND_ACCOUNT);
    assert!(wallet.sent_transactions().iter().all(|tx| tx.from == SECOND_ACCOUNT));
}

#[tokio::test]
async fn test_account_switch_mid_purchase_keeps_approving_account() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64).with_send_delay(Duration::from_millis(200)));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let purchase = {
        let app = app.clone();
        tokio::spawn(async move { app.buy("10").await })
    };
    wait_for_phase(&app, Phase::ApprovalPending).await;

    wallet.emit(ProviderEvent::AccountsChanged(vec![SECOND_ACCOUNT]));
    wait_for_account(&app, SECOND_ACCOUNT).await;

    let outcome = purchase.await.unwrap().unwrap();

    // The swap spends the allowance granted by the account that approved
    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|tx| tx.from == ACCOUNT));
    assert_eq!(outcome.request.recipient, ACCOUNT);

    // The next purchase uses the new account
    let next = app.buy("1").await.unwrap();
    assert_eq!(next.request.recipient, SECOND_ACCOUNT);
}

#[tokio::test]
async fn test_network_switch_is_tracked() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    wallet.emit(ProviderEvent::ChainChanged(json!("0x13881")));
    wait_for_phase(&app, Phase::WrongNetwork { chain_id: 80001, required: 137 }).await;
    assert_eq!(app.session().await.unwrap().chain_id(), 80001);

    wallet.emit(ProviderEvent::ChainChanged(json!("137")));
    wait_for_phase(&app, Phase::Connected { chain_id: 137 }).await;
}

#[tokio::test]
async fn test_wallet_disconnect_ends_session() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    wallet.emit(ProviderEvent::Disconnected {
        code: Some(4900),
        reason: "Wallet closed".to_string(),
    });
    wait_for_phase(&app, Phase::Disconnected).await;

    assert!(app.session().await.is_none());
    assert!(wallet.is_closed());
    assert_eq!(app.buy("10").await.err(), Some(SwapFlowError::NoSession));
}

#[tokio::test]
async fn test_reconnect_after_wallet_disconnect() {
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    wallet.emit(ProviderEvent::Disconnected {
        code: None,
        reason: "Wallet closed".to_string(),
    });
    wait_for_phase(&app, Phase::Disconnected).await;

    app.connect().await.unwrap();
    app.buy("3").await.unwrap();
    assert_eq!(wallet.sent_transactions().len(), 2);
}

// ============================================================================
// Wallet selection and configuration
// ============================================================================

#[tokio::test]
async fn test_modal_connects_chosen_wallet() {
    let frame = Arc::new(MockConnector::new(Arc::new(MockWallet::new(ACCOUNT, 137u64))));
    let bridge = Arc::new(MockConnector::new(Arc::new(
        MockWallet::new(SECOND_ACCOUNT, 137u64).with_kind(ProviderKind::Remote),
    )));

    let chooser = Arc::new(PreferredWallet::new(Some("bridge".to_string())));
    let modal = WalletModal::new(chooser.clone())
        .with_wallet("frame", ProviderKind::Injected, frame.clone())
        .with_wallet("bridge", ProviderKind::Remote, bridge.clone());
    let app = SwapApp::from_config(&Config::default(), Arc::new(modal));

    let session = app.connect().await.unwrap();
    assert_eq!(session.account(), SECOND_ACCOUNT);
    assert_eq!(session.provider().kind(), ProviderKind::Remote);
    assert_eq!(frame.connect_count(), 0);
    assert_eq!(bridge.connect_count(), 1);

    // Switching wallets releases the previous session first
    chooser.set(Some("frame".to_string()));
    let session = app.connect().await.unwrap();
    assert_eq!(session.account(), ACCOUNT);
    assert_eq!(frame.connect_count(), 1);
}

#[tokio::test]
async fn test_modal_without_match_is_cancelled() {
    let modal = WalletModal::new(Arc::new(PreferredWallet::new(Some("ledger".to_string()))))
        .with_wallet(
            "frame",
            ProviderKind::Injected,
            Arc::new(MockConnector::new(Arc::new(MockWallet::new(ACCOUNT, 137u64)))),
        );
    let app = SwapApp::from_config(&Config::default(), Arc::new(modal));

    assert_eq!(
        app.connect().await.err(),
        Some(SwapFlowError::Connection(ProviderError::Cancelled))
    );
}

#[tokio::test]
async fn test_route_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[network]
name = "Polygon"
chain_id = 137
rpc_url = "https://polygon-rpc.com"

[router]
address = "0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff"
deadline_secs = 300
"#,
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let wallet = Arc::new(MockWallet::new(ACCOUNT, 137u64));
    let app = SwapApp::from_config(&config, Arc::new(MockConnector::new(wallet.clone())));
    app.connect().await.unwrap();

    let before = unix_now();
    let outcome = app.buy("10").await.unwrap();

    assert!(outcome.request.deadline >= before + 300);
    assert!(outcome.request.deadline <= unix_now() + 300);
    assert_eq!(outcome.request.path, vec![USDT_ADDRESS, ENOC_ADDRESS]);
}

#[tokio::test]
async fn test_balances_after_purchase_query() {
    let wallet = Arc::new(
        MockWallet::new(ACCOUNT, 137u64)
            .with_balance(USDT_ADDRESS, U256::from(25_000_000u64))
            .with_balance(ENOC_ADDRESS, U256::from(1_500_000_000_000_000_000u64)),
    );
    let app = app_for(&wallet);
    app.connect().await.unwrap();

    let balances = app.balances().await.unwrap();

    assert_eq!(balances.source.to_string(), "25 USDT");
    assert_eq!(balances.destination.to_string(), "1.5 ENOC");
    // Reads are calls, not transactions
    assert!(wallet.sent_transactions().is_empty());
}
