//! Client manager initialization tests
//! Run with: cargo test --test manager_test

mod common;

use common::{test_config, MockConnector};
use faucet_server::{ClientManager, FaucetError, FaucetMetrics};
use futures::future::join_all;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn manager(connector: Arc<MockConnector>, init_timeout: Duration) -> ClientManager {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    ClientManager::new(
        connector,
        config.validator_client.clone(),
        config.stable_wallet_credential(),
        config.native_wallet_credential(),
        init_timeout,
        FaucetMetrics::new().unwrap(),
    )
}

#[tokio::test]
async fn test_concurrent_first_use_initializes_once() {
    let connector = Arc::new(MockConnector::new().with_connect_delay(Duration::from_millis(50)));
    let manager = Arc::new(manager(connector.clone(), Duration::from_secs(5)));

    let calls = (0..16).map(|_| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.ensure_ready().await })
    });
    let results = join_all(calls).await;

    for result in results {
        assert!(result.unwrap().is_ok());
    }
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.derivations(), 2);
    assert!(manager.is_ready());
}

#[tokio::test]
async fn test_ready_manager_makes_no_further_calls() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager(connector.clone(), Duration::from_secs(5));

    let first = manager.ensure_ready().await.unwrap();
    let second = manager.ensure_ready().await.unwrap();
    let third = manager.ensure_ready().await.unwrap();

    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.derivations(), 2);
    assert!(Arc::ptr_eq(&first.stable_wallet, &second.stable_wallet));
    assert!(Arc::ptr_eq(&second.native_wallet, &third.native_wallet));
    assert_ne!(first.stable_wallet.address(), first.native_wallet.address());
}

#[tokio::test]
async fn test_failed_connect_is_not_cached() {
    let connector = Arc::new(MockConnector::new());
    connector.failing_connects.store(1, Ordering::SeqCst);
    let manager = manager(connector.clone(), Duration::from_secs(5));

    let err = manager.ensure_ready().await.err().unwrap();
    assert!(matches!(err, FaucetError::ClientInit(_)));
    assert!(!manager.is_ready());
    assert_eq!(connector.derivations(), 0);

    manager.ensure_ready().await.unwrap();
    assert_eq!(connector.connects(), 2);
    assert!(manager.is_ready());
}

#[tokio::test]
async fn test_initialization_timeout_is_retryable() {
    let connector =
        Arc::new(MockConnector::new().with_connect_delay(Duration::from_millis(300)));
    let manager = manager(connector.clone(), Duration::from_millis(50));

    let err = manager.ensure_ready().await.err().unwrap();
    assert!(matches!(err, FaucetError::Timeout(_)));
    assert!(!manager.is_ready());

    *connector.connect_delay.lock().unwrap() = Duration::ZERO;
    manager.ensure_ready().await.unwrap();
    assert_eq!(connector.connects(), 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_a_failed_attempt() {
    let connector = Arc::new(MockConnector::new().with_connect_delay(Duration::from_millis(100)));
    connector.failing_connects.store(1, Ordering::SeqCst);
    let manager = Arc::new(manager(connector.clone(), Duration::from_secs(5)));

    let calls = (0..8).map(|_| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.ensure_ready().await })
    });
    let results = join_all(calls).await;

    for result in results {
        let err = result.unwrap().err().unwrap();
        assert!(matches!(err, FaucetError::ClientInit(_)));
    }
    assert_eq!(connector.connects(), 1);

    manager.ensure_ready().await.unwrap();
    assert_eq!(connector.connects(), 2);
}
