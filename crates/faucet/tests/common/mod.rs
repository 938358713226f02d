//! Mock validator collaborator shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use faucet_chain::{
    Any, BroadcastMode, ChainConnector, ChainError, ChainResult, LocalWallet, TransferOutcome,
    ValidatorClient, ValidatorConfig, WalletCredential,
};
use faucet_server::{build_state, AppState, FaucetConfig};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const STABLE_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const NATIVE_MNEMONIC: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";
pub const RECIPIENT_MNEMONIC: &str = "letter advice cage absurd amount doctor acoustic avoid letter advice cage above";

/// A transaction captured by the mock client
#[derive(Debug, Clone)]
pub struct SentTx {
    pub signer: String,
    pub msgs: Vec<Any>,
    pub mode: BroadcastMode,
}

pub struct MockClient {
    pub sent: Mutex<Vec<SentTx>>,
    /// Result code reported for every transaction
    pub code: AtomicU32,
    pub send_delay: Mutex<Option<Duration>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            code: AtomicU32::new(0),
            send_delay: Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidatorClient for MockClient {
    async fn send(
        &self,
        wallet: &LocalWallet,
        msgs: Vec<Any>,
        mode: BroadcastMode,
    ) -> ChainResult<TransferOutcome> {
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentTx {
            signer: wallet.address().to_string(),
            msgs,
            mode,
        });

        let code = self.code.load(Ordering::SeqCst);
        Ok(TransferOutcome {
            tx_hash: format!("{:064X}", sent.len()),
            code,
            height: Some(100),
            log: if code == 0 {
                String::new()
            } else {
                "insufficient funds".to_string()
            },
        })
    }
}

pub struct MockConnector {
    pub client: Arc<MockClient>,
    pub connects: AtomicUsize,
    pub derivations: AtomicUsize,
    /// Number of upcoming connect calls that fail
    pub failing_connects: AtomicUsize,
    pub connect_delay: Mutex<Duration>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            client: Arc::new(MockClient::new()),
            connects: AtomicUsize::new(0),
            derivations: AtomicUsize::new(0),
            failing_connects: AtomicUsize::new(0),
            connect_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *self.connect_delay.lock().unwrap() = delay;
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainConnector for MockConnector {
    async fn connect(&self, _config: &ValidatorConfig) -> ChainResult<Arc<dyn ValidatorClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let delay = *self.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(ChainError::Connection("connection refused".to_string()));
        }

        let client: Arc<dyn ValidatorClient> = self.client.clone();
        Ok(client)
    }

    async fn derive_wallet(&self, credential: &WalletCredential) -> ChainResult<Arc<LocalWallet>> {
        self.derivations.fetch_add(1, Ordering::SeqCst);
        LocalWallet::from_credential(credential).map(Arc::new)
    }
}

/// Defaults with test mnemonics and a static root under `static_root`
pub fn test_config(static_root: &std::path::Path) -> FaucetConfig {
    let mut config = FaucetConfig::default();
    config.static_web_path = static_root.to_string_lossy().to_string();
    config.faucet_wallet = faucet_server::config::Secret::new(STABLE_MNEMONIC);
    config.faucet_native_token_wallet = faucet_server::config::Secret::new(NATIVE_MNEMONIC);
    config.init_timeout_secs = 5;
    config.submit_timeout_secs = 5;
    config
}

pub fn recipient_address() -> String {
    LocalWallet::from_mnemonic(RECIPIENT_MNEMONIC, "dydx")
        .unwrap()
        .address()
        .to_string()
}

pub fn test_state(config: FaucetConfig, connector: Arc<MockConnector>) -> AppState {
    build_state(config, connector).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
