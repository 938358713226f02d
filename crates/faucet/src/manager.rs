//! Validator client manager
//!
//! Owns the one validator connection and the two faucet wallets. Each is
//! created on first use and then shared by every request for the life of the
//! process. Concurrent first callers all await one shared initialization
//! attempt and receive its result, error included. A failed or timed out
//! attempt is dropped so the next call starts a fresh one, while resources it
//! did produce stay populated.

use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult};
use crate::metrics::FaucetMetrics;
use faucet_chain::{ChainConnector, LocalWallet, ValidatorClient, ValidatorConfig, WalletCredential};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

type InitFuture = Shared<BoxFuture<'static, FaucetResult<Ready>>>;

/// Handles available once the manager is fully initialized
#[derive(Clone)]
pub struct Ready {
    pub client: Arc<dyn ValidatorClient>,
    pub stable_wallet: Arc<LocalWallet>,
    pub native_wallet: Arc<LocalWallet>,
}

struct Resources {
    connector: Arc<dyn ChainConnector>,
    validator_config: ValidatorConfig,
    stable_credential: WalletCredential,
    native_credential: WalletCredential,
    metrics: FaucetMetrics,

    connection: OnceCell<Arc<dyn ValidatorClient>>,
    stable_wallet: OnceCell<Arc<LocalWallet>>,
    native_wallet: OnceCell<Arc<LocalWallet>>,
}

#[derive(Default)]
struct InFlight {
    attempt: u64,
    future: Option<InitFuture>,
}

pub struct ClientManager {
    resources: Arc<Resources>,
    init_timeout: Duration,
    in_flight: Mutex<InFlight>,
}

impl ClientManager {
    pub fn new(
        connector: Arc<dyn ChainConnector>,
        validator_config: ValidatorConfig,
        stable_credential: WalletCredential,
        native_credential: WalletCredential,
        init_timeout: Duration,
        metrics: FaucetMetrics,
    ) -> Self {
        Self {
            resources: Arc::new(Resources {
                connector,
                validator_config,
                stable_credential,
                native_credential,
                metrics,
                connection: OnceCell::new(),
                stable_wallet: OnceCell::new(),
                native_wallet: OnceCell::new(),
            }),
            init_timeout,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub fn from_config(
        connector: Arc<dyn ChainConnector>,
        config: &FaucetConfig,
        metrics: FaucetMetrics,
    ) -> Self {
        Self::new(
            connector,
            config.validator_client.clone(),
            config.stable_wallet_credential(),
            config.native_wallet_credential(),
            config.init_timeout(),
            metrics,
        )
    }

    /// Whether the connection and both wallets are populated
    pub fn is_ready(&self) -> bool {
        self.resources.current().is_some()
    }

    /// Populate whatever is missing and return the shared handles
    pub async fn ensure_ready(&self) -> FaucetResult<Ready> {
        if let Some(ready) = self.resources.current() {
            return Ok(ready);
        }

        let (attempt, future) = self.join_attempt();
        let result = match tokio::time::timeout(self.init_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.init_timeout, "Validator client initialization timed out");
                Err(FaucetError::Timeout(format!(
                    "validator client initialization exceeded {}s",
                    self.init_timeout.as_secs()
                )))
            }
        };

        self.finish_attempt(attempt);
        result
    }

    /// The in-flight attempt, started if there is none
    fn join_attempt(&self) -> (u64, InitFuture) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(future) = &in_flight.future {
            return (in_flight.attempt, future.clone());
        }

        in_flight.attempt += 1;
        let future = self.resources.clone().initialize().boxed().shared();
        in_flight.future = Some(future.clone());
        (in_flight.attempt, future)
    }

    fn finish_attempt(&self, attempt: u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.attempt == attempt {
            in_flight.future = None;
        }
    }
}

impl Resources {
    fn current(&self) -> Option<Ready> {
        Some(Ready {
            client: self.connection.get()?.clone(),
            stable_wallet: self.stable_wallet.get()?.clone(),
            native_wallet: self.native_wallet.get()?.clone(),
        })
    }

    async fn initialize(self: Arc<Self>) -> FaucetResult<Ready> {
        let client = self
            .connection
            .get_or_try_init(|| async {
                info!(url = %self.validator_config.validator_url, "Connecting to validator");
                let result = self.connector.connect(&self.validator_config).await;
                self.metrics.record_init("connection", result.is_ok());
                result
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Validator connection failed");
                FaucetError::ClientInit(e.to_string())
            })?
            .clone();

        let stable_wallet = self
            .wallet(&self.stable_wallet, &self.stable_credential, "stable_wallet")
            .await?;
        let native_wallet = self
            .wallet(&self.native_wallet, &self.native_credential, "native_wallet")
            .await?;

        Ok(Ready {
            client,
            stable_wallet,
            native_wallet,
        })
    }

    async fn wallet(
        &self,
        cell: &OnceCell<Arc<LocalWallet>>,
        credential: &WalletCredential,
        resource: &'static str,
    ) -> FaucetResult<Arc<LocalWallet>> {
        cell.get_or_try_init(|| async {
            let result = self.connector.derive_wallet(credential).await;
            self.metrics.record_init(resource, result.is_ok());
            result
        })
        .await
        .map(Arc::clone)
        .map_err(|e| {
            warn!(resource, error = %e, "Wallet derivation failed");
            FaucetError::ClientInit(e.to_string())
        })
    }
}
