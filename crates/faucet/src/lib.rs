//! Token faucet for dYdX v4 chains
//!
//! Exposes two write endpoints over a validator client:
//! - `POST /faucet/tokens` deposits stablecoins into a subaccount
//! - `POST /faucet/native-token` sends native tokens to an address
//!
//! plus `GET /config` and static hosting of the front-end bundle.

pub mod amount;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod service;

pub use api::{router, AppState, FaucetNativeTokenRequest, FaucetResponse, FaucetTokensRequest};
pub use config::FaucetConfig;
pub use error::{FaucetError, FaucetResult};
pub use manager::{ClientManager, Ready};
pub use metrics::FaucetMetrics;
pub use service::FaucetService;

use faucet_chain::ChainConnector;
use std::sync::Arc;

/// Wire the client manager, service and metrics behind one shared state
pub fn build_state(
    config: FaucetConfig,
    connector: Arc<dyn ChainConnector>,
) -> FaucetResult<AppState> {
    let metrics = FaucetMetrics::new().map_err(|e| FaucetError::Internal(e.to_string()))?;
    let manager = Arc::new(ClientManager::from_config(connector, &config, metrics.clone()));
    let service = Arc::new(FaucetService::new(manager, &config, metrics.clone()));
    AppState::new(service, Arc::new(config), metrics)
}
