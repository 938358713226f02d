//! Faucet service core logic

use crate::amount::{native_base_units, TokenAmount};
use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult};
use crate::manager::ClientManager;
use crate::metrics::FaucetMetrics;
use faucet_chain::{
    msgs, Any, BroadcastMode, DenomConfig, LocalWallet, SubaccountId, SubaccountInfo,
    TransferOutcome, ValidatorClient,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Asset id of the stablecoin on dYdX chains
pub const STABLE_ASSET_ID: u32 = 0;

/// Faucet wallets always spend from their default subaccount
const FAUCET_SUBACCOUNT: u32 = 0;

/// Faucet service
pub struct FaucetService {
    manager: Arc<ClientManager>,
    denoms: DenomConfig,
    broadcast_mode: BroadcastMode,
    native_token_amount: u64,
    mask_chain_failures: bool,
    submit_timeout: Duration,
    metrics: FaucetMetrics,
}

impl FaucetService {
    pub fn new(manager: Arc<ClientManager>, config: &FaucetConfig, metrics: FaucetMetrics) -> Self {
        Self {
            manager,
            denoms: config.validator_client.denom_config.clone(),
            broadcast_mode: config.validator_client.broadcast_options.mode,
            native_token_amount: config.faucet_native_token_amount,
            mask_chain_failures: config.mask_chain_failures,
            submit_timeout: config.submit_timeout(),
            metrics,
        }
    }

    pub fn manager(&self) -> &ClientManager {
        &self.manager
    }

    /// Deposit `amount` stablecoins into subaccount 0 of `address`
    pub async fn deposit_tokens(
        &self,
        address: &str,
        amount: &TokenAmount,
    ) -> FaucetResult<TransferOutcome> {
        require_address(address)?;
        let ready = self.manager.ensure_ready().await?;

        let quantums = amount.to_quantums(self.denoms.stable_decimals)?;
        let sender = SubaccountInfo::new(ready.stable_wallet.clone(), FAUCET_SUBACCOUNT);
        let recipient = SubaccountId {
            owner: address.to_string(),
            number: 0,
        };

        let msg = msgs::deposit_to_subaccount(&sender, recipient, STABLE_ASSET_ID, quantums)
            .map_err(FaucetError::from_submission)?;

        info!(address, %amount, quantums, "Depositing stablecoins");
        self.submit("tokens", ready.client.as_ref(), &ready.stable_wallet, msg)
            .await
    }

    /// Send the configured native token amount to `address`
    pub async fn send_native_token(&self, address: &str) -> FaucetResult<TransferOutcome> {
        require_address(address)?;
        let ready = self.manager.ensure_ready().await?;

        let amount = native_base_units(self.native_token_amount, self.denoms.native_decimals)
            .ok_or_else(|| {
                FaucetError::Config(format!(
                    "native token amount {} with {} decimals overflows u128",
                    self.native_token_amount, self.denoms.native_decimals
                ))
            })?;
        let sender = SubaccountInfo::new(ready.native_wallet.clone(), FAUCET_SUBACCOUNT);

        let msg = msgs::send_token(&sender, address, &self.denoms.native_denom, amount)
            .map_err(FaucetError::from_submission)?;

        info!(address, amount = %amount, denom = %self.denoms.native_denom, "Sending native token");
        self.submit("native_token", ready.client.as_ref(), &ready.native_wallet, msg)
            .await
    }

    async fn submit(
        &self,
        endpoint: &'static str,
        client: &dyn ValidatorClient,
        wallet: &LocalWallet,
        msg: Any,
    ) -> FaucetResult<TransferOutcome> {
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.submit_timeout,
            client.send(wallet, vec![msg], self.broadcast_mode),
        )
        .await;
        self.metrics
            .submission_duration
            .with_label_values(&[endpoint])
            .observe(started.elapsed().as_secs_f64());

        let outcome = result
            .map_err(|_| {
                FaucetError::Timeout(format!(
                    "transaction submission exceeded {}s",
                    self.submit_timeout.as_secs()
                ))
            })?
            .map_err(FaucetError::from_submission)?;

        info!(
            endpoint,
            tx_hash = %outcome.tx_hash,
            code = outcome.code,
            height = ?outcome.height,
            "Transaction submitted"
        );

        if !outcome.is_success() {
            if self.mask_chain_failures {
                warn!(
                    endpoint,
                    tx_hash = %outcome.tx_hash,
                    code = outcome.code,
                    log = %outcome.log,
                    "Chain rejected transaction, reporting success"
                );
                return Ok(outcome);
            }
            return Err(FaucetError::ChainSubmission {
                tx_hash: outcome.tx_hash,
                code: outcome.code,
                log: outcome.log,
            });
        }

        Ok(outcome)
    }
}

fn require_address(address: &str) -> FaucetResult<()> {
    if address.trim().is_empty() {
        return Err(FaucetError::Validation("address is required".to_string()));
    }
    Ok(())
}
