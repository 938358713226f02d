//! Validator client: account lookup, signing and broadcast over CometBFT RPC

use crate::config::{BroadcastMode, ValidatorConfig};
use crate::error::{ChainError, ChainResult};
use crate::wallet::{LocalWallet, WalletCredential};
use async_trait::async_trait;
use cosmrs::{
    proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse},
    tendermint::chain::Id as ChainId,
    tx::{self, Fee, SignDoc, SignerInfo},
    AccountId, Any, Coin,
};
use prost::Message;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tendermint_rpc::{Client, HttpClient};
use tracing::{debug, info};

const ACCOUNT_QUERY_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";

/// Result of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub tx_hash: String,
    /// ABCI result code, zero on success
    pub code: u32,
    /// Block height, when the transaction was committed
    pub height: Option<u64>,
    pub log: String,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Account number and sequence used for signing
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// A connected validator client, safe for concurrent use
#[async_trait]
pub trait ValidatorClient: Send + Sync {
    /// Sign `msgs` with `wallet` and broadcast them as one transaction
    async fn send(
        &self,
        wallet: &LocalWallet,
        msgs: Vec<Any>,
        mode: BroadcastMode,
    ) -> ChainResult<TransferOutcome>;
}

/// Produces the network-bound handles the faucet depends on
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(&self, config: &ValidatorConfig) -> ChainResult<Arc<dyn ValidatorClient>>;

    async fn derive_wallet(&self, credential: &WalletCredential) -> ChainResult<Arc<LocalWallet>>;
}

/// Connector backed by a real CometBFT node
#[derive(Debug, Default, Clone, Copy)]
pub struct TendermintConnector;

#[async_trait]
impl ChainConnector for TendermintConnector {
    async fn connect(&self, config: &ValidatorConfig) -> ChainResult<Arc<dyn ValidatorClient>> {
        let client: Arc<dyn ValidatorClient> =
            Arc::new(TendermintValidatorClient::connect(config.clone()).await?);
        Ok(client)
    }

    async fn derive_wallet(&self, credential: &WalletCredential) -> ChainResult<Arc<LocalWallet>> {
        let credential = credential.clone();
        // PBKDF2 seed stretching is CPU bound
        let wallet = tokio::task::spawn_blocking(move || LocalWallet::from_credential(&credential))
            .await
            .map_err(|e| ChainError::KeyDerivation(e.to_string()))??;
        info!(address = %wallet.address(), "Wallet derived");
        Ok(Arc::new(wallet))
    }
}

/// Validator client speaking CometBFT JSON-RPC
pub struct TendermintValidatorClient {
    rpc: HttpClient,
    config: ValidatorConfig,
    chain_id: ChainId,
}

impl TendermintValidatorClient {
    /// Connect to the node and verify it serves the configured chain
    pub async fn connect(config: ValidatorConfig) -> ChainResult<Self> {
        let rpc = HttpClient::new(config.validator_url.as_str())?;

        let chain_id: ChainId = config
            .chain_id
            .parse()
            .map_err(|e| ChainError::Connection(format!("Invalid chain ID: {}", e)))?;

        let status = rpc.status().await?;
        if status.node_info.network != chain_id {
            return Err(ChainError::ChainIdMismatch {
                expected: config.chain_id.clone(),
                actual: status.node_info.network.to_string(),
            });
        }

        info!(
            url = %config.validator_url,
            chain_id = %config.chain_id,
            height = status.sync_info.latest_block_height.value(),
            "Validator client connected"
        );

        Ok(Self {
            rpc,
            config,
            chain_id,
        })
    }

    /// Query account number and sequence for `address`
    pub async fn account_info(&self, address: &AccountId) -> ChainResult<AccountInfo> {
        let request = QueryAccountRequest {
            address: address.to_string(),
        };

        let response = self
            .rpc
            .abci_query(
                Some(ACCOUNT_QUERY_PATH.to_string()),
                request.encode_to_vec(),
                None,
                false,
            )
            .await?;

        if response.code.is_err() {
            return Err(ChainError::AccountQuery(format!(
                "{} (code {})",
                response.log,
                response.code.value()
            )));
        }

        let account = QueryAccountResponse::decode(response.value.as_slice())
            .map_err(|e| ChainError::AccountQuery(e.to_string()))?
            .account
            .ok_or_else(|| ChainError::AccountQuery(format!("Account {} not found", address)))?;

        let base = BaseAccount::decode(account.value.as_slice())
            .map_err(|e| ChainError::AccountQuery(e.to_string()))?;

        Ok(AccountInfo {
            account_number: base.account_number,
            sequence: base.sequence,
        })
    }

    async fn signing_account(&self, address: &AccountId) -> ChainResult<AccountInfo> {
        let mut info = self.account_info(address).await?;
        if self.config.use_timestamp_nonce {
            info.sequence = timestamp_nonce();
        }
        Ok(info)
    }

    fn sign(
        &self,
        wallet: &LocalWallet,
        msgs: Vec<Any>,
        account: AccountInfo,
    ) -> ChainResult<Vec<u8>> {
        let body = tx::Body::new(msgs, self.config.default_client_memo.clone(), 0u32);

        let options = &self.config.broadcast_options;
        let fee_denom = self
            .config
            .denom_config
            .gas_denom
            .parse()
            .map_err(|e| ChainError::Signing(format!("Invalid gas denom: {}", e)))?;
        let fee = Fee::from_amount_and_gas(
            Coin {
                denom: fee_denom,
                amount: options.fee_amount as u128,
            },
            options.gas_limit,
        );

        let signer_info = SignerInfo::single_direct(Some(wallet.public_key()), account.sequence);
        let auth_info = signer_info.auth_info(fee);

        let sign_doc = SignDoc::new(&body, &auth_info, &self.chain_id, account.account_number)
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        sign_doc
            .sign(wallet.signing_key())
            .and_then(|raw| raw.to_bytes())
            .map_err(|e| ChainError::Signing(e.to_string()))
    }
}

#[async_trait]
impl ValidatorClient for TendermintValidatorClient {
    async fn send(
        &self,
        wallet: &LocalWallet,
        msgs: Vec<Any>,
        mode: BroadcastMode,
    ) -> ChainResult<TransferOutcome> {
        let account = self.signing_account(wallet.address()).await?;
        debug!(
            address = %wallet.address(),
            account_number = account.account_number,
            sequence = account.sequence,
            "Signing transaction"
        );

        let tx_bytes = self.sign(wallet, msgs, account)?;

        match mode {
            BroadcastMode::Commit => {
                let response = self
                    .rpc
                    .broadcast_tx_commit(tx_bytes)
                    .await
                    .map_err(|e| ChainError::Broadcast(e.to_string()))?;

                // A CheckTx failure means the transaction never reached a block
                if response.check_tx.code.is_err() {
                    return Ok(TransferOutcome {
                        tx_hash: response.hash.to_string(),
                        code: response.check_tx.code.value(),
                        height: None,
                        log: response.check_tx.log,
                    });
                }

                Ok(TransferOutcome {
                    tx_hash: response.hash.to_string(),
                    code: response.tx_result.code.value(),
                    height: Some(response.height.value()),
                    log: response.tx_result.log,
                })
            }
            BroadcastMode::Sync => {
                let response = self
                    .rpc
                    .broadcast_tx_sync(tx_bytes)
                    .await
                    .map_err(|e| ChainError::Broadcast(e.to_string()))?;

                Ok(TransferOutcome {
                    tx_hash: response.hash.to_string(),
                    code: response.code.value(),
                    height: None,
                    log: response.log,
                })
            }
        }
    }
}

fn timestamp_nonce() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
