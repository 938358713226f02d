//! Validator connection configuration

use serde::{Deserialize, Serialize};

/// Denominations and decimal precision of the two faucet tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenomConfig {
    /// Stablecoin denom (an IBC-wrapped USDC on dYdX chains)
    pub stable_denom: String,
    /// Decimal places of one stablecoin unit
    pub stable_decimals: u32,
    /// Denom used to pay transaction fees
    pub gas_denom: String,
    /// Native chain token denom
    pub native_denom: String,
    /// Decimal places of one native token unit
    pub native_decimals: u32,
}

impl Default for DenomConfig {
    fn default() -> Self {
        Self {
            stable_denom: "ibc/8E27BA2D5493AF5636760E354E46004562C46AB7EC0CC4C1CA14E9E20E2545B5"
                .to_string(),
            stable_decimals: 6,
            gas_denom: "uusdc".to_string(),
            native_denom: "adv4tnt".to_string(),
            native_decimals: 18,
        }
    }
}

/// How a signed transaction is handed to the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastMode {
    /// Block until the transaction is included in a block or rejected
    Commit,
    /// Return once the transaction passed `CheckTx`
    Sync,
}

/// Broadcast and fee settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastOptions {
    pub mode: BroadcastMode,
    pub gas_limit: u64,
    /// Fee amount in `gas_denom`
    pub fee_amount: u64,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            mode: BroadcastMode::Commit,
            gas_limit: 1_000_000,
            fee_amount: 0,
        }
    }
}

/// Validator client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// CometBFT RPC endpoint
    pub validator_url: String,
    pub chain_id: String,
    pub denom_config: DenomConfig,
    pub broadcast_options: BroadcastOptions,
    /// Memo attached to every transaction
    pub default_client_memo: String,
    /// Use the current unix time in milliseconds as the account sequence
    pub use_timestamp_nonce: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            validator_url: "http://localhost:26657".to_string(),
            chain_id: "localdydxprotocol".to_string(),
            denom_config: DenomConfig::default(),
            broadcast_options: BroadcastOptions::default(),
            default_client_memo: "faucet".to_string(),
            use_timestamp_nonce: false,
        }
    }
}
