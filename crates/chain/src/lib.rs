//! Validator client layer for the faucet
//!
//! Wraps cosmrs and tendermint-rpc behind two traits:
//! - `ChainConnector` connects to a validator and derives wallets
//! - `ValidatorClient` signs and broadcasts transactions

pub mod client;
pub mod config;
pub mod error;
pub mod msgs;
pub mod wallet;

pub use client::{
    AccountInfo, ChainConnector, TendermintConnector, TendermintValidatorClient, TransferOutcome,
    ValidatorClient,
};
pub use config::{BroadcastMode, BroadcastOptions, DenomConfig, ValidatorConfig};
pub use cosmrs::Any;
pub use error::{ChainError, ChainResult};
pub use msgs::SubaccountId;
pub use wallet::{LocalWallet, SubaccountInfo, WalletCredential, DEFAULT_ADDRESS_PREFIX};
