use thiserror::Error;

/// Errors raised by the validator client and wallet layer
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Chain ID mismatch: expected {expected}, node reports {actual}")]
    ChainIdMismatch { expected: String, actual: String },

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Account query failed: {0}")]
    AccountQuery(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),
}

impl From<tendermint_rpc::Error> for ChainError {
    fn from(err: tendermint_rpc::Error) -> Self {
        ChainError::Connection(err.to_string())
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
