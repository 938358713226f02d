//! Error types for the faucet service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use faucet_chain::ChainError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Faucet service errors
#[derive(Error, Debug, Clone)]
pub enum FaucetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validator client unavailable: {0}")]
    ClientInit(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction {tx_hash} failed with code {code}: {log}")]
    ChainSubmission { tx_hash: String, code: u32, log: String },

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not Found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FaucetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FaucetError::Validation(_)
            | FaucetError::InvalidAddress(_)
            | FaucetError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            FaucetError::NotFound => StatusCode::NOT_FOUND,
            FaucetError::ClientInit(_) => StatusCode::SERVICE_UNAVAILABLE,
            FaucetError::ChainSubmission { .. } | FaucetError::Submission(_) => {
                StatusCode::BAD_GATEWAY
            }
            FaucetError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            FaucetError::Config(_) | FaucetError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert a chain error raised while building or submitting a transfer
    pub fn from_submission(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(msg) => FaucetError::InvalidAddress(msg),
            ChainError::InvalidMessage(msg) => FaucetError::Validation(msg),
            other => FaucetError::Submission(other.to_string()),
        }
    }
}

impl From<JsonRejection> for FaucetError {
    fn from(rejection: JsonRejection) -> Self {
        FaucetError::Validation(rejection.body_text())
    }
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            FaucetError::Config(_) | FaucetError::Internal(_) => {
                error!("Request failed: {}", self);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;
