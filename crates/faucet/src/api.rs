//! HTTP API for faucet service

use crate::amount::TokenAmount;
use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult};
use crate::logging::ACCESS_LOG_TARGET;
use crate::metrics::FaucetMetrics;
use crate::service::FaucetService;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    handler::Handler,
    http::{Request, Response, StatusCode, Uri},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use faucet_chain::TransferOutcome;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, Span};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FaucetService>,
    pub config: Arc<FaucetConfig>,
    pub metrics: FaucetMetrics,
    pub front_path: Regex,
}

impl AppState {
    pub fn new(
        service: Arc<FaucetService>,
        config: Arc<FaucetConfig>,
        metrics: FaucetMetrics,
    ) -> FaucetResult<Self> {
        let front_path = config.front_path_regex()?;
        Ok(Self {
            service,
            config,
            metrics,
            front_path,
        })
    }

    fn record(&self, endpoint: &str, result: &FaucetResult<TransferOutcome>) {
        match result {
            Ok(_) => self.metrics.record_request(endpoint, "ok"),
            Err(e) => {
                error!(endpoint, error = %e, "Faucet request failed");
                self.metrics.record_request(endpoint, "error");
            }
        }
    }
}

/// Stablecoin faucet request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetTokensRequest {
    pub address: String,
    #[serde(default)]
    pub subaccount_number: u32,
    pub amount: TokenAmount,
}

/// Native token faucet request
#[derive(Debug, Deserialize)]
pub struct FaucetNativeTokenRequest {
    pub address: String,
}

/// Success acknowledgement
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaucetResponse {
    pub result: String,
}

impl FaucetResponse {
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_web_path)
        .call_fallback_on_method_not_allowed(true)
        .fallback(spa_fallback_handler.with_state(state.clone()));

    Router::new()
        .route("/config", get(config_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/faucet/tokens", post(faucet_tokens_handler))
        .route("/faucet/native-token", post(faucet_native_token_handler))
        .fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        target: ACCESS_LOG_TARGET,
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        query = request.uri().query().unwrap_or("")
                    )
                })
                .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                    tracing::info!(
                        target: ACCESS_LOG_TARGET,
                        status = response.status().as_u16(),
                        response_time_ms = latency.as_millis() as u64,
                        "request completed"
                    );
                }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Effective configuration, without wallet mnemonics
pub async fn config_handler(State(state): State<AppState>) -> Json<FaucetConfig> {
    Json(state.config.as_ref().clone())
}

/// Stablecoin deposit handler
pub async fn faucet_tokens_handler(
    State(state): State<AppState>,
    payload: Result<Json<FaucetTokensRequest>, JsonRejection>,
) -> FaucetResult<Json<FaucetResponse>> {
    let Json(request) = payload?;

    if request.subaccount_number != 0 {
        tracing::debug!(
            subaccount_number = request.subaccount_number,
            "Deposits always target subaccount 0"
        );
    }

    let result = state
        .service
        .deposit_tokens(&request.address, &request.amount)
        .await;
    state.record("tokens", &result);
    result?;

    Ok(Json(FaucetResponse::ok()))
}

/// Native token transfer handler
pub async fn faucet_native_token_handler(
    State(state): State<AppState>,
    payload: Result<Json<FaucetNativeTokenRequest>, JsonRejection>,
) -> FaucetResult<Json<FaucetResponse>> {
    let Json(request) = payload?;

    let result = state.service.send_native_token(&request.address).await;
    state.record("native_token", &result);
    result?;

    Ok(Json(FaucetResponse::ok()))
}

/// Health check handler
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "clientReady": state.service.manager().is_ready(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus metrics handler
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.gather().map_err(|e| {
        error!("Failed to gather metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Unmatched paths: SPA index when allowed, otherwise 404
pub async fn spa_fallback_handler(
    State(state): State<AppState>,
    uri: Uri,
) -> axum::response::Response {
    if state.front_path.is_match(uri.path()) {
        if let Ok(index) = tokio::fs::read_to_string(state.config.index_file()).await {
            return Html(index).into_response();
        }
    }
    FaucetError::NotFound.into_response()
}
