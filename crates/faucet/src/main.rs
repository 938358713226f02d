//! Faucet service binary

use anyhow::Context;
use clap::Parser;
use faucet_chain::TendermintConnector;
use faucet_server::logging::{self, LogFormat};
use faucet_server::{build_state, router, FaucetConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (JSON, TOML or YAML)
    #[arg(short, long, env = "CONFIG")]
    config: Option<PathBuf>,

    /// Listen port
    #[arg(long)]
    listen_port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(FaucetConfig::default_path);
    let (mut config, report) = FaucetConfig::load(&config_path)?;

    if let Some(port) = args.listen_port {
        config.listen_port = port;
    }
    if args.debug {
        config.log_level = "debug".to_string();
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }

    let _guard = logging::init(
        &config.log_level,
        config.log_format,
        config.access_log_file.as_deref(),
    )?;

    info!("Starting faucet service v{}", env!("CARGO_PKG_VERSION"));
    report.log();
    info!("Configuration:");
    info!("  Validator URL: {}", config.validator_client.validator_url);
    info!("  Chain ID: {}", config.validator_client.chain_id);
    info!("  Static web path: {}", config.static_web_path);
    info!("  Native token amount: {}", config.faucet_native_token_amount);

    let listen_addr = config.listen_addr();
    let tls = config
        .tls_paths()
        .map(|(cert, key)| (PathBuf::from(cert), PathBuf::from(key)));

    let state = build_state(config, Arc::new(TendermintConnector))?;

    // Best-effort warm-up, requests retry on failure
    let manager_state = state.clone();
    tokio::spawn(async move {
        match manager_state.service.manager().ensure_ready().await {
            Ok(_) => info!("Validator client initialized"),
            Err(e) => warn!("Validator client initialization deferred: {}", e),
        }
    });

    let app = router(state);

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    match tls {
        Some((cert, key)) => {
            // No-op when a provider is already installed
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert, &key)
                .await
                .with_context(|| {
                    format!(
                        "Failed to load TLS certificate {} and key {}",
                        cert.display(),
                        key.display()
                    )
                })?;
            info!("https server listening on {}", listen_addr);
            axum_server::bind_rustls(listen_addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("http server listening on {}", listen_addr);
            axum_server::bind(listen_addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
