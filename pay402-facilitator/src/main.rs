//! Pay402 facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p pay402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p pay402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p pay402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `4021`)
//! - `RUST_LOG` — Log level filter (default: `info`)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy_signer_local::PrivateKeySigner;
use axum::http::Method;
use axum::{Json, Router};
use pay402::networks;
use pay402::replay::InMemoryReplayLedger;
use pay402_evm::{CashbackPolicy, ExactEvmFacilitator, HttpSettlementProvider, SettlementProvider};
use tower_http::cors;
use tracing_subscriber::EnvFilter;
use url::Url;

use pay402_facilitator::config::FacilitatorConfig;
use pay402_facilitator::handlers::{AppState, FacilitatorState, facilitator_router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FacilitatorConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        networks = config.networks.len(),
        cashback = config.cashback.is_some(),
        "loaded configuration"
    );

    if config.networks.is_empty() {
        tracing::warn!("no networks configured; facilitator will report no supported kinds");
    }

    // One ledger for all networks: replay keys embed the network name.
    let ledger = Arc::new(InMemoryReplayLedger::new());
    let settle_timeout = Duration::from_secs(config.settle_timeout_secs);

    let mut engines = HashMap::new();
    let mut signers = Vec::new();

    for (network, net_cfg) in &config.networks {
        if networks::by_name(network).is_none() {
            tracing::warn!(network = %network, "skipping unknown network");
            continue;
        }

        let key_str = net_cfg.signer_private_key.trim();
        if key_str.is_empty() || key_str.starts_with('$') {
            tracing::warn!(
                network = %network,
                "skipping network: signer_private_key not resolved (missing env var?)"
            );
            continue;
        }

        let signer: PrivateKeySigner = key_str
            .parse()
            .map_err(|e| format!("invalid signer key for {network}: {e}"))?;
        let rpc_url: Url = net_cfg
            .rpc_url
            .parse()
            .map_err(|e| format!("invalid RPC URL for {network}: {e}"))?;

        let provider = Arc::new(HttpSettlementProvider::connect(rpc_url, signer));
        let signer_address = provider.signer_address();

        let mut engine = ExactEvmFacilitator::new(
            Arc::clone(&provider) as Arc<dyn SettlementProvider>,
            Arc::clone(&ledger) as _,
        )
        .with_settle_timeout(settle_timeout);
        if let Some(cashback) = &config.cashback {
            engine = engine.with_cashback(
                provider as Arc<dyn SettlementProvider>,
                CashbackPolicy {
                    rate_bps: cashback.rate_bps,
                    reward_asset: cashback.reward_asset,
                },
            );
        }

        tracing::info!(
            network = %network,
            signer = %signer_address,
            "registered exact scheme engine"
        );
        engines.insert(network.clone(), engine);
        signers.push((network.clone(), signer_address));
    }

    let state: FacilitatorState = Arc::new(AppState::new(engines, signers));

    let app = Router::new()
        .merge(facilitator_router(Arc::clone(&state)))
        .route("/health", axum::routing::get(health))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("facilitator listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("facilitator shut down gracefully");
    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("received Ctrl-C, shutting down");
    }
}
