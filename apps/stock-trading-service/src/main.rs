//! Stock Trading Service Binary
//!
//! Starts the gRPC quote and order service plus its health endpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin stock-trading-service
//! ```
//!
//! # Environment Variables
//!
//! - `STOCK_TRADING_GRPC_PORT`: gRPC server port (default: 9090)
//! - `STOCK_TRADING_HEALTH_PORT`: Health check HTTP port (default: 8083)
//! - `STOCK_TRADING_SUBSCRIBE_COUNT`: Quotes per subscription (default: 10)
//! - `STOCK_TRADING_SUBSCRIBE_INTERVAL_MS`: Subscription pacing (default: 1000)
//! - `STOCK_TRADING_STREAM_CAPACITY`: Outbound channel capacity (default: 16)
//! - `STOCK_TRADING_MAX_PRICE`: Random price upper bound (default: 200.0)
//! - `STOCK_TRADING_ORDER_POLICY`: accept_all | validate (default: accept_all)
//! - `STOCK_TRADING_SEED`: Initial quotes, `SYM=price,...`
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: stock-trading-service)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use stock_trading_service::infrastructure::grpc::proto::stocktrading::v1::stock_trading_service_server::StockTradingServiceServer;
use stock_trading_service::infrastructure::health::{HealthServer, HealthServerState};
use stock_trading_service::infrastructure::telemetry;
use stock_trading_service::{
    InMemoryQuoteStore, RandomPriceSource, ServiceConfig, ServiceHandlers, StockTradingServer,
    StockTradingServerConfig, SystemClock, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting Stock Trading Service");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Collaborators
    let store = Arc::new(InMemoryQuoteStore::from_seed(&config.seed, Utc::now()));
    let price_source = Arc::new(RandomPriceSource::new(config.pricing.max_price));
    let order_policy = config.order_policy.build();

    // Initialize gRPC server
    let handlers = ServiceHandlers::new(
        store.clone(),
        price_source,
        Arc::new(SystemClock),
        config.subscription_settings(),
        order_policy,
    );
    let grpc_server_config = StockTradingServerConfig {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stream_capacity: config.streams.stream_capacity,
    };
    let grpc_server = Arc::new(StockTradingServer::new(
        grpc_server_config,
        handlers,
        shutdown_token.clone(),
    ));

    // Initialize health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        config.order_policy.as_str().to_string(),
        grpc_server.stats(),
        store,
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );

    // Spawn health server
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // Spawn gRPC server
    let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.server.grpc_port));
    let grpc_service = StockTradingServiceServer::from_arc(grpc_server);
    let grpc_shutdown = shutdown_token.clone();

    let grpc_task = tokio::spawn(async move {
        tracing::info!(addr = %grpc_addr, "gRPC server listening");
        if let Err(e) = Server::builder()
            .add_service(grpc_service)
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled_owned())
            .await
        {
            tracing::error!(error = %e, "gRPC server error");
        }
        tracing::info!("gRPC server stopped");
    });

    tracing::info!("Stock trading service ready");

    await_shutdown(&shutdown_token, grpc_task).await;

    tracing::info!("Stock trading service stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        grpc_port = config.server.grpc_port,
        health_port = config.server.health_port,
        subscribe_count = config.streams.subscribe_count,
        subscribe_interval_ms = u64::try_from(config.streams.subscribe_interval.as_millis())
            .unwrap_or(u64::MAX),
        stream_capacity = config.streams.stream_capacity,
        order_policy = config.order_policy.as_str(),
        seeded_symbols = config.seed.len(),
        "Configuration loaded"
    );
}

/// Wait for SIGINT/SIGTERM or an early gRPC server exit, then cancel
/// `shutdown_token` and wait for in-flight calls to drain.
async fn await_shutdown(
    shutdown_token: &CancellationToken,
    mut grpc_task: tokio::task::JoinHandle<()>,
) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let grpc_exited = tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
            false
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
            false
        }
        _ = &mut grpc_task => {
            tracing::warn!("gRPC server exited early, shutting down");
            true
        }
    };

    shutdown_token.cancel();
    tracing::info!("Graceful shutdown started");

    if !grpc_exited && let Err(e) = grpc_task.await {
        tracing::error!(error = %e, "gRPC server task failed");
    }
}
