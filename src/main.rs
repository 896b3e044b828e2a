use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use trend_scanner::{
    config::AppConfig, governed_router, scanner::ScannerService, yahoo::YahooClient, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting trend-scanner");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        tickers = app_config.tickers.len(),
        range = %app_config.history_range,
        "Loaded configuration"
    );

    let yahoo_client = YahooClient::from_config(&app_config)
        .context("Failed to initialize Yahoo Finance client")?;
    let scanner = ScannerService::new(
        Arc::new(yahoo_client),
        app_config.tickers.clone(),
        app_config.analysis.clone(),
    );
    let app_state = AppState { scanner: Arc::new(scanner) };

    let app = governed_router(app_state, &app_config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;

    Ok(())
}
