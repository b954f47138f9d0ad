//! FX converter - bidirectional currency conversion service
//!
//! A Rust backend implementing a debounced conversion state machine that
//! keeps a sending and a receiving amount in sync through a rate source.

mod api;
mod catalog;
mod rates;
mod runtime;
mod state_machine;
mod validation;

use api::{create_router, AppState};
use catalog::CurrencyCatalog;
use rates::{LoggingFetcher, RatesConfig, TransferGoFetcher};
use state_machine::ControllerContext;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fx_converter=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("FX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let debounce = std::env::var("FX_DEBOUNCE_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .map_or(state_machine::state::DEFAULT_DEBOUNCE, Duration::from_millis);

    // Load the currency catalog once
    let catalog = match std::env::var("FX_CATALOG_PATH") {
        Ok(path) => {
            tracing::info!(path = %path, "Loading currency catalog");
            CurrencyCatalog::load(&path)?
        }
        Err(_) => CurrencyCatalog::default(),
    };
    tracing::info!(
        currencies = ?catalog.list_supported().iter().map(|c| c.code.as_str()).collect::<Vec<_>>(),
        default_from = %catalog.default_from().code,
        default_to = %catalog.default_to().code,
        "Currency catalog ready"
    );

    // Rate source
    let rates_config = RatesConfig::from_env();
    tracing::info!(
        base_url = %rates_config.base_url,
        timeout = ?rates_config.timeout,
        "Rate source configured"
    );
    let fetcher = LoggingFetcher::new(Arc::new(TransferGoFetcher::new(&rates_config)?));

    // Controller
    let controller =
        runtime::spawn_converter(ControllerContext::new(debounce), &catalog, fetcher);

    // Create application state
    let state = AppState::new(controller, Arc::new(catalog));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FX converter listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
