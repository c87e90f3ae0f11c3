use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use renthub_rust::{AppState, config::Settings, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "renthub_rust=info,tower_http=info".into())) // Default to info if RUST_LOG not set
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing RentHub server...");

    // Load configuration
    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e); // Propagate the error
        }
    };

    let app_state = AppState::build(settings)?;
    tracing::info!(
        vehicles = app_state.catalogs.vehicles.len(),
        services = app_state.catalogs.services.len(),
        discover = app_state.catalogs.discover.len(),
        "Catalogs ready."
    );

    // Evaluate the gate once so the first page render has a state
    let snapshot = app_state.gate.refresh().await;
    tracing::info!(state = ?snapshot.state, "Biometric gate evaluated.");

    let router: Router = routes::create_router(app_state.clone());

    // Combine the router with static file serving
    let app = router.nest_service("/static", ServeDir::new("static"));

    // Parse the server address from settings
    let addr: SocketAddr = match app_state.settings.server_address.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid server address format in configuration ('{}'): {}", app_state.settings.server_address, e);
            return Err(anyhow::anyhow!("Invalid server address format: {}", app_state.settings.server_address));
        }
    };

    // Create a TCP listener
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into()); // Convert std::io::Error to anyhow::Error
        }
    };

    // Run the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
