/// Server setup and initialization
/// 
/// Wires together all components: execution engine, delivery channels and
/// HTTP routes. Provides the main application factory for the Axum app.

use crate::{
    api::{create_crew_routes, create_delivery_routes, AppState},
    config::Config,
    delivery::{DiscordWebhook, EmailDelivery, EmailSettings, SheetsExport},
    runtime::{dispatch::NodeDispatcher, engine::ExecutionEngine, handlers::HandlerRegistry},
};
use anyhow::Result;
use axum::Router;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes and middleware
/// 
/// `handlers` is the capability table nodes are dispatched to; pass
/// `HandlerRegistry::builtin()` for the simulated framework handlers.
pub fn create_app(config: &Config, handlers: HandlerRegistry) -> Result<Router> {
    tracing::info!("⚙️ Initializing node dispatcher with {:?}", handlers);
    let dispatcher = NodeDispatcher::new(handlers);

    tracing::info!("🚀 Initializing execution engine");
    let engine = ExecutionEngine::new(dispatcher).with_buffer(config.engine.stream_buffer);

    tracing::info!("📮 Initializing transcript delivery channels");
    let discord = DiscordWebhook::new(Duration::from_secs(config.delivery.discord_timeout_secs))
        .map_err(|e| anyhow::anyhow!("Failed to initialize Discord delivery: {}", e))?;
    let email = EmailDelivery::new(EmailSettings {
        smtp_host: config.delivery.smtp_host.clone(),
        sender: config.delivery.email_sender.clone(),
        password: config.delivery.email_password.clone(),
        timeout: Duration::from_secs(config.delivery.email_timeout_secs),
    });

    let app_state = AppState {
        engine,
        discord: Arc::new(discord),
        sheets: Arc::new(SheetsExport),
        email: Arc::new(email),
        default_sheet_name: config.delivery.default_sheet_name.clone(),
        default_email_recipient: config.delivery.default_email_recipient.clone(),
    };

    // Create the main application router
    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        .merge(create_crew_routes())
        .merge(create_delivery_routes())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
/// 
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging; RUST_LOG overrides the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_filter))
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", config.server.log_filter, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Opsyde server...");

    // Create the application
    let app = create_app(&config, HandlerRegistry::builtin())?;

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    // Start the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
