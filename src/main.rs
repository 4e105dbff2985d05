//! Intercept Server - Main Application Entry Point
//!
//! Demonstrates pipelines mounted on an axum router:
//!
//! - `/login`: open to everyone, issues a session cookie
//! - `/update`: requires the session cookie
//! - `/health`: plain axum handler, no pipeline
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build one pipeline per route and register its authorizers and monitors
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use intercept_handler::{
    Endpoint, Pipeline,
    config::Config,
    handlers::{health::health_check, login::LoginPage, resource::UpdateResource},
    middleware::{
        auth::{AllowAll, RequireCookie},
        logging::ResponseLogger,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    // Chains are registered here, before the pipelines are shared with the router
    let login = Pipeline::new(LoginPage::new(config.session_cookie.clone()))
        .authorizer(AllowAll)
        .monitor(ResponseLogger);

    let update = Pipeline::new(UpdateResource)
        .authorizer(RequireCookie::new(config.session_cookie.clone()))
        .monitor(ResponseLogger);

    let app = Router::new()
        .route("/health", get(health_check))
        .route_service("/login", Endpoint::new(login, config.endpoint()))
        .route_service("/update", Endpoint::new(update, config.endpoint()))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
