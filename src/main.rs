mod chores;
mod config;
mod jobs;
mod orchestrator;
mod provider;
mod rate_limit;
mod routes;
mod state;
mod store;
mod sync;
mod tokens;
mod webhooks;

#[cfg(test)]
mod testutil;

use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::rate_limit::SlidingWindowLimiter;
use crate::state::AppState;
use crate::store::rest::RestStore;
use homeboard_core::Vault;
use homeboard_provider_google::{GoogleClient, GoogleCredentials};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let vault = Vault::new(&config.token_encryption_secret)?;
    let store = Arc::new(RestStore::new(
        &config.supabase_url,
        &config.supabase_service_key,
    ));
    let google = Arc::new(GoogleClient::new(GoogleCredentials {
        client_id: config.google_client_id.clone(),
        client_secret: config.google_client_secret.clone(),
        redirect_uri: config.google_redirect_uri.clone(),
    }));

    let port = config.port;
    let state = AppState::new(
        config,
        store,
        google,
        vault,
        Arc::new(SlidingWindowLimiter::for_sync()),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::calendars::router())
        .merge(routes::events::router())
        .merge(routes::chores::router())
        .merge(routes::cron::router())
        .merge(routes::webhook::router())
        .merge(routes::auth::router())
        .with_state(state)
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("homeboard-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
