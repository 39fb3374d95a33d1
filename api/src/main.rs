use std::net::SocketAddr;
use std::sync::Arc;

use finmock_core::{FixtureError, FsFixtureRepository};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "finmock",
        version = "0.1.0",
        description = "Mock financial-data control plane for agent integration tests. Tools are served from canned fixtures behind a session-gated login."
    ),
    paths(
        routes::health::health_check,
        routes::mcp_stream::mcp_post,
        routes::login::login_page,
        routes::login::login_submit,
    ),
    components(schemas(
        HealthResponse,
        finmock_core::error::ApiError,
        routes::login::LoginSubmit,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Sessions seen since startup
    pub sessions: usize,
    /// Identities with provisioned fixture data
    pub identities: usize,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("fixture directory unusable: {0}")]
    Fixtures(#[from] FixtureError),

    #[error("server I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "finmock_api=debug,finmock_core=info,finmock_mcp_runtime=info,tower_http=info"
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "finmock server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = config::ServerConfig::from_env()?;

    let fixtures = FsFixtureRepository::open(&config.fixtures_dir).await?;
    tracing::info!(
        fixtures_dir = %fixtures.root().display(),
        base_url = %config.base_url,
        "fixture repository opened"
    );

    let app_state = state::AppState::new(Arc::new(fixtures), config.base_url.clone());
    let app = routes::app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("finmock listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("finmock stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
