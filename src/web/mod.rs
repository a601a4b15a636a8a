pub mod routes;

use axum::{routing::get, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};

use crate::analysis::{self, AnalysisError, TriageAnalyzer};
use crate::config::Config;
use crate::issue::{GitHubClient, IssueError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    GitHub(#[from] IssueError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Read-only state shared by all handlers.
pub struct AppState {
    pub github: GitHubClient,
    pub analyzer: TriageAnalyzer,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Ok(Self {
            github: GitHubClient::from_config(config)?,
            analyzer: analysis::analyzer_from_config(config)?,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route(
            "/analyze",
            get(routes::analyze_query).post(routes::analyze_form),
        )
        .with_state(state)
}

/// Serve the dashboard on `addr` until Ctrl+C.
pub async fn serve(config: &Config, addr: &str) -> Result<(), ServerError> {
    let state = Arc::new(AppState::from_config(config)?);
    info!(
        primary = state.analyzer.primary_model(),
        fallback = state.analyzer.fallback_model(),
        "analyzer ready"
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(addr = %addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
