//! HTTP service for article generation.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | service info |
//! | `GET /health` | readiness and agent status |
//! | `POST /generate-article` | run the pipeline for one request |
//! | `GET /metrics` | Prometheus text format |
//!
//! Pipeline errors map to status codes through
//! [`AgentError::status_code`](crate::agents::AgentError::status_code);
//! a server whose pipeline failed to start answers 503.

pub mod handlers;
pub mod routes;
pub mod state;

pub use handlers::{ArticleResponse, GenerateArticleRequest, HealthResponse};
pub use routes::create_router;
pub use state::AppState;

/// Serves the router on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, ready = state.pipeline.is_some(), "Starting article service");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down article service");
        })
        .await
}
