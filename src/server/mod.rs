//! HTTP front end for video generation.
//!
//! Exposes a thin API over the session driver:
//! - `GET /health`
//! - `POST /api/videos`: builds a task, runs one session, returns the
//!   result location with a share token
//!
//! Persistence and authentication belong to the caller's deployment.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use livegen::server::{create_router, AppState};
//! use livegen::Config;
//!
//! let state = Arc::new(AppState::new(Config::from_env()));
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
//! axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
//! ```

mod handlers;
mod state;

pub use handlers::{
    create_router, health_check, GenerateVideoRequest, GenerateVideoResponse, HealthResponse,
};
pub use state::{AppState, RateDecision, RateLimiter};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::{LivegenError, Result};

/// Bind `addr` and serve the API until the process exits.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LivegenError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    serve_listener(listener, state).await
}

/// Serve the API on an already bound listener.
pub async fn serve_listener(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("HTTP server listening on {}", addr);

    let cleanup = state.spawn_limiter_cleanup();
    let app = create_router(state);
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;
    cleanup.abort();

    served.map_err(|e| LivegenError::Server(format!("HTTP server error: {}", e)))
}
