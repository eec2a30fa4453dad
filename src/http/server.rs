//! HTTP server for the upload endpoint

use super::handler::{upload_handler, AppState};
use crate::backend::GraphBackend;
use crate::config::ServerConfig;
use crate::error::IngestError;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Bound a whole request; an overrun answers like any other stage timeout
async fn request_deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            let err = IngestError::Timeout { stage: "request" };
            warn!(status = err.status().as_u16(), error = %err, "upload failed");
            err.into_response()
        }
    }
}

/// Build the router: `POST /upload` is the only route
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(config.request_timeout(), request_deadline))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server owning the graph backend for its lifetime
pub struct HttpServer {
    config: ServerConfig,
    backend: Arc<dyn GraphBackend>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, backend: Arc<dyn GraphBackend>) -> Self {
        Self { config, backend }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn start(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
        let state = Arc::new(AppState::new(Arc::clone(&self.backend), &self.config));
        let app = router(state, &self.config);

        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(
            %addr,
            backend = self.backend.name(),
            staging_dir = %self.config.staging_dir.display(),
            "upload endpoint available at POST /upload"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
