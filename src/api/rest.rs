//! Router assembly and the HTTP server itself.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{handlers, AppState};

/// Request bodies are opaque payload strings plus a few scalar fields; 1 MiB
/// is far beyond any legitimate request.
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Builds the complete router for the queue API.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/queue", post(handlers::create_queue))
        .route("/queue/admin/clear", delete(handlers::clear_all))
        .route(
            "/queue/:queue_id/task",
            post(handlers::enqueue_task).get(handlers::dequeue_task),
        )
        .route("/queue/:queue_id/result", post(handlers::submit_result))
        .route(
            "/queue/:queue_id/result/:task_id",
            get(handlers::get_result),
        )
        .route("/queue/:queue_id/status", get(handlers::queue_status))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE))
                .layer(TraceLayer::new_for_http()),
        )
}

/// Binds the listener and serves until `shutdown` resolves.
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr.parse()?;
    let app = create_router().with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "task queue API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
