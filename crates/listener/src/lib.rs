//! HTTP surface of the release scheduler.
//!
//! Serves two groups of routes on one listener:
//!
//! - `POST /webhook`: entry change notifications from the content backend,
//!   handed to [`scheduler::ReleaseScheduler`].
//! - `GET /work-items/...`: read-only proxy to the work-tracking system for the
//!   editing UI. Mounted only when a [`release::WorkItemTracker`] is configured.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, body parsing, status codes, CORS, and request
//! tracing live here. Domain decisions are delegated to the scheduler.

pub mod webhook;
pub mod work_items;

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use release::WorkItemTracker;
use scheduler::ReleaseScheduler;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state of the webhook route.
#[derive(Clone)]
pub struct AppState {
    /// Scheduler handling eligible notifications.
    pub scheduler: Arc<ReleaseScheduler>,
}

/// Builds the full router.
///
/// Pass `None` for `work_items` to serve the webhook only.
pub fn create_router(state: AppState, work_items: Option<Arc<dyn WorkItemTracker>>) -> Router {
    let mut router = Router::new().route("/webhook", post(webhook::receive_entry_change));
    if let Some(tracker) = work_items {
        router = router.merge(work_items::router(tracker));
    }

    router
        .fallback(route_not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found." })),
    )
}

/// Serves `router` on `listener` until `shutdown` resolves, then drains
/// in-flight requests.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Server running");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
