//! Work-item proxy routes used by the editing UI.
//!
//! Each route forwards to the [`WorkItemTracker`] and relays its JSON as-is.
//! Failures are logged and reported as a fixed JSON error message.

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use release::{WorkItemId, WorkItemQuery, WorkItemTracker};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

type Tracker = Arc<dyn WorkItemTracker>;

/// Which proxy call failed; selects the error message returned to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// `GET /work-items`
    List,
    /// `GET /work-items/{id}`
    Get,
    /// `GET /work-items/fetch-self/{id}`
    FetchSelf,
}

impl ProxyError {
    fn message(self) -> &'static str {
        match self {
            ProxyError::List => "Failed to fetch work items.",
            ProxyError::Get => "Failed to fetch work item.",
            ProxyError::FetchSelf => "Failed to fetch data from self link.",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}

/// Query string of `GET /work-items`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    search_term: String,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    50
}

impl From<SearchParams> for WorkItemQuery {
    fn from(params: SearchParams) -> Self {
        WorkItemQuery {
            search_term: params.search_term,
            page: params.page,
            per_page: params.per_page,
        }
    }
}

/// Builds the proxy routes around `tracker`.
pub fn router<S>(tracker: Tracker) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/work-items", get(list_work_items))
        .route("/work-items/{id}", get(get_work_item))
        .route("/work-items/fetch-self/{id}", get(fetch_self_link))
        .with_state(tracker)
}

async fn list_work_items(
    State(tracker): State<Tracker>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Value>>, ProxyError> {
    let query = WorkItemQuery::from(params);
    tracker.search(&query).await.map(Json).map_err(|err| {
        error!(error = %err, "Error fetching work items");
        ProxyError::List
    })
}

/// Unwraps a numeric work item id, reporting a malformed one as `failure`.
fn work_item_id(
    path: Result<Path<u64>, PathRejection>,
    failure: ProxyError,
) -> Result<u64, ProxyError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        warn!(error = %rejection, "Invalid work item id");
        failure
    })
}

async fn get_work_item(
    State(tracker): State<Tracker>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Value>, ProxyError> {
    let id = work_item_id(path, ProxyError::Get)?;
    tracker.get(WorkItemId::new(id)).await.map(Json).map_err(|err| {
        error!(work_item_id = id, error = %err, "Error fetching work item");
        ProxyError::Get
    })
}

async fn fetch_self_link(
    State(tracker): State<Tracker>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Value>, ProxyError> {
    let id = work_item_id(path, ProxyError::FetchSelf)?;
    tracker
        .fetch_self(WorkItemId::new(id))
        .await
        .map(Json)
        .map_err(|err| {
            error!(work_item_id = id, error = %err, "Error fetching data from self link");
            ProxyError::FetchSelf
        })
}
