use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use listener::{create_router, AppState};
use release::{InMemoryContentStore, WorkItemError, WorkItemId, WorkItemQuery, WorkItemTracker};
use scheduler::{ReleaseScheduler, SchedulerSettings};
use serde_json::{json, Value};

/// Tracker double holding work items `1..=count`, newest (highest id) first.
struct FakeTracker {
    count: u64,
    failing: bool,
    queries: Mutex<Vec<WorkItemQuery>>,
}

impl FakeTracker {
    fn new(count: u64) -> Self {
        Self {
            count,
            failing: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(0)
        }
    }

    fn item(id: u64) -> Value {
        json!({ "id": id, "fields": { "System.Title": format!("Item {id}") } })
    }

    fn check(&self) -> Result<(), WorkItemError> {
        if self.failing {
            Err(WorkItemError::Api {
                status: 401,
                message: "unauthorized".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WorkItemTracker for FakeTracker {
    async fn search(&self, query: &WorkItemQuery) -> Result<Vec<Value>, WorkItemError> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());
        let ids: Vec<u64> = (1..=self.count).rev().collect();
        Ok(query.page_of(&ids).iter().map(|id| Self::item(*id)).collect())
    }

    async fn get(&self, id: WorkItemId) -> Result<Value, WorkItemError> {
        self.check()?;
        Ok(Self::item(id.as_u64()))
    }

    async fn fetch_self(&self, id: WorkItemId) -> Result<Value, WorkItemError> {
        self.check()?;
        Ok(json!({ "id": id.as_u64(), "rev": 9, "url": format!("https://example.test/{id}") }))
    }
}

fn server_with(tracker: Arc<FakeTracker>) -> TestServer {
    let scheduler = ReleaseScheduler::new(
        Arc::new(InMemoryContentStore::new()),
        SchedulerSettings::default(),
    );
    let state = AppState {
        scheduler: Arc::new(scheduler),
    };
    TestServer::new(create_router(state, Some(tracker))).unwrap()
}

#[tokio::test]
async fn lists_first_page_by_default() {
    let tracker = Arc::new(FakeTracker::new(60));
    let server = server_with(tracker.clone());

    let response = server.get("/work-items").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let items = response.json::<Vec<Value>>();
    assert_eq!(items.len(), 50);
    assert_eq!(items[0]["id"], 60);
    assert_eq!(
        tracker.queries.lock().unwrap()[0],
        WorkItemQuery {
            search_term: String::new(),
            page: 1,
            per_page: 50
        }
    );
}

#[tokio::test]
async fn forwards_search_and_paging_parameters() {
    let tracker = Arc::new(FakeTracker::new(12));
    let server = server_with(tracker.clone());

    let response = server
        .get("/work-items")
        .add_query_param("searchTerm", "checkout")
        .add_query_param("page", 2)
        .add_query_param("perPage", 5)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let ids: Vec<u64> = response
        .json::<Vec<Value>>()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    assert_eq!(tracker.queries.lock().unwrap()[0].search_term, "checkout");
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let server = server_with(Arc::new(FakeTracker::new(3)));

    let response = server.get("/work-items").add_query_param("page", 4).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn fetches_single_work_item() {
    let server = server_with(Arc::new(FakeTracker::new(3)));

    let response = server.get("/work-items/42").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["id"], 42);
}

#[tokio::test]
async fn follows_self_link() {
    let server = server_with(Arc::new(FakeTracker::new(3)));

    let response = server.get("/work-items/fetch-self/42").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["url"], "https://example.test/42");
}

#[tokio::test]
async fn upstream_failures_map_to_fixed_messages() {
    let server = server_with(Arc::new(FakeTracker::failing()));

    let cases = [
        ("/work-items", "Failed to fetch work items."),
        ("/work-items/1", "Failed to fetch work item."),
        ("/work-items/fetch-self/1", "Failed to fetch data from self link."),
    ];
    for (path, message) in cases {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>(), json!({ "error": message }));
    }
}

#[tokio::test]
async fn non_numeric_id_gets_the_route_error() {
    let server = server_with(Arc::new(FakeTracker::new(3)));

    let response = server.get("/work-items/abc").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Failed to fetch work item." }));

    let response = server.get("/work-items/fetch-self/abc").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to fetch data from self link." })
    );
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let server = server_with(Arc::new(FakeTracker::new(1)));

    let response = server
        .get("/work-items/1")
        .add_header("Origin", "https://app.example.test")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), "*");
}
