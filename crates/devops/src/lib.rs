//! Work-tracking adapter.
//!
//! Implements the [`release::WorkItemTracker`] trait over the work item REST
//! API. Responses are forwarded as raw JSON; the editing UI reads them.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Query language, URL layout, API versioning, and basic
//! authentication with a personal access token live here.

use std::time::Duration;

use async_trait::async_trait;
use release::{WorkItemError, WorkItemId, WorkItemQuery, WorkItemTracker};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// API version sent with every request.
pub const API_VERSION: &str = "7.1";

/// Fields returned for listed and individually fetched work items.
pub const WORK_ITEM_FIELDS: &str =
    "System.Id,System.Title,System.State,System.AssignedTo,System.CreatedBy,System.CreatedDate";

/// Fields requested when only the `self` link is needed.
pub const SELF_LINK_FIELDS: &str = "System.Id,System.Title,System.State";

/// Connection settings for [`DevOpsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevOpsSettings {
    /// Project-scoped API base, e.g. `https://{org}.visualstudio.com/{project}/_apis`.
    pub base_url: String,
    /// Personal access token, sent as the password of basic authentication.
    pub personal_access_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl DevOpsSettings {
    /// Returns the project-scoped API base for `organization` and `project`.
    pub fn default_base_url(organization: &str, project: &str) -> String {
        format!("https://{organization}.visualstudio.com/{project}/_apis")
    }
}

/// Builds the query listing work items whose title contains `search_term`,
/// newest first.
///
/// Single quotes in the term are doubled so it stays one string literal.
pub fn title_search_query(search_term: &str) -> String {
    format!(
        "SELECT [System.Id], [System.Title], [System.State] FROM WorkItems \
         WHERE [System.Title] CONTAINS '{}' ORDER BY [System.CreatedDate] DESC",
        search_term.replace('\'', "''")
    )
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Deserialize)]
struct WorkItemReference {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WorkItemBatch {
    #[serde(default)]
    value: Vec<Value>,
}

/// Returns the `_links.self.href` of a work item.
fn self_link(work_item: &Value) -> Option<&str> {
    work_item.pointer("/_links/self/href")?.as_str()
}

/// [`WorkItemTracker`] over the work item REST API.
#[derive(Debug, Clone)]
pub struct DevOpsClient {
    http: reqwest::Client,
    settings: DevOpsSettings,
}

fn transport(err: reqwest::Error) -> WorkItemError {
    WorkItemError::Transport {
        message: err.to_string(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, WorkItemError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WorkItemError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    response.json::<T>().await.map_err(|e| WorkItemError::Decode {
        message: e.to_string(),
    })
}

impl DevOpsClient {
    /// Builds a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemError::Transport`] if the HTTP client cannot be built.
    pub fn new(settings: DevOpsSettings) -> Result<Self, WorkItemError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, WorkItemError> {
        request
            .basic_auth("", Some(&self.settings.personal_access_token))
            .send()
            .await
            .map_err(transport)
    }
}

#[async_trait]
impl WorkItemTracker for DevOpsClient {
    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &WorkItemQuery) -> Result<Vec<Value>, WorkItemError> {
        let request = self
            .http
            .post(self.url("wit/wiql"))
            .query(&[("api-version", API_VERSION)])
            .json(&json!({ "query": title_search_query(&query.search_term) }));
        let result: QueryResult = read_json(self.send(request).await?).await?;

        let ids: Vec<u64> = result.work_items.iter().map(|item| item.id).collect();
        let page = query.page_of(&ids);
        debug!(matched = ids.len(), on_page = page.len(), "Work item query finished");
        if page.is_empty() {
            return Ok(Vec::new());
        }

        let ids = page
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self.http.get(self.url("wit/workitems")).query(&[
            ("ids", ids.as_str()),
            ("fields", WORK_ITEM_FIELDS),
            ("api-version", API_VERSION),
        ]);
        let batch: WorkItemBatch = read_json(self.send(request).await?).await?;
        Ok(batch.value)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get(&self, id: WorkItemId) -> Result<Value, WorkItemError> {
        let request = self
            .http
            .get(self.url(&format!("wit/workitems/{id}")))
            .query(&[("fields", WORK_ITEM_FIELDS), ("api-version", API_VERSION)]);
        read_json(self.send(request).await?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_self(&self, id: WorkItemId) -> Result<Value, WorkItemError> {
        let request = self
            .http
            .get(self.url(&format!("wit/workitems/{id}")))
            .query(&[("fields", SELF_LINK_FIELDS), ("api-version", API_VERSION)]);
        let work_item: Value = read_json(self.send(request).await?).await?;

        let href = self_link(&work_item).ok_or_else(|| WorkItemError::Decode {
            message: format!("work item {id} has no self link"),
        })?;
        read_json(self.send(self.http.get(href)).await?).await
    }
}
