//! Port traits implemented by infrastructure crates.
//!
//! The domain only ever talks to the content backend and the work-tracking
//! system through these traits, so tests can substitute
//! [`crate::memory::InMemoryContentStore`] or any other double.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    Asset, AssetId, ContentError, EntityLink, Entry, EntryId, ReleaseBatch, ReleaseTitle,
    WorkItemError, WorkItemId,
};

// ---------------------------------------------------------------------------
// Content backend
// ---------------------------------------------------------------------------

/// Read/write access to one environment of the content backend.
///
/// Every method is a single network round trip with no retry; failures are
/// returned to the caller as-is.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetches an entry with all of its localized fields.
    async fn get_entry(&self, id: &EntryId) -> Result<Entry, ContentError>;

    /// Fetches an asset.
    async fn get_asset(&self, id: &AssetId) -> Result<Asset, ContentError>;

    /// Lists every release in the environment.
    async fn list_releases(&self) -> Result<Vec<ReleaseBatch>, ContentError>;

    /// Creates a release with `title` and no members.
    async fn create_release(&self, title: &ReleaseTitle) -> Result<ReleaseBatch, ContentError>;

    /// Replaces the member list of `release` with `members`, keeping its title.
    ///
    /// The update is conditional on `release.version`; implementations return
    /// [`ContentError::Conflict`] when the stored release has moved on.
    async fn update_release(
        &self,
        release: &ReleaseBatch,
        members: Vec<EntityLink>,
    ) -> Result<ReleaseBatch, ContentError>;
}

// ---------------------------------------------------------------------------
// Work tracking
// ---------------------------------------------------------------------------

/// Page and search term for a work-item listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemQuery {
    /// Text the work item title must contain. Empty matches everything.
    pub search_term: String,
    /// 1-based page number.
    pub page: usize,
    /// Items per page.
    pub per_page: usize,
}

impl Default for WorkItemQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            page: 1,
            per_page: 50,
        }
    }
}

impl WorkItemQuery {
    /// Returns the slice of `ids` that falls on this page.
    ///
    /// Page numbers below 1 are treated as 1; pages past the end are empty.
    pub fn page_of<'a, T>(&self, ids: &'a [T]) -> &'a [T] {
        let page = self.page.max(1);
        let start = (page - 1).saturating_mul(self.per_page).min(ids.len());
        let end = page.saturating_mul(self.per_page).min(ids.len());
        &ids[start..end]
    }
}

/// Read-only access to the external work-tracking system.
///
/// Responses are passed through as raw JSON; the editing UI owns their schema.
#[async_trait]
pub trait WorkItemTracker: Send + Sync {
    /// Lists the work items whose titles contain the query's search term,
    /// newest first, restricted to the requested page.
    async fn search(&self, query: &WorkItemQuery) -> Result<Vec<Value>, WorkItemError>;

    /// Fetches one work item with the standard field set.
    async fn get(&self, id: WorkItemId) -> Result<Value, WorkItemError>;

    /// Fetches a work item and then the resource behind its `self` link.
    async fn fetch_self(&self, id: WorkItemId) -> Result<Value, WorkItemError>;
}
