//! In-memory [`ContentStore`].
//!
//! Holds entries, assets, and releases in process memory with the same
//! version-checked update semantics as the real backend. Used as the test
//! double for the scheduler and the HTTP layer.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    Asset, AssetId, ContentError, ContentStore, EntityLink, Entry, EntryId, LinkKind, ReleaseBatch,
    ReleaseId, ReleaseTitle,
};

#[derive(Default)]
struct State {
    entries: BTreeMap<EntryId, Entry>,
    assets: BTreeMap<AssetId, Asset>,
    releases: Vec<ReleaseBatch>,
    unavailable: HashSet<String>,
    next_release: u64,
    creates: usize,
    updates: usize,
}

/// A [`ContentStore`] backed by process memory.
#[derive(Default)]
pub struct InMemoryContentStore {
    state: Mutex<State>,
}

impl InMemoryContentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds or replaces an entry.
    pub fn insert_entry(&self, entry: Entry) {
        self.state().entries.insert(entry.id.clone(), entry);
    }

    /// Adds or replaces an asset.
    pub fn insert_asset(&self, id: AssetId) {
        self.state().assets.insert(id.clone(), Asset { id });
    }

    /// Adds an existing release verbatim.
    pub fn insert_release(&self, release: ReleaseBatch) {
        self.state().releases.push(release);
    }

    /// Makes every later fetch of the entry or asset with `id` fail with a
    /// server error.
    pub fn make_unavailable(&self, id: &str) {
        self.state().unavailable.insert(id.to_string());
    }

    /// Returns a snapshot of all releases.
    pub fn releases(&self) -> Vec<ReleaseBatch> {
        self.state().releases.clone()
    }

    /// Returns the release titled `title`, if any.
    pub fn release_titled(&self, title: &ReleaseTitle) -> Option<ReleaseBatch> {
        self.state().releases.iter().find(|r| &r.title == title).cloned()
    }

    /// Number of releases created through [`ContentStore::create_release`].
    pub fn create_count(&self) -> usize {
        self.state().creates
    }

    /// Number of successful [`ContentStore::update_release`] calls.
    pub fn update_count(&self) -> usize {
        self.state().updates
    }
}

fn unavailable(id: &str) -> ContentError {
    ContentError::Api {
        status: 503,
        message: format!("'{id}' is unavailable"),
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_entry(&self, id: &EntryId) -> Result<Entry, ContentError> {
        let state = self.state();
        if state.unavailable.contains(id.as_str()) {
            return Err(unavailable(id.as_str()));
        }
        state
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                kind: LinkKind::Entry,
                id: id.to_string(),
            })
    }

    async fn get_asset(&self, id: &AssetId) -> Result<Asset, ContentError> {
        let state = self.state();
        if state.unavailable.contains(id.as_str()) {
            return Err(unavailable(id.as_str()));
        }
        state
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                kind: LinkKind::Asset,
                id: id.to_string(),
            })
    }

    async fn list_releases(&self) -> Result<Vec<ReleaseBatch>, ContentError> {
        Ok(self.state().releases.clone())
    }

    async fn create_release(&self, title: &ReleaseTitle) -> Result<ReleaseBatch, ContentError> {
        let mut state = self.state();
        state.next_release += 1;
        let id = ReleaseId::new(format!("release-{}", state.next_release)).ok_or_else(|| {
            ContentError::Decode {
                message: "generated an empty release id".into(),
            }
        })?;
        let release = ReleaseBatch {
            id,
            title: title.clone(),
            version: 1,
            members: Vec::new(),
        };
        state.releases.push(release.clone());
        state.creates += 1;
        Ok(release)
    }

    async fn update_release(
        &self,
        release: &ReleaseBatch,
        members: Vec<EntityLink>,
    ) -> Result<ReleaseBatch, ContentError> {
        let mut state = self.state();
        let stored = state
            .releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| ContentError::Api {
                status: 404,
                message: format!("release '{}' not found", release.id),
            })?;
        if stored.version != release.version {
            return Err(ContentError::Conflict {
                title: release.title.clone(),
                expected_version: release.version,
            });
        }
        stored.members = members;
        stored.version += 1;
        let updated = stored.clone();
        state.updates += 1;
        Ok(updated)
    }
}
