//! Reference closure of a root entry.
//!
//! Walks link-valued fields depth-first with an explicit worklist so that deep
//! or cyclic reference graphs neither recurse on the call stack nor loop.
//!
//! # Invariants
//! - Every entry is expanded at most once per walk; the root counts as visited.
//! - Assets are fetched once and never expanded.
//! - The walk aborts on the first failed fetch; nothing partial is returned.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::{AssetId, ContentStore, EntityLink, Entry, EntryId, Locale, ReleaseError};

/// Default ceiling on the number of linked resources one walk may collect.
pub const DEFAULT_MAX_REFERENCES: usize = 5000;

/// Collects every entry and asset reachable from a root entry.
pub struct ReferenceCollector<'a, S: ?Sized> {
    store: &'a S,
    locale: &'a Locale,
    limit: usize,
}

struct Walk {
    visited: HashSet<EntryId>,
    assets: HashSet<AssetId>,
    collected: Vec<EntityLink>,
}

impl<'a, S> ReferenceCollector<'a, S>
where
    S: ContentStore + ?Sized,
{
    /// Creates a collector reading fields under `locale` and stopping with an
    /// error once more than `limit` resources have been collected.
    pub fn new(store: &'a S, locale: &'a Locale, limit: usize) -> Self {
        Self {
            store,
            locale,
            limit,
        }
    }

    /// Returns the links reachable from `root` in depth-first preorder: each
    /// linked entry is followed through before its parent's next link.
    ///
    /// The root itself is never part of the result. Entries appear once each;
    /// an asset linked from several places appears once.
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::Upstream`] if fetching any linked entry or asset fails.
    /// - [`ReleaseError::ReferenceLimitExceeded`] if the closure is larger than
    ///   the configured limit.
    #[instrument(skip_all, fields(root = %root.id))]
    pub async fn collect(&self, root: &Entry) -> Result<Vec<EntityLink>, ReleaseError> {
        let mut walk = Walk {
            visited: HashSet::from([root.id.clone()]),
            assets: HashSet::new(),
            collected: Vec::new(),
        };

        // One frame per entry being expanded; the top frame is the deepest.
        let mut frames = vec![root.links(self.locale).into_iter()];
        while let Some(frame) = frames.last_mut() {
            let Some(link) = frame.next() else {
                frames.pop();
                continue;
            };
            match &link {
                EntityLink::Entry(id) => {
                    if !walk.visited.insert(id.clone()) {
                        continue;
                    }
                    self.record(link.clone(), &mut walk)?;
                    let entry = self.store.get_entry(id).await?;
                    frames.push(entry.links(self.locale).into_iter());
                }
                EntityLink::Asset(id) => {
                    if walk.assets.contains(id) {
                        continue;
                    }
                    self.store.get_asset(id).await?;
                    walk.assets.insert(id.clone());
                    self.record(link.clone(), &mut walk)?;
                }
            }
        }

        debug!(count = walk.collected.len(), "Collected references");
        Ok(walk.collected)
    }

    fn record(&self, link: EntityLink, walk: &mut Walk) -> Result<(), ReleaseError> {
        if walk.collected.len() >= self.limit {
            return Err(ReleaseError::ReferenceLimitExceeded { limit: self.limit });
        }
        walk.collected.push(link);
        Ok(())
    }
}
