//! Per-title mutual exclusion for release read-modify-write cycles.

use std::sync::Arc;

use dashmap::DashMap;
use release::ReleaseTitle;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per release title.
///
/// Locks are created on first use and kept for the life of the process; there
/// is one per release date seen, so the map stays small.
#[derive(Default)]
pub struct TitleLocks {
    inner: DashMap<ReleaseTitle, Arc<AsyncMutex<()>>>,
}

impl TitleLocks {
    /// Waits until no other holder of `title`'s lock remains, then returns a
    /// guard that releases it on drop.
    pub async fn acquire(&self, title: &ReleaseTitle) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.inner.entry(title.clone()).or_default().value());
        lock.lock_owned().await
    }
}
