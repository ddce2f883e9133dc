//! Release scheduler orchestration.
//!
//! [`ReleaseScheduler`] sequences one webhook invocation through the domain
//! rules in the [`release`] crate:
//!
//! ```text
//! Received → EligibilityChecked → Rejected
//!                               → BatchResolved → GraphCollected → Merged → Persisted
//! ```
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The scheduler sequences calls between business
//! logic in [`release`] and the [`release::ContentStore`] port. It contains no
//! domain rules of its own.
//!
//! ## Concurrency
//!
//! Invocations that resolve to the same release title are serialised inside
//! the process (see [`locks`]), so the second one reads the first one's write.
//! Writers in other processes are detected by the version check on
//! [`release::ContentStore::update_release`] and surface as
//! [`release::ContentError::Conflict`]; they are not retried.

pub mod locks;

use std::sync::Arc;

use release::{
    evaluate, merge_members, resolve_batch, ContentStore, Eligibility, EntityLink,
    EntryNotification, EntryId, IneligibleReason, InvocationId, Locale, ReferenceCollector,
    ReleaseCandidate, ReleaseError, ReleaseId, ReleaseTitle, ValidationError,
    DEFAULT_MAX_REFERENCES,
};
use tracing::{info, info_span, Instrument};

use crate::locks::TitleLocks;

/// Tunables for a [`ReleaseScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Locale read from entry fields and from the notification's work-item field.
    pub locale: Locale,
    /// Ceiling on the number of resources one reference walk may collect.
    pub max_references: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            max_references: DEFAULT_MAX_REFERENCES,
        }
    }
}

/// A release that was written by [`ReleaseScheduler::schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRelease {
    /// The entry that triggered the invocation.
    pub entry_id: EntryId,
    /// The release the entry was added to.
    pub release_id: ReleaseId,
    /// Title of that release.
    pub title: ReleaseTitle,
    /// `true` if the release was created by this invocation.
    pub created: bool,
    /// Member count after the update.
    pub member_count: usize,
}

/// Result of handling one notification end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The entry is not ready; nothing was read or written.
    NoAction(IneligibleReason),
    /// The entry and its references were added to a release.
    Scheduled(ScheduledRelease),
}

/// Schedules content entries into dated release batches.
pub struct ReleaseScheduler {
    store: Arc<dyn ContentStore>,
    settings: SchedulerSettings,
    locks: TitleLocks,
}

impl ReleaseScheduler {
    /// Creates a scheduler writing to `store`.
    pub fn new(store: Arc<dyn ContentStore>, settings: SchedulerSettings) -> Self {
        Self {
            store,
            settings,
            locks: TitleLocks::default(),
        }
    }

    /// Runs the eligibility gate. Performs no I/O.
    pub fn assess(&self, notification: &EntryNotification) -> Result<Eligibility, ValidationError> {
        evaluate(notification, &self.settings.locale)
    }

    /// Gates `notification` and schedules its entry if eligible.
    pub async fn handle(
        &self,
        notification: &EntryNotification,
    ) -> Result<ScheduleOutcome, ReleaseError> {
        match self.assess(notification)? {
            Eligibility::Ineligible(reason) => Ok(ScheduleOutcome::NoAction(reason)),
            Eligibility::Eligible(candidate) => {
                self.schedule(&candidate).await.map(ScheduleOutcome::Scheduled)
            }
        }
    }

    /// Adds `candidate` and everything it references to the release for its date.
    ///
    /// The new member list is computed in memory and written with a single
    /// update, so a failure at any step leaves the release as it was (apart
    /// from a freshly created, still empty release).
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::Upstream`] for any failed backend call, including a
    ///   version conflict on the final update.
    /// - [`ReleaseError::ReferenceLimitExceeded`] if the entry's reference
    ///   closure is larger than [`SchedulerSettings::max_references`].
    pub async fn schedule(
        &self,
        candidate: &ReleaseCandidate,
    ) -> Result<ScheduledRelease, ReleaseError> {
        let span = info_span!(
            "schedule_release",
            invocation_id = %InvocationId::new_random(),
            entry_id = %candidate.entry_id,
            release_date = %candidate.release_date,
        );
        self.schedule_inner(candidate).instrument(span).await
    }

    async fn schedule_inner(
        &self,
        candidate: &ReleaseCandidate,
    ) -> Result<ScheduledRelease, ReleaseError> {
        let title = candidate.release_date.release_title();
        let _guard = self.locks.acquire(&title).await;

        let resolved = resolve_batch(self.store.as_ref(), &title).await?;

        let root = self.store.get_entry(&candidate.entry_id).await?;
        let collected = ReferenceCollector::new(
            self.store.as_ref(),
            &self.settings.locale,
            self.settings.max_references,
        )
        .collect(&root)
        .await?;

        let members = merge_members(
            &resolved.batch.members,
            EntityLink::Entry(candidate.entry_id.clone()),
            collected,
        );
        let updated = self.store.update_release(&resolved.batch, members).await?;

        info!(
            release_id = %updated.id,
            title = %updated.title,
            members = updated.members.len(),
            created = resolved.created,
            "Entry and its references added to release"
        );

        Ok(ScheduledRelease {
            entry_id: candidate.entry_id.clone(),
            release_id: updated.id,
            title: updated.title,
            created: resolved.created,
            member_count: updated.members.len(),
        })
    }
}
