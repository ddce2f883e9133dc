//! Release batch resolution and member merging.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::{ContentError, ContentStore, EntityLink, ReleaseBatch, ReleaseTitle};

/// A batch returned by [`resolve_batch`], and whether this call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBatch {
    /// The batch to merge into.
    pub batch: ReleaseBatch,
    /// `true` if no batch with the title existed before this call.
    pub created: bool,
}

/// Finds the release titled exactly `title`, creating an empty one if none exists.
///
/// Lists every release and takes the first exact title match, so repeated
/// calls for the same title return the same batch.
///
/// # Errors
///
/// Propagates any [`ContentError`] from listing or creating releases.
pub async fn resolve_batch<S>(store: &S, title: &ReleaseTitle) -> Result<ResolvedBatch, ContentError>
where
    S: ContentStore + ?Sized,
{
    let releases = store.list_releases().await?;
    if let Some(batch) = releases.into_iter().find(|r| &r.title == title) {
        debug!(release_id = %batch.id, title = %title, members = batch.members.len(), "Found existing release");
        return Ok(ResolvedBatch {
            batch,
            created: false,
        });
    }

    let batch = store.create_release(title).await?;
    info!(release_id = %batch.id, title = %title, "Created new release");
    Ok(ResolvedBatch {
        batch,
        created: true,
    })
}

/// Removes links whose id was already seen, keeping the first occurrence.
///
/// Ids are compared without regard to link kind.
pub fn dedup_by_id(links: impl IntoIterator<Item = EntityLink>) -> Vec<EntityLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.id().to_string()))
        .collect()
}

/// Builds the new member list of a batch: its current members, then `root`,
/// then everything `root` references, deduplicated by id (first wins).
pub fn merge_members(
    existing: &[EntityLink],
    root: EntityLink,
    collected: impl IntoIterator<Item = EntityLink>,
) -> Vec<EntityLink> {
    dedup_by_id(
        existing
            .iter()
            .cloned()
            .chain(std::iter::once(root))
            .chain(collected),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetId, EntryId};

    fn entry(id: &str) -> EntityLink {
        EntityLink::Entry(EntryId::new(id).unwrap())
    }

    fn asset(id: &str) -> EntityLink {
        EntityLink::Asset(AssetId::new(id).unwrap())
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let out = dedup_by_id(vec![entry("a"), asset("x"), entry("b"), asset("x"), entry("a")]);
        assert_eq!(out, vec![entry("a"), asset("x"), entry("b")]);
    }

    #[test]
    fn dedup_ignores_kind_when_ids_collide() {
        let out = dedup_by_id(vec![entry("same"), asset("same")]);
        assert_eq!(out, vec![entry("same")]);
    }

    #[test]
    fn merge_puts_existing_members_first() {
        let existing = vec![entry("old"), asset("logo")];
        let merged = merge_members(&existing, entry("root"), vec![entry("c"), asset("logo"), asset("y")]);
        assert_eq!(
            merged,
            vec![entry("old"), asset("logo"), entry("root"), entry("c"), asset("y")]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let collected = vec![entry("c"), asset("y"), asset("y")];
        let once = merge_members(&[], entry("root"), collected.clone());
        let twice = merge_members(&once, entry("root"), collected);
        assert_eq!(once, twice);
    }
}
