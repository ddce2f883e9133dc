//! Core release scheduling domain.
//!
//! This crate contains every domain concept, newtype identifier, batching rule,
//! and port trait used by the release scheduler. Infrastructure crates implement
//! the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`EntryId`, `ReleaseTitle`, etc.) |
//! | [`types`] | Entries, links, release batches, release dates |
//! | [`errors`] | Validation, content backend, and invocation errors |
//! | [`eligibility`] | Gate deciding whether a notification schedules anything |
//! | [`batch`] | Find-or-create of dated batches and member merging |
//! | [`collector`] | Reference closure of a root entry |
//! | [`ports`] | `ContentStore` and `WorkItemTracker` traits |
//! | [`memory`] | In-memory `ContentStore` |

pub mod batch;
pub mod collector;
pub mod eligibility;
pub mod errors;
pub mod identifiers;
pub mod memory;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use batch::{dedup_by_id, merge_members, resolve_batch, ResolvedBatch};
pub use collector::{ReferenceCollector, DEFAULT_MAX_REFERENCES};
pub use eligibility::{
    evaluate, Eligibility, EntryNotification, IneligibleReason, NotificationSys,
    ReleaseCandidate, READY_FOR_RELEASE, WORK_ITEM_FIELD,
};
pub use errors::{ContentError, ReleaseError, ValidationError, WorkItemError};
pub use identifiers::{AssetId, EntryId, InvocationId, Locale, ReleaseId, ReleaseTitle, WorkItemId};
pub use memory::InMemoryContentStore;
pub use ports::{ContentStore, WorkItemQuery, WorkItemTracker};
pub use types::{
    Asset, EntityLink, Entry, LinkKind, LocalizedValues, ReleaseBatch, ReleaseDate, WorkItemRef,
};
