//! Error types for the release scheduling domain.
//!
//! [`ReleaseError`] covers everything that stops one webhook invocation.
//! Failures reported by the content backend are described by [`ContentError`]
//! and wrapped into [`ReleaseError::Upstream`]; work-tracking failures use
//! [`WorkItemError`] and never reach the scheduler.
//!
//! None of these errors is retried inside the workspace. The webhook sender
//! owns redelivery.

use thiserror::Error;

use crate::{LinkKind, ReleaseTitle};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Why an inbound notification was rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload carries no `sys.id`.
    #[error("entry id is missing")]
    MissingEntryId,

    /// The `workItemId` field is absent, not a sequence, or empty.
    #[error("workItemId field is missing or empty")]
    MissingWorkItem,

    /// `releaseDate` is present but is not a recognisable date.
    #[error("release date '{raw}' is not a valid date")]
    InvalidReleaseDate {
        /// The value as received.
        raw: String,
    },
}

// ---------------------------------------------------------------------------
// Content backend
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::ContentStore`] implementation.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The requested entry or asset does not exist.
    #[error("{kind} '{id}' was not found")]
    NotFound {
        /// Kind of resource requested.
        kind: LinkKind,
        /// The id that was requested.
        id: String,
    },

    /// The release was modified by someone else since it was read.
    #[error("release '{title}' was modified concurrently (expected version {expected_version})")]
    Conflict {
        /// Title of the release being updated.
        title: ReleaseTitle,
        /// The version the update was based on.
        expected_version: u64,
    },

    /// The backend answered with an unexpected HTTP status.
    #[error("content backend returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body, if any.
        message: String,
    },

    /// The request could not be sent or the response could not be received.
    #[error("content backend request failed: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("content backend response could not be decoded: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Invocation-level errors
// ---------------------------------------------------------------------------

/// Errors that abort one webhook invocation.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The notification is malformed. No side effects have happened.
    #[error("invalid notification: {0}")]
    Validation(#[from] ValidationError),

    /// A call to the content backend failed. Nothing was written after the
    /// failure; a batch created before it may remain with its prior members.
    #[error(transparent)]
    Upstream(#[from] ContentError),

    /// The reference closure grew past the configured ceiling.
    #[error("reference closure exceeded the limit of {limit} linked resources")]
    ReferenceLimitExceeded {
        /// The configured ceiling.
        limit: usize,
    },
}

// ---------------------------------------------------------------------------
// Work tracking
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::WorkItemTracker`] implementation.
#[derive(Debug, Error)]
pub enum WorkItemError {
    /// The work-tracking API answered with an unexpected HTTP status.
    #[error("work-tracking API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The request could not be sent or the response could not be received.
    #[error("work-tracking request failed: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("work-tracking response could not be decoded: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}
