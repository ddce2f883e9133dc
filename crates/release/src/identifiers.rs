//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging an
//! [`EntryId`] with an [`AssetId`] even though both are strings issued by the
//! same content backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: content backend
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a content entry (`sys.id` of an Entry resource).
    EntryId
}

string_id! {
    /// Identifies a media asset (`sys.id` of an Asset resource).
    AssetId
}

string_id! {
    /// Identifies a release batch as assigned by the content backend.
    ReleaseId
}

string_id! {
    /// A content locale code (e.g. `"en-US"`) used to read localized field values.
    Locale
}

impl Default for Locale {
    /// The backend's default locale, `en-US`.
    fn default() -> Self {
        Self("en-US".to_string())
    }
}

// ---------------------------------------------------------------------------
// Release titles
// ---------------------------------------------------------------------------

/// Title of a dated release batch, always of the form `"Release - YYYY-MM-DD"`.
///
/// The title is the only key used to find an existing batch, so it is only
/// ever built from a calendar date and compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReleaseTitle(String);

impl ReleaseTitle {
    /// Prefix shared by every machine-generated release title.
    pub const PREFIX: &'static str = "Release - ";

    /// Builds the title for the batch collecting content released on `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self(format!("{}{}", Self::PREFIX, date.format("%Y-%m-%d")))
    }

    /// Wraps a title read back from the content backend.
    ///
    /// Titles of manually created releases are accepted verbatim; they simply
    /// never compare equal to a generated one unless they match exactly.
    pub fn from_existing(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Returns the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReleaseTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: work tracking (integer-backed)
// ---------------------------------------------------------------------------

/// Identifies a work item in the external work-tracking system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItemId(u64);

impl WorkItemId {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single webhook invocation.
///
/// Generated fresh for every inbound notification and attached to the
/// invocation's span so all upstream calls made on its behalf can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
