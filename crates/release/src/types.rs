//! Shared value types for the release scheduling domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structure the batching rules operate on: localized entry fields, typed links
//! between content, and the member list of a release batch.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AssetId, EntryId, Locale, ReleaseId, ReleaseTitle};

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// The kind of resource a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// A content entry; may link onward.
    Entry,
    /// A media asset; always a leaf.
    Asset,
}

impl LinkKind {
    /// Returns the wire name of this kind (`"Entry"` or `"Asset"`).
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Entry => "Entry",
            LinkKind::Asset => "Asset",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// A typed reference to an entry or an asset.
///
/// Used both for link-valued entry fields and for the members of a
/// [`ReleaseBatch`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum EntityLink {
    /// Link to a content entry.
    Entry(EntryId),
    /// Link to a media asset.
    Asset(AssetId),
}

impl EntityLink {
    /// Returns which kind of resource this link targets.
    pub fn kind(&self) -> LinkKind {
        match self {
            EntityLink::Entry(_) => LinkKind::Entry,
            EntityLink::Asset(_) => LinkKind::Asset,
        }
    }

    /// Returns the raw target id regardless of kind.
    ///
    /// Release membership is deduplicated on this value alone.
    pub fn id(&self) -> &str {
        match self {
            EntityLink::Entry(id) => id.as_str(),
            EntityLink::Asset(id) => id.as_str(),
        }
    }

    /// Interprets a raw field value as a link.
    ///
    /// Returns `None` unless the value has the shape
    /// `{ "sys": { "type": "Link", "linkType": "Entry" | "Asset", "id": "<non-empty>" } }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let sys = value.get("sys")?;
        if sys.get("type")?.as_str()? != "Link" {
            return None;
        }
        let id = sys.get("id")?.as_str()?;
        match sys.get("linkType")?.as_str()? {
            "Entry" => EntryId::new(id).map(EntityLink::Entry),
            "Asset" => AssetId::new(id).map(EntityLink::Asset),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Values of one entry field keyed by locale code.
pub type LocalizedValues = BTreeMap<String, Value>;

/// A content entry as read from the content backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Backend-assigned identifier.
    pub id: EntryId,

    /// Field name → locale → raw value.
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedValues>,
}

impl Entry {
    /// Creates an entry with no fields.
    pub fn new(id: EntryId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Sets the `locale` value of `field`, replacing any previous value.
    pub fn with_field(mut self, field: impl Into<String>, locale: &Locale, value: Value) -> Self {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(locale.as_str().to_string(), value);
        self
    }

    /// Returns every link held by this entry's fields under `locale`, in field
    /// order and then element order.
    ///
    /// A sequence value contributes each of its elements as a candidate; any
    /// other value is a single candidate. Candidates that are not links are
    /// skipped, as are fields with no value for `locale`.
    pub fn links(&self, locale: &Locale) -> Vec<EntityLink> {
        let mut links = Vec::new();
        for values in self.fields.values() {
            let Some(value) = values.get(locale.as_str()) else {
                continue;
            };
            match value {
                Value::Array(items) => links.extend(items.iter().filter_map(EntityLink::from_value)),
                other => links.extend(EntityLink::from_value(other)),
            }
        }
        links
    }
}

// ---------------------------------------------------------------------------

/// A media asset. Assets are leaves of the reference graph; only their
/// existence matters to release batching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Backend-assigned identifier.
    pub id: AssetId,
}

// ---------------------------------------------------------------------------
// Release batches
// ---------------------------------------------------------------------------

/// A named collection of entries and assets published together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseBatch {
    /// Backend-assigned identifier.
    pub id: ReleaseId,

    /// Batch title; the lookup key for dated batches.
    pub title: ReleaseTitle,

    /// Backend version counter, checked on update to detect concurrent writers.
    pub version: u64,

    /// Current members. Ids are unique within a batch.
    pub members: Vec<EntityLink>,
}

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

/// The work-item reference embedded in an entry's `workItemId` field.
///
/// Only the fields that drive release eligibility are read; anything else the
/// editing UI stores alongside them is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemRef {
    /// Workflow state name as reported by the work-tracking system. A
    /// non-string state is kept in its JSON form.
    pub state: Option<String>,

    /// Planned release timestamp, date, or epoch milliseconds, as stored by
    /// the editing UI. `null` is treated as absent.
    pub release_date: Option<Value>,
}

impl WorkItemRef {
    /// Reads a reference from its raw field value without ever failing.
    ///
    /// Anything other than an object yields a reference with neither state
    /// nor date.
    pub fn from_value(value: &Value) -> Self {
        let state = match value.get("state") {
            None | Some(Value::Null) => None,
            Some(Value::String(state)) => Some(state.clone()),
            Some(other) => Some(other.to_string()),
        };
        let release_date = value.get("releaseDate").filter(|v| !v.is_null()).cloned();
        Self {
            state,
            release_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// The calendar day a piece of content is released on (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReleaseDate(NaiveDate);

impl ReleaseDate {
    /// Parses a release timestamp and truncates it to its UTC calendar day.
    ///
    /// Accepts RFC 3339 timestamps (offsets are normalised to UTC first),
    /// timestamps without an offset (taken as UTC), and plain `YYYY-MM-DD`
    /// dates. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc).date_naive()));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(Self(dt.date()));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(Self)
    }

    /// Interprets `millis` as milliseconds since the Unix epoch and takes its
    /// UTC calendar day.
    pub fn from_timestamp_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| Self(dt.date_naive()))
    }

    /// Returns the title of the batch for this date.
    pub fn release_title(self) -> ReleaseTitle {
        ReleaseTitle::for_date(self.0)
    }
}

impl std::fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn en_us() -> Locale {
        Locale::new("en-US").unwrap()
    }

    fn link(kind: &str, id: &str) -> Value {
        json!({ "sys": { "type": "Link", "linkType": kind, "id": id } })
    }

    #[test]
    fn from_value_accepts_entry_and_asset_links() {
        assert_eq!(
            EntityLink::from_value(&link("Entry", "e1")),
            Some(EntityLink::Entry(EntryId::new("e1").unwrap()))
        );
        assert_eq!(
            EntityLink::from_value(&link("Asset", "a1")),
            Some(EntityLink::Asset(AssetId::new("a1").unwrap()))
        );
    }

    #[test]
    fn from_value_ignores_non_links() {
        assert_eq!(EntityLink::from_value(&json!("plain text")), None);
        assert_eq!(EntityLink::from_value(&json!({ "sys": { "type": "Entry", "id": "x" } })), None);
        assert_eq!(EntityLink::from_value(&link("Tag", "t1")), None);
        assert_eq!(EntityLink::from_value(&link("Entry", "")), None);
        assert_eq!(EntityLink::from_value(&json!({ "lat": 1.0, "lon": 2.0 })), None);
    }

    #[test]
    fn links_reads_scalar_and_sequence_fields_for_the_locale() {
        let locale = en_us();
        let entry = Entry::new(EntryId::new("root").unwrap())
            .with_field("title", &locale, json!("Hello"))
            .with_field("hero", &locale, link("Asset", "img"))
            .with_field("related", &locale, json!([link("Entry", "b"), json!(3), link("Entry", "c")]))
            .with_field("empty", &locale, json!([]))
            .with_field("author", &Locale::new("de-DE").unwrap(), link("Entry", "de-only"));

        let links = entry.links(&locale);

        assert_eq!(
            links,
            vec![
                EntityLink::Asset(AssetId::new("img").unwrap()),
                EntityLink::Entry(EntryId::new("b").unwrap()),
                EntityLink::Entry(EntryId::new("c").unwrap()),
            ]
        );
    }

    #[test]
    fn release_date_discards_time_of_day() {
        let date = ReleaseDate::parse("2024-06-01T10:00:00Z").unwrap();
        assert_eq!(date.to_string(), "2024-06-01");
        assert_eq!(date.release_title().as_str(), "Release - 2024-06-01");
    }

    #[test]
    fn release_date_normalises_offsets_to_utc() {
        let date = ReleaseDate::parse("2024-06-01T01:30:00+02:00").unwrap();
        assert_eq!(date.to_string(), "2024-05-31");
    }

    #[test]
    fn release_date_accepts_plain_and_naive_forms() {
        assert_eq!(ReleaseDate::parse("2024-06-01").unwrap().to_string(), "2024-06-01");
        assert_eq!(ReleaseDate::parse("2024-06-01T23:59:59.500").unwrap().to_string(), "2024-06-01");
        assert_eq!(ReleaseDate::parse("2024-06-01T08:15").unwrap().to_string(), "2024-06-01");
    }

    #[test]
    fn release_date_from_epoch_millis() {
        let date = ReleaseDate::from_timestamp_millis(1_717_236_000_000).unwrap();
        assert_eq!(date.to_string(), "2024-06-01");
    }

    #[test]
    fn work_item_ref_reads_any_shape() {
        assert_eq!(WorkItemRef::from_value(&json!(42)), WorkItemRef::default());
        assert_eq!(
            WorkItemRef::from_value(&json!({ "state": 3, "releaseDate": null })),
            WorkItemRef {
                state: Some("3".into()),
                release_date: None
            }
        );
        assert_eq!(
            WorkItemRef::from_value(&json!({ "state": "New", "releaseDate": 1_717_236_000_000_i64 })),
            WorkItemRef {
                state: Some("New".into()),
                release_date: Some(json!(1_717_236_000_000_i64))
            }
        );
    }

    #[test]
    fn release_date_rejects_garbage() {
        assert!(ReleaseDate::parse("next tuesday").is_none());
        assert!(ReleaseDate::parse("2024-13-01").is_none());
        assert!(ReleaseDate::parse("").is_none());
    }
}
