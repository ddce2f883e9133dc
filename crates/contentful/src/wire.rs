//! Wire format of the content management API.
//!
//! Resources are decoded into private serde types and converted into domain
//! types here, so the rest of the crate never handles raw JSON.

use std::collections::BTreeMap;

use release::{
    Asset, AssetId, ContentError, EntityLink, Entry, EntryId, LocalizedValues, ReleaseBatch,
    ReleaseId, ReleaseTitle,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Media type the management API uses for request and response bodies.
pub const MANAGEMENT_MEDIA_TYPE: &str = "application/vnd.contentful.management.v1+json";

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceSys {
    pub id: String,
    #[serde(default)]
    pub version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntryResource {
    pub sys: ResourceSys,
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedValues>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetResource {
    pub sys: ResourceSys,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseResource {
    pub sys: ResourceSys,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub entities: Option<Collection<Value>>,
}

/// Space or environment metadata, used for startup verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    /// The resource's `sys.id`.
    pub id: String,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedResourceWire {
    pub sys: ResourceSys,
    #[serde(default)]
    pub name: String,
}

impl From<NamedResourceWire> for NamedResource {
    fn from(wire: NamedResourceWire) -> Self {
        Self {
            id: wire.sys.id,
            name: wire.name,
        }
    }
}

fn empty_id(what: &str) -> ContentError {
    ContentError::Decode {
        message: format!("{what} has an empty sys.id"),
    }
}

impl TryFrom<EntryResource> for Entry {
    type Error = ContentError;

    fn try_from(wire: EntryResource) -> Result<Self, Self::Error> {
        Ok(Entry {
            id: EntryId::new(wire.sys.id).ok_or_else(|| empty_id("entry"))?,
            fields: wire.fields,
        })
    }
}

impl TryFrom<AssetResource> for Asset {
    type Error = ContentError;

    fn try_from(wire: AssetResource) -> Result<Self, Self::Error> {
        Ok(Asset {
            id: AssetId::new(wire.sys.id).ok_or_else(|| empty_id("asset"))?,
        })
    }
}

impl TryFrom<ReleaseResource> for ReleaseBatch {
    type Error = ContentError;

    fn try_from(wire: ReleaseResource) -> Result<Self, Self::Error> {
        let members = wire
            .entities
            .map(|entities| entities.items)
            .unwrap_or_default()
            .iter()
            .filter_map(EntityLink::from_value)
            .collect();
        Ok(ReleaseBatch {
            id: ReleaseId::new(wire.sys.id).ok_or_else(|| empty_id("release"))?,
            title: ReleaseTitle::from_existing(wire.title),
            version: wire.sys.version.unwrap_or_default(),
            members,
        })
    }
}

/// Encodes a link the way the management API stores it.
pub fn link_value(link: &EntityLink) -> Value {
    json!({
        "sys": {
            "type": "Link",
            "linkType": link.kind().as_str(),
            "id": link.id(),
        }
    })
}

/// Builds the body of a release create or update request.
pub fn release_body(title: &ReleaseTitle, members: &[EntityLink]) -> Value {
    json!({
        "title": title.as_str(),
        "entities": {
            "sys": { "type": "Array" },
            "items": members.iter().map(link_value).collect::<Vec<_>>(),
        }
    })
}

/// Extracts the human-readable message from an API error body.
///
/// Falls back to the raw body (truncated) when it is not a JSON error object.
pub fn error_message(body: &str) -> String {
    const MAX_RAW: usize = 200;
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(id) = value.pointer("/sys/id").and_then(Value::as_str) {
            return id.to_string();
        }
    }
    body.chars().take(MAX_RAW).collect()
}

#[cfg(test)]
mod tests {
    use release::{Locale, LinkKind};

    use super::*;

    #[test]
    fn decodes_entry_with_localized_fields() {
        let wire: EntryResource = serde_json::from_value(json!({
            "sys": { "id": "entry-1", "type": "Entry", "version": 12 },
            "fields": {
                "title": { "en-US": "Hello", "de-DE": "Hallo" },
                "hero": { "en-US": { "sys": { "type": "Link", "linkType": "Asset", "id": "img" } } }
            }
        }))
        .unwrap();

        let entry = Entry::try_from(wire).unwrap();

        assert_eq!(entry.id.as_str(), "entry-1");
        let links = entry.links(&Locale::default());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind(), LinkKind::Asset);
    }

    #[test]
    fn entry_without_fields_decodes_empty() {
        let wire: EntryResource =
            serde_json::from_value(json!({ "sys": { "id": "bare" } })).unwrap();
        assert!(Entry::try_from(wire).unwrap().fields.is_empty());
    }

    #[test]
    fn entry_with_empty_id_is_rejected() {
        let wire: EntryResource = serde_json::from_value(json!({ "sys": { "id": "" } })).unwrap();
        assert!(matches!(Entry::try_from(wire), Err(ContentError::Decode { .. })));
    }

    #[test]
    fn decodes_release_members_and_version() {
        let wire: ReleaseResource = serde_json::from_value(json!({
            "sys": { "id": "rel-1", "type": "Release", "version": 3 },
            "title": "Release - 2024-06-01",
            "entities": {
                "sys": { "type": "Array" },
                "items": [
                    { "sys": { "type": "Link", "linkType": "Entry", "id": "e1" } },
                    { "sys": { "type": "Link", "linkType": "Asset", "id": "a1" } }
                ]
            }
        }))
        .unwrap();

        let release = ReleaseBatch::try_from(wire).unwrap();

        assert_eq!(release.id.as_str(), "rel-1");
        assert_eq!(release.version, 3);
        assert_eq!(release.title.as_str(), "Release - 2024-06-01");
        assert_eq!(
            release.members,
            vec![
                EntityLink::Entry(EntryId::new("e1").unwrap()),
                EntityLink::Asset(AssetId::new("a1").unwrap()),
            ]
        );
    }

    #[test]
    fn release_without_entities_has_no_members() {
        let wire: ReleaseResource = serde_json::from_value(json!({
            "sys": { "id": "rel-2", "version": 1 },
            "title": "Release - 2024-06-02"
        }))
        .unwrap();
        assert!(ReleaseBatch::try_from(wire).unwrap().members.is_empty());
    }

    #[test]
    fn release_body_encodes_links() {
        let title = ReleaseTitle::from_existing("Release - 2024-06-01");
        let members = vec![
            EntityLink::Entry(EntryId::new("e1").unwrap()),
            EntityLink::Asset(AssetId::new("a1").unwrap()),
        ];

        assert_eq!(
            release_body(&title, &members),
            json!({
                "title": "Release - 2024-06-01",
                "entities": {
                    "sys": { "type": "Array" },
                    "items": [
                        { "sys": { "type": "Link", "linkType": "Entry", "id": "e1" } },
                        { "sys": { "type": "Link", "linkType": "Asset", "id": "a1" } }
                    ]
                }
            })
        );
    }

    #[test]
    fn error_message_prefers_api_message() {
        assert_eq!(
            error_message(r#"{"sys":{"type":"Error","id":"VersionMismatch"},"message":"Version mismatch"}"#),
            "Version mismatch"
        );
        assert_eq!(
            error_message(r#"{"sys":{"type":"Error","id":"NotFound"}}"#),
            "NotFound"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
