use release::{
    AssetId, ContentError, EntityLink, Entry, EntryId, InMemoryContentStore, Locale,
    ReferenceCollector, ReleaseError,
};
use serde_json::{json, Value};

fn en_us() -> Locale {
    Locale::new("en-US").unwrap()
}

fn entry_id(id: &str) -> EntryId {
    EntryId::new(id).unwrap()
}

fn asset_id(id: &str) -> AssetId {
    AssetId::new(id).unwrap()
}

fn link(kind: &str, id: &str) -> Value {
    json!({ "sys": { "type": "Link", "linkType": kind, "id": id } })
}

#[tokio::test]
async fn cycle_terminates_and_lists_each_resource_once() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let a = Entry::new(entry_id("A")).with_field("next", &locale, link("Entry", "B"));
    let b = Entry::new(entry_id("B"))
        .with_field("back", &locale, link("Entry", "A"))
        .with_field("image", &locale, link("Asset", "X"));
    store.insert_entry(a.clone());
    store.insert_entry(b);
    store.insert_asset(asset_id("X"));

    let collected = ReferenceCollector::new(&store, &locale, 100)
        .collect(&a)
        .await
        .unwrap();

    assert_eq!(
        collected,
        vec![EntityLink::Entry(entry_id("B")), EntityLink::Asset(asset_id("X"))]
    );
}

#[tokio::test]
async fn multi_reference_duplicates_are_collected_once() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let root = Entry::new(entry_id("root")).with_field(
        "related",
        &locale,
        json!([link("Entry", "C"), link("Asset", "Y"), link("Asset", "Y")]),
    );
    store.insert_entry(Entry::new(entry_id("C")));
    store.insert_asset(asset_id("Y"));

    let collected = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap();

    assert_eq!(
        collected,
        vec![EntityLink::Entry(entry_id("C")), EntityLink::Asset(asset_id("Y"))]
    );
}

#[tokio::test]
async fn transitive_references_are_followed_depth_first() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let root = Entry::new(entry_id("root"))
        .with_field("items", &locale, json!([link("Entry", "B"), link("Entry", "C")]));
    store.insert_entry(Entry::new(entry_id("B")).with_field("child", &locale, link("Entry", "D")));
    store.insert_entry(Entry::new(entry_id("C")).with_field("file", &locale, link("Asset", "Z")));
    store.insert_entry(Entry::new(entry_id("D")).with_field("title", &locale, json!("leaf")));
    store.insert_asset(asset_id("Z"));

    let collected = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap();

    assert_eq!(
        collected,
        vec![
            EntityLink::Entry(entry_id("B")),
            EntityLink::Entry(entry_id("D")),
            EntityLink::Entry(entry_id("C")),
            EntityLink::Asset(asset_id("Z")),
        ]
    );
}

#[tokio::test]
async fn non_link_and_other_locale_values_contribute_nothing() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let root = Entry::new(entry_id("root"))
        .with_field("title", &locale, json!("Hello"))
        .with_field("count", &locale, json!(3))
        .with_field("location", &locale, json!({ "lat": 1.0, "lon": 2.0 }))
        .with_field("tags", &locale, json!([]))
        .with_field("nothing", &locale, Value::Null)
        .with_field("author", &Locale::new("fr-FR").unwrap(), link("Entry", "missing"));

    let collected = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap();

    assert!(collected.is_empty());
}

#[tokio::test]
async fn missing_linked_entry_aborts_the_walk() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let root = Entry::new(entry_id("root")).with_field("next", &locale, link("Entry", "gone"));

    let err = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Upstream(ContentError::NotFound { ref id, .. }) if id == "gone"
    ));
}

#[tokio::test]
async fn failing_asset_fetch_aborts_the_walk() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    store.insert_asset(asset_id("broken"));
    store.make_unavailable("broken");
    let root = Entry::new(entry_id("root")).with_field("image", &locale, link("Asset", "broken"));

    let err = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap_err();

    assert!(matches!(err, ReleaseError::Upstream(ContentError::Api { status: 503, .. })));
}

#[tokio::test]
async fn closure_larger_than_limit_is_rejected() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    // Chain root -> e0 -> e1 -> ... -> e9
    let root = Entry::new(entry_id("root")).with_field("next", &locale, link("Entry", "e0"));
    for i in 0..10 {
        let mut entry = Entry::new(entry_id(&format!("e{i}")));
        if i < 9 {
            entry = entry.with_field("next", &locale, link("Entry", &format!("e{}", i + 1)));
        }
        store.insert_entry(entry);
    }

    let within = ReferenceCollector::new(&store, &locale, 10).collect(&root).await.unwrap();
    assert_eq!(within.len(), 10);

    let err = ReferenceCollector::new(&store, &locale, 5)
        .collect(&root)
        .await
        .unwrap_err();
    assert!(matches!(err, ReleaseError::ReferenceLimitExceeded { limit: 5 }));
}

#[tokio::test]
async fn entry_reached_twice_is_expanded_under_its_first_parent() {
    let locale = en_us();
    let store = InMemoryContentStore::new();
    let root = Entry::new(entry_id("root"))
        .with_field("items", &locale, json!([link("Entry", "B"), link("Entry", "C")]));
    store.insert_entry(Entry::new(entry_id("B")).with_field("shared", &locale, link("Entry", "S")));
    store.insert_entry(Entry::new(entry_id("C")).with_field("shared", &locale, link("Entry", "S")));
    store.insert_entry(Entry::new(entry_id("S")).with_field("file", &locale, link("Asset", "F")));
    store.insert_asset(asset_id("F"));

    let collected = ReferenceCollector::new(&store, &locale, 100)
        .collect(&root)
        .await
        .unwrap();

    assert_eq!(
        collected,
        vec![
            EntityLink::Entry(entry_id("B")),
            EntityLink::Entry(entry_id("S")),
            EntityLink::Asset(asset_id("F")),
            EntityLink::Entry(entry_id("C")),
        ]
    );
}
