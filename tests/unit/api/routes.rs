use super::*;
use crate::{
    lineage::graph::LineageConfig,
    snapshot::store::ContentDocument,
};

fn store() -> ContentStore {
    let doc = ContentDocument::from_json_str(
        r#"{
        "branches": [{"id": 1, "name": "main"}],
        "chapters": [
            {"id": 10, "branchId": 1, "orderIndex": 1},
            {"id": 11, "branchId": 1, "orderIndex": 2},
            {"id": 12, "branchId": 1, "orderIndex": 3}
        ],
        "wikiEntries": [{"id": 1, "branchId": 1, "title": "Aria"}],
        "wikiSnapshots": [
            {"id": 1, "wikiEntryId": 1, "effectiveFromChapterId": 10, "body": "a farmer"},
            {"id": 2, "wikiEntryId": 1, "effectiveFromChapterId": 12, "body": "a queen"}
        ],
        "maps": [{"id": 1, "branchId": 1, "name": "World", "width": 800, "height": 600}],
        "mapSnapshots": []
    }"#,
    )
    .unwrap();
    ContentStore::from_document(doc, LineageConfig::default()).unwrap()
}

#[test]
fn paths_methods_and_bodies() {
    let at = Some(ReaderPosition::new(BranchId(1), ChapterId(11)));
    assert_eq!(
        ContentRequest::get_wiki(WikiEntryId(3), at).path(),
        "/wikis/3?chapter=11"
    );
    assert_eq!(ContentRequest::get_wiki(WikiEntryId(3), None).path(), "/wikis/3");
    assert_eq!(ContentRequest::get_map(MapId(2), at).path(), "/maps/2?chapter=11");
    assert_eq!(
        ContentRequest::ListMaps { branch: BranchId(4) }.path(),
        "/maps?branchId=4"
    );

    let post = ContentRequest::CreateWikiSnapshot {
        id: WikiEntryId(3),
        chapter: ChapterId(11),
        body: "text".to_owned(),
    };
    assert_eq!(post.method(), Method::Post);
    assert_eq!(post.path(), "/wikis/3/snapshots");
    assert_eq!(post.body(), Some(json!({"chapterId": 11, "body": "text"})));

    let post = ContentRequest::CreateMapSnapshot {
        id: MapId(2),
        chapter: ChapterId(11),
        base_image_url: "/m.png".to_owned(),
    };
    assert_eq!(post.method().to_string(), "POST");
    assert_eq!(
        post.body(),
        Some(json!({"validFromChapter": 11, "baseImageUrl": "/m.png"}))
    );
    assert_eq!(ContentRequest::ListMapSnapshots { id: MapId(2) }.body(), None);
}

#[test]
fn serving_a_chapter_query_never_leaks_later_snapshots() {
    let mut store = store();
    let response = ContentRequest::GetWiki {
        id: WikiEntryId(1),
        chapter: Some(ChapterId(11)),
    }
    .serve(&mut store)
    .unwrap();

    let payload: WikiPayload = serde_json::from_value(response.data).unwrap();
    assert_eq!(payload.snapshot.map(|s| s.body), Some("a farmer".to_owned()));
    assert_eq!(payload.snapshots.len(), 1);

    let response = ContentRequest::GetWiki {
        id: WikiEntryId(1),
        chapter: None,
    }
    .serve(&mut store)
    .unwrap();
    let payload: WikiPayload = serde_json::from_value(response.data).unwrap();
    assert_eq!(payload.snapshot.map(|s| s.body), Some("a queen".to_owned()));
    assert_eq!(payload.snapshots[0].body, "a queen");
}

#[test]
fn serving_snapshot_creation_and_map_listing() {
    let mut store = store();
    let created = ContentRequest::CreateMapSnapshot {
        id: MapId(1),
        chapter: ChapterId(11),
        base_image_url: "/world.png".to_owned(),
    }
    .serve(&mut store)
    .unwrap();
    assert_eq!(created.data, json!({"id": 3}));

    let early = ReaderPosition::new(BranchId(1), ChapterId(10));
    let map = ContentRequest::get_map(MapId(1), Some(early))
        .serve(&mut store)
        .unwrap();
    let payload: MapPayload = serde_json::from_value(map.data).unwrap();
    assert!(payload.effective_snapshot().is_none());

    let list = ContentRequest::ListMaps { branch: BranchId(1) }
        .serve(&mut store)
        .unwrap();
    assert_eq!(list.data[0]["name"], json!("World"));

    let dup = ContentRequest::CreateMapSnapshot {
        id: MapId(1),
        chapter: ChapterId(11),
        base_image_url: String::new(),
    }
    .serve(&mut store);
    assert!(matches!(dup, Err(LoreError::Conflict(_))));
}
