use super::*;

#[test]
fn ids_serialize_as_bare_numbers() {
    assert_eq!(serde_json::to_value(ChapterId(12)).unwrap(), serde_json::json!(12));
    let id: MapId = serde_json::from_str("7").unwrap();
    assert_eq!(id, MapId(7));
    assert_eq!(SnapshotId(3).to_string(), "3");
    assert_eq!(ChapterRank(4).to_string(), "#4");
}

#[test]
fn reader_position_wire_shape() {
    let p = ReaderPosition::new(BranchId(1), ChapterId(2));
    assert_eq!(
        serde_json::to_value(p).unwrap(),
        serde_json::json!({"branchId": 1, "chapterId": 2})
    );
    assert_eq!(p.to_string(), "branch 1 @ chapter 2");
}

#[test]
fn entity_keys_are_tagged() {
    let key = EntityKey::Wiki(WikiEntryId(5));
    assert_eq!(
        serde_json::to_value(key).unwrap(),
        serde_json::json!({"kind": "wiki", "id": 5})
    );
    assert_eq!(EntityKey::Map(MapId(2)).to_string(), "map 2");
    assert_ne!(EntityKey::Map(MapId(5)), EntityKey::Wiki(WikiEntryId(5)));
}
