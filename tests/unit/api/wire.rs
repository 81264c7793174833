use super::*;
use serde_json::json;

fn map_json(snapshot: serde_json::Value, snapshots: serde_json::Value) -> serde_json::Value {
    json!({
        "id": 1,
        "name": "World",
        "description": "",
        "width": 800,
        "height": 600,
        "sourceMapId": null,
        "snapshots": snapshots,
        "snapshot": snapshot,
        "createdAt": "2025-01-01T00:00:00Z",
    })
}

fn snapshot_json(id: u64, chapter: u64) -> serde_json::Value {
    json!({
        "id": id,
        "validFromChapter": chapter,
        "baseImageUrl": format!("/img/{id}.png"),
        "layers": [{
            "id": 1,
            "name": "Cities",
            "layerType": "MARKER",
            "zIndex": 2,
            "isVisible": true,
            "styleJson": null,
            "objects": [{
                "id": 3,
                "objectType": "POINT",
                "coordinates": {"lat": 10, "lng": 20},
                "label": "Port",
                "description": "",
                "wikiEntryId": 4,
                "styleJson": null,
                "createdAt": "2025-01-01T00:00:00Z"
            }],
            "createdAt": "2025-01-01T00:00:00Z"
        }],
        "createdAt": "2025-01-01T00:00:00Z"
    })
}

#[test]
fn map_payload_prefers_resolved_snapshot() {
    let raw = map_json(snapshot_json(7, 3), json!([snapshot_json(5, 1)]));
    let payload: MapPayload = serde_json::from_value(raw).unwrap();
    let snap = payload.effective_snapshot().unwrap();
    assert_eq!(snap.id.0, 7);
    assert_eq!(snap.effective_from_chapter_id, ChapterId(3));
    assert_eq!(snap.layers[0].objects[0].wiki_entry_id, Some(WikiEntryId(4)));
    assert_eq!(payload.canvas(), MapCanvas { width: 800, height: 600 });
}

#[test]
fn map_payload_falls_back_to_first_listed_snapshot() {
    let raw = map_json(json!(null), json!([snapshot_json(5, 1), snapshot_json(6, 2)]));
    let payload: MapPayload = serde_json::from_value(raw).unwrap();
    assert_eq!(payload.effective_snapshot().map(|s| s.id.0), Some(5));

    let raw = map_json(json!(null), json!([]));
    let payload: MapPayload = serde_json::from_value(raw).unwrap();
    assert!(payload.effective_snapshot().is_none());
}

#[test]
fn envelope_unwraps_and_reports_failure() {
    let ok: ApiResponse<u32> = serde_json::from_value(json!({"data": 3})).unwrap();
    assert_eq!(ok.into_data().unwrap(), 3);

    let failed: ApiResponse<Option<u32>> =
        serde_json::from_value(json!({"success": false, "data": null, "message": "nope"})).unwrap();
    let err = failed.into_data().unwrap_err();
    assert!(err.to_string().contains("nope"));

    let v = serde_json::to_value(ApiResponse::ok("x")).unwrap();
    assert_eq!(v, json!({"success": true, "data": "x"}));
}

#[test]
fn wiki_payload_accepts_name_alias() {
    let payload: WikiPayload = serde_json::from_value(json!({
        "id": 2,
        "name": "Aria",
        "firstAppearance": 10,
        "snapshot": {"id": 1, "wikiEntryId": 2, "validFromChapter": 10, "body": "hi"}
    }))
    .unwrap();
    assert_eq!(payload.title, "Aria");
    assert_eq!(payload.first_appearance, Some(ChapterId(10)));
    assert_eq!(payload.snapshot.map(|s| s.body), Some("hi".to_owned()));
}
