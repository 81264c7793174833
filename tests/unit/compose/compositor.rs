use super::*;
use crate::{
    foundation::core::{ChapterId, LayerId, ObjectId, Rect, SnapshotId, WikiEntryId},
    geometry::parse::LatLng,
};
use serde_json::json;

fn object(id: u64, kind: ObjectType, coords: serde_json::Value) -> MapObject {
    MapObject::new(ObjectId(id), kind, coords)
}

fn layer(id: u64, z: i32, objects: Vec<MapObject>) -> MapLayer {
    MapLayer {
        id: LayerId(id),
        name: String::new(),
        layer_type: Default::default(),
        z_index: z,
        is_visible: true,
        style_json: None,
        objects,
    }
}

fn snapshot(layers: Vec<MapLayer>) -> MapSnapshot {
    MapSnapshot {
        id: SnapshotId(1),
        map_id: None,
        effective_from_chapter_id: ChapterId(1),
        base_image_url: "/base.png".to_owned(),
        layers,
    }
}

fn canvas() -> MapCanvas {
    MapCanvas {
        width: 800,
        height: 600,
    }
}

#[test]
fn one_bad_point_among_four_valid_objects() {
    let layers = vec![layer(
        1,
        0,
        vec![
            object(1, ObjectType::Point, json!([10, 20])),
            object(2, ObjectType::Point, json!("bad")),
            object(3, ObjectType::Line, json!([[0, 0], [5, 5]])),
            object(4, ObjectType::Circle, json!({"center": [10, 20], "radius": 3})),
        ],
    )];
    let plan =
        Compositor::compose(canvas(), &snapshot(layers), &ComposeSettings::default()).unwrap();

    assert_eq!(plan.units.len(), 3);
    assert_eq!(plan.rejected.len(), 1);
    assert_eq!(plan.rejected[0].object_id, ObjectId(2));
    assert!(matches!(
        plan.rejected[0].error,
        GeometryError::InvalidPoint { .. }
    ));
    let ids: Vec<u64> = plan.units.iter().map(|u| u.object_id.0).collect();
    assert_eq!(ids, vec![1, 3, 4]);
}

#[test]
fn layers_sort_stably_by_z_index() {
    let layers = vec![
        layer(10, 2, vec![object(1, ObjectType::Point, json!([0, 0]))]),
        layer(11, 1, vec![object(2, ObjectType::Point, json!([0, 0]))]),
        layer(12, 2, vec![object(3, ObjectType::Point, json!([0, 0]))]),
        layer(13, 1, vec![object(4, ObjectType::Point, json!([0, 0]))]),
        layer(14, -5, vec![object(5, ObjectType::Point, json!([0, 0]))]),
    ];
    let (units, rejected) = Compositor::compose_layers(&layers, &StyleDefaults::default());
    assert!(rejected.is_empty());
    let order: Vec<u64> = units.iter().map(|u| u.layer_id.0).collect();
    assert_eq!(order, vec![14, 11, 13, 10, 12]);
}

#[test]
fn hidden_layers_are_not_parsed() {
    let mut hidden = layer(2, 0, vec![object(9, ObjectType::Point, json!("bad"))]);
    hidden.is_visible = false;
    let layers = vec![layer(1, 0, vec![object(1, ObjectType::Point, json!([1, 1]))]), hidden];

    let (units, rejected) = Compositor::compose_layers(&layers, &StyleDefaults::default());
    assert_eq!(units.len(), 1);
    assert!(rejected.is_empty());
}

#[test]
fn units_carry_identity_and_metadata() {
    let mut castle = object(7, ObjectType::Icon, json!({"lat": 100, "lng": 200}));
    castle.label = "  Castle  ".to_owned();
    castle.description = "  ".to_owned();
    castle.wiki_entry_id = Some(WikiEntryId(3));
    castle.style_json = Some(json!({"iconUrl": "/pins/castle.png"}));
    let layers = vec![layer(4, 3, vec![castle])];

    let (units, _) = Compositor::compose_layers(&layers, &StyleDefaults::default());
    let unit = &units[0];
    assert_eq!(unit.object_id, ObjectId(7));
    assert_eq!(unit.layer_id, LayerId(4));
    assert_eq!(unit.z_index, 3);
    assert_eq!(unit.label.as_deref(), Some("  Castle  "));
    assert_eq!(unit.description, None);
    assert_eq!(unit.wiki_entry_id, Some(WikiEntryId(3)));
    match &unit.primitive {
        Primitive::Marker { at, icon } => {
            assert_eq!(*at, LatLng::new(100.0, 200.0));
            assert_eq!(icon.as_ref().map(|i| i.icon_url.as_str()), Some("/pins/castle.png"));
        }
        other => panic!("unexpected primitive {other:?}"),
    }
}

#[test]
fn layer_style_applies_under_object_style() {
    let mut roads = layer(
        1,
        0,
        vec![
            object(1, ObjectType::Line, json!([[0, 0], [1, 1]])),
            object(2, ObjectType::Polygon, json!([[0, 0], [0, 4], [4, 4]])),
        ],
    );
    roads.style_json = Some(json!({"color": "#aa0000"}));
    roads.objects[1].style_json = Some(json!({"color": "#00aa00"}));

    let (units, _) = Compositor::compose_layers(&[roads], &StyleDefaults::default());
    match (&units[0].primitive, &units[1].primitive) {
        (Primitive::Polyline { style: a, .. }, Primitive::Polygon { style: b, .. }) => {
            assert_eq!(a.color, "#aa0000");
            assert!(!a.fill);
            assert_eq!(b.color, "#00aa00");
            assert!(b.fill);
        }
        other => panic!("unexpected primitives {other:?}"),
    }
}

#[test]
fn unknown_object_type_is_rejected_not_fatal() {
    let raw = json!({"id": 5, "objectType": "HEXAGON", "coordinates": [1, 2]});
    let hex: MapObject = serde_json::from_value(raw).unwrap();
    let layers = vec![layer(
        1,
        0,
        vec![hex, object(6, ObjectType::Point, json!([1, 2]))],
    )];
    let (units, rejected) = Compositor::compose_layers(&layers, &StyleDefaults::default());
    assert_eq!(units.len(), 1);
    assert_eq!(rejected[0].error, GeometryError::UnsupportedObjectType);
}

#[test]
fn plan_reports_content_bounds_and_viewport() {
    let layers = vec![layer(
        1,
        0,
        vec![
            object(1, ObjectType::Point, json!([10, 20])),
            object(2, ObjectType::Circle, json!({"lat": 100, "lng": 100, "radius": 10})),
            object(3, ObjectType::Polygon, json!([])),
        ],
    )];
    let plan =
        Compositor::compose(canvas(), &snapshot(layers), &ComposeSettings::default()).unwrap();
    assert_eq!(plan.content_bounds(), Some(Rect::new(20.0, 10.0, 110.0, 110.0)));
    assert_eq!(plan.viewport.bounds(), [[0.0, 0.0], [600.0, 800.0]]);
    assert_eq!(plan.base_image_url, "/base.png");
    assert!(plan.unit(ObjectId(3)).is_some());
    assert!(plan.unit(ObjectId(3)).and_then(|u| u.primitive.to_bez_path()).is_some());
}

#[test]
fn invalid_canvas_fails_the_plan() {
    let zero = MapCanvas {
        width: 0,
        height: 10,
    };
    assert!(Compositor::compose(zero, &snapshot(vec![]), &ComposeSettings::default()).is_err());
}
