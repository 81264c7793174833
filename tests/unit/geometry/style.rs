use super::*;
use serde_json::json;

#[test]
fn defaults_depend_on_object_type() {
    let defaults = StyleDefaults::default();
    let resolver = StyleResolver::new(&defaults);

    let line = resolver.path_style(ObjectType::Line, None, None);
    assert_eq!(line.color, "#3388ff");
    assert_eq!(line.weight, 3.0);
    assert!(!line.fill);

    let poly = resolver.path_style(ObjectType::Polygon, None, None);
    assert!(poly.fill);
    assert_eq!(poly.fill_opacity, 0.2);
}

#[test]
fn object_style_overrides_layer_style() {
    let defaults = StyleDefaults::default();
    let resolver = StyleResolver::new(&defaults);
    let layer = json!({"color": "#ff0000", "weight": 5, "dashArray": "4 2"});
    let object = json!({"color": "#00ff00", "className": "river"});

    let style = resolver.path_style(ObjectType::Line, Some(&layer), Some(&object));
    assert_eq!(style.color, "#00ff00");
    assert_eq!(style.weight, 5.0);
    assert_eq!(style.dash_array.as_deref(), Some("4 2"));
    assert_eq!(style.extra.get("className"), Some(&json!("river")));
}

#[test]
fn ill_typed_style_falls_back_to_defaults() {
    let defaults = StyleDefaults::default();
    let resolver = StyleResolver::new(&defaults);

    let style = resolver.path_style(ObjectType::Circle, None, Some(&json!({"weight": "thick"})));
    assert_eq!(style, resolver.path_style(ObjectType::Circle, None, None));

    let style = resolver.path_style(ObjectType::Line, Some(&json!("red")), None);
    assert_eq!(style.color, "#3388ff");
}

#[test]
fn icon_requires_icon_url() {
    let defaults = StyleDefaults::default();
    let resolver = StyleResolver::new(&defaults);
    let style = json!({"iconUrl": "/pins/castle.png"});

    let icon = resolver.icon_style(ObjectType::Icon, None, Some(&style)).unwrap();
    assert_eq!(icon.icon_url, "/pins/castle.png");
    assert_eq!(icon.icon_size, [25.0, 41.0]);
    assert_eq!(icon.icon_anchor, [12.0, 41.0]);

    assert_eq!(resolver.icon_style(ObjectType::Icon, None, None), None);
    assert_eq!(resolver.icon_style(ObjectType::Point, None, Some(&style)), None);
}

#[test]
fn icon_metrics_override_and_tolerate_garbage() {
    let defaults = StyleDefaults::default();
    let resolver = StyleResolver::new(&defaults);
    let layer = json!({"iconUrl": "/pins/a.png", "iconSize": [32, 32]});
    let object = json!({"iconAnchor": "middle"});

    let icon = resolver
        .icon_style(ObjectType::Icon, Some(&layer), Some(&object))
        .unwrap();
    assert_eq!(icon.icon_size, [32.0, 32.0]);
    assert_eq!(icon.icon_anchor, [12.0, 41.0]);
}
