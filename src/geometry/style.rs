use serde_json::{Map as JsonMap, Value};

use crate::snapshot::model::ObjectType;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Type-specific style defaults applied under every layer and object style.
pub struct StyleDefaults {
    /// Stroke color.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Stroke opacity.
    pub opacity: f64,
    /// Fill opacity of filled shapes.
    pub fill_opacity: f64,
    /// Icon pixel size when an ICON style names an `iconUrl` but no `iconSize`.
    pub icon_size: [f64; 2],
    /// Icon anchor when an ICON style names an `iconUrl` but no `iconAnchor`.
    pub icon_anchor: [f64; 2],
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_owned(),
            weight: 3.0,
            opacity: 1.0,
            fill_opacity: 0.2,
            icon_size: [25.0, 41.0],
            icon_anchor: [12.0, 41.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stroke and fill options for LINE, POLYGON and CIRCLE.
pub struct PathStyle {
    /// Stroke color.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Stroke opacity.
    pub opacity: f64,
    /// Whether the shape is filled.
    pub fill: bool,
    /// Fill color; the stroke color when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// SVG dash pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    /// Keys this crate does not interpret, passed to the host untouched.
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Custom marker image for an ICON object.
pub struct IconStyle {
    /// Image URL.
    pub icon_url: String,
    /// Width and height in pixels.
    pub icon_size: [f64; 2],
    /// Pixel offset of the anchor point inside the image.
    pub icon_anchor: [f64; 2],
}

/// Merges defaults, then the layer's style, then the object's style.
///
/// The merge is shallow and key by key. A merged style that does not
/// type-check falls back to the defaults; it never rejects the object.
#[derive(Clone, Copy, Debug)]
pub struct StyleResolver<'a> {
    defaults: &'a StyleDefaults,
}

impl<'a> StyleResolver<'a> {
    /// Resolver over `defaults`.
    pub fn new(defaults: &'a StyleDefaults) -> Self {
        Self { defaults }
    }

    /// Defaults underneath every merge.
    pub fn defaults(&self) -> &StyleDefaults {
        self.defaults
    }

    /// Layer style overlaid by object style, without defaults.
    pub fn merged(&self, layer: Option<&Value>, object: Option<&Value>) -> JsonMap<String, Value> {
        let mut out = JsonMap::new();
        for (source, style) in [("layer", layer), ("object", object)] {
            match style {
                None | Some(Value::Null) => {}
                Some(Value::Object(map)) => {
                    out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                Some(other) => {
                    tracing::warn!(source, found = %other, "ignoring non-object style");
                }
            }
        }
        out
    }

    /// Path options for a stroked/filled shape.
    pub fn path_style(
        &self,
        object_type: ObjectType,
        layer: Option<&Value>,
        object: Option<&Value>,
    ) -> PathStyle {
        let fallback = self.default_path(object_type);
        let mut base = match serde_json::to_value(&fallback) {
            Ok(Value::Object(map)) => map,
            _ => return fallback,
        };
        base.extend(self.merged(layer, object));

        match serde_json::from_value::<PathStyle>(Value::Object(base)) {
            Ok(style) => style,
            Err(err) => {
                tracing::warn!(?object_type, %err, "style does not type-check; using defaults");
                fallback
            }
        }
    }

    /// Custom icon for an ICON object whose style names an `iconUrl`.
    ///
    /// POINT objects, and ICON objects without `iconUrl`, use the host's
    /// default marker and get `None`.
    pub fn icon_style(
        &self,
        object_type: ObjectType,
        layer: Option<&Value>,
        object: Option<&Value>,
    ) -> Option<IconStyle> {
        if object_type != ObjectType::Icon {
            return None;
        }
        let merged = self.merged(layer, object);
        let icon_url = match merged.get("iconUrl") {
            Some(Value::String(url)) if !url.is_empty() => url.clone(),
            _ => return None,
        };
        Some(IconStyle {
            icon_url,
            icon_size: pixel_pair(&merged, "iconSize").unwrap_or(self.defaults.icon_size),
            icon_anchor: pixel_pair(&merged, "iconAnchor").unwrap_or(self.defaults.icon_anchor),
        })
    }

    fn default_path(&self, object_type: ObjectType) -> PathStyle {
        PathStyle {
            color: self.defaults.color.clone(),
            weight: self.defaults.weight,
            opacity: self.defaults.opacity,
            fill: matches!(object_type, ObjectType::Polygon | ObjectType::Circle),
            fill_color: None,
            fill_opacity: self.defaults.fill_opacity,
            dash_array: None,
            extra: JsonMap::new(),
        }
    }
}

fn pixel_pair(style: &JsonMap<String, Value>, key: &str) -> Option<[f64; 2]> {
    let v = style.get(key)?;
    match serde_json::from_value::<[f64; 2]>(v.clone()) {
        Ok(pair) => Some(pair),
        Err(err) => {
            tracing::warn!(key, %err, "ignoring malformed icon metric");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/style.rs"]
mod tests;
