use serde_json::Value;

use crate::{
    foundation::core::{BezPath, Point, Rect},
    snapshot::model::ObjectType,
};

/// A coordinate in the map's flat pixel space: `lat` is the row, `lng` the column.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatLng {
    /// Row (y) in pixels.
    pub lat: f64,
    /// Column (x) in pixels.
    pub lng: f64,
}

impl LatLng {
    /// Build a coordinate from row and column.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Pixel-space point (`x = lng`, `y = lat`).
    pub fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// Canonical shape of a parsed coordinate payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeometryPayload {
    /// POINT / ICON.
    Point {
        /// Marker position.
        at: LatLng,
    },
    /// LINE / POLYGON: one part for a flat sequence, several for nested ones.
    MultiPoint {
        /// Vertex lists, outer ring first.
        parts: Vec<Vec<LatLng>>,
    },
    /// CIRCLE, radius in pixel units.
    Circle {
        /// Circle center.
        center: LatLng,
        /// Radius, `>= 0`.
        radius: f64,
    },
}

impl GeometryPayload {
    /// Number of vertices; circles and points count as one.
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Point { .. } | Self::Circle { .. } => 1,
            Self::MultiPoint { parts } => parts.iter().map(Vec::len).sum(),
        }
    }

    /// Pixel-space bounding box; `None` for an empty sequence.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Point { at } => {
                let p = at.to_point();
                Some(Rect::from_points(p, p))
            }
            Self::Circle { center, radius } => {
                let c = center.to_point();
                Some(Rect::new(c.x - radius, c.y - radius, c.x + radius, c.y + radius))
            }
            Self::MultiPoint { parts } => parts
                .iter()
                .flatten()
                .map(|v| {
                    let p = v.to_point();
                    Rect::from_points(p, p)
                })
                .reduce(|a, b| a.union(b)),
        }
    }

    /// Path through every part; `closed` closes each part as a ring.
    pub fn to_bez_path(&self, closed: bool) -> BezPath {
        let mut path = BezPath::new();
        match self {
            Self::Point { .. } => {}
            Self::Circle { center, radius } => {
                let circle = kurbo::Circle::new(center.to_point(), *radius);
                path = kurbo::Shape::to_path(&circle, 0.1);
            }
            Self::MultiPoint { parts } => {
                for part in parts {
                    let mut vertices = part.iter().map(|v| v.to_point());
                    let Some(first) = vertices.next() else {
                        continue;
                    };
                    path.move_to(first);
                    for p in vertices {
                        path.line_to(p);
                    }
                    if closed {
                        path.close_path();
                    }
                }
            }
        }
        path
    }
}

/// Why a single object's coordinates could not be used.
///
/// Always recoverable: the object is left out of the render plan and the rest
/// of the batch continues.
#[derive(thiserror::Error, Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeometryError {
    /// Neither a numeric pair nor a `{lat, lng}` object.
    #[error("invalid point: expected [lat, lng] or {{lat, lng}}, found {found}")]
    InvalidPoint {
        /// Short description of the offending value.
        found: String,
    },

    /// A LINE or POLYGON payload that is not an array.
    #[error("expected a coordinate sequence, found {found}")]
    ExpectedSequence {
        /// Short description of the offending value.
        found: String,
    },

    /// One vertex of a sequence failed to parse.
    #[error("invalid vertex {index} in part {part}: {source}")]
    InvalidVertex {
        /// Part (ring) index.
        part: usize,
        /// Vertex index inside the part.
        index: usize,
        /// What was wrong with the vertex.
        #[source]
        source: Box<GeometryError>,
    },

    /// A CIRCLE payload that is not an object.
    #[error("expected a circle object, found {found}")]
    ExpectedCircle {
        /// Short description of the offending value.
        found: String,
    },

    /// No finite `radius`.
    #[error("circle radius is missing or not a number")]
    MissingRadius,

    /// `radius` below zero.
    #[error("circle radius must be >= 0, got {radius}")]
    NegativeRadius {
        /// The rejected radius.
        radius: f64,
    },

    /// The object type has no geometry rule.
    #[error("unsupported object type")]
    UnsupportedObjectType,
}

/// Dispatch a coordinate payload on the object's type tag.
pub fn parse_geometry(
    object_type: ObjectType,
    coordinates: &Value,
) -> Result<GeometryPayload, GeometryError> {
    match object_type {
        ObjectType::Point | ObjectType::Icon => Ok(GeometryPayload::Point {
            at: parse_point(coordinates)?,
        }),
        ObjectType::Line | ObjectType::Polygon => Ok(GeometryPayload::MultiPoint {
            parts: parse_sequence(coordinates)?,
        }),
        ObjectType::Circle => parse_circle(coordinates),
        ObjectType::Unknown => Err(GeometryError::UnsupportedObjectType),
    }
}

/// `[lat, lng]` or `{ "lat": .., "lng": .. }`.
pub fn parse_point(v: &Value) -> Result<LatLng, GeometryError> {
    let pair = match v {
        Value::Array(items) if items.len() == 2 => (finite(&items[0]), finite(&items[1])),
        Value::Object(map) => (
            map.get("lat").and_then(finite),
            map.get("lng").and_then(finite),
        ),
        _ => (None, None),
    };
    match pair {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(GeometryError::InvalidPoint {
            found: describe(v),
        }),
    }
}

fn parse_sequence(v: &Value) -> Result<Vec<Vec<LatLng>>, GeometryError> {
    let Value::Array(items) = v else {
        return Err(GeometryError::ExpectedSequence {
            found: describe(v),
        });
    };
    if items.is_empty() {
        return Ok(Vec::new());
    }

    if is_nested(items) {
        items
            .iter()
            .enumerate()
            .map(|(part, ring)| match ring {
                Value::Array(vertices) => parse_vertices(part, vertices),
                other => Err(GeometryError::InvalidVertex {
                    part,
                    index: 0,
                    source: Box::new(GeometryError::ExpectedSequence {
                        found: describe(other),
                    }),
                }),
            })
            .collect()
    } else {
        Ok(vec![parse_vertices(0, items)?])
    }
}

// Nested when the first non-empty element is itself a list of vertices rather than a vertex.
fn is_nested(items: &[Value]) -> bool {
    let first = items.iter().find(|v| !matches!(v, Value::Array(inner) if inner.is_empty()));
    match first {
        Some(Value::Array(inner)) => {
            matches!(inner.first(), Some(Value::Array(_) | Value::Object(_)))
        }
        // Only empty lists: an outer list of empty rings.
        None => true,
        _ => false,
    }
}

fn parse_vertices(part: usize, vertices: &[Value]) -> Result<Vec<LatLng>, GeometryError> {
    vertices
        .iter()
        .enumerate()
        .map(|(index, v)| {
            parse_point(v).map_err(|e| GeometryError::InvalidVertex {
                part,
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

fn parse_circle(v: &Value) -> Result<GeometryPayload, GeometryError> {
    let Value::Object(map) = v else {
        return Err(GeometryError::ExpectedCircle {
            found: describe(v),
        });
    };

    // A nested `center` wins over inline lat/lng, even when malformed. Null counts as absent.
    let center = match map.get("center") {
        None | Some(Value::Null) => parse_point(v)?,
        Some(center) => parse_point(center)?,
    };

    let radius = map
        .get("radius")
        .and_then(finite)
        .ok_or(GeometryError::MissingRadius)?;
    if radius < 0.0 {
        return Err(GeometryError::NegativeRadius { radius });
    }

    Ok(GeometryPayload::Circle { center, radius })
}

fn finite(v: &Value) -> Option<f64> {
    v.as_f64().filter(|f| f.is_finite())
}

fn describe(v: &Value) -> String {
    match v {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "a boolean".to_owned(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(_) => "an object".to_owned(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/parse.rs"]
mod tests;
