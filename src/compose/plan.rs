use crate::{
    foundation::core::{BezPath, LayerId, ObjectId, Rect, SnapshotId, WikiEntryId},
    geometry::parse::{GeometryError, GeometryPayload, LatLng},
    geometry::style::{IconStyle, PathStyle},
    snapshot::model::ObjectType,
    viewport::projection::Viewport,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
/// A drawable shape with its resolved style.
pub enum Primitive {
    /// POINT or ICON; `icon` is `None` for the host's default marker.
    Marker {
        /// Marker position.
        at: LatLng,
        /// Custom marker image.
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<IconStyle>,
    },
    /// LINE; several parts for a multi-polyline.
    Polyline {
        /// Vertex lists, one per polyline.
        parts: Vec<Vec<LatLng>>,
        /// Stroke options.
        style: PathStyle,
    },
    /// POLYGON; outer ring first, then holes.
    Polygon {
        /// Outer ring, then holes.
        rings: Vec<Vec<LatLng>>,
        /// Stroke and fill options.
        style: PathStyle,
    },
    /// CIRCLE, radius in pixels.
    Circle {
        /// Circle center.
        center: LatLng,
        /// Radius in pixels.
        radius: f64,
        /// Stroke and fill options.
        style: PathStyle,
    },
}

impl Primitive {
    fn geometry(&self) -> GeometryPayload {
        match self {
            Self::Marker { at, .. } => GeometryPayload::Point { at: *at },
            Self::Polyline { parts, .. } => GeometryPayload::MultiPoint {
                parts: parts.clone(),
            },
            Self::Polygon { rings, .. } => GeometryPayload::MultiPoint {
                parts: rings.clone(),
            },
            Self::Circle { center, radius, .. } => GeometryPayload::Circle {
                center: *center,
                radius: *radius,
            },
        }
    }

    /// Pixel-space bounds; `None` for an empty polyline or polygon.
    pub fn bounds(&self) -> Option<Rect> {
        self.geometry().bounds()
    }

    /// Outline in pixel space; markers have none.
    pub fn to_bez_path(&self) -> Option<BezPath> {
        match self {
            Self::Marker { .. } => None,
            Self::Polyline { .. } => Some(self.geometry().to_bez_path(false)),
            Self::Polygon { .. } | Self::Circle { .. } => Some(self.geometry().to_bez_path(true)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// One successfully parsed object, tagged with where it came from.
pub struct RenderUnit {
    /// Originating object, for click/selection handlers.
    pub object_id: ObjectId,
    /// Originating layer.
    pub layer_id: LayerId,
    /// Z-index of the originating layer.
    pub z_index: i32,
    /// Authoring type of the object.
    pub object_type: ObjectType,
    /// Shape and resolved style.
    pub primitive: Primitive,
    /// Non-blank object label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Non-blank object description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Wiki entry opened when the unit is selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_entry_id: Option<WikiEntryId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// An object left out of the plan because its coordinates did not parse.
pub struct RejectedObject {
    /// Rejected object.
    pub object_id: ObjectId,
    /// Layer holding the object.
    pub layer_id: LayerId,
    /// Authoring type of the object.
    pub object_type: ObjectType,
    /// Why its coordinates were unusable.
    pub error: GeometryError,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Ordered, backend-agnostic drawing list for one map snapshot.
///
/// `units` are in paint order: ascending layer z-index, then original layer
/// order, then object order within the layer.
pub struct RenderPlan {
    /// Snapshot the plan was composed from.
    pub snapshot_id: SnapshotId,
    /// Base image drawn under every unit.
    pub base_image_url: String,
    /// Coordinate frame of the base image.
    pub viewport: Viewport,
    /// Drawable units in paint order.
    pub units: Vec<RenderUnit>,
    /// Objects left out, in encounter order.
    pub rejected: Vec<RejectedObject>,
}

impl RenderPlan {
    /// Union of every unit's bounds in pixel space.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.units
            .iter()
            .filter_map(|u| u.primitive.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Unit drawn for `object`, if it parsed.
    pub fn unit(&self, object: ObjectId) -> Option<&RenderUnit> {
        self.units.iter().find(|u| u.object_id == object)
    }
}
