use crate::{
    compose::plan::{Primitive, RejectedObject, RenderPlan, RenderUnit},
    foundation::error::LoreResult,
    geometry::parse::{GeometryError, GeometryPayload, parse_geometry},
    geometry::style::{StyleDefaults, StyleResolver},
    snapshot::model::{MapCanvas, MapLayer, MapObject, MapSnapshot, ObjectType},
    viewport::projection::{Viewport, ViewportConfig},
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Compositor configuration.
pub struct ComposeSettings {
    /// Zoom band of the produced viewport.
    pub viewport: ViewportConfig,
    /// Style defaults under every layer and object style.
    pub styles: StyleDefaults,
}

/// Stateless compositor from a map snapshot to a render plan.
pub struct Compositor;

impl Compositor {
    #[tracing::instrument(
        skip(snapshot, settings),
        fields(snapshot_id = %snapshot.id, layers = snapshot.layers.len())
    )]
    /// Build the render plan for `snapshot` on a map of size `canvas`.
    ///
    /// Fails only on an invalid canvas or zoom band. Objects whose
    /// coordinates do not parse are recorded in `rejected`.
    pub fn compose(
        canvas: MapCanvas,
        snapshot: &MapSnapshot,
        settings: &ComposeSettings,
    ) -> LoreResult<RenderPlan> {
        let viewport = Viewport::new(canvas, settings.viewport)?;
        let (units, rejected) = Self::compose_layers(&snapshot.layers, &settings.styles);
        if !rejected.is_empty() {
            tracing::info!(
                rendered = units.len(),
                rejected = rejected.len(),
                "composed with rejected objects"
            );
        }
        Ok(RenderPlan {
            snapshot_id: snapshot.id,
            base_image_url: snapshot.base_image_url.clone(),
            viewport,
            units,
            rejected,
        })
    }

    /// Paint-ordered units plus the objects that failed to parse.
    pub fn compose_layers(
        layers: &[MapLayer],
        styles: &StyleDefaults,
    ) -> (Vec<RenderUnit>, Vec<RejectedObject>) {
        let mut ordered: Vec<((i32, usize), &MapLayer)> = layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.is_visible)
            .map(|(index, layer)| ((layer.z_index, index), layer))
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let resolver = StyleResolver::new(styles);
        let mut units = Vec::new();
        let mut rejected = Vec::new();
        for (_, layer) in ordered {
            for object in &layer.objects {
                match compose_object(&resolver, layer, object) {
                    Ok(unit) => units.push(unit),
                    Err(error) => {
                        tracing::warn!(
                            object = %object.id,
                            layer = %layer.id,
                            object_type = ?object.object_type,
                            %error,
                            "skipping object with invalid geometry"
                        );
                        rejected.push(RejectedObject {
                            object_id: object.id,
                            layer_id: layer.id,
                            object_type: object.object_type,
                            error,
                        });
                    }
                }
            }
        }
        (units, rejected)
    }
}

fn compose_object(
    resolver: &StyleResolver<'_>,
    layer: &MapLayer,
    object: &MapObject,
) -> Result<RenderUnit, GeometryError> {
    let kind = object.object_type;
    let payload = parse_geometry(kind, &object.coordinates)?;
    let layer_style = layer.style_json.as_ref();
    let object_style = object.style_json.as_ref();

    let primitive = match (kind, payload) {
        (ObjectType::Point | ObjectType::Icon, GeometryPayload::Point { at }) => Primitive::Marker {
            at,
            icon: resolver.icon_style(kind, layer_style, object_style),
        },
        (ObjectType::Line, GeometryPayload::MultiPoint { parts }) => Primitive::Polyline {
            parts,
            style: resolver.path_style(kind, layer_style, object_style),
        },
        (ObjectType::Polygon, GeometryPayload::MultiPoint { parts }) => Primitive::Polygon {
            rings: parts,
            style: resolver.path_style(kind, layer_style, object_style),
        },
        (ObjectType::Circle, GeometryPayload::Circle { center, radius }) => Primitive::Circle {
            center,
            radius,
            style: resolver.path_style(kind, layer_style, object_style),
        },
        _ => return Err(GeometryError::UnsupportedObjectType),
    };

    Ok(RenderUnit {
        object_id: object.id,
        layer_id: layer.id,
        z_index: layer.z_index,
        object_type: kind,
        primitive,
        label: non_empty(&object.label),
        description: non_empty(&object.description),
        wiki_entry_id: object.wiki_entry_id,
    })
}

// Blank text is dropped; anything else is kept as the author wrote it.
fn non_empty(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
