use crate::foundation::core::{
    BranchId, ChapterId, LayerId, MapId, ObjectId, SnapshotId, WikiEntryId,
};
use crate::foundation::error::{LoreError, LoreResult};

/// An immutable version of some entity, effective from a chapter onward.
pub trait Versioned {
    /// Id of the snapshot.
    fn snapshot_id(&self) -> SnapshotId;
    /// Chapter from which the snapshot applies.
    fn effective_from(&self) -> ChapterId;
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A lore/character/location record scoped to a branch.
pub struct WikiEntry {
    /// Entry id.
    pub id: WikiEntryId,
    /// Branch that owns the entry.
    pub branch_id: BranchId,
    /// Entry title.
    pub title: String,
    /// Author tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Chapter where the subject first appears; `None` means always listed.
    #[serde(default)]
    pub first_appearance: Option<ChapterId>,
    /// Entry this one was copied from when its branch was forked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_entry_id: Option<WikiEntryId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// An immutable version of a wiki entry's content.
pub struct WikiSnapshot {
    /// Snapshot id.
    pub id: SnapshotId,
    /// Entry this snapshot versions.
    pub wiki_entry_id: WikiEntryId,
    /// Chapter from which this version applies.
    #[serde(alias = "validFromChapter")]
    pub effective_from_chapter_id: ChapterId,
    /// Entry text.
    #[serde(default)]
    pub body: String,
}

impl Versioned for WikiSnapshot {
    fn snapshot_id(&self) -> SnapshotId {
        self.id
    }

    fn effective_from(&self) -> ChapterId {
        self.effective_from_chapter_id
    }
}

/// Pixel dimensions of a map's base image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MapCanvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl MapCanvas {
    /// Reject a zero-sized canvas.
    pub fn validate(self) -> LoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LoreError::validation("map width/height must be > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A spatial canvas tied to a branch.
pub struct Map {
    /// Map id.
    pub id: MapId,
    /// Branch that owns the map.
    pub branch_id: BranchId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Fixed at creation; defines the projection's coordinate space.
    pub width: u32,
    /// Base image height in pixels.
    pub height: u32,
    /// Map this one was copied from when its branch was forked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map_id: Option<MapId>,
}

impl Map {
    /// Pixel canvas of the map.
    pub fn canvas(&self) -> MapCanvas {
        MapCanvas {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// An immutable version of a map's visual state.
pub struct MapSnapshot {
    /// Snapshot id.
    pub id: SnapshotId,
    /// Map this snapshot versions; required in a stored document.
    #[serde(default)]
    pub map_id: Option<MapId>,
    /// Chapter from which this version applies.
    #[serde(alias = "validFromChapter")]
    pub effective_from_chapter_id: ChapterId,
    /// Base image URL.
    #[serde(default)]
    pub base_image_url: String,
    /// Layers in authoring order.
    #[serde(default)]
    pub layers: Vec<MapLayer>,
}

impl Versioned for MapSnapshot {
    fn snapshot_id(&self) -> SnapshotId {
        self.id
    }

    fn effective_from(&self) -> ChapterId {
        self.effective_from_chapter_id
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Authoring category of a layer; carried through, not used for ordering.
pub enum LayerType {
    /// Base imagery.
    Base,
    /// Generic overlay.
    #[default]
    Overlay,
    /// Point markers.
    Marker,
    /// Routes and borders.
    Path,
    /// Areas.
    Region,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A named, orderable group of annotations.
pub struct MapLayer {
    /// Layer id.
    pub id: LayerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Authoring category.
    #[serde(default)]
    pub layer_type: LayerType,
    /// Paint order; not unique.
    #[serde(default)]
    pub z_index: i32,
    /// Render filter only; hidden layers keep their objects.
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Style merged under every object's style.
    #[serde(default)]
    pub style_json: Option<serde_json::Value>,
    /// Annotations in paint order.
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

fn default_visible() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Annotation kind; decides the shape of `coordinates`.
pub enum ObjectType {
    /// A default marker.
    Point,
    /// A marker with an optional custom image.
    Icon,
    /// A polyline.
    Line,
    /// A polygon, optionally with holes.
    Polygon,
    /// A circle with a pixel radius.
    Circle,
    /// Any tag this crate does not know; such objects are rejected at render time.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A single spatial annotation with author-entered, unvalidated JSON.
pub struct MapObject {
    /// Object id.
    pub id: ObjectId,
    /// Annotation kind.
    pub object_type: ObjectType,
    /// Raw coordinate JSON.
    #[serde(default)]
    pub coordinates: serde_json::Value,
    /// Style overriding the layer's style.
    #[serde(default)]
    pub style_json: Option<serde_json::Value>,
    /// Short label.
    #[serde(default)]
    pub label: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Wiki entry opened when the object is selected.
    #[serde(default)]
    pub wiki_entry_id: Option<WikiEntryId>,
}

impl MapObject {
    /// An unstyled, unlabelled object.
    pub fn new(id: ObjectId, object_type: ObjectType, coordinates: serde_json::Value) -> Self {
        Self {
            id,
            object_type,
            coordinates,
            style_json: None,
            label: String::new(),
            description: String::new(),
            wiki_entry_id: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/model.rs"]
mod tests;
