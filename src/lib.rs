//! Lorekeeper resolves spoiler-safe content versions for branching stories and
//! composites map snapshots into ordered render plans.
//!
//! # Pipeline overview
//!
//! 1. **Locate**: a [`ReaderPosition`] (branch + chapter) is validated against the [`Lineage`].
//! 2. **Resolve**: `snapshots + position -> Resolution` picks the effective snapshot, or
//!    reports the entity as unrevealed.
//! 3. **Compose**: `MapSnapshot -> RenderPlan` orders layers, parses every object's
//!    coordinates and resolves its style, recording bad objects instead of failing.
//! 4. **Present**: a [`MapView`] hands the plan to the host's [`SpatialLibrary`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Pure resolution**: the reader position is an explicit argument; identical inputs
//!   always resolve to the same snapshot.
//! - **Per-object failure**: malformed annotation JSON never aborts a batch.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod compose;
mod foundation;
mod geometry;
mod lineage;
mod snapshot;
mod view;
mod viewport;

pub use api::routes::{ContentRequest, Method};
pub use api::wire::{ApiResponse, MapPayload, WikiPayload};
pub use compose::compositor::{ComposeSettings, Compositor};
pub use compose::plan::{Primitive, RejectedObject, RenderPlan, RenderUnit};
pub use foundation::core::{
    BezPath, BranchId, ChapterId, ChapterRank, Circle, EntityKey, LayerId, MapId, ObjectId,
    Point, ReaderPosition, Rect, SnapshotId, Vec2, WikiEntryId,
};
pub use foundation::error::{LoreError, LoreResult};
pub use geometry::parse::{GeometryError, GeometryPayload, LatLng, parse_geometry, parse_point};
pub use geometry::style::{IconStyle, PathStyle, StyleDefaults, StyleResolver};
pub use lineage::graph::{Lineage, LineageConfig};
pub use lineage::model::{Branch, Chapter};
pub use snapshot::cache::{CachedResolution, ResolutionCache, Ticket};
pub use snapshot::model::{
    LayerType, Map, MapCanvas, MapLayer, MapObject, MapSnapshot, ObjectType, Versioned,
    WikiEntry, WikiSnapshot,
};
pub use snapshot::resolver::{Resolution, SnapshotResolver};
pub use snapshot::store::{ContentDocument, ContentStore, ForkSummary};
pub use view::session::{MapView, MapViewState, ReaderSession, SpatialLibrary};
pub use viewport::projection::{Viewport, ViewportConfig};
