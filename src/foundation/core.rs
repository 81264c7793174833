use std::fmt;

pub use kurbo::{BezPath, Circle, Point, Rect, Vec2};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a storyline branch.
    BranchId
);
id_newtype!(
    /// Identifier of a chapter (unique across all branches).
    ChapterId
);
id_newtype!(
    /// Identifier of a wiki entry.
    WikiEntryId
);
id_newtype!(
    /// Identifier of a map.
    MapId
);
id_newtype!(
    /// Identifier of a wiki or map snapshot.
    SnapshotId
);
id_newtype!(
    /// Identifier of a map layer.
    LayerId
);
id_newtype!(
    /// Identifier of a map object.
    ObjectId
);

/// Ordinal position of a chapter within a lineage; the spoiler boundary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChapterRank(pub u32);

impl fmt::Display for ChapterRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a reader currently is: a branch and the chapter they are reading.
///
/// Passed explicitly into every resolution call; there is no ambient
/// "current chapter".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ReaderPosition {
    /// Branch being read.
    pub branch_id: BranchId,
    /// Chapter being read.
    pub chapter_id: ChapterId,
}

impl ReaderPosition {
    /// Build a position from its parts.
    pub fn new(branch_id: BranchId, chapter_id: ChapterId) -> Self {
        Self {
            branch_id,
            chapter_id,
        }
    }
}

impl fmt::Display for ReaderPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch {} @ chapter {}", self.branch_id, self.chapter_id)
    }
}

/// A versioned content entity, used as a cache key.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum EntityKey {
    /// A wiki entry.
    Wiki(WikiEntryId),
    /// A map.
    Map(MapId),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wiki(id) => write!(f, "wiki {id}"),
            Self::Map(id) => write!(f, "map {id}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
