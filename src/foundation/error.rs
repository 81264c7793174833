use crate::foundation::core::{BranchId, ChapterId};

/// Convenience result type used across lorekeeper.
pub type LoreResult<T> = Result<T, LoreError>;

/// Top-level error taxonomy used by resolution, authoring and view APIs.
///
/// Per-object geometry failures are not part of this enum; they are reported
/// through [`crate::GeometryError`] inside a render plan.
#[derive(thiserror::Error, Debug)]
pub enum LoreError {
    /// Invalid user-provided or stored data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A branch id that the lineage does not know.
    #[error("unknown branch {0}")]
    UnknownBranch(BranchId),

    /// A chapter id that no branch owns.
    #[error("unknown chapter {0}")]
    UnknownChapter(ChapterId),

    /// The chapter exists but cannot be reached from the branch.
    #[error("chapter {chapter} is not in the lineage of branch {branch}")]
    ChapterNotInLineage {
        /// Branch whose lineage was searched.
        branch: BranchId,
        /// Chapter that was looked up.
        chapter: ChapterId,
    },

    /// The parent walk from `branch` did not reach a root within `limit` hops.
    #[error("lineage of branch {branch} exceeds {limit} ancestors (cycle detected)")]
    CycleDetected {
        /// Branch whose walk failed.
        branch: BranchId,
        /// Depth bound that was exceeded.
        limit: usize,
    },

    /// A content entity (wiki entry, map, snapshot) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An authoring action collides with existing content.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The spatial rendering library could not be initialized.
    #[error("map library initialization failed: {0}")]
    MapLibraryInitFailed(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoreError {
    /// Build a [`LoreError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LoreError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`LoreError::Conflict`] value.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Build a [`LoreError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for failures that leave the spoiler boundary undefined.
    ///
    /// These must reach the page boundary (error state with retry) instead of
    /// degrading to a placeholder.
    pub fn is_lineage_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownBranch(_)
                | Self::UnknownChapter(_)
                | Self::ChapterNotInLineage { .. }
                | Self::CycleDetected { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
