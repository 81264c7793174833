use chrono::{DateTime, Utc};

use crate::foundation::core::{BranchId, ChapterId, ChapterRank};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A forkable storyline.
pub struct Branch {
    /// Branch identifier.
    pub id: BranchId,
    /// Parent branch, `None` for a root.
    #[serde(default)]
    pub parent_branch_id: Option<BranchId>,
    /// Parent chapter after which this branch diverges.
    #[serde(default)]
    pub forked_at_chapter_id: Option<ChapterId>,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl Branch {
    /// A root branch with no parent.
    pub fn root(id: BranchId, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_branch_id: None,
            forked_at_chapter_id: None,
            name: name.into(),
        }
    }

    /// A branch forked from `parent` after `at`.
    pub fn fork(id: BranchId, parent: BranchId, at: ChapterId, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_branch_id: Some(parent),
            forked_at_chapter_id: Some(at),
            name: name.into(),
        }
    }

    /// Whether the branch has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_branch_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// An ordered narrative unit inside a branch.
pub struct Chapter {
    /// Chapter identifier.
    pub id: ChapterId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Position within the branch; strictly increasing.
    pub order_index: u32,
    /// Publication time; unpublished chapters are invisible to readers.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Chapter {
    /// An unpublished chapter.
    pub fn new(id: ChapterId, branch_id: BranchId, order_index: u32) -> Self {
        Self {
            id,
            branch_id,
            order_index,
            published_at: None,
        }
    }

    /// Mark the chapter published at `at`.
    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Rank of the chapter in every lineage that reaches it.
    pub fn rank(&self) -> ChapterRank {
        ChapterRank(self.order_index)
    }

    /// Whether readers can see this chapter at `now`.
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.published_at.is_some_and(|t| t <= now)
    }
}
