use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    foundation::core::{BranchId, ChapterId, ChapterRank, ReaderPosition},
    foundation::error::{LoreError, LoreResult},
    lineage::model::{Branch, Chapter},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Lineage construction settings.
pub struct LineageConfig {
    /// Maximum number of ancestors a branch may have before its walk is
    /// treated as corrupt.
    pub max_depth: usize,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// How much of a branch's chapter list is visible from the walk's origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reach {
    All,
    UpTo(ChapterRank),
    Nothing,
}

impl Reach {
    fn admits(self, rank: ChapterRank) -> bool {
        match self {
            Reach::All => true,
            Reach::UpTo(limit) => rank <= limit,
            Reach::Nothing => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Hop {
    branch: BranchId,
    reach: Reach,
}

#[derive(Clone, Debug)]
enum LineagePath {
    /// Origin first, root last.
    Resolved(Vec<Hop>),
    Corrupt,
}

/// Branch forest plus per-branch chapter sequences.
///
/// Ancestor paths are computed once when a branch enters the lineage, so
/// rank queries never re-walk parent pointers.
#[derive(Clone, Debug, Default)]
pub struct Lineage {
    config: LineageConfig,
    branches: BTreeMap<BranchId, Branch>,
    chapters: BTreeMap<ChapterId, Chapter>,
    by_branch: BTreeMap<BranchId, Vec<ChapterId>>,
    paths: BTreeMap<BranchId, LineagePath>,
}

impl Lineage {
    #[tracing::instrument(skip_all, fields(branches = branches.len(), chapters = chapters.len()))]
    /// Validate and index a full branch/chapter set.
    pub fn build(
        branches: Vec<Branch>,
        chapters: Vec<Chapter>,
        config: LineageConfig,
    ) -> LoreResult<Self> {
        if config.max_depth == 0 {
            return Err(LoreError::validation("lineage max_depth must be > 0"));
        }

        let mut lineage = Self {
            config,
            ..Self::default()
        };

        for branch in branches {
            let id = branch.id;
            if lineage.branches.insert(id, branch).is_some() {
                return Err(LoreError::validation(format!("duplicate branch id {id}")));
            }
            lineage.by_branch.insert(id, Vec::new());
        }

        for chapter in chapters {
            let id = chapter.id;
            let Some(ids) = lineage.by_branch.get_mut(&chapter.branch_id) else {
                return Err(LoreError::UnknownBranch(chapter.branch_id));
            };
            ids.push(id);
            if lineage.chapters.insert(id, chapter).is_some() {
                return Err(LoreError::validation(format!("duplicate chapter id {id}")));
            }
        }

        for (branch_id, ids) in lineage.by_branch.iter_mut() {
            let chapters = &lineage.chapters;
            ids.sort_by_key(|id| chapters.get(id).map(|c| c.order_index));
            for pair in ids.windows(2) {
                let a = chapters.get(&pair[0]).map(|c| c.order_index);
                let b = chapters.get(&pair[1]).map(|c| c.order_index);
                if a == b {
                    return Err(LoreError::validation(format!(
                        "branch {branch_id} has chapters {} and {} with the same order index",
                        pair[0], pair[1]
                    )));
                }
            }
        }

        for branch in lineage.branches.values() {
            lineage.validate_fork(branch)?;
        }

        let ids: Vec<BranchId> = lineage.branches.keys().copied().collect();
        for id in ids {
            let path = lineage.walk(id);
            if matches!(path, LineagePath::Corrupt) {
                tracing::warn!(branch = %id, limit = config.max_depth, "branch lineage is corrupt");
            }
            lineage.paths.insert(id, path);
        }

        Ok(lineage)
    }

    /// Settings the lineage was built with.
    pub fn config(&self) -> LineageConfig {
        self.config
    }

    /// Look up a branch.
    pub fn branch(&self, id: BranchId) -> LoreResult<&Branch> {
        self.branches.get(&id).ok_or(LoreError::UnknownBranch(id))
    }

    /// Look up a chapter.
    pub fn chapter(&self, id: ChapterId) -> LoreResult<&Chapter> {
        self.chapters.get(&id).ok_or(LoreError::UnknownChapter(id))
    }

    /// Every branch, by id.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    /// Every chapter, by id.
    pub fn chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.values()
    }

    /// Chapters owned by `branch`, in order.
    pub fn branch_chapters(&self, branch: BranchId) -> LoreResult<Vec<&Chapter>> {
        let ids = self
            .by_branch
            .get(&branch)
            .ok_or(LoreError::UnknownBranch(branch))?;
        Ok(ids.iter().filter_map(|id| self.chapters.get(id)).collect())
    }

    /// The branch itself followed by each ancestor, ending at the root.
    pub fn ancestor_path(&self, branch: BranchId) -> LoreResult<Vec<&Branch>> {
        self.hops(branch)?
            .iter()
            .map(|hop| self.branch(hop.branch))
            .collect()
    }

    /// Rank of `chapter` as seen from `branch`.
    ///
    /// A chapter of the branch itself always ranks; a chapter of an ancestor
    /// ranks only if it is at or before the point where the lineage forked
    /// away from that ancestor.
    pub fn chapter_rank(&self, branch: BranchId, chapter: ChapterId) -> LoreResult<ChapterRank> {
        let hops = self.hops(branch)?;
        let ch = self.chapter(chapter)?;
        let rank = ch.rank();
        match hops.iter().find(|hop| hop.branch == ch.branch_id) {
            Some(hop) if hop.reach.admits(rank) => Ok(rank),
            _ => Err(LoreError::ChapterNotInLineage { branch, chapter }),
        }
    }

    /// Rank of the chapter the reader is on.
    pub fn position_rank(&self, position: ReaderPosition) -> LoreResult<ChapterRank> {
        self.chapter_rank(position.branch_id, position.chapter_id)
    }

    /// Every chapter readable from `branch`, root chapters first.
    pub fn reading_order(&self, branch: BranchId) -> LoreResult<Vec<&Chapter>> {
        let hops = self.hops(branch)?;
        let mut out = Vec::new();
        for hop in hops.iter().rev() {
            for chapter in self.branch_chapters(hop.branch)? {
                if hop.reach.admits(chapter.rank()) {
                    out.push(chapter);
                }
            }
        }
        out.sort_by_key(|c| c.rank());
        Ok(out)
    }

    /// [`Lineage::reading_order`] restricted to chapters published by `now`.
    pub fn published_reading_order(
        &self,
        branch: BranchId,
        now: DateTime<Utc>,
    ) -> LoreResult<Vec<&Chapter>> {
        let mut chapters = self.reading_order(branch)?;
        chapters.retain(|c| c.is_published_at(now));
        Ok(chapters)
    }

    /// Last chapter in the reading order, if the lineage has any.
    pub fn latest_chapter(&self, branch: BranchId) -> LoreResult<Option<&Chapter>> {
        Ok(self.reading_order(branch)?.pop())
    }

    /// Whether `ancestor` appears on the path from `branch` to its root
    /// (a branch counts as its own ancestor).
    pub fn descends_from(&self, branch: BranchId, ancestor: BranchId) -> LoreResult<bool> {
        Ok(self.hops(branch)?.iter().any(|hop| hop.branch == ancestor))
    }

    /// Register a newly forked (or new root) branch.
    pub fn add_branch(&mut self, branch: Branch) -> LoreResult<()> {
        if self.branches.contains_key(&branch.id) {
            return Err(LoreError::conflict(format!(
                "branch {} already exists",
                branch.id
            )));
        }
        if let Some(parent) = branch.parent_branch_id {
            // Only existing branches can be parents, so no cycle can form here.
            self.hops(parent)?;
        }
        self.validate_fork(&branch)?;

        let id = branch.id;
        self.branches.insert(id, branch);
        self.by_branch.insert(id, Vec::new());
        let path = self.walk(id);
        self.paths.insert(id, path);
        Ok(())
    }

    /// Append a chapter to the end of its branch.
    pub fn append_chapter(&mut self, chapter: Chapter) -> LoreResult<()> {
        let branch = self.branch(chapter.branch_id)?;
        if self.chapters.contains_key(&chapter.id) {
            return Err(LoreError::conflict(format!(
                "chapter {} already exists",
                chapter.id
            )));
        }
        if let Some(fork_rank) = self.fork_rank(branch) {
            if chapter.rank() <= fork_rank {
                return Err(LoreError::validation(format!(
                    "chapter {} must continue after fork point {fork_rank} of branch {}",
                    chapter.id, branch.id
                )));
            }
        }
        let last = self
            .by_branch
            .get(&chapter.branch_id)
            .and_then(|ids| ids.last())
            .and_then(|id| self.chapters.get(id));
        if let Some(last) = last {
            if chapter.order_index <= last.order_index {
                return Err(LoreError::validation(format!(
                    "chapter {} order index {} does not follow {}",
                    chapter.id, chapter.order_index, last.order_index
                )));
            }
        }

        let (id, branch_id) = (chapter.id, chapter.branch_id);
        self.chapters.insert(id, chapter);
        self.by_branch.entry(branch_id).or_default().push(id);
        Ok(())
    }

    fn hops(&self, branch: BranchId) -> LoreResult<&[Hop]> {
        match self.paths.get(&branch) {
            None => Err(LoreError::UnknownBranch(branch)),
            Some(LineagePath::Corrupt) => Err(LoreError::CycleDetected {
                branch,
                limit: self.config.max_depth,
            }),
            Some(LineagePath::Resolved(hops)) => Ok(hops),
        }
    }

    fn fork_rank(&self, branch: &Branch) -> Option<ChapterRank> {
        branch
            .forked_at_chapter_id
            .and_then(|id| self.chapters.get(&id))
            .map(Chapter::rank)
    }

    fn validate_fork(&self, branch: &Branch) -> LoreResult<()> {
        let Some(parent) = branch.parent_branch_id else {
            if branch.forked_at_chapter_id.is_some() {
                return Err(LoreError::validation(format!(
                    "root branch {} cannot have a fork chapter",
                    branch.id
                )));
            }
            return Ok(());
        };
        if !self.branches.contains_key(&parent) {
            return Err(LoreError::UnknownBranch(parent));
        }
        let Some(fork_at) = branch.forked_at_chapter_id else {
            return Ok(());
        };
        let fork_chapter = self.chapter(fork_at)?;
        if fork_chapter.branch_id != parent {
            return Err(LoreError::validation(format!(
                "branch {} forks at chapter {fork_at} of branch {}, not of parent {parent}",
                branch.id, fork_chapter.branch_id
            )));
        }

        let first = self
            .by_branch
            .get(&branch.id)
            .and_then(|ids| ids.first())
            .and_then(|id| self.chapters.get(id));
        if let Some(first) = first {
            if first.order_index <= fork_chapter.order_index {
                return Err(LoreError::validation(format!(
                    "branch {} starts at order index {}, not after fork point {}",
                    branch.id, first.order_index, fork_chapter.order_index
                )));
            }
        }
        Ok(())
    }

    fn walk(&self, origin: BranchId) -> LineagePath {
        let mut hops = Vec::new();
        let mut reach = Reach::All;
        let mut current = origin;
        loop {
            if hops.len() > self.config.max_depth {
                return LineagePath::Corrupt;
            }
            let Some(branch) = self.branches.get(&current) else {
                return LineagePath::Corrupt;
            };
            hops.push(Hop {
                branch: current,
                reach,
            });
            let Some(parent) = branch.parent_branch_id else {
                return LineagePath::Resolved(hops);
            };
            reach = match (reach, self.fork_rank(branch)) {
                (Reach::Nothing, _) | (_, None) => Reach::Nothing,
                (_, Some(rank)) => Reach::UpTo(rank),
            };
            current = parent;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lineage/graph.rs"]
mod tests;
