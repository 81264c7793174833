use crate::{
    foundation::core::{BranchId, ChapterRank, ReaderPosition},
    foundation::error::LoreResult,
    lineage::graph::Lineage,
    snapshot::model::Versioned,
};

/// Outcome of resolving an entity at a reader position.
///
/// `Unrevealed` is not an error: the reader is positioned before the
/// entity's first applicable snapshot and should see a locked placeholder.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, S> {
    /// The effective snapshot.
    Revealed(&'a S),
    /// No snapshot applies yet.
    Unrevealed,
}

impl<S> Clone for Resolution<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Resolution<'_, S> {}

impl<'a, S> Resolution<'a, S> {
    /// The effective snapshot, if revealed.
    pub fn snapshot(self) -> Option<&'a S> {
        match self {
            Self::Revealed(s) => Some(s),
            Self::Unrevealed => None,
        }
    }

    /// Whether a snapshot applies.
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

/// Stateless selector of the effective snapshot.
///
/// A pure function of (snapshot set, lineage, reader position); it keeps no
/// state between calls.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotResolver<'l> {
    lineage: &'l Lineage,
}

impl<'l> SnapshotResolver<'l> {
    /// Resolver over `lineage`.
    pub fn new(lineage: &'l Lineage) -> Self {
        Self { lineage }
    }

    #[tracing::instrument(skip(self, snapshots), fields(candidates = snapshots.len()))]
    /// Pick the snapshot with the greatest effective rank not after the reader.
    ///
    /// Snapshots effective from chapters outside the reader's lineage (sibling
    /// branches, later parent chapters) never qualify. Fails only when the
    /// reader position itself is not a valid lineage position.
    pub fn resolve<'s, S: Versioned>(
        &self,
        snapshots: &'s [S],
        position: ReaderPosition,
    ) -> LoreResult<Resolution<'s, S>> {
        let reader_rank = self.lineage.position_rank(position)?;
        Ok(self.select(snapshots, position.branch_id, Some(reader_rank)))
    }

    #[tracing::instrument(skip(self, snapshots), fields(candidates = snapshots.len()))]
    /// Latest snapshot reachable from `home` with no chapter bound.
    pub fn resolve_unrestricted<'s, S: Versioned>(
        &self,
        snapshots: &'s [S],
        home: BranchId,
    ) -> LoreResult<Resolution<'s, S>> {
        self.lineage.ancestor_path(home)?;
        Ok(self.select(snapshots, home, None))
    }

    /// Rank of a snapshot's effective chapter as seen from `branch`.
    pub fn effective_rank<S: Versioned>(
        &self,
        snapshot: &S,
        branch: BranchId,
    ) -> Option<ChapterRank> {
        self.lineage
            .chapter_rank(branch, snapshot.effective_from())
            .ok()
    }

    fn select<'s, S: Versioned>(
        &self,
        snapshots: &'s [S],
        branch: BranchId,
        bound: Option<ChapterRank>,
    ) -> Resolution<'s, S> {
        let mut best: Option<(ChapterRank, &'s S)> = None;
        for snapshot in snapshots {
            let rank = match self.lineage.chapter_rank(branch, snapshot.effective_from()) {
                Ok(rank) => rank,
                Err(err) => {
                    tracing::debug!(
                        snapshot = %snapshot.snapshot_id(),
                        %err,
                        "snapshot is not reachable from the reader lineage"
                    );
                    continue;
                }
            };
            if bound.is_some_and(|limit| rank > limit) {
                continue;
            }

            best = match best {
                None => Some((rank, snapshot)),
                Some((best_rank, _)) if rank > best_rank => Some((rank, snapshot)),
                Some((best_rank, current)) if rank == best_rank => {
                    tracing::warn!(
                        %rank,
                        kept = %current.snapshot_id().max(snapshot.snapshot_id()),
                        dropped = %current.snapshot_id().min(snapshot.snapshot_id()),
                        "snapshots share an effective rank; keeping the highest id"
                    );
                    if snapshot.snapshot_id() > current.snapshot_id() {
                        Some((rank, snapshot))
                    } else {
                        best
                    }
                }
                keep => keep,
            };
        }

        match best {
            Some((_, snapshot)) => Resolution::Revealed(snapshot),
            None => Resolution::Unrevealed,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/resolver.rs"]
mod tests;
