use std::collections::HashMap;

use crate::foundation::core::{EntityKey, ReaderPosition, SnapshotId};

/// A memoized resolution, detached from the snapshot borrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "snapshotId")]
pub enum CachedResolution {
    /// The id of the effective snapshot.
    Revealed(SnapshotId),
    /// No snapshot applied.
    Unrevealed,
}

/// Proof that a computation started at a given navigation epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    position: ReaderPosition,
}

impl Ticket {
    /// Position the ticket was issued for.
    pub fn position(&self) -> ReaderPosition {
        self.position
    }
}

/// Per-key memo of resolution results.
///
/// Entries never go stale on their own: snapshots are immutable, so the only
/// invalidation is a newly created snapshot for the same entity. Navigation
/// bumps the epoch, and results carrying an older ticket are refused.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    epoch: u64,
    current: Option<ReaderPosition>,
    entries: HashMap<(EntityKey, ReaderPosition), CachedResolution>,
}

impl ResolutionCache {
    /// Empty cache with no reader position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the reader and hand out a ticket for work done at the new position.
    pub fn navigate(&mut self, position: ReaderPosition) -> Ticket {
        self.epoch += 1;
        self.current = Some(position);
        tracing::debug!(epoch = self.epoch, %position, "reader navigated");
        Ticket {
            epoch: self.epoch,
            position,
        }
    }

    /// Current reader position, if the reader has navigated.
    pub fn position(&self) -> Option<ReaderPosition> {
        self.current
    }

    /// Memoized result for `entity` at `position`.
    pub fn get(&self, entity: EntityKey, position: ReaderPosition) -> Option<CachedResolution> {
        self.entries.get(&(entity, position)).copied()
    }

    /// Store a result computed under `ticket`.
    ///
    /// Returns `false` (and stores nothing) when the reader has navigated
    /// since the ticket was issued.
    pub fn commit(&mut self, ticket: &Ticket, entity: EntityKey, value: CachedResolution) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                %entity,
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "dropping result for an abandoned position"
            );
            return false;
        }
        self.entries.insert((entity, ticket.position), value);
        true
    }

    /// Forget every memoized result for `entity`.
    pub fn snapshot_created(&mut self, entity: EntityKey) {
        self.entries.retain(|(key, _), _| *key != entity);
    }

    /// Number of memoized results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/cache.rs"]
mod tests;
