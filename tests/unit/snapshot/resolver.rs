use super::*;
use crate::{
    foundation::core::{ChapterId, SnapshotId, WikiEntryId},
    foundation::error::LoreError,
    lineage::graph::LineageConfig,
    lineage::model::{Branch, Chapter},
    snapshot::model::WikiSnapshot,
};

const MAIN: BranchId = BranchId(1);
const FORK: BranchId = BranchId(2);
const SIBLING: BranchId = BranchId(3);

fn ch(rank: u32) -> ChapterId {
    ChapterId(100 + u64::from(rank))
}

// main: ranks 0..=10; FORK leaves main after rank 6 and adds 7..=9 (ids 207..);
// SIBLING leaves main after rank 2 and adds rank 3 (id 303).
fn lineage() -> Lineage {
    let mut chapters: Vec<Chapter> = (0..=10).map(|r| Chapter::new(ch(r), MAIN, r)).collect();
    for r in 7..=9 {
        chapters.push(Chapter::new(ChapterId(200 + u64::from(r)), FORK, r));
    }
    chapters.push(Chapter::new(ChapterId(303), SIBLING, 3));
    Lineage::build(
        vec![
            Branch::root(MAIN, "main"),
            Branch::fork(FORK, MAIN, ch(6), "fork"),
            Branch::fork(SIBLING, MAIN, ch(2), "sibling"),
        ],
        chapters,
        LineageConfig::default(),
    )
    .unwrap()
}

fn snap(id: u64, from: ChapterId) -> WikiSnapshot {
    WikiSnapshot {
        id: SnapshotId(id),
        wiki_entry_id: WikiEntryId(1),
        effective_from_chapter_id: from,
        body: format!("v{id}"),
    }
}

fn resolved_id(res: Resolution<'_, WikiSnapshot>) -> Option<u64> {
    res.snapshot().map(|s| s.id.0)
}

#[test]
fn picks_latest_snapshot_at_or_before_reader() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let snapshots = vec![snap(1, ch(1)), snap(5, ch(5)), snap(10, ch(10))];

    let at = |rank| ReaderPosition::new(MAIN, ch(rank));
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, at(7)).unwrap()),
        Some(5)
    );
    assert_eq!(
        resolver.resolve(&snapshots, at(0)).unwrap(),
        Resolution::Unrevealed
    );
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, at(10)).unwrap()),
        Some(10)
    );
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, at(5)).unwrap()),
        Some(5)
    );
}

#[test]
fn resolution_is_bounded_and_maximal_for_every_position() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let snapshots = vec![
        snap(1, ch(1)),
        snap(2, ch(4)),
        snap(3, ChapterId(208)),
        snap(4, ChapterId(303)),
        snap(5, ch(9)),
    ];

    for branch in [MAIN, FORK, SIBLING] {
        for chapter in lineage.reading_order(branch).unwrap() {
            let position = ReaderPosition::new(branch, chapter.id);
            let reader_rank = lineage.position_rank(position).unwrap();
            let qualifying: Vec<ChapterRank> = snapshots
                .iter()
                .filter_map(|s| resolver.effective_rank(s, branch))
                .filter(|r| *r <= reader_rank)
                .collect();

            match resolver.resolve(&snapshots, position).unwrap() {
                Resolution::Revealed(s) => {
                    let rank = resolver.effective_rank(s, branch).unwrap();
                    assert!(rank <= reader_rank);
                    assert!(qualifying.iter().all(|r| *r <= rank));
                }
                Resolution::Unrevealed => assert!(qualifying.is_empty()),
            }
        }
    }
}

#[test]
fn sibling_and_post_fork_snapshots_never_leak() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    // ch(8) is main's rank 8, written after FORK diverged at rank 6.
    let snapshots = vec![snap(1, ch(1)), snap(2, ch(8)), snap(3, ChapterId(303))];

    let on_fork = ReaderPosition::new(FORK, ChapterId(209));
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, on_fork).unwrap()),
        Some(1)
    );

    let on_sibling = ReaderPosition::new(SIBLING, ChapterId(303));
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, on_sibling).unwrap()),
        Some(3)
    );

    let on_main = ReaderPosition::new(MAIN, ch(10));
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, on_main).unwrap()),
        Some(2)
    );
}

#[test]
fn resolution_is_order_independent_and_repeatable() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let forward = vec![snap(1, ch(1)), snap(5, ch(5)), snap(10, ch(10))];
    let mut backward = forward.clone();
    backward.reverse();

    let position = ReaderPosition::new(MAIN, ch(8));
    let a = resolved_id(resolver.resolve(&forward, position).unwrap());
    let b = resolved_id(resolver.resolve(&backward, position).unwrap());
    let again = resolved_id(resolver.resolve(&forward, position).unwrap());
    assert_eq!(a, Some(5));
    assert_eq!(a, b);
    assert_eq!(a, again);
}

#[test]
fn equal_ranks_fall_back_to_highest_id() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let snapshots = vec![snap(9, ch(3)), snap(4, ch(3)), snap(12, ch(3))];
    let position = ReaderPosition::new(MAIN, ch(3));
    assert_eq!(
        resolved_id(resolver.resolve(&snapshots, position).unwrap()),
        Some(12)
    );
}

#[test]
fn invalid_reader_position_is_a_hard_error() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let snapshots = vec![snap(1, ch(1))];

    let err = resolver
        .resolve(&snapshots, ReaderPosition::new(SIBLING, ch(9)))
        .unwrap_err();
    assert!(matches!(err, LoreError::ChapterNotInLineage { .. }));
    assert!(err.is_lineage_failure());
}

#[test]
fn unrestricted_view_takes_latest_reachable() {
    let lineage = lineage();
    let resolver = SnapshotResolver::new(&lineage);
    let snapshots = vec![snap(1, ch(1)), snap(2, ch(10)), snap(3, ChapterId(303))];
    assert_eq!(
        resolved_id(resolver.resolve_unrestricted(&snapshots, MAIN).unwrap()),
        Some(2)
    );
    assert_eq!(
        resolved_id(resolver.resolve_unrestricted(&snapshots, SIBLING).unwrap()),
        Some(3)
    );
    let none: Vec<WikiSnapshot> = Vec::new();
    assert_eq!(
        resolver.resolve_unrestricted(&none, MAIN).unwrap(),
        Resolution::Unrevealed
    );
}
