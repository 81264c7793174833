use std::collections::{BTreeMap, BTreeSet};

use crate::{
    foundation::core::{
        BranchId, ChapterId, ChapterRank, LayerId, MapId, ObjectId, ReaderPosition, SnapshotId,
        WikiEntryId,
    },
    foundation::error::{LoreError, LoreResult},
    lineage::graph::{Lineage, LineageConfig},
    lineage::model::{Branch, Chapter},
    snapshot::model::{Map, MapCanvas, MapLayer, MapSnapshot, Versioned, WikiEntry, WikiSnapshot},
    snapshot::resolver::{Resolution, SnapshotResolver},
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Serialized form of a whole content set.
pub struct ContentDocument {
    /// Branch forest.
    pub branches: Vec<Branch>,
    /// Chapters of every branch.
    pub chapters: Vec<Chapter>,
    /// Wiki entries.
    pub wiki_entries: Vec<WikiEntry>,
    /// Wiki snapshots of every entry.
    pub wiki_snapshots: Vec<WikiSnapshot>,
    /// Maps.
    pub maps: Vec<Map>,
    /// Map snapshots of every map.
    pub map_snapshots: Vec<MapSnapshot>,
}

impl ContentDocument {
    /// Parse a document from JSON.
    pub fn from_json_str(s: &str) -> LoreResult<Self> {
        serde_json::from_str(s).map_err(|e| LoreError::serde(e.to_string()))
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> LoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoreError::serde(e.to_string()))
    }
}

/// What [`ContentStore::fork_branch_content`] copied.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkSummary {
    /// `(source, copy)` pairs.
    pub wiki_entries: Vec<(WikiEntryId, WikiEntryId)>,
    /// `(source, copy)` pairs.
    pub maps: Vec<(MapId, MapId)>,
    /// Number of wiki snapshots copied.
    pub wiki_snapshots: usize,
    /// Number of map snapshots copied.
    pub map_snapshots: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct IdCounters {
    wiki: u64,
    map: u64,
    snapshot: u64,
    layer: u64,
    object: u64,
}

fn bump(counter: &mut u64, what: &str) -> LoreResult<u64> {
    *counter = counter
        .checked_add(1)
        .ok_or_else(|| LoreError::validation(format!("{what} id space exhausted")))?;
    Ok(*counter)
}

/// In-memory content store: lineage plus every versioned entity.
///
/// Snapshots are append-only. Layers and objects are owned by exactly one
/// snapshot; the store reassigns their ids whenever it adopts a layer list.
#[derive(Clone, Debug)]
pub struct ContentStore {
    lineage: Lineage,
    wiki_entries: BTreeMap<WikiEntryId, WikiEntry>,
    wiki_snapshots: BTreeMap<WikiEntryId, Vec<WikiSnapshot>>,
    maps: BTreeMap<MapId, Map>,
    map_snapshots: BTreeMap<MapId, Vec<MapSnapshot>>,
    ids: IdCounters,
}

impl ContentStore {
    #[tracing::instrument(skip_all)]
    /// Validate a document and index it.
    pub fn from_document(doc: ContentDocument, config: LineageConfig) -> LoreResult<Self> {
        let lineage = Lineage::build(doc.branches, doc.chapters, config)?;
        let mut store = Self {
            lineage,
            wiki_entries: BTreeMap::new(),
            wiki_snapshots: BTreeMap::new(),
            maps: BTreeMap::new(),
            map_snapshots: BTreeMap::new(),
            ids: IdCounters::default(),
        };

        for entry in doc.wiki_entries {
            store.lineage.branch(entry.branch_id)?;
            if let Some(ch) = entry.first_appearance {
                store.lineage.chapter(ch)?;
            }
            let id = entry.id;
            store.ids.wiki = store.ids.wiki.max(id.0);
            if store.wiki_entries.insert(id, entry).is_some() {
                return Err(LoreError::validation(format!("duplicate wiki entry id {id}")));
            }
            store.wiki_snapshots.insert(id, Vec::new());
        }

        for map in doc.maps {
            store.lineage.branch(map.branch_id)?;
            map.canvas().validate()?;
            let id = map.id;
            store.ids.map = store.ids.map.max(id.0);
            if store.maps.insert(id, map).is_some() {
                return Err(LoreError::validation(format!("duplicate map id {id}")));
            }
            store.map_snapshots.insert(id, Vec::new());
        }

        let mut seen = BTreeSet::new();
        for snap in doc.wiki_snapshots {
            store.lineage.chapter(snap.effective_from_chapter_id)?;
            if !seen.insert(snap.id) {
                return Err(LoreError::validation(format!("duplicate snapshot id {}", snap.id)));
            }
            store.ids.snapshot = store.ids.snapshot.max(snap.id.0);
            store
                .wiki_snapshots
                .get_mut(&snap.wiki_entry_id)
                .ok_or_else(|| {
                    LoreError::validation(format!(
                        "snapshot {} references unknown wiki entry {}",
                        snap.id, snap.wiki_entry_id
                    ))
                })?
                .push(snap);
        }

        for snap in doc.map_snapshots {
            store.lineage.chapter(snap.effective_from_chapter_id)?;
            if !seen.insert(snap.id) {
                return Err(LoreError::validation(format!("duplicate snapshot id {}", snap.id)));
            }
            let Some(map_id) = snap.map_id else {
                return Err(LoreError::validation(format!(
                    "map snapshot {} has no map id",
                    snap.id
                )));
            };
            store.ids.snapshot = store.ids.snapshot.max(snap.id.0);
            for layer in &snap.layers {
                store.ids.layer = store.ids.layer.max(layer.id.0);
                for object in &layer.objects {
                    store.ids.object = store.ids.object.max(object.id.0);
                }
            }
            store
                .map_snapshots
                .get_mut(&map_id)
                .ok_or_else(|| {
                    LoreError::validation(format!(
                        "snapshot {} references unknown map {map_id}",
                        snap.id
                    ))
                })?
                .push(snap);
        }

        Ok(store)
    }

    /// Serialize the current state back into a document.
    pub fn to_document(&self) -> ContentDocument {
        ContentDocument {
            branches: self.lineage.branches().cloned().collect(),
            chapters: self.lineage.chapters().cloned().collect(),
            wiki_entries: self.wiki_entries.values().cloned().collect(),
            wiki_snapshots: self.wiki_snapshots.values().flatten().cloned().collect(),
            maps: self.maps.values().cloned().collect(),
            map_snapshots: self.map_snapshots.values().flatten().cloned().collect(),
        }
    }

    /// Branch and chapter structure.
    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Look up a wiki entry.
    pub fn wiki_entry(&self, id: WikiEntryId) -> LoreResult<&WikiEntry> {
        self.wiki_entries
            .get(&id)
            .ok_or_else(|| LoreError::not_found(format!("wiki entry {id}")))
    }

    /// Look up a map.
    pub fn map(&self, id: MapId) -> LoreResult<&Map> {
        self.maps
            .get(&id)
            .ok_or_else(|| LoreError::not_found(format!("map {id}")))
    }

    /// Raw snapshot set of a wiki entry, in insertion order.
    pub fn wiki_snapshots(&self, id: WikiEntryId) -> LoreResult<&[WikiSnapshot]> {
        self.wiki_snapshots
            .get(&id)
            .map(Vec::as_slice)
            .ok_or_else(|| LoreError::not_found(format!("wiki entry {id}")))
    }

    /// Raw snapshot set of a map, in insertion order.
    pub fn map_snapshots(&self, id: MapId) -> LoreResult<&[MapSnapshot]> {
        self.map_snapshots
            .get(&id)
            .map(Vec::as_slice)
            .ok_or_else(|| LoreError::not_found(format!("map {id}")))
    }

    /// Snapshots ordered by effective rank in the entry's home lineage.
    pub fn wiki_history(&self, id: WikiEntryId) -> LoreResult<Vec<&WikiSnapshot>> {
        let home = self.wiki_entry(id)?.branch_id;
        Ok(self.history(self.wiki_snapshots(id)?, home))
    }

    /// Snapshots ordered by effective rank in the map's home lineage.
    pub fn map_history(&self, id: MapId) -> LoreResult<Vec<&MapSnapshot>> {
        let home = self.map(id)?.branch_id;
        Ok(self.history(self.map_snapshots(id)?, home))
    }

    /// History a reader at `position` may see, oldest first.
    ///
    /// Without a position this is every snapshot reachable from the entry's
    /// home branch.
    pub fn visible_wiki_history(
        &self,
        id: WikiEntryId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Vec<&WikiSnapshot>> {
        let home = self.wiki_entry(id)?.branch_id;
        self.visible(self.wiki_snapshots(id)?, home, position)
    }

    /// History a reader at `position` may see, oldest first.
    pub fn visible_map_history(
        &self,
        id: MapId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Vec<&MapSnapshot>> {
        let home = self.map(id)?.branch_id;
        self.visible(self.map_snapshots(id)?, home, position)
    }

    /// Effective wiki snapshot; `None` position means the unrestricted view.
    pub fn resolve_wiki(
        &self,
        id: WikiEntryId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Resolution<'_, WikiSnapshot>> {
        let home = self.wiki_entry(id)?.branch_id;
        self.resolve_in(self.wiki_snapshots(id)?, home, position)
    }

    /// Effective map snapshot; `None` position means the unrestricted view.
    pub fn resolve_map(
        &self,
        id: MapId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Resolution<'_, MapSnapshot>> {
        let home = self.map(id)?.branch_id;
        self.resolve_in(self.map_snapshots(id)?, home, position)
    }

    /// Wiki entries of `branch` a reader may see, ordered by title.
    ///
    /// Entries whose first appearance lies after the reader, or outside the
    /// reader's lineage, are hidden. Without a position every entry is listed.
    pub fn list_wikis(
        &self,
        branch: BranchId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Vec<&WikiEntry>> {
        self.lineage.branch(branch)?;
        let reader = match position {
            Some(p) => Some((p.branch_id, self.lineage.position_rank(p)?)),
            None => None,
        };

        let mut out: Vec<&WikiEntry> = self
            .wiki_entries
            .values()
            .filter(|e| e.branch_id == branch)
            .filter(|e| match (e.first_appearance, reader) {
                (None, _) | (_, None) => true,
                (Some(ch), Some((reader_branch, reader_rank))) => self
                    .lineage
                    .chapter_rank(reader_branch, ch)
                    .is_ok_and(|rank| rank <= reader_rank),
            })
            .collect();
        out.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Maps of `branch`, ordered by name.
    pub fn list_maps(&self, branch: BranchId) -> LoreResult<Vec<&Map>> {
        self.lineage.branch(branch)?;
        let mut out: Vec<&Map> = self.maps.values().filter(|m| m.branch_id == branch).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Register a new branch (root or fork).
    pub fn add_branch(&mut self, branch: Branch) -> LoreResult<()> {
        self.lineage.add_branch(branch)
    }

    /// Append a chapter to its branch.
    pub fn append_chapter(&mut self, chapter: Chapter) -> LoreResult<()> {
        self.lineage.append_chapter(chapter)
    }

    /// Create an empty wiki entry on `branch`.
    pub fn create_wiki_entry(
        &mut self,
        branch: BranchId,
        title: impl Into<String>,
        first_appearance: Option<ChapterId>,
    ) -> LoreResult<WikiEntryId> {
        self.lineage.branch(branch)?;
        if let Some(ch) = first_appearance {
            self.lineage.chapter(ch)?;
        }
        let id = WikiEntryId(bump(&mut self.ids.wiki, "wiki entry")?);
        self.wiki_entries.insert(
            id,
            WikiEntry {
                id,
                branch_id: branch,
                title: title.into(),
                tags: Vec::new(),
                first_appearance,
                source_entry_id: None,
            },
        );
        self.wiki_snapshots.insert(id, Vec::new());
        Ok(id)
    }

    /// Create a map with a fixed canvas on `branch`.
    pub fn create_map(
        &mut self,
        branch: BranchId,
        name: impl Into<String>,
        canvas: MapCanvas,
    ) -> LoreResult<MapId> {
        self.lineage.branch(branch)?;
        canvas.validate()?;
        let id = MapId(bump(&mut self.ids.map, "map")?);
        self.maps.insert(
            id,
            Map {
                id,
                branch_id: branch,
                name: name.into(),
                description: String::new(),
                width: canvas.width,
                height: canvas.height,
                source_map_id: None,
            },
        );
        self.map_snapshots.insert(id, Vec::new());
        Ok(id)
    }

    #[tracing::instrument(skip(self, body))]
    /// Append a wiki snapshot effective from `chapter`.
    pub fn create_wiki_snapshot(
        &mut self,
        entry: WikiEntryId,
        chapter: ChapterId,
        body: impl Into<String>,
    ) -> LoreResult<SnapshotId> {
        let home = self.wiki_entry(entry)?.branch_id;
        self.check_effective_chapter(self.wiki_snapshots(entry)?, home, chapter)?;

        let id = SnapshotId(bump(&mut self.ids.snapshot, "snapshot")?);
        self.wiki_snapshots.entry(entry).or_default().push(WikiSnapshot {
            id,
            wiki_entry_id: entry,
            effective_from_chapter_id: chapter,
            body: body.into(),
        });
        tracing::debug!(snapshot = %id, "wiki snapshot created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, base_image_url, layers), fields(layers = layers.len()))]
    /// Append a map snapshot effective from `chapter`.
    ///
    /// Layer and object ids are reassigned from the store's counters.
    pub fn create_map_snapshot(
        &mut self,
        map: MapId,
        chapter: ChapterId,
        base_image_url: impl Into<String>,
        layers: Vec<MapLayer>,
    ) -> LoreResult<SnapshotId> {
        let home = self.map(map)?.branch_id;
        self.check_effective_chapter(self.map_snapshots(map)?, home, chapter)?;

        let id = SnapshotId(bump(&mut self.ids.snapshot, "snapshot")?);
        let layers = self.adopt_layers(layers)?;
        self.map_snapshots.entry(map).or_default().push(MapSnapshot {
            id,
            map_id: Some(map),
            effective_from_chapter_id: chapter,
            base_image_url: base_image_url.into(),
            layers,
        });
        tracing::debug!(snapshot = %id, "map snapshot created");
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    /// Copy the wiki entries and maps of `source` into its descendant `target`.
    ///
    /// Only snapshots effective at chapters the target can reach are copied.
    pub fn fork_branch_content(
        &mut self,
        source: BranchId,
        target: BranchId,
    ) -> LoreResult<ForkSummary> {
        self.lineage.branch(source)?;
        if source == target || !self.lineage.descends_from(target, source)? {
            return Err(LoreError::validation(format!(
                "branch {target} does not descend from branch {source}"
            )));
        }

        let mut summary = ForkSummary::default();

        let entries: Vec<WikiEntry> = self
            .wiki_entries
            .values()
            .filter(|e| e.branch_id == source)
            .cloned()
            .collect();
        for entry in entries {
            let old = entry.id;
            let new = WikiEntryId(bump(&mut self.ids.wiki, "wiki entry")?);
            let copies: Vec<WikiSnapshot> = self
                .reachable(self.wiki_snapshots(old)?, target)
                .into_iter()
                .cloned()
                .collect();
            let mut snaps = Vec::with_capacity(copies.len());
            for snap in copies {
                snaps.push(WikiSnapshot {
                    id: SnapshotId(bump(&mut self.ids.snapshot, "snapshot")?),
                    wiki_entry_id: new,
                    ..snap
                });
            }
            summary.wiki_snapshots += snaps.len();
            self.wiki_entries.insert(
                new,
                WikiEntry {
                    id: new,
                    branch_id: target,
                    source_entry_id: Some(old),
                    ..entry
                },
            );
            self.wiki_snapshots.insert(new, snaps);
            summary.wiki_entries.push((old, new));
        }

        let maps: Vec<Map> = self
            .maps
            .values()
            .filter(|m| m.branch_id == source)
            .cloned()
            .collect();
        for map in maps {
            let old = map.id;
            let new = MapId(bump(&mut self.ids.map, "map")?);
            let copies: Vec<MapSnapshot> = self
                .reachable(self.map_snapshots(old)?, target)
                .into_iter()
                .cloned()
                .collect();
            let mut snaps = Vec::with_capacity(copies.len());
            for snap in copies {
                let layers = self.adopt_layers(snap.layers)?;
                snaps.push(MapSnapshot {
                    id: SnapshotId(bump(&mut self.ids.snapshot, "snapshot")?),
                    map_id: Some(new),
                    layers,
                    ..snap
                });
            }
            summary.map_snapshots += snaps.len();
            self.maps.insert(
                new,
                Map {
                    id: new,
                    branch_id: target,
                    source_map_id: Some(old),
                    ..map
                },
            );
            self.map_snapshots.insert(new, snaps);
            summary.maps.push((old, new));
        }

        tracing::info!(
            wiki_entries = summary.wiki_entries.len(),
            maps = summary.maps.len(),
            "branch content forked"
        );
        Ok(summary)
    }

    fn resolve_in<'s, S: Versioned>(
        &self,
        snapshots: &'s [S],
        home: BranchId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Resolution<'s, S>> {
        let resolver = SnapshotResolver::new(&self.lineage);
        match position {
            Some(p) => resolver.resolve(snapshots, p),
            None => resolver.resolve_unrestricted(snapshots, home),
        }
    }

    fn history<'s, S: Versioned>(&self, snapshots: &'s [S], home: BranchId) -> Vec<&'s S> {
        let rank = |s: &S| -> Option<ChapterRank> {
            self.lineage.chapter_rank(home, s.effective_from()).ok()
        };
        let mut out: Vec<&S> = snapshots.iter().collect();
        // Snapshots unreachable from home sort last.
        out.sort_by_key(|s| {
            let r = rank(*s);
            (r.is_none(), r, s.snapshot_id())
        });
        out
    }

    fn visible<'s, S: Versioned>(
        &self,
        snapshots: &'s [S],
        home: BranchId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Vec<&'s S>> {
        let (branch, bound) = match position {
            Some(p) => (p.branch_id, Some(self.lineage.position_rank(p)?)),
            None => {
                self.lineage.ancestor_path(home)?;
                (home, None)
            }
        };
        let mut out: Vec<(ChapterRank, &S)> = snapshots
            .iter()
            .filter_map(|s| {
                let rank = self.lineage.chapter_rank(branch, s.effective_from()).ok()?;
                bound.is_none_or(|limit| rank <= limit).then_some((rank, s))
            })
            .collect();
        out.sort_by_key(|(rank, s)| (*rank, s.snapshot_id()));
        Ok(out.into_iter().map(|(_, s)| s).collect())
    }

    fn reachable<'s, S: Versioned>(&self, snapshots: &'s [S], branch: BranchId) -> Vec<&'s S> {
        snapshots
            .iter()
            .filter(|s| self.lineage.chapter_rank(branch, s.effective_from()).is_ok())
            .collect()
    }

    fn check_effective_chapter<S: Versioned>(
        &self,
        existing: &[S],
        home: BranchId,
        chapter: ChapterId,
    ) -> LoreResult<()> {
        self.lineage.chapter_rank(home, chapter)?;
        if let Some(dup) = existing.iter().find(|s| s.effective_from() == chapter) {
            return Err(LoreError::conflict(format!(
                "snapshot {} is already effective from chapter {chapter}",
                dup.snapshot_id()
            )));
        }
        Ok(())
    }

    fn adopt_layers(&mut self, mut layers: Vec<MapLayer>) -> LoreResult<Vec<MapLayer>> {
        for layer in &mut layers {
            layer.id = LayerId(bump(&mut self.ids.layer, "layer")?);
            for object in &mut layer.objects {
                object.id = ObjectId(bump(&mut self.ids.object, "object")?);
            }
        }
        Ok(layers)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/store.rs"]
mod tests;
