use std::cell::OnceCell;

use crate::{
    api::wire::MapPayload,
    compose::compositor::{ComposeSettings, Compositor},
    compose::plan::RenderPlan,
    foundation::core::{EntityKey, MapId, ReaderPosition, WikiEntryId},
    foundation::error::{LoreError, LoreResult},
    snapshot::cache::{CachedResolution, ResolutionCache, Ticket},
    snapshot::model::{MapCanvas, MapSnapshot, Versioned, WikiSnapshot},
    snapshot::resolver::Resolution,
    snapshot::store::ContentStore,
};

/// Host-side spatial rendering library (the heavy dependency of a map view).
pub trait SpatialLibrary {
    /// Draw a composed plan.
    fn present(&mut self, plan: &RenderPlan) -> anyhow::Result<()>;
}

/// A reader's explicit position plus a memo of what they have resolved.
#[derive(Debug)]
pub struct ReaderSession<'s> {
    store: &'s ContentStore,
    cache: ResolutionCache,
    ticket: Ticket,
}

impl<'s> ReaderSession<'s> {
    /// Start reading at `position`, which must be a valid lineage position.
    pub fn new(store: &'s ContentStore, position: ReaderPosition) -> LoreResult<Self> {
        store.lineage().position_rank(position)?;
        let mut cache = ResolutionCache::new();
        let ticket = cache.navigate(position);
        Ok(Self {
            store,
            cache,
            ticket,
        })
    }

    /// Store this session reads from.
    pub fn store(&self) -> &'s ContentStore {
        self.store
    }

    /// Current reader position.
    pub fn position(&self) -> ReaderPosition {
        self.ticket.position()
    }

    /// Memoized results.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Move to another chapter; results still in flight for the old one are dropped.
    pub fn navigate(&mut self, position: ReaderPosition) -> LoreResult<()> {
        self.store.lineage().position_rank(position)?;
        self.ticket = self.cache.navigate(position);
        Ok(())
    }

    /// Ticket for work started now; pass it back to [`ReaderSession::commit`].
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Store a result computed elsewhere under `ticket`.
    pub fn commit(&mut self, ticket: &Ticket, entity: EntityKey, value: CachedResolution) -> bool {
        self.cache.commit(ticket, entity, value)
    }

    /// Forget memoized results for an entity that just got a new snapshot.
    pub fn snapshot_created(&mut self, entity: EntityKey) {
        self.cache.snapshot_created(entity);
    }

    /// Effective wiki snapshot at the current position, memoized.
    pub fn resolve_wiki(&mut self, id: WikiEntryId) -> LoreResult<Resolution<'s, WikiSnapshot>> {
        let snapshots = self.store.wiki_snapshots(id)?;
        self.resolve_cached(EntityKey::Wiki(id), snapshots, |store, position| {
            store.resolve_wiki(id, Some(position))
        })
    }

    /// Effective map snapshot at the current position, memoized.
    pub fn resolve_map(&mut self, id: MapId) -> LoreResult<Resolution<'s, MapSnapshot>> {
        let snapshots = self.store.map_snapshots(id)?;
        self.resolve_cached(EntityKey::Map(id), snapshots, |store, position| {
            store.resolve_map(id, Some(position))
        })
    }

    fn resolve_cached<S: Versioned>(
        &mut self,
        key: EntityKey,
        snapshots: &'s [S],
        resolve: impl FnOnce(&'s ContentStore, ReaderPosition) -> LoreResult<Resolution<'s, S>>,
    ) -> LoreResult<Resolution<'s, S>> {
        let position = self.position();
        match self.cache.get(key, position) {
            Some(CachedResolution::Unrevealed) => return Ok(Resolution::Unrevealed),
            Some(CachedResolution::Revealed(id)) => {
                if let Some(s) = snapshots.iter().find(|s| s.snapshot_id() == id) {
                    return Ok(Resolution::Revealed(s));
                }
            }
            None => {}
        }

        let ticket = self.ticket;
        let resolution = resolve(self.store, position)?;
        let cached = match resolution {
            Resolution::Revealed(s) => CachedResolution::Revealed(s.snapshot_id()),
            Resolution::Unrevealed => CachedResolution::Unrevealed,
        };
        self.cache.commit(&ticket, key, cached);
        Ok(resolution)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
/// What a map view shows.
pub enum MapViewState {
    /// The spatial library has not been initialized yet.
    Loading,
    /// The spatial library failed to initialize; the rest of the page works.
    Unavailable {
        /// Initialization or presentation failure.
        reason: String,
    },
    /// The map has no snapshots at all.
    NoSnapshot,
    /// The reader is before the map's first snapshot.
    Locked,
    /// The composed plan was presented.
    Ready {
        /// What was drawn.
        plan: RenderPlan,
    },
}

/// A map panel that owns its spatial library.
///
/// The library is initialized at most once per view; a failed initialization
/// is remembered and never retried.
pub struct MapView<L> {
    library: OnceCell<Result<L, String>>,
    settings: ComposeSettings,
}

impl<L: SpatialLibrary> MapView<L> {
    /// A view whose library is not loaded yet.
    pub fn new(settings: ComposeSettings) -> Self {
        Self {
            library: OnceCell::new(),
            settings,
        }
    }

    /// Compositor settings.
    pub fn settings(&self) -> &ComposeSettings {
        &self.settings
    }

    /// Initialize the library with `loader` unless that already happened.
    pub fn load_library<F>(&mut self, loader: F) -> LoreResult<()>
    where
        F: FnOnce() -> anyhow::Result<L>,
    {
        let outcome = self.library.get_or_init(|| match loader() {
            Ok(lib) => Ok(lib),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "map library failed to initialize");
                Err(format!("{err:#}"))
            }
        });
        match outcome {
            Ok(_) => Ok(()),
            Err(reason) => Err(LoreError::MapLibraryInitFailed(reason.clone())),
        }
    }

    /// Whether the library initialized successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.library.get(), Some(Ok(_)))
    }

    #[tracing::instrument(skip(self, session), fields(position = %session.position()))]
    /// Resolve and compose `map` for the session's reader.
    ///
    /// Lineage failures are returned as `Err`; everything else becomes a state.
    pub fn render(
        &mut self,
        session: &mut ReaderSession<'_>,
        map: MapId,
    ) -> LoreResult<MapViewState> {
        if let Some(state) = self.library_gate() {
            return Ok(state);
        }
        let store = session.store();
        let canvas = store.map(map)?.canvas();
        if store.map_snapshots(map)?.is_empty() {
            return Ok(MapViewState::NoSnapshot);
        }
        match session.resolve_map(map)? {
            Resolution::Unrevealed => Ok(MapViewState::Locked),
            Resolution::Revealed(snapshot) => self.present(canvas, snapshot),
        }
    }

    /// Render a payload the server already resolved.
    pub fn render_payload(&mut self, payload: &MapPayload) -> LoreResult<MapViewState> {
        if let Some(state) = self.library_gate() {
            return Ok(state);
        }
        match payload.effective_snapshot() {
            None => Ok(MapViewState::NoSnapshot),
            Some(snapshot) => self.present(payload.canvas(), snapshot),
        }
    }

    fn library_gate(&self) -> Option<MapViewState> {
        match self.library.get() {
            None => Some(MapViewState::Loading),
            Some(Err(reason)) => Some(MapViewState::Unavailable {
                reason: reason.clone(),
            }),
            Some(Ok(_)) => None,
        }
    }

    fn present(&mut self, canvas: MapCanvas, snapshot: &MapSnapshot) -> LoreResult<MapViewState> {
        let plan = Compositor::compose(canvas, snapshot, &self.settings)?;
        let Some(Ok(library)) = self.library.get_mut() else {
            return Ok(MapViewState::Loading);
        };
        if let Err(err) = library.present(&plan) {
            tracing::warn!(error = %format!("{err:#}"), "map library failed to present");
            return Ok(MapViewState::Unavailable {
                reason: format!("{err:#}"),
            });
        }
        Ok(MapViewState::Ready { plan })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/session.rs"]
mod tests;
