use crate::{
    foundation::core::{ChapterId, MapId, ReaderPosition, WikiEntryId},
    foundation::error::{LoreError, LoreResult},
    snapshot::model::{MapCanvas, MapSnapshot, WikiSnapshot},
    snapshot::store::ContentStore,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response envelope of the remote content store.
pub struct ApiResponse<T> {
    /// `false` when the store refused the request.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Response body.
    pub data: T,
    /// Human-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    /// Successful envelope around `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Unwrap the envelope, turning `success: false` into an error.
    pub fn into_data(self) -> LoreResult<T> {
        if self.success {
            return Ok(self.data);
        }
        Err(LoreError::Other(anyhow::anyhow!(
            "content store reported failure: {}",
            self.message.as_deref().unwrap_or("no message")
        )))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// `GET /maps/{id}` payload.
///
/// The server either resolves `snapshot` for the requested chapter or sends
/// the `snapshots` list, whose first element is the fallback.
pub struct MapPayload {
    /// Map id.
    pub id: MapId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Base image width in pixels.
    pub width: u32,
    /// Base image height in pixels.
    pub height: u32,
    /// Map this one was copied from on fork.
    #[serde(default)]
    pub source_map_id: Option<MapId>,
    /// Visible snapshot history, newest first.
    #[serde(default)]
    pub snapshots: Vec<MapSnapshot>,
    /// Snapshot resolved for the requested chapter.
    #[serde(default)]
    pub snapshot: Option<MapSnapshot>,
}

impl MapPayload {
    /// Pixel canvas of the map.
    pub fn canvas(&self) -> MapCanvas {
        MapCanvas {
            width: self.width,
            height: self.height,
        }
    }

    /// `snapshot`, else the first of `snapshots`.
    pub fn effective_snapshot(&self) -> Option<&MapSnapshot> {
        self.snapshot.as_ref().or_else(|| self.snapshots.first())
    }

    /// Server-side shape: the snapshot resolved for `position` plus the
    /// history visible from there, newest first.
    pub fn from_store(
        store: &ContentStore,
        id: MapId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Self> {
        let map = store.map(id)?;
        let snapshot = store.resolve_map(id, position)?.snapshot().cloned();
        Ok(Self {
            id,
            name: map.name.clone(),
            description: map.description.clone(),
            width: map.width,
            height: map.height,
            source_map_id: map.source_map_id,
            snapshots: store
                .visible_map_history(id, position)?
                .into_iter()
                .rev()
                .cloned()
                .collect(),
            snapshot,
        })
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// `GET /wikis/{id}` payload.
pub struct WikiPayload {
    /// Wiki entry id.
    pub id: WikiEntryId,
    /// Entry title.
    #[serde(alias = "name")]
    pub title: String,
    /// Author tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Chapter where the subject first appears.
    #[serde(default)]
    pub first_appearance: Option<ChapterId>,
    /// Visible snapshot history, newest first.
    #[serde(default)]
    pub snapshots: Vec<WikiSnapshot>,
    /// Snapshot resolved for the requested chapter.
    #[serde(default)]
    pub snapshot: Option<WikiSnapshot>,
}

impl WikiPayload {
    /// Server-side shape, see [`MapPayload::from_store`].
    pub fn from_store(
        store: &ContentStore,
        id: WikiEntryId,
        position: Option<ReaderPosition>,
    ) -> LoreResult<Self> {
        let entry = store.wiki_entry(id)?;
        let snapshot = store.resolve_wiki(id, position)?.snapshot().cloned();
        Ok(Self {
            id,
            title: entry.title.clone(),
            tags: entry.tags.clone(),
            first_appearance: entry.first_appearance,
            snapshots: store
                .visible_wiki_history(id, position)?
                .into_iter()
                .rev()
                .cloned()
                .collect(),
            snapshot,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/api/wire.rs"]
mod tests;
