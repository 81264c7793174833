use std::fmt;

use serde_json::{Value, json};

use crate::{
    api::wire::{ApiResponse, MapPayload, WikiPayload},
    foundation::core::{BranchId, ChapterId, MapId, ReaderPosition, WikiEntryId},
    foundation::error::{LoreError, LoreResult},
    snapshot::store::ContentStore,
};

/// HTTP method of a content-store request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// The remote content-store endpoints this crate consumes.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentRequest {
    /// `GET /wikis/{id}?chapter={chapterId}`; no chapter means the unrestricted view.
    GetWiki {
        /// Entry to fetch.
        id: WikiEntryId,
        /// Reader chapter.
        chapter: Option<ChapterId>,
    },
    /// `GET /wikis/{id}/snapshots`
    ListWikiSnapshots {
        /// Entry whose history is listed.
        id: WikiEntryId,
    },
    /// `POST /wikis/{id}/snapshots {chapterId, body}`
    CreateWikiSnapshot {
        /// Entry to version.
        id: WikiEntryId,
        /// Chapter the new version applies from.
        chapter: ChapterId,
        /// Entry text.
        body: String,
    },
    /// `GET /maps?branchId={id}`
    ListMaps {
        /// Branch whose maps are listed.
        branch: BranchId,
    },
    /// `GET /maps/{id}?chapter={chapterId}`
    GetMap {
        /// Map to fetch.
        id: MapId,
        /// Reader chapter.
        chapter: Option<ChapterId>,
    },
    /// `GET /maps/{id}/snapshots`
    ListMapSnapshots {
        /// Map whose history is listed.
        id: MapId,
    },
    /// `POST /maps/{id}/snapshots {validFromChapter, baseImageUrl}`
    CreateMapSnapshot {
        /// Map to version.
        id: MapId,
        /// Chapter the new version applies from.
        chapter: ChapterId,
        /// Base image of the new version.
        base_image_url: String,
    },
}

impl ContentRequest {
    /// `GET /wikis/{id}`, scoped to `position`'s chapter when given.
    pub fn get_wiki(id: WikiEntryId, position: Option<ReaderPosition>) -> Self {
        Self::GetWiki {
            id,
            chapter: position.map(|p| p.chapter_id),
        }
    }

    /// `GET /maps/{id}`, scoped to `position`'s chapter when given.
    pub fn get_map(id: MapId, position: Option<ReaderPosition>) -> Self {
        Self::GetMap {
            id,
            chapter: position.map(|p| p.chapter_id),
        }
    }

    /// HTTP method of this request.
    pub fn method(&self) -> Method {
        match self {
            Self::CreateWikiSnapshot { .. } | Self::CreateMapSnapshot { .. } => Method::Post,
            _ => Method::Get,
        }
    }

    /// Path plus query string.
    pub fn path(&self) -> String {
        let with_chapter = |base: String, chapter: &Option<ChapterId>| match chapter {
            Some(ch) => format!("{base}?chapter={ch}"),
            None => base,
        };
        match self {
            Self::GetWiki { id, chapter } => with_chapter(format!("/wikis/{id}"), chapter),
            Self::ListWikiSnapshots { id } | Self::CreateWikiSnapshot { id, .. } => {
                format!("/wikis/{id}/snapshots")
            }
            Self::ListMaps { branch } => format!("/maps?branchId={branch}"),
            Self::GetMap { id, chapter } => with_chapter(format!("/maps/{id}"), chapter),
            Self::ListMapSnapshots { id } | Self::CreateMapSnapshot { id, .. } => {
                format!("/maps/{id}/snapshots")
            }
        }
    }

    /// JSON body for POST requests.
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::CreateWikiSnapshot { chapter, body, .. } => Some(json!({
                "chapterId": chapter,
                "body": body,
            })),
            Self::CreateMapSnapshot {
                chapter,
                base_image_url,
                ..
            } => Some(json!({
                "validFromChapter": chapter,
                "baseImageUrl": base_image_url,
            })),
            _ => None,
        }
    }

    #[tracing::instrument(skip(store), fields(method = %self.method(), path = %self.path()))]
    /// Answer the request from an in-memory store, the way the remote store would.
    ///
    /// A `chapter` query is read on the entity's home branch.
    pub fn serve(&self, store: &mut ContentStore) -> LoreResult<ApiResponse<Value>> {
        let data = match self {
            Self::GetWiki { id, chapter } => {
                let home = store.wiki_entry(*id)?.branch_id;
                let position = chapter.map(|ch| ReaderPosition::new(home, ch));
                to_value(&WikiPayload::from_store(store, *id, position)?)?
            }
            Self::ListWikiSnapshots { id } => to_value(&store.wiki_history(*id)?)?,
            Self::CreateWikiSnapshot { id, chapter, body } => {
                let created = store.create_wiki_snapshot(*id, *chapter, body.clone())?;
                json!({ "id": created })
            }
            Self::ListMaps { branch } => to_value(&store.list_maps(*branch)?)?,
            Self::GetMap { id, chapter } => {
                let home = store.map(*id)?.branch_id;
                let position = chapter.map(|ch| ReaderPosition::new(home, ch));
                to_value(&MapPayload::from_store(store, *id, position)?)?
            }
            Self::ListMapSnapshots { id } => to_value(&store.map_history(*id)?)?,
            Self::CreateMapSnapshot {
                id,
                chapter,
                base_image_url,
            } => {
                let created =
                    store.create_map_snapshot(*id, *chapter, base_image_url.clone(), Vec::new())?;
                json!({ "id": created })
            }
        };
        Ok(ApiResponse::ok(data))
    }
}

fn to_value<T: serde::Serialize>(v: &T) -> LoreResult<Value> {
    serde_json::to_value(v).map_err(|e| LoreError::serde(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/api/routes.rs"]
mod tests;
