//! The catalog seam: how the engine reads media items and collection
//! membership. Persistence and metadata acquisition live behind this trait.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use anyhow::Context;
use playout_model::{
    CollectionId, CollectionKey, CollectionWithItems, MediaItem, MediaItemId,
    PlaybackOrder, PlaylistId, PlaylistItem,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Read access to the media catalog. Everything handed out is already
/// resolved to concrete media items.
pub trait MediaCatalog: fmt::Debug + Send + Sync {
    /// Items behind a content source in catalog order. A playlist resolves to
    /// the items of all of its entries.
    fn media_items(&self, key: &CollectionKey) -> Vec<MediaItem>;

    /// Member collections of a multi-collection.
    fn multi_collection_members(&self, id: CollectionId) -> Vec<CollectionWithItems>;

    /// Entries of a playlist.
    fn playlist_entries(&self, id: PlaylistId) -> Vec<PlaylistItem>;

    /// Explicit item order of a collection that uses custom ordering.
    fn custom_order(&self, id: CollectionId) -> Option<Vec<MediaItemId>>;

    /// Playlist entries sorted by index together with their items.
    fn playlist_contents(&self, id: PlaylistId) -> Vec<(PlaylistItem, Vec<MediaItem>)> {
        let mut entries = self.playlist_entries(id);
        entries.sort_by_key(|entry| entry.index);
        entries
            .into_iter()
            .map(|entry| {
                let items = self.media_items(&entry.source);
                (entry, items)
            })
            .collect()
    }

    /// Sub-collections used by shuffle-in-order. Multi-collections use their
    /// members; any other source is split into one ordered group per show,
    /// with everything that is not an episode shuffled together.
    fn shuffle_in_order_members(&self, key: &CollectionKey) -> Vec<CollectionWithItems> {
        match key {
            CollectionKey::MultiCollection(id) => self.multi_collection_members(*id),
            _ => split_by_show(key, self.media_items(key)),
        }
    }
}

fn split_by_show(key: &CollectionKey, items: Vec<MediaItem>) -> Vec<CollectionWithItems> {
    let fallback_id = match key {
        CollectionKey::Collection(id)
        | CollectionKey::MultiCollection(id)
        | CollectionKey::SmartCollection(id) => *id,
        CollectionKey::Playlist(id) => CollectionId::new(id.value()),
        CollectionKey::MediaItem(id) => CollectionId::new(id.value()),
    };

    let mut shows: BTreeMap<u64, Vec<MediaItem>> = BTreeMap::new();
    let mut loose = Vec::new();
    for item in items {
        match item.show_id {
            Some(show) if item.is_episode() => {
                shows.entry(show.value()).or_default().push(item)
            }
            _ => loose.push(item),
        }
    }

    let mut result: Vec<CollectionWithItems> = shows
        .into_iter()
        .map(|(show, items)| CollectionWithItems {
            collection_id: CollectionId::new(show),
            items,
            schedule_as_group: true,
            playback_order: PlaybackOrder::Chronological,
        })
        .collect();

    if !loose.is_empty() {
        result.push(CollectionWithItems {
            collection_id: fallback_id,
            items: loose,
            schedule_as_group: false,
            playback_order: PlaybackOrder::Shuffle,
        });
    }

    result
}

/// A plain collection (or a smart collection with its query already run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCollection {
    pub id: CollectionId,
    #[serde(default)]
    pub name: String,
    pub items: Vec<MediaItemId>,
    /// When set, `items` is in the user's custom order.
    #[serde(default)]
    pub custom_order: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiCollectionMember {
    pub source: CollectionKey,
    #[serde(default)]
    pub schedule_as_group: bool,
    #[serde(default = "default_member_order")]
    pub playback_order: PlaybackOrder,
}

fn default_member_order() -> PlaybackOrder {
    PlaybackOrder::Chronological
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMultiCollection {
    pub id: CollectionId,
    #[serde(default)]
    pub name: String,
    pub members: Vec<MultiCollectionMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    pub id: PlaylistId,
    #[serde(default)]
    pub name: String,
    pub items: Vec<PlaylistItem>,
}

/// Catalog held entirely in memory, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryCatalog {
    pub media_items: Vec<MediaItem>,
    pub collections: Vec<CatalogCollection>,
    pub smart_collections: Vec<CatalogCollection>,
    pub multi_collections: Vec<CatalogMultiCollection>,
    pub playlists: Vec<CatalogPlaylist>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a catalog document from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))
    }

    pub fn with_media_items(mut self, items: impl IntoIterator<Item = MediaItem>) -> Self {
        self.media_items.extend(items);
        self
    }

    /// Registers a collection holding `items`, adding them to the catalog.
    pub fn with_collection(mut self, id: u64, items: Vec<MediaItem>) -> Self {
        let ids = items.iter().map(|item| item.id).collect();
        self.add_items(items);
        self.collections.push(CatalogCollection {
            id: CollectionId::new(id),
            name: String::new(),
            items: ids,
            custom_order: false,
        });
        self
    }

    /// Registers a collection whose item order is user defined.
    pub fn with_custom_order_collection(mut self, id: u64, items: Vec<MediaItem>) -> Self {
        let ids = items.iter().map(|item| item.id).collect();
        self.add_items(items);
        self.collections.push(CatalogCollection {
            id: CollectionId::new(id),
            name: String::new(),
            items: ids,
            custom_order: true,
        });
        self
    }

    pub fn with_smart_collection(mut self, id: u64, items: Vec<MediaItem>) -> Self {
        let ids = items.iter().map(|item| item.id).collect();
        self.add_items(items);
        self.smart_collections.push(CatalogCollection {
            id: CollectionId::new(id),
            name: String::new(),
            items: ids,
            custom_order: false,
        });
        self
    }

    pub fn with_multi_collection(mut self, id: u64, members: Vec<MultiCollectionMember>) -> Self {
        self.multi_collections.push(CatalogMultiCollection {
            id: CollectionId::new(id),
            name: String::new(),
            members,
        });
        self
    }

    pub fn with_playlist(mut self, id: u64, items: Vec<PlaylistItem>) -> Self {
        self.playlists.push(CatalogPlaylist {
            id: PlaylistId::new(id),
            name: String::new(),
            items,
        });
        self
    }

    fn add_items(&mut self, items: Vec<MediaItem>) {
        for item in items {
            if !self.media_items.iter().any(|existing| existing.id == item.id) {
                self.media_items.push(item);
            }
        }
    }

    fn resolve(&self, ids: &[MediaItemId]) -> Vec<MediaItem> {
        let index: HashMap<MediaItemId, &MediaItem> =
            self.media_items.iter().map(|item| (item.id, item)).collect();
        ids.iter()
            .filter_map(|id| index.get(id).map(|item| (*item).clone()))
            .collect()
    }

    fn collection(&self, id: CollectionId) -> Option<&CatalogCollection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

impl MediaCatalog for InMemoryCatalog {
    fn media_items(&self, key: &CollectionKey) -> Vec<MediaItem> {
        match key {
            CollectionKey::Collection(id) => self
                .collection(*id)
                .map(|c| self.resolve(&c.items))
                .unwrap_or_default(),
            CollectionKey::SmartCollection(id) => self
                .smart_collections
                .iter()
                .find(|c| c.id == *id)
                .map(|c| self.resolve(&c.items))
                .unwrap_or_default(),
            CollectionKey::MultiCollection(id) => {
                let mut items: Vec<MediaItem> = Vec::new();
                for member in self.multi_collection_members(*id) {
                    for item in member.items {
                        if !items.iter().any(|i| i.id == item.id) {
                            items.push(item);
                        }
                    }
                }
                items
            }
            CollectionKey::Playlist(id) => self
                .playlist_contents(*id)
                .into_iter()
                .flat_map(|(_, items)| items)
                .collect(),
            CollectionKey::MediaItem(id) => self.resolve(&[*id]),
        }
    }

    fn multi_collection_members(&self, id: CollectionId) -> Vec<CollectionWithItems> {
        let Some(multi) = self.multi_collections.iter().find(|m| m.id == id) else {
            return Vec::new();
        };

        multi
            .members
            .iter()
            .filter_map(|member| {
                let collection_id = match member.source {
                    CollectionKey::Collection(id) | CollectionKey::SmartCollection(id) => id,
                    _ => return None,
                };
                Some(CollectionWithItems {
                    collection_id,
                    items: self.media_items(&member.source),
                    schedule_as_group: member.schedule_as_group,
                    playback_order: member.playback_order,
                })
            })
            .collect()
    }

    fn playlist_entries(&self, id: PlaylistId) -> Vec<PlaylistItem> {
        self.playlists
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.items.clone())
            .unwrap_or_default()
    }

    fn custom_order(&self, id: CollectionId) -> Option<Vec<MediaItemId>> {
        self.collection(id)
            .filter(|c| c.custom_order)
            .map(|c| c.items.clone())
    }
}
