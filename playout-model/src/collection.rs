use crate::ids::{CollectionId, MediaItemId, PlaylistId};
use crate::media::MediaItem;

/// Order in which a collection hands out its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlaybackOrder {
    Chronological,
    #[default]
    Shuffle,
    Random,
    Custom,
    SeasonEpisode,
    ShuffleInOrder,
}

/// Identifies the source an enumerator serves. Schedule rules and filler
/// presets both point at content through a key; enumerator state is stored
/// per key so that shared sources advance together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "id", rename_all = "snake_case")
)]
pub enum CollectionKey {
    Collection(CollectionId),
    MultiCollection(CollectionId),
    SmartCollection(CollectionId),
    Playlist(PlaylistId),
    MediaItem(MediaItemId),
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKey::Collection(id) => write!(f, "collection:{id}"),
            CollectionKey::MultiCollection(id) => {
                write!(f, "multi-collection:{id}")
            }
            CollectionKey::SmartCollection(id) => {
                write!(f, "smart-collection:{id}")
            }
            CollectionKey::Playlist(id) => write!(f, "playlist:{id}"),
            CollectionKey::MediaItem(id) => write!(f, "media-item:{id}"),
        }
    }
}

/// Persisted cursor of one enumerator: the next position to hand out and
/// the seed driving any pseudo-randomness. This is plain data so a build can
/// be resumed from it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionEnumeratorState {
    pub index: usize,
    pub seed: u64,
}

impl CollectionEnumeratorState {
    pub fn new(index: usize, seed: u64) -> Self {
        Self { index, seed }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { index: 0, seed }
    }
}

/// A unit that must play back to back: a single item, or a multi-part
/// episode run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupedMediaItem {
    pub first: MediaItem,
    #[cfg_attr(feature = "serde", serde(default))]
    pub additional: Vec<MediaItem>,
}

impl GroupedMediaItem {
    pub fn single(item: MediaItem) -> Self {
        Self {
            first: item,
            additional: Vec::new(),
        }
    }

    pub fn new(first: MediaItem, additional: Vec<MediaItem>) -> Self {
        Self { first, additional }
    }

    pub fn len(&self) -> usize {
        1 + self.additional.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        std::iter::once(&self.first).chain(self.additional.iter())
    }

    pub fn contains(&self, id: MediaItemId) -> bool {
        self.iter().any(|item| item.id == id)
    }
}

/// Flattens groups back into playback order.
pub fn flatten_groups(groups: &[GroupedMediaItem]) -> Vec<MediaItem> {
    groups
        .iter()
        .flat_map(|group| group.iter().cloned())
        .collect()
}

/// One member collection of a multi-collection, already resolved to items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionWithItems {
    pub collection_id: CollectionId,
    pub items: Vec<MediaItem>,
    /// Keep the collection's internal order and treat it as one unit when
    /// shuffling.
    #[cfg_attr(feature = "serde", serde(default))]
    pub schedule_as_group: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_group_order"))]
    pub playback_order: PlaybackOrder,
}

#[cfg(feature = "serde")]
fn default_group_order() -> PlaybackOrder {
    PlaybackOrder::Chronological
}

/// One entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaylistItem {
    pub index: u32,
    pub source: CollectionKey,
    #[cfg_attr(feature = "serde", serde(default))]
    pub playback_order: PlaybackOrder,
    /// Play every item of the source before moving to the next entry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub play_all: bool,
}

impl PlaylistItem {
    pub fn new(index: u32, source: CollectionKey, playback_order: PlaybackOrder) -> Self {
        Self {
            index,
            source,
            playback_order,
            play_all: false,
        }
    }

    pub fn play_all(mut self) -> Self {
        self.play_all = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_flatten_groups_keeps_part_order() {
        let item = |id: u64| MediaItem::movie(id, TimeDelta::minutes(1));
        let groups = vec![
            GroupedMediaItem::new(item(3), vec![item(4), item(5)]),
            GroupedMediaItem::single(item(1)),
        ];

        let ids: Vec<u64> = flatten_groups(&groups)
            .iter()
            .map(|i| i.id.value())
            .collect();
        assert_eq!(ids, vec![3, 4, 5, 1]);
        assert_eq!(groups[0].len(), 3);
        assert!(groups[0].contains(MediaItemId::new(5)));
    }

    #[test]
    fn test_collection_key_serializes_tagged() {
        let key = CollectionKey::Playlist(PlaylistId::new(4));
        let json = serde_json::to_string(&key).expect("serialize key");
        assert_eq!(json, r#"{"type":"playlist","id":4}"#);
    }
}
