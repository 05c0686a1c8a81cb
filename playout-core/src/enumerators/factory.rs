//! Chooses and builds the enumerator for each collection key a schedule uses.

use std::collections::BTreeMap;

use playout_model::{
    CollectionEnumeratorState, CollectionKey, GroupedMediaItem, MediaItem, PlaybackOrder,
    ProgramSchedule,
};
use tracing::debug;

use super::{
    MediaCollectionEnumerator, OrderedEnumerator, PlaylistEntry, PlaylistEnumerator,
    RandomizedEnumerator, ShuffleInOrderEnumerator, ShuffledEnumerator, SingleItemEnumerator,
    seeds,
};
use crate::catalog::MediaCatalog;
use crate::grouping;

/// Items the engine can schedule: a non-zero duration and, when
/// `skip_missing` is set, present on disk.
pub fn is_playable(item: &MediaItem, skip_missing: bool) -> bool {
    item.duration > chrono::TimeDelta::zero() && (!skip_missing || item.is_available())
}

/// Playback order per key: the first rule that uses a key as content decides,
/// keys used only for filler shuffle.
pub fn playback_orders(schedule: &ProgramSchedule) -> BTreeMap<CollectionKey, PlaybackOrder> {
    let mut orders = BTreeMap::new();
    let items = schedule.sorted_items();
    for item in &items {
        orders.entry(item.collection).or_insert(item.playback_order);
    }
    for item in &items {
        for preset in item.fillers.all() {
            orders.entry(preset.collection).or_insert(PlaybackOrder::Shuffle);
        }
    }
    orders
}

#[derive(Debug)]
pub struct EnumeratorFactory<'a, C: MediaCatalog + ?Sized> {
    catalog: &'a C,
    schedule: &'a ProgramSchedule,
    random_start_point: bool,
    skip_missing: bool,
}

impl<'a, C: MediaCatalog + ?Sized> EnumeratorFactory<'a, C> {
    pub fn new(catalog: &'a C, schedule: &'a ProgramSchedule) -> Self {
        Self {
            catalog,
            schedule,
            random_start_point: false,
            skip_missing: false,
        }
    }

    /// Places fresh chronological and season/episode cursors at a seeded
    /// random index.
    pub fn with_random_start(mut self, random_start_point: bool) -> Self {
        self.random_start_point = random_start_point;
        self
    }

    pub fn with_skip_missing(mut self, skip_missing: bool) -> Self {
        self.skip_missing = skip_missing;
        self
    }

    fn playable(&self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        items
            .into_iter()
            .filter(|item| is_playable(item, self.skip_missing))
            .collect()
    }

    /// Builds the enumerator for `key` over `items`, which the caller has
    /// already filtered.
    pub fn build(
        &self,
        key: CollectionKey,
        items: Vec<MediaItem>,
        order: PlaybackOrder,
        state: CollectionEnumeratorState,
    ) -> Box<dyn MediaCollectionEnumerator> {
        debug!(%key, ?order, index = state.index, seed = state.seed, "Building enumerator");

        match key {
            CollectionKey::Playlist(id) => {
                let entries = self
                    .catalog
                    .playlist_contents(id)
                    .into_iter()
                    .enumerate()
                    .filter_map(|(position, (entry, items))| {
                        let items = self.playable(items);
                        if items.is_empty() {
                            return None;
                        }
                        let child_state = CollectionEnumeratorState::with_seed(
                            seeds::derive_seed(state.seed, position as u64),
                        );
                        let enumerator: Box<dyn MediaCollectionEnumerator> = if items.len() == 1 {
                            Box::new(SingleItemEnumerator::new(items[0].clone()))
                        } else {
                            self.build_ordered(entry.source, items, entry.playback_order, child_state, false)
                        };
                        Some(PlaylistEntry::new(entry.source, entry.play_all, enumerator))
                    })
                    .collect();
                Box::new(PlaylistEnumerator::new(entries, state))
            }
            CollectionKey::MediaItem(_) => match items.into_iter().next() {
                Some(item) => Box::new(SingleItemEnumerator::new(item)),
                None => Box::new(OrderedEnumerator::chronological(Vec::new(), state)),
            },
            CollectionKey::Collection(id) => match self.catalog.custom_order(id) {
                Some(order) => Box::new(OrderedEnumerator::custom(items, &order, state)),
                None => self.build_ordered(key, items, order, state, self.random_start_point),
            },
            _ => self.build_ordered(key, items, order, state, self.random_start_point),
        }
    }

    fn build_ordered(
        &self,
        key: CollectionKey,
        items: Vec<MediaItem>,
        order: PlaybackOrder,
        state: CollectionEnumeratorState,
        random_start: bool,
    ) -> Box<dyn MediaCollectionEnumerator> {
        let keep_together = self.schedule.keep_multi_part_episodes_together;
        let cross_show = self.schedule.treat_collections_as_shows;

        match order {
            PlaybackOrder::Chronological => {
                let mut enumerator = OrderedEnumerator::chronological(items.clone(), state);
                if keep_together {
                    enumerator = enumerator.with_groups(&grouping::group_media_items(&items, cross_show));
                }
                if random_start {
                    enumerator = enumerator.with_random_start();
                }
                Box::new(enumerator)
            }
            PlaybackOrder::SeasonEpisode => {
                let enumerator = OrderedEnumerator::season_episode(items, state);
                if random_start {
                    Box::new(enumerator.with_random_start())
                } else {
                    Box::new(enumerator)
                }
            }
            PlaybackOrder::Random => Box::new(RandomizedEnumerator::new(items, state)),
            PlaybackOrder::Custom => {
                let order = match key {
                    CollectionKey::Collection(id) => self.catalog.custom_order(id),
                    _ => None,
                };
                match order {
                    Some(order) => Box::new(OrderedEnumerator::custom(items, &order, state)),
                    None => {
                        let order: Vec<_> = items.iter().map(|item| item.id).collect();
                        Box::new(OrderedEnumerator::custom(items, &order, state))
                    }
                }
            }
            PlaybackOrder::ShuffleInOrder => {
                let members = self
                    .catalog
                    .shuffle_in_order_members(&key)
                    .into_iter()
                    .map(|mut member| {
                        member.items.retain(|item| is_playable(item, self.skip_missing));
                        member
                    })
                    .collect();
                Box::new(ShuffleInOrderEnumerator::new(members, state, random_start))
            }
            PlaybackOrder::Shuffle => {
                Box::new(ShuffledEnumerator::new(self.shuffle_groups(key, items), state))
            }
        }
    }

    fn shuffle_groups(&self, key: CollectionKey, items: Vec<MediaItem>) -> Vec<GroupedMediaItem> {
        let keep_together = self.schedule.keep_multi_part_episodes_together;
        let cross_show = self.schedule.treat_collections_as_shows;

        match key {
            CollectionKey::MultiCollection(id) => {
                let members: Vec<_> = self
                    .catalog
                    .multi_collection_members(id)
                    .into_iter()
                    .map(|mut member| {
                        member.items.retain(|item| is_playable(item, self.skip_missing));
                        member
                    })
                    .collect();
                grouping::group_multi_collection(&members, keep_together, cross_show)
            }
            _ if keep_together => grouping::group_media_items(&items, cross_show),
            _ => items.into_iter().map(GroupedMediaItem::single).collect(),
        }
    }
}
