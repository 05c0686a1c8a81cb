//! Fixed-order strategies: chronological, season/episode and custom order.
//! They differ only in how the list is sorted up front.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use playout_model::{
    CollectionEnumeratorState, GroupedMediaItem, MediaItem, MediaItemId,
};
use rand::Rng;
use tracing::debug;

use super::{MediaCollectionEnumerator, comparer, seeds};

#[derive(Debug, Clone)]
pub struct OrderedEnumerator {
    items: Vec<MediaItem>,
    state: CollectionEnumeratorState,
    group_sizes: HashMap<MediaItemId, usize>,
}

impl OrderedEnumerator {
    /// Aired order.
    pub fn chronological(mut items: Vec<MediaItem>, state: CollectionEnumeratorState) -> Self {
        items.sort_by(comparer::chronological);
        Self::from_sorted(items, state)
    }

    /// Season then episode, specials (season 0) excluded.
    pub fn season_episode(items: Vec<MediaItem>, state: CollectionEnumeratorState) -> Self {
        let mut items: Vec<MediaItem> = items
            .into_iter()
            .filter(|item| !item.season.is_some_and(|s| s.is_specials()))
            .collect();
        items.sort_by(comparer::season_episode);
        Self::from_sorted(items, state)
    }

    /// Exactly the order given by `order`; items missing from it follow in
    /// chronological order.
    pub fn custom(
        mut items: Vec<MediaItem>,
        order: &[MediaItemId],
        state: CollectionEnumeratorState,
    ) -> Self {
        let positions: HashMap<MediaItemId, usize> = order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        items.sort_by(|a, b| {
            let pa = positions.get(&a.id).copied().unwrap_or(usize::MAX);
            let pb = positions.get(&b.id).copied().unwrap_or(usize::MAX);
            pa.cmp(&pb).then_with(|| comparer::chronological(a, b))
        });
        Self::from_sorted(items, state)
    }

    fn from_sorted(items: Vec<MediaItem>, state: CollectionEnumeratorState) -> Self {
        let mut enumerator = Self {
            items,
            state,
            group_sizes: HashMap::new(),
        };
        enumerator.reset_state(state);
        enumerator
    }

    /// Remembers multi-part groups so callers can ask how long the current
    /// run is.
    pub fn with_groups(mut self, groups: &[GroupedMediaItem]) -> Self {
        for group in groups {
            for item in group.iter() {
                self.group_sizes.insert(item.id, group.len());
            }
        }
        self
    }

    /// Moves a fresh cursor to a seeded random position.
    pub fn with_random_start(mut self) -> Self {
        if self.state.index == 0 && self.items.len() > 1 {
            let index = seeds::rng(self.state.seed).random_range(0..self.items.len());
            self.state.index = index;
        }
        self
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }
}

impl MediaCollectionEnumerator for OrderedEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.state.index)
    }

    fn move_next(&mut self, _now: Option<DateTime<FixedOffset>>) {
        if !self.items.is_empty() {
            self.state.index = (self.state.index + 1) % self.items.len();
        }
    }

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        if state.index >= self.items.len() && state.index != 0 {
            debug!(
                index = state.index,
                count = self.items.len(),
                "Resetting stale ordered enumerator state"
            );
            self.state = CollectionEnumeratorState::new(0, 0);
        } else {
            self.state = state;
        }
    }

    fn peek(&self, offset: usize) -> Option<MediaItem> {
        if self.items.is_empty() {
            return None;
        }
        self.items
            .get((self.state.index + offset) % self.items.len())
            .cloned()
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn current_group_size(&self) -> Option<usize> {
        let current = self.current()?;
        Some(self.group_sizes.get(&current.id).copied().unwrap_or(1))
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn dated(id: u64, year: i32) -> MediaItem {
        MediaItem::movie(id, TimeDelta::minutes(90))
            .with_release_date(NaiveDate::from_ymd_opt(year, 1, 1).expect("date"))
    }

    fn ids(enumerator: &mut OrderedEnumerator, n: usize) -> Vec<u64> {
        (0..n)
            .map(|_| {
                let id = enumerator.current().expect("item").id.value();
                enumerator.move_next(None);
                id
            })
            .collect()
    }

    #[test]
    fn test_chronological_visits_in_aired_order_and_wraps() {
        let items = vec![dated(1, 2003), dated(2, 1999), dated(3, 2001)];
        let mut enumerator =
            OrderedEnumerator::chronological(items, CollectionEnumeratorState::default());

        assert_eq!(ids(&mut enumerator, 4), vec![2, 3, 1, 2]);
        assert_eq!(enumerator.state().index, 1);
    }

    #[test]
    fn test_stale_index_resets_to_start() {
        let items = vec![dated(1, 2003), dated(2, 1999)];
        let enumerator =
            OrderedEnumerator::chronological(items, CollectionEnumeratorState::new(5, 77));

        assert_eq!(enumerator.state(), CollectionEnumeratorState::new(0, 0));
        assert_eq!(enumerator.current().map(|i| i.id.value()), Some(2));
    }

    #[test]
    fn test_season_episode_skips_specials() {
        let episode = |id: u64, s: u16, e: u16| {
            MediaItem::episode(id, 1, TimeDelta::minutes(22)).with_season_episode(s, e)
        };
        let items = vec![episode(1, 2, 1), episode(2, 0, 1), episode(3, 1, 2), episode(4, 1, 1)];
        let mut enumerator =
            OrderedEnumerator::season_episode(items, CollectionEnumeratorState::default());

        assert_eq!(enumerator.count(), 3);
        assert_eq!(ids(&mut enumerator, 3), vec![4, 3, 1]);
    }

    #[test]
    fn test_custom_order_follows_stored_indices() {
        let items = vec![dated(1, 2000), dated(2, 2001), dated(3, 2002)];
        let order = [MediaItemId::new(3), MediaItemId::new(1), MediaItemId::new(2)];
        let mut enumerator =
            OrderedEnumerator::custom(items, &order, CollectionEnumeratorState::default());

        assert_eq!(ids(&mut enumerator, 3), vec![3, 1, 2]);
        assert_eq!(enumerator.peek(1).map(|i| i.id.value()), Some(1));
    }

    #[test]
    fn test_random_start_is_seeded() {
        let items: Vec<MediaItem> = (1..=20).map(|id| dated(id, 2000 + id as i32)).collect();
        let a = OrderedEnumerator::chronological(items.clone(), CollectionEnumeratorState::with_seed(3))
            .with_random_start();
        let b = OrderedEnumerator::chronological(items, CollectionEnumeratorState::with_seed(3))
            .with_random_start();

        assert_eq!(a.state(), b.state());
        assert!(a.state().index < 20);
    }
}
