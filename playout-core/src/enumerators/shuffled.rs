use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, GroupedMediaItem, MediaItem, MediaItemId};
use rand::seq::SliceRandom;
use tracing::debug;

use super::{MediaCollectionEnumerator, seeds};

const MAX_RESEED_ATTEMPTS: usize = 16;

/// Permutation of groups, flattened so that every group plays contiguously.
/// A completed cycle reseeds and reshuffles.
#[derive(Debug, Clone)]
pub struct ShuffledEnumerator {
    groups: Vec<GroupedMediaItem>,
    shuffled: Vec<MediaItem>,
    group_lengths: Vec<usize>,
    state: CollectionEnumeratorState,
}

impl ShuffledEnumerator {
    pub fn new(groups: Vec<GroupedMediaItem>, state: CollectionEnumeratorState) -> Self {
        let mut enumerator = Self {
            groups,
            shuffled: Vec::new(),
            group_lengths: Vec::new(),
            state,
        };
        enumerator.apply_state(state);
        enumerator
    }

    /// Every item in its own group.
    pub fn from_items(items: Vec<MediaItem>, state: CollectionEnumeratorState) -> Self {
        Self::new(items.into_iter().map(GroupedMediaItem::single).collect(), state)
    }

    fn apply_state(&mut self, state: CollectionEnumeratorState) {
        let total: usize = self.groups.iter().map(GroupedMediaItem::len).sum();
        let state = if state.index >= total && state.index != 0 {
            debug!(
                index = state.index,
                count = total,
                "Resetting stale shuffled enumerator state"
            );
            CollectionEnumeratorState::new(0, seeds::next_seed(state.seed))
        } else {
            state
        };

        if self.shuffled.is_empty() || state.seed != self.state.seed {
            self.reshuffle(state.seed);
        }
        self.state = state;
    }

    fn reshuffle(&mut self, seed: u64) {
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        order.shuffle(&mut seeds::rng(seed));

        self.shuffled.clear();
        self.group_lengths.clear();
        for index in order {
            let group = &self.groups[index];
            for item in group.iter() {
                self.shuffled.push(item.clone());
                self.group_lengths.push(group.len());
            }
        }
    }

    /// Seed for the cycle after the one ending with `previous_last`. Seeds
    /// whose permutation would replay that item back to back are passed
    /// over, so the choice lives in the saved seed and resumes identically.
    fn next_cycle_seed(&mut self, previous_last: Option<MediaItemId>) -> u64 {
        let mut seed = self.state.seed;
        for _ in 0..MAX_RESEED_ATTEMPTS {
            seed = seeds::next_seed(seed);
            self.reshuffle(seed);
            let head = self.shuffled.first().map(|item| item.id);
            if self.groups.len() <= 1 || head != previous_last {
                break;
            }
        }
        seed
    }
}

impl MediaCollectionEnumerator for ShuffledEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        self.shuffled.get(self.state.index)
    }

    fn move_next(&mut self, _now: Option<DateTime<FixedOffset>>) {
        if self.shuffled.is_empty() {
            return;
        }
        self.state.index += 1;
        if self.state.index >= self.shuffled.len() {
            let previous_last = self.shuffled.last().map(|item| item.id);
            let seed = self.next_cycle_seed(previous_last);
            self.state = CollectionEnumeratorState::new(0, seed);
        }
    }

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        self.apply_state(state);
    }

    fn peek(&self, offset: usize) -> Option<MediaItem> {
        if offset == 0 {
            return self.current().cloned();
        }
        if self.state.index + offset < self.shuffled.len() {
            return self.shuffled.get(self.state.index + offset).cloned();
        }
        let mut ahead = self.clone();
        for _ in 0..offset {
            ahead.move_next(None);
        }
        ahead.current().cloned()
    }

    fn count(&self) -> usize {
        self.shuffled.len()
    }

    fn current_group_size(&self) -> Option<usize> {
        self.group_lengths.get(self.state.index).copied()
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}
