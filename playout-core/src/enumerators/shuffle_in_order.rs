//! Balanced interleave of several ordered sub-collections.
//!
//! Each grouped collection keeps its own order while the collections are
//! spread evenly across one cycle. Collections that are not scheduled as a
//! group are merged and shuffled into a single pseudo-collection first. The
//! spreading follows the balanced shuffle described at
//! <https://keyj.emphy.de/balanced-shuffle/>.

use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, CollectionWithItems, MediaItem, PlaybackOrder};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{MediaCollectionEnumerator, comparer, seeds};

const MAX_RESEED_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct ShuffleInOrderEnumerator {
    collections: Vec<CollectionWithItems>,
    random_start_point: bool,
    shuffled: Vec<MediaItem>,
    state: CollectionEnumeratorState,
}

struct Lane {
    offset: usize,
    slots: Vec<Option<MediaItem>>,
}

impl ShuffleInOrderEnumerator {
    pub fn new(
        collections: Vec<CollectionWithItems>,
        state: CollectionEnumeratorState,
        random_start_point: bool,
    ) -> Self {
        let mut enumerator = Self {
            collections,
            random_start_point,
            shuffled: Vec::new(),
            state,
        };
        enumerator.apply_state(state);
        enumerator
    }

    fn apply_state(&mut self, state: CollectionEnumeratorState) {
        let total: usize = self.collections.iter().map(|c| c.items.len()).sum();
        let state = if state.index >= total && state.index != 0 {
            debug!(
                index = state.index,
                count = total,
                "Resetting stale shuffle-in-order state"
            );
            CollectionEnumeratorState::new(0, seeds::next_seed(state.seed))
        } else {
            state
        };

        if self.shuffled.is_empty() || state.seed != self.state.seed {
            self.shuffled = self.shuffle(state.seed);
        }
        self.state = state;
    }

    fn shuffle(&self, seed: u64) -> Vec<MediaItem> {
        let mut rng = seeds::rng(seed);

        let mut lanes: Vec<Vec<Option<MediaItem>>> = self
            .collections
            .iter()
            .filter(|c| c.schedule_as_group)
            .map(|c| ordered_items(c).into_iter().map(Some).collect())
            .collect();

        let mut loose: Vec<Option<MediaItem>> = self
            .collections
            .iter()
            .filter(|c| !c.schedule_as_group)
            .flat_map(|c| c.items.iter().cloned().map(Some))
            .collect();
        if !loose.is_empty() {
            loose.shuffle(&mut rng);
            lanes.push(loose);
        }

        lanes.retain(|lane| !lane.is_empty());
        let Some(max_length) = lanes.iter().map(Vec::len).max() else {
            return Vec::new();
        };

        let filled: Vec<Lane> = lanes
            .into_iter()
            .map(|lane| self.fill(lane, max_length, &mut rng))
            .collect();

        let mut result = Vec::new();
        for row in 0..max_length {
            let mut batch: Vec<Option<MediaItem>> = filled
                .iter()
                .map(|lane| lane.slots[(lane.offset + row) % lane.slots.len()].clone())
                .collect();
            batch.shuffle(&mut rng);
            result.extend(batch.into_iter().flatten());
        }
        result
    }

    /// Pads a lane to `max_length` with gaps spread evenly between its items.
    fn fill(&self, items: Vec<Option<MediaItem>>, max_length: usize, rng: &mut ChaCha8Rng) -> Lane {
        let gaps = max_length - items.len();
        let items_are_smaller = items.len() < gaps;
        let mut items: VecDeque<Option<MediaItem>> = items.into();
        let mut spaces: VecDeque<Option<MediaItem>> = std::iter::repeat_n(None, gaps).collect();
        let (smaller, larger) = if items_are_smaller {
            (&mut items, &mut spaces)
        } else {
            (&mut spaces, &mut items)
        };

        let mut slots = Vec::with_capacity(max_length);
        let mut k = smaller.len();
        while k > 0 {
            let n = max_length - slots.len();
            let optimal = n as f64 / k as f64 + (rng.random::<f64>() - 0.5) / 5.0;
            let run = (optimal as usize).clamp(1, max_length - k + 1);
            slots.extend(smaller.pop_front());
            for _ in 1..run {
                slots.extend(larger.pop_front());
            }
            k -= 1;
        }
        slots.extend(smaller.drain(..));
        slots.extend(larger.drain(..));

        let offset = if self.random_start_point && slots.len() > 1 {
            rng.random_range(0..slots.len() - 1)
        } else {
            0
        };

        Lane { offset, slots }
    }
}

fn ordered_items(collection: &CollectionWithItems) -> Vec<MediaItem> {
    let mut items = collection.items.clone();
    if collection.playback_order != PlaybackOrder::Custom {
        items.sort_by(comparer::chronological);
    }
    items
}

impl MediaCollectionEnumerator for ShuffleInOrderEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        if self.shuffled.is_empty() {
            return None;
        }
        self.shuffled.get(self.state.index % self.shuffled.len())
    }

    fn move_next(&mut self, _now: Option<DateTime<FixedOffset>>) {
        if self.shuffled.is_empty() {
            return;
        }

        if (self.state.index + 1) % self.shuffled.len() == 0 {
            let tail = self.current().map(|item| item.id);
            let mut seed = self.state.seed;
            for _ in 0..MAX_RESEED_ATTEMPTS {
                seed = seeds::next_seed(seed);
                self.shuffled = self.shuffle(seed);
                let head = self.shuffled.first().map(|item| item.id);
                if self.shuffled.len() <= 1 || head != tail {
                    break;
                }
            }
            self.state = CollectionEnumeratorState::new(0, seed);
        } else {
            self.state.index += 1;
        }
    }

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        self.apply_state(state);
    }

    fn peek(&self, offset: usize) -> Option<MediaItem> {
        let mut ahead = self.clone();
        for _ in 0..offset {
            ahead.move_next(None);
        }
        ahead.current().cloned()
    }

    fn count(&self) -> usize {
        self.shuffled.len()
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}
