//! Playlists rotate through their entries, taking one item per entry per
//! pass unless the entry plays all of its items at once.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, CollectionKey, MediaItem};
use tracing::debug;

use super::{MediaCollectionEnumerator, seeds};

/// One playlist entry with the enumerator over its source. Entries that
/// share a source share the enumerator.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub source: CollectionKey,
    pub play_all: bool,
    pub enumerator: Box<dyn MediaCollectionEnumerator>,
}

impl PlaylistEntry {
    pub fn new(
        source: CollectionKey,
        play_all: bool,
        enumerator: Box<dyn MediaCollectionEnumerator>,
    ) -> Self {
        Self {
            source,
            play_all,
            enumerator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaylistEnumerator {
    /// `(child, play_all)` per entry, in playlist order.
    entries: Vec<(usize, bool)>,
    pristine: Vec<Box<dyn MediaCollectionEnumerator>>,
    children: Vec<Box<dyn MediaCollectionEnumerator>>,
    entry_index: usize,
    count: usize,
    state: CollectionEnumeratorState,
}

impl PlaylistEnumerator {
    pub fn new(entries: Vec<PlaylistEntry>, state: CollectionEnumeratorState) -> Self {
        let mut sources: HashMap<CollectionKey, usize> = HashMap::new();
        let mut pristine = Vec::new();
        let mut layout = Vec::with_capacity(entries.len());
        for entry in entries {
            let child = *sources.entry(entry.source).or_insert_with(|| {
                pristine.push(entry.enumerator);
                pristine.len() - 1
            });
            layout.push((child, entry.play_all));
        }

        let count = cycle_length(&layout, &pristine);
        let mut enumerator = Self {
            entries: layout,
            children: Vec::new(),
            pristine,
            entry_index: 0,
            count,
            state,
        };
        enumerator.reset_state(state);
        enumerator
    }

    fn rebuild(&mut self, seed: u64) {
        self.children = self
            .pristine
            .iter()
            .enumerate()
            .map(|(position, child)| {
                let mut child = child.clone();
                child.reset_state(CollectionEnumeratorState::with_seed(seeds::derive_seed(
                    seed,
                    position as u64,
                )));
                child
            })
            .collect();
        self.entry_index = 0;
        self.state = CollectionEnumeratorState::with_seed(seed);
    }

    fn advance(&mut self, now: Option<DateTime<FixedOffset>>) {
        let Some(&(child, play_all)) = self.entries.get(self.entry_index) else {
            return;
        };
        let enumerator = &mut self.children[child];
        enumerator.move_next(now);

        let finished_all = enumerator.count() == 0 || enumerator.state().index % enumerator.count() == 0;
        if !play_all || finished_all {
            self.entry_index = (self.entry_index + 1) % self.entries.len();
        }
        self.state.index = (self.state.index + 1) % self.count.max(1);
        if self.state.index == 0 {
            // children start the next pass from a seed the state records
            self.rebuild(seeds::next_seed(self.state.seed));
        }
    }
}

/// Least common multiple of the single-pick entry sizes, times the number of
/// picks one pass over the entries makes.
fn cycle_length(entries: &[(usize, bool)], children: &[Box<dyn MediaCollectionEnumerator>]) -> usize {
    if entries.is_empty() {
        return 0;
    }

    let lcm = entries
        .iter()
        .filter(|(_, play_all)| !play_all)
        .map(|(child, _)| children[*child].count().max(1))
        .fold(1, lcm);
    let picks: usize = entries
        .iter()
        .map(|(child, play_all)| {
            if *play_all {
                children[*child].count().max(1)
            } else {
                1
            }
        })
        .sum();
    lcm * picks
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

impl MediaCollectionEnumerator for PlaylistEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        let (child, _) = self.entries.get(self.entry_index)?;
        self.children.get(*child)?.current()
    }

    fn move_next(&mut self, now: Option<DateTime<FixedOffset>>) {
        self.advance(now);
    }

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    /// Children carry no persisted state of their own, so the playlist
    /// rebuilds them and replays up to the saved index.
    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        if state.index >= self.count && state.index != 0 {
            debug!(
                index = state.index,
                count = self.count,
                "Resetting stale playlist state"
            );
            self.rebuild(seeds::next_seed(state.seed));
            return;
        }
        self.rebuild(state.seed);
        for _ in 0..state.index {
            self.advance(None);
        }
    }

    fn peek(&self, offset: usize) -> Option<MediaItem> {
        let mut ahead = self.clone();
        for _ in 0..offset {
            ahead.advance(None);
        }
        ahead.current().cloned()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn current_group_size(&self) -> Option<usize> {
        let (child, _) = self.entries.get(self.entry_index)?;
        self.children.get(*child)?.current_group_size()
    }

    fn current_play_all_size(&self) -> Option<usize> {
        let (child, play_all) = self.entries.get(self.entry_index)?;
        if *play_all {
            self.children.get(*child).map(|child| child.count())
        } else {
            None
        }
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}
