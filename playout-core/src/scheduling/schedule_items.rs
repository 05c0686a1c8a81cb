use playout_model::CollectionEnumeratorState;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::enumerators::seeds;

/// Cursor over the rules of a schedule, by position in the sorted rule list.
///
/// Without shuffling the rules are visited in index order. With shuffling
/// every full pass is a fresh seeded permutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItemsEnumerator {
    len: usize,
    shuffle: bool,
    order: Vec<usize>,
    state: CollectionEnumeratorState,
}

impl ScheduleItemsEnumerator {
    pub fn new(len: usize, shuffle: bool, state: CollectionEnumeratorState) -> Self {
        let mut enumerator = Self {
            len,
            shuffle,
            order: Vec::new(),
            state,
        };
        if len > 0 && state.index >= len {
            debug!(index = state.index, len, "Resetting stale schedule item cursor");
            enumerator.state = CollectionEnumeratorState::with_seed(state.seed);
        }
        enumerator.order = enumerator.order_for(enumerator.state.seed);
        enumerator
    }

    fn order_for(&self, seed: u64) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len).collect();
        if self.shuffle {
            order.shuffle(&mut seeds::rng(seed));
        }
        order
    }

    /// Position of the current rule in the sorted rule list.
    pub fn current(&self) -> usize {
        self.order.get(self.state.index).copied().unwrap_or(0)
    }

    /// Position of the rule that follows the current one.
    pub fn peek_next(&self) -> usize {
        let mut next = self.clone();
        next.move_next();
        next.current()
    }

    pub fn move_next(&mut self) {
        if self.len == 0 {
            return;
        }
        self.state.index += 1;
        if self.state.index >= self.len {
            self.state.index = 0;
            if self.shuffle {
                self.state.seed = seeds::next_seed(self.state.seed);
                self.order = self.order_for(self.state.seed);
            }
        }
    }

    pub fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
