use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, MediaItem};
use rand::RngCore;

use super::{MediaCollectionEnumerator, seeds};

/// Independent random picks with replacement. Draw `i` is a pure function
/// of `(seed, i)`, so the index grows without bound and the seed never
/// changes.
#[derive(Debug, Clone)]
pub struct RandomizedEnumerator {
    items: Vec<MediaItem>,
    state: CollectionEnumeratorState,
    position: usize,
}

impl RandomizedEnumerator {
    pub fn new(items: Vec<MediaItem>, state: CollectionEnumeratorState) -> Self {
        let mut enumerator = Self {
            items,
            state,
            position: 0,
        };
        enumerator.reset_state(state);
        enumerator
    }

    fn pick(&self, index: usize) -> usize {
        if self.items.is_empty() {
            return 0;
        }
        let mut rng = seeds::rng(self.state.seed);
        // each draw consumes two 32-bit words of the stream
        rng.set_word_pos(2 * index as u128);
        (rng.next_u64() % self.items.len() as u64) as usize
    }
}

impl MediaCollectionEnumerator for RandomizedEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.position)
    }

    fn move_next(&mut self, _now: Option<DateTime<FixedOffset>>) {
        self.state.index += 1;
        self.position = self.pick(self.state.index);
    }

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        self.state = state;
        self.position = self.pick(state.index);
    }

    fn peek(&self, offset: usize) -> Option<MediaItem> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(self.pick(self.state.index + offset)).cloned()
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn items(n: u64) -> Vec<MediaItem> {
        (1..=n).map(|id| MediaItem::movie(id, TimeDelta::minutes(5))).collect()
    }

    fn draw(enumerator: &mut RandomizedEnumerator, n: usize) -> Vec<u64> {
        (0..n)
            .map(|_| {
                let id = enumerator.current().expect("item").id.value();
                enumerator.move_next(None);
                id
            })
            .collect()
    }

    #[test]
    fn test_sequence_is_neither_identity_nor_reverse() {
        let mut enumerator =
            RandomizedEnumerator::new(items(10), CollectionEnumeratorState::with_seed(1));
        let sequence = draw(&mut enumerator, 10);

        let identity: Vec<u64> = (1..=10).collect();
        let reverse: Vec<u64> = (1..=10).rev().collect();
        assert_ne!(sequence, identity);
        assert_ne!(sequence, reverse);
    }

    #[test]
    fn test_index_grows_without_bound_and_resume_matches() {
        let mut enumerator =
            RandomizedEnumerator::new(items(3), CollectionEnumeratorState::with_seed(5));
        let first = draw(&mut enumerator, 7);
        assert_eq!(enumerator.state(), CollectionEnumeratorState::new(7, 5));

        let mut resumed =
            RandomizedEnumerator::new(items(3), CollectionEnumeratorState::new(4, 5));
        assert_eq!(draw(&mut resumed, 3), first[4..].to_vec());
    }

    #[test]
    fn test_peek_matches_future_draws() {
        let mut enumerator =
            RandomizedEnumerator::new(items(6), CollectionEnumeratorState::with_seed(11));
        let peeked: Vec<u64> = (0..4)
            .map(|offset| enumerator.peek(offset).expect("peek").id.value())
            .collect();
        assert_eq!(draw(&mut enumerator, 4), peeked);
    }
}
