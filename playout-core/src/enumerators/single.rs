use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, MediaItem};

use super::MediaCollectionEnumerator;

/// Always yields the same item.
#[derive(Debug, Clone)]
pub struct SingleItemEnumerator {
    item: MediaItem,
    state: CollectionEnumeratorState,
}

impl SingleItemEnumerator {
    pub fn new(item: MediaItem) -> Self {
        Self {
            item,
            state: CollectionEnumeratorState::default(),
        }
    }
}

impl MediaCollectionEnumerator for SingleItemEnumerator {
    fn current(&self) -> Option<&MediaItem> {
        Some(&self.item)
    }

    fn move_next(&mut self, _now: Option<DateTime<FixedOffset>>) {}

    fn state(&self) -> CollectionEnumeratorState {
        self.state
    }

    fn reset_state(&mut self, state: CollectionEnumeratorState) {
        self.state = CollectionEnumeratorState::new(0, state.seed);
    }

    fn peek(&self, _offset: usize) -> Option<MediaItem> {
        Some(self.item.clone())
    }

    fn count(&self) -> usize {
        1
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator> {
        Box::new(self.clone())
    }
}
