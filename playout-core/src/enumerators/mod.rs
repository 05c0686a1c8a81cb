//! Collection enumerators: deterministic cursors over a list of media items.
//!
//! Every strategy is a pure function of `(items, CollectionEnumeratorState)`.
//! The state is plain data, so a build can be saved after any advance and
//! resumed later to produce exactly the same future sequence.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionEnumeratorState, CollectionKey, MediaItem};

use crate::error::{Result, SchedulingError};

pub mod comparer;
pub mod factory;
pub mod ordered;
pub mod playlist;
pub mod randomized;
pub mod seeds;
pub mod shuffle_in_order;
pub mod shuffled;
pub mod single;

pub use factory::EnumeratorFactory;
pub use ordered::OrderedEnumerator;
pub use playlist::{PlaylistEntry, PlaylistEnumerator};
pub use randomized::RandomizedEnumerator;
pub use shuffle_in_order::ShuffleInOrderEnumerator;
pub use shuffled::ShuffledEnumerator;
pub use single::SingleItemEnumerator;

/// Cursor over the items of one collection key.
pub trait MediaCollectionEnumerator: fmt::Debug + Send {
    /// The item that would play next, `None` for an empty collection.
    fn current(&self) -> Option<&MediaItem>;

    /// Advances past the current item. Strategies that do not depend on the
    /// wall clock ignore `now`.
    fn move_next(&mut self, now: Option<DateTime<FixedOffset>>);

    fn state(&self) -> CollectionEnumeratorState;

    /// Repositions the cursor. An index outside the collection is treated as
    /// stale and reset.
    fn reset_state(&mut self, state: CollectionEnumeratorState);

    /// The item `offset` advances ahead of the cursor without moving it.
    /// `peek(0)` is the current item.
    fn peek(&self, offset: usize) -> Option<MediaItem>;

    /// Number of advances in one full cycle.
    fn count(&self) -> usize;

    /// Size of the multi-part group holding the current item, when the
    /// enumerator knows about groups.
    fn current_group_size(&self) -> Option<usize> {
        None
    }

    /// Size of the current playlist entry when it plays all of its items.
    fn current_play_all_size(&self) -> Option<usize> {
        None
    }

    fn clone_box(&self) -> Box<dyn MediaCollectionEnumerator>;
}

impl Clone for Box<dyn MediaCollectionEnumerator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Saved positions of every enumerator, used to roll back speculative
/// scheduling.
pub type EnumeratorSnapshot = BTreeMap<CollectionKey, CollectionEnumeratorState>;

/// Enumerators for every collection key a schedule touches.
#[derive(Debug, Default, Clone)]
pub struct EnumeratorMap {
    inner: BTreeMap<CollectionKey, Box<dyn MediaCollectionEnumerator>>,
}

impl EnumeratorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: CollectionKey, enumerator: Box<dyn MediaCollectionEnumerator>) {
        self.inner.insert(key, enumerator);
    }

    pub fn with(mut self, key: CollectionKey, enumerator: impl MediaCollectionEnumerator + 'static) -> Self {
        self.insert(key, Box::new(enumerator));
        self
    }

    pub fn get(&self, key: &CollectionKey) -> Result<&dyn MediaCollectionEnumerator> {
        match self.inner.get(key) {
            Some(enumerator) => Ok(enumerator.as_ref()),
            None => Err(SchedulingError::MissingEnumerator(*key)),
        }
    }

    pub fn get_mut(&mut self, key: &CollectionKey) -> Result<&mut dyn MediaCollectionEnumerator> {
        match self.inner.get_mut(key) {
            Some(enumerator) => Ok(enumerator.as_mut()),
            None => Err(SchedulingError::MissingEnumerator(*key)),
        }
    }

    pub fn contains(&self, key: &CollectionKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CollectionKey> {
        self.inner.keys()
    }

    pub fn snapshot(&self) -> EnumeratorSnapshot {
        self.inner
            .iter()
            .map(|(key, enumerator)| (*key, enumerator.state()))
            .collect()
    }

    pub fn restore(&mut self, snapshot: &EnumeratorSnapshot) {
        for (key, state) in snapshot {
            if let Some(enumerator) = self.inner.get_mut(key) {
                enumerator.reset_state(*state);
            }
        }
    }
}
