//! Seed derivation. All pseudo-randomness flows from explicit `u64` seeds
//! through ChaCha8 so that sequences are stable across platforms.

use playout_model::CollectionKey;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// The seed that follows `seed` when a cycle completes.
pub fn next_seed(seed: u64) -> u64 {
    rng(seed).next_u64()
}

/// A seed for a sub-stream identified by `salt`.
pub fn derive_seed(seed: u64, salt: u64) -> u64 {
    rng(seed ^ salt.rotate_left(32)).next_u64()
}

/// Stable numeric salt for a collection key.
pub fn key_salt(key: &CollectionKey) -> u64 {
    let (tag, id) = match key {
        CollectionKey::Collection(id) => (1u64, id.value()),
        CollectionKey::MultiCollection(id) => (2, id.value()),
        CollectionKey::SmartCollection(id) => (3, id.value()),
        CollectionKey::Playlist(id) => (4, id.value()),
        CollectionKey::MediaItem(id) => (5, id.value()),
    };
    (tag << 56) ^ id
}

/// Where seeds for brand-new enumerator states come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    /// Every fresh state is derived from this base seed.
    Fixed(u64),
    /// Fresh states draw from the thread-local generator.
    Entropy,
}

impl SeedSource {
    pub fn from_config(seed: Option<u64>) -> Self {
        seed.map_or(SeedSource::Entropy, SeedSource::Fixed)
    }

    pub fn seed_for(&self, key: &CollectionKey) -> u64 {
        match self {
            SeedSource::Fixed(base) => derive_seed(*base, key_salt(key)),
            SeedSource::Entropy => rand::rng().random(),
        }
    }

    /// Seed for the schedule-items cursor.
    pub fn schedule_seed(&self) -> u64 {
        match self {
            SeedSource::Fixed(base) => derive_seed(*base, 0),
            SeedSource::Entropy => rand::rng().random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playout_model::CollectionId;

    #[test]
    fn test_fixed_source_is_deterministic_per_key() {
        let source = SeedSource::Fixed(42);
        let a = CollectionKey::Collection(CollectionId::new(1));
        let b = CollectionKey::MultiCollection(CollectionId::new(1));

        assert_eq!(source.seed_for(&a), SeedSource::Fixed(42).seed_for(&a));
        assert_ne!(source.seed_for(&a), source.seed_for(&b));
        assert_ne!(next_seed(7), 7);
        assert_eq!(next_seed(7), next_seed(7));
    }
}
