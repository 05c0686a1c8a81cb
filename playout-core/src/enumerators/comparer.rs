use std::cmp::Ordering;

use playout_model::MediaItem;

/// Orders a present value before an absent one.
fn present_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Release date, then season, episode and track, then id. Missing values
/// sort last.
pub fn chronological(a: &MediaItem, b: &MediaItem) -> Ordering {
    present_first(a.release_date, b.release_date)
        .then_with(|| present_first(a.season, b.season))
        .then_with(|| present_first(a.episode, b.episode))
        .then_with(|| present_first(a.track, b.track))
        .then_with(|| a.id.cmp(&b.id))
}

/// Season then episode, falling back to chronological order.
pub fn season_episode(a: &MediaItem, b: &MediaItem) -> Ordering {
    present_first(a.season, b.season)
        .then_with(|| present_first(a.episode, b.episode))
        .then_with(|| chronological(a, b))
}
