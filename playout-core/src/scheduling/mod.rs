//! Mode schedulers: each turns one schedule rule into a run of playout items
//! and the updated builder state.
//!
//! Every scheduler takes the state by value and hands back the next state,
//! so the builder can checkpoint between rules. None of them schedules past
//! the hard stop; a rule whose first item would start there emits nothing
//! and moves the clock to the hard stop.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use playout_model::{
    CollectionKey, FillerKind, GuideGroup, GuideMode, MediaItem, PlayoutItem, ScheduleItem,
    ScheduleItemKind,
};
use tracing::warn;

use crate::enumerators::EnumeratorMap;
use crate::error::Result;

pub mod duration;
pub mod filler;
pub mod flood;
pub mod multiple;
pub mod one;
pub mod schedule_items;
pub mod state;

pub use filler::{add_filler, close_gap, end_time_with_filler, pad_target};
pub use schedule_items::ScheduleItemsEnumerator;
pub use state::{PlayoutBuilderState, filler_start_time_after, start_time_after};

/// Everything a scheduler reads besides the rule and the state.
#[derive(Debug)]
pub struct ScheduleContext<'a> {
    pub enumerators: &'a mut EnumeratorMap,
    /// Number of playable items behind each collection key.
    pub collection_sizes: &'a BTreeMap<CollectionKey, usize>,
    pub hard_stop: DateTime<FixedOffset>,
}

/// The state after a rule ran, and the items it emitted.
pub type Scheduled = (PlayoutBuilderState, Vec<PlayoutItem>);

/// Runs the scheduler matching `item`'s kind. A rule with nothing playable
/// emits nothing and hands over to the next rule.
pub fn schedule(
    ctx: &mut ScheduleContext<'_>,
    state: PlayoutBuilderState,
    item: &ScheduleItem,
    next_item: &ScheduleItem,
) -> Result<Scheduled> {
    if !has_content(ctx.enumerators, item)? {
        return Ok(skip_rule(state, item));
    }

    match &item.kind {
        ScheduleItemKind::One => one::schedule(ctx, state, item, next_item),
        ScheduleItemKind::Multiple { count } => multiple::schedule(ctx, state, item, count, next_item),
        ScheduleItemKind::Duration {
            playout_duration,
            tail_mode,
        } => duration::schedule(ctx, state, item, *playout_duration, *tail_mode),
        ScheduleItemKind::Flood => flood::schedule(ctx, state, item, next_item),
    }
}

/// Whether the rule's own collection has an item to play.
pub fn has_content(enumerators: &EnumeratorMap, item: &ScheduleItem) -> Result<bool> {
    Ok(enumerators.get(&item.collection)?.current().is_some())
}

fn skip_rule(mut state: PlayoutBuilderState, item: &ScheduleItem) -> Scheduled {
    warn!(collection = %item.collection, rule = item.index, "No playable media; skipping schedule item");
    state.clear_rule_progress();
    state.schedule_items.move_next();
    (state, Vec::new())
}

/// The content entry for `media` starting at `start`.
fn content_item(
    item: &ScheduleItem,
    media: &MediaItem,
    start: DateTime<FixedOffset>,
    state: &PlayoutBuilderState,
) -> PlayoutItem {
    let kind = match item.guide_mode {
        GuideMode::Filler => FillerKind::GuideMode,
        GuideMode::Normal => FillerKind::None,
    };
    let mut content = PlayoutItem::new(media.id, start, media.duration, kind, state.next_guide_group);
    content.custom_title = filler::custom_title(item);
    content
}

/// Flood, Multiple and Duration bump the guide group after every item. The
/// trailing bump is undone unless the rule's items share exactly one group.
fn in_single_guide_group(items: &[PlayoutItem]) -> bool {
    let groups: BTreeSet<GuideGroup> = items.iter().map(|item| item.guide_group).collect();
    groups.len() == 1
}

fn latest_finish(items: &[PlayoutItem]) -> Option<DateTime<FixedOffset>> {
    items.iter().map(|item| item.finish).max()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeDelta, TimeZone};
    use playout_model::{CollectionEnumeratorState, CollectionId};

    use super::*;
    use crate::enumerators::OrderedEnumerator;

    pub fn key(id: u64) -> CollectionKey {
        CollectionKey::Collection(CollectionId::new(id))
    }

    pub fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset")
            .with_ymd_and_hms(2024, 5, 1, hour, minute, 0)
            .single()
            .expect("valid time")
    }

    pub fn movies(first_id: u64, minutes: &[i64]) -> Vec<MediaItem> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| MediaItem::movie(first_id + i as u64, TimeDelta::minutes(*m)))
            .collect()
    }

    /// Chronological enumerators for `(key, first id, durations)` triples.
    pub fn enumerators(collections: &[(u64, u64, &[i64])]) -> EnumeratorMap {
        let mut map = EnumeratorMap::new();
        for (id, first, minutes) in collections {
            map.insert(
                key(*id),
                Box::new(OrderedEnumerator::chronological(
                    movies(*first, minutes),
                    CollectionEnumeratorState::default(),
                )),
            );
        }
        map
    }

    pub fn sizes(map: &EnumeratorMap) -> BTreeMap<CollectionKey, usize> {
        map.keys()
            .map(|key| (*key, map.get(key).map(|e| e.count()).unwrap_or(0)))
            .collect()
    }

    pub fn state(time: DateTime<FixedOffset>, rules: usize) -> PlayoutBuilderState {
        PlayoutBuilderState::new(
            ScheduleItemsEnumerator::new(rules, false, CollectionEnumeratorState::default()),
            time,
        )
    }

    pub fn ids(items: &[PlayoutItem]) -> Vec<u64> {
        items.iter().map(|item| item.media_item_id.value()).collect()
    }
}
