//! Filler resolution shared by every mode scheduler: pre, mid and post-roll
//! around each content item, pad-to-nearest-minute, and the tail and
//! fallback filler that close the gap before the next rule.
//!
//! Roll filler is planned against enumerator peeks and only committed once
//! the caller decides to keep the block, so the end-time lookahead and the
//! items actually emitted always agree.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};
use playout_model::{
    CollectionKey, FillerKind, FillerMode, FillerPreset, MediaChapter, MediaItem, PlayoutItem,
    ScheduleItem,
};
use tracing::{debug, error, warn};

use super::state::PlayoutBuilderState;
use crate::enumerators::{EnumeratorMap, seeds};
use crate::error::Result;
use crate::expressions::filter_chapters;

/// Enumerator advances planned but not yet applied.
#[derive(Debug, Default)]
struct Lookahead {
    offsets: BTreeMap<CollectionKey, usize>,
}

impl Lookahead {
    fn peek(&self, enumerators: &EnumeratorMap, key: &CollectionKey) -> Result<Option<MediaItem>> {
        let offset = self.offsets.get(key).copied().unwrap_or(0);
        Ok(enumerators.get(key)?.peek(offset))
    }

    fn advance(&mut self, key: CollectionKey) {
        *self.offsets.entry(key).or_default() += 1;
    }

    fn commit(self, enumerators: &mut EnumeratorMap) -> Result<()> {
        for (key, advances) in self.offsets {
            let enumerator = enumerators.get_mut(&key)?;
            for _ in 0..advances {
                enumerator.move_next(None);
            }
        }
        Ok(())
    }
}

/// A content item with its roll filler, timed back to back from the content
/// start, plus the filler advances it needs.
#[derive(Debug)]
pub struct PlannedFiller {
    pub items: Vec<PlayoutItem>,
    start: DateTime<FixedOffset>,
    lookahead: Lookahead,
}

impl PlannedFiller {
    pub fn finish(&self) -> DateTime<FixedOffset> {
        self.items
            .iter()
            .map(|item| item.finish)
            .max()
            .unwrap_or(self.start)
    }

    /// Advances the filler enumerators past everything the plan used.
    pub fn commit(self, enumerators: &mut EnumeratorMap) -> Result<Vec<PlayoutItem>> {
        self.lookahead.commit(enumerators)?;
        Ok(self.items)
    }
}

/// The first `minutes` boundary strictly after `end`, ignoring seconds.
pub fn pad_target(end: DateTime<FixedOffset>, minutes: u32) -> DateTime<FixedOffset> {
    let minutes = minutes.max(1);
    let minute = end.minute();
    let truncated = end
        - TimeDelta::seconds(i64::from(end.second()))
        - TimeDelta::nanoseconds(i64::from(end.nanosecond()));
    let target_minute = (minute / minutes + 1) * minutes;
    truncated + TimeDelta::minutes(i64::from(target_minute - minute))
}

/// Chapters that mid-roll splits the content at. Empty when there is no
/// mid-roll or fewer than two chapters remain.
fn effective_chapters(
    mid_roll: Option<&FillerPreset>,
    chapters: &[MediaChapter],
    duration: TimeDelta,
) -> Vec<MediaChapter> {
    let Some(mid_roll) = mid_roll else {
        return Vec::new();
    };
    if chapters.len() <= 1 {
        return Vec::new();
    }

    let effective = match mid_roll.expression.as_deref() {
        Some(expression) if !expression.trim().is_empty() => {
            filter_chapters(expression, chapters, duration)
        }
        _ => chapters.to_vec(),
    };

    if effective.len() <= 1 { Vec::new() } else { effective }
}

fn total_duration<'a>(items: impl IntoIterator<Item = &'a PlayoutItem>) -> TimeDelta {
    items
        .into_iter()
        .fold(TimeDelta::zero(), |total, item| total + item.duration())
}

struct BlockPlanner<'a> {
    enumerators: &'a EnumeratorMap,
    item: &'a ScheduleItem,
    content: &'a PlayoutItem,
    lookahead: Lookahead,
    log: bool,
}

impl BlockPlanner<'_> {
    fn filler_item(&self, media: &MediaItem, duration: TimeDelta, kind: FillerKind) -> PlayoutItem {
        let mut item = PlayoutItem::new(
            media.id,
            self.content.start,
            duration,
            kind,
            self.content.guide_group,
        );
        item.custom_title = self.content.custom_title.clone();
        item
    }

    fn count(&mut self, preset: &FillerPreset, count: usize) -> Result<Vec<PlayoutItem>> {
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(media) = self.lookahead.peek(self.enumerators, &preset.collection)? else {
                break;
            };
            result.push(self.filler_item(&media, media.duration, preset.kind));
            self.lookahead.advance(preset.collection);
        }
        Ok(result)
    }

    /// Fills up to `target`. An item at least one and a half times the
    /// target is skipped once; any other item that does not fit ends the
    /// block.
    fn duration(&mut self, preset: &FillerPreset, target: TimeDelta) -> Result<Vec<PlayoutItem>> {
        let mut result = Vec::new();
        let mut remaining = target;
        let mut skipped = false;

        while remaining > TimeDelta::zero() {
            let Some(media) = self.lookahead.peek(self.enumerators, &preset.collection)? else {
                break;
            };
            let duration = media.duration;
            if duration <= TimeDelta::zero() {
                break;
            }

            if remaining - duration >= TimeDelta::zero() {
                result.push(self.filler_item(&media, duration, preset.kind));
                remaining -= duration;
                self.lookahead.advance(preset.collection);
            } else if skipped {
                break;
            } else if duration.num_milliseconds() * 2 >= target.num_milliseconds() * 3 {
                if self.log {
                    warn!(
                        filler = %media.display_title(),
                        filler_duration = ?duration,
                        gap = ?target,
                        "Filler item is too long for the gap; skipping to the next filler item"
                    );
                }
                skipped = true;
                self.lookahead.advance(preset.collection);
            } else {
                if duration > target && self.log {
                    warn!(
                        filler = %media.display_title(),
                        filler_duration = ?duration,
                        gap = ?target,
                        "Filler item is too long for the gap; ending filler block"
                    );
                }
                break;
            }
        }

        Ok(result)
    }

    /// Filler for a non-pad preset. `slot` tells breaks of the same item
    /// apart so random counts differ between them.
    fn preset_items(&mut self, preset: &FillerPreset, slot: u64) -> Result<Vec<PlayoutItem>> {
        match preset.mode {
            FillerMode::Count => self.count(preset, preset.count.unwrap_or(0) as usize),
            FillerMode::RandomCount => {
                let max = u64::from(preset.count.unwrap_or(0));
                let seed = seeds::derive_seed(
                    self.content.start.timestamp() as u64,
                    self.content.media_item_id.value() ^ slot,
                );
                self.count(preset, (seed % (max + 1)) as usize)
            }
            FillerMode::Duration => match preset.duration {
                Some(duration) => self.duration(preset, duration),
                None => Ok(Vec::new()),
            },
            FillerMode::Pad => Ok(Vec::new()),
        }
    }

    /// One fallback item stretched to `duration`.
    fn fallback_for_pad(&mut self, duration: TimeDelta) -> Result<Option<PlayoutItem>> {
        let Some(fallback) = self.item.fillers.fallback.as_ref() else {
            return Ok(None);
        };
        if duration <= TimeDelta::zero() {
            return Ok(None);
        }
        let Some(media) = self.lookahead.peek(self.enumerators, &fallback.collection)? else {
            return Ok(None);
        };

        let mut item = self.filler_item(&media, duration, FillerKind::Fallback);
        item.out_point = TimeDelta::zero();
        self.lookahead.advance(fallback.collection);
        Ok(Some(item))
    }

    /// Duration filler for the whole pad, then one fallback item for
    /// whatever is left.
    fn pad_fill(&mut self, pad: &FillerPreset, remaining: TimeDelta) -> Result<Vec<PlayoutItem>> {
        let mut fill = self.duration(pad, remaining)?;
        let left = remaining - total_duration(&fill);
        if let Some(fallback) = self.fallback_for_pad(left)? {
            fill.push(fallback);
        }
        Ok(fill)
    }

    /// Spreads the pad evenly over the mid-roll breaks, topping each break up
    /// with fallback once the duration filler runs out.
    fn distribute(
        &mut self,
        pad: &FillerPreset,
        remaining: TimeDelta,
        breaks: &mut [Vec<PlayoutItem>],
    ) -> Result<()> {
        let mut queue: VecDeque<PlayoutItem> = self.duration(pad, remaining)?.into();
        let gaps = breaks.len();
        let average = remaining / gaps as i32;
        let mut filled = TimeDelta::zero();

        for (position, slot) in breaks.iter_mut().enumerate() {
            let budget = if position + 1 == gaps {
                remaining - filled
            } else {
                average
            };
            let mut current = TimeDelta::zero();
            while current < budget && filled < remaining {
                let next = match queue.pop_front() {
                    Some(item) => Some(item),
                    None => self.fallback_for_pad((budget - current).min(remaining - filled))?,
                };
                let Some(next) = next else {
                    break;
                };
                current += next.duration();
                filled += next.duration();
                slot.push(next);
            }
        }

        Ok(())
    }

    fn plan(mut self, chapters: &[MediaChapter]) -> Result<PlannedFiller> {
        let item = self.item;
        let content = self.content;
        let fillers = &item.fillers;

        if fillers.rolls().filter(|preset| preset.is_pad()).count() > 1 {
            if self.log {
                error!(
                    schedule_item = item.index,
                    "Multiple pad-to-nearest-minute fillers are configured; no filler will be used"
                );
            }
            return Ok(PlannedFiller {
                items: vec![content.clone()],
                start: content.start,
                lookahead: self.lookahead,
            });
        }

        let effective = effective_chapters(fillers.mid_roll.as_ref(), chapters, content.duration());
        let pieces: Vec<PlayoutItem> = if effective.is_empty() {
            vec![content.clone()]
        } else {
            effective.iter().map(|chapter| content.for_chapter(chapter)).collect()
        };

        let non_pad = |slot: &Option<FillerPreset>| slot.clone().filter(|preset| !preset.is_pad());

        let mut pre = match non_pad(&fillers.pre_roll) {
            Some(preset) => self.preset_items(&preset, 0)?,
            None => Vec::new(),
        };

        let mut breaks: Vec<Vec<PlayoutItem>> = vec![Vec::new(); pieces.len() - 1];
        if let Some(preset) = non_pad(&fillers.mid_roll) {
            for (position, slot) in breaks.iter_mut().enumerate() {
                *slot = self.preset_items(&preset, position as u64 + 1)?;
            }
        }

        let mut post = match non_pad(&fillers.post_roll) {
            Some(preset) => self.preset_items(&preset, pieces.len() as u64)?,
            None => Vec::new(),
        };

        if let Some(pad) = fillers.rolls().find(|preset| preset.is_pad()) {
            let unpadded = total_duration(pre.iter().chain(&pieces).chain(breaks.iter().flatten()).chain(&post));
            let end = content.start + unpadded;
            let remaining = pad_target(end, pad.pad_to_nearest_minute.unwrap_or(1)) - end;
            debug!(?remaining, %end, "Padding to nearest minute");

            match pad.kind {
                FillerKind::PreRoll => {
                    let mut fill = self.pad_fill(pad, remaining)?;
                    fill.append(&mut pre);
                    pre = fill;
                }
                FillerKind::MidRoll if !breaks.is_empty() => {
                    self.distribute(pad, remaining, &mut breaks)?;
                }
                _ => post.extend(self.pad_fill(pad, remaining)?),
            }
        }

        let mut ordered = pre;
        let mut breaks = breaks.into_iter();
        for piece in pieces {
            ordered.push(piece);
            if let Some(slot) = breaks.next() {
                ordered.extend(slot);
            }
        }
        ordered.extend(post);

        let mut time = content.start;
        let items = ordered
            .into_iter()
            .map(|item| {
                let item = item.retimed(time);
                time = item.finish;
                item
            })
            .collect();

        Ok(PlannedFiller {
            items,
            start: content.start,
            lookahead: self.lookahead,
        })
    }
}

/// Plans `content` with its pre, mid and post-roll without moving any
/// enumerator.
pub fn plan_filler(
    enumerators: &EnumeratorMap,
    item: &ScheduleItem,
    content: &PlayoutItem,
    chapters: &[MediaChapter],
    log: bool,
) -> Result<PlannedFiller> {
    BlockPlanner {
        enumerators,
        item,
        content,
        lookahead: Lookahead::default(),
        log,
    }
    .plan(chapters)
}

/// Surrounds `content` with its roll filler and advances the filler
/// enumerators.
pub fn add_filler(
    enumerators: &mut EnumeratorMap,
    item: &ScheduleItem,
    content: &PlayoutItem,
    chapters: &[MediaChapter],
) -> Result<Vec<PlayoutItem>> {
    plan_filler(enumerators, item, content, chapters, true)?.commit(enumerators)
}

/// When `content` would end once its roll filler is added. Pure lookahead.
pub fn end_time_with_filler(
    enumerators: &EnumeratorMap,
    item: &ScheduleItem,
    content: &PlayoutItem,
    chapters: &[MediaChapter],
) -> Result<DateTime<FixedOffset>> {
    Ok(plan_filler(enumerators, item, content, chapters, false)?.finish())
}

/// Appends tail filler back to back until the next one would overshoot
/// `next_start`.
pub fn add_tail_filler(
    enumerators: &mut EnumeratorMap,
    item: &ScheduleItem,
    state: &mut PlayoutBuilderState,
    items: &mut Vec<PlayoutItem>,
    next_start: DateTime<FixedOffset>,
) -> Result<()> {
    let Some(tail) = item.fillers.tail.as_ref() else {
        return Ok(());
    };
    let enumerator = enumerators.get_mut(&tail.collection)?;

    while state.current_time < next_start {
        let Some(media) = enumerator.current().cloned() else {
            break;
        };
        let duration = media.duration;
        if duration <= TimeDelta::zero() {
            break;
        }
        if state.current_time + duration > next_start {
            debug!(
                filler_duration = ?duration,
                %next_start,
                "Tail filler would run past the next item start"
            );
            break;
        }

        let mut filler = PlayoutItem::new(
            media.id,
            state.current_time,
            duration,
            FillerKind::Tail,
            state.next_guide_group,
        );
        filler.custom_title = custom_title(item);
        items.push(filler);

        state.current_time += duration;
        enumerator.move_next(None);
    }

    Ok(())
}

/// Stretches one fallback item over whatever gap is left before
/// `next_start`.
pub fn add_fallback_filler(
    enumerators: &mut EnumeratorMap,
    item: &ScheduleItem,
    state: &mut PlayoutBuilderState,
    items: &mut Vec<PlayoutItem>,
    next_start: DateTime<FixedOffset>,
) -> Result<()> {
    let Some(fallback) = item.fillers.fallback.as_ref() else {
        return Ok(());
    };
    if state.current_time >= next_start {
        return Ok(());
    }

    let enumerator = enumerators.get_mut(&fallback.collection)?;
    let Some(media) = enumerator.current().cloned() else {
        return Ok(());
    };

    let mut filler = PlayoutItem::new(
        media.id,
        state.current_time,
        next_start - state.current_time,
        FillerKind::Fallback,
        state.next_guide_group,
    );
    filler.out_point = TimeDelta::zero();
    filler.custom_title = custom_title(item);
    items.push(filler);

    state.current_time = next_start;
    enumerator.move_next(None);
    Ok(())
}

/// Tail filler, then fallback for the remainder.
pub fn close_gap(
    enumerators: &mut EnumeratorMap,
    item: &ScheduleItem,
    state: &mut PlayoutBuilderState,
    items: &mut Vec<PlayoutItem>,
    next_start: DateTime<FixedOffset>,
) -> Result<()> {
    add_tail_filler(enumerators, item, state, items, next_start)?;
    add_fallback_filler(enumerators, item, state, items, next_start)
}

/// The rule's custom title, ignoring blank titles.
pub fn custom_title(item: &ScheduleItem) -> Option<String> {
    if item.has_custom_title() {
        item.custom_title.clone()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerators::OrderedEnumerator;
    use crate::scheduling::schedule_items::ScheduleItemsEnumerator;
    use chrono::TimeZone;
    use playout_model::{CollectionEnumeratorState, CollectionId, GuideGroup};

    const CONTENT: u64 = 1;
    const FILLER: u64 = 2;
    const FALLBACK: u64 = 3;

    fn key(id: u64) -> CollectionKey {
        CollectionKey::Collection(CollectionId::new(id))
    }

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset")
            .with_ymd_and_hms(2024, 5, 1, hour, minute, second)
            .single()
            .expect("valid time")
    }

    fn movies(first_id: u64, minutes: &[i64]) -> Vec<MediaItem> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| MediaItem::movie(first_id + i as u64, TimeDelta::minutes(*m)))
            .collect()
    }

    fn enumerators(filler_minutes: &[i64]) -> EnumeratorMap {
        EnumeratorMap::new()
            .with(
                key(FILLER),
                OrderedEnumerator::chronological(movies(100, filler_minutes), CollectionEnumeratorState::default()),
            )
            .with(
                key(FALLBACK),
                OrderedEnumerator::chronological(movies(900, &[1]), CollectionEnumeratorState::default()),
            )
    }

    fn content(start: DateTime<FixedOffset>, minutes: i64) -> PlayoutItem {
        PlayoutItem::new(
            CONTENT.into(),
            start,
            TimeDelta::minutes(minutes),
            FillerKind::None,
            GuideGroup::new(4),
        )
    }

    fn kinds(items: &[PlayoutItem]) -> Vec<FillerKind> {
        items.iter().map(|item| item.filler_kind).collect()
    }

    fn assert_contiguous(items: &[PlayoutItem]) {
        for pair in items.windows(2) {
            assert_eq!(pair[0].finish, pair[1].start);
        }
    }

    #[test]
    fn test_pad_target_is_strictly_after() {
        assert_eq!(pad_target(at(10, 16, 0), 15), at(10, 30, 0));
        assert_eq!(pad_target(at(10, 30, 0), 15), at(10, 45, 0));
        assert_eq!(pad_target(at(10, 29, 40), 15), at(10, 30, 0));
        assert_eq!(pad_target(at(10, 50, 0), 30), at(11, 0, 0));
    }

    #[test]
    fn test_pre_and_post_roll_count() {
        let mut map = enumerators(&[2, 3, 4]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::count(FillerKind::PreRoll, key(FILLER), 2))
            .with_filler(FillerPreset::count(FillerKind::PostRoll, key(FILLER), 1));

        let result = add_filler(&mut map, &item, &content(at(9, 0, 0), 30), &[]).expect("filler");

        assert_eq!(
            kinds(&result),
            vec![FillerKind::PreRoll, FillerKind::PreRoll, FillerKind::None, FillerKind::PostRoll]
        );
        assert_contiguous(&result);
        assert_eq!(result[2].start, at(9, 5, 0));
        assert_eq!(result[3].media_item_id.value(), 102);
        assert!(result.iter().all(|i| i.guide_group == GuideGroup::new(4)));
        assert_eq!(map.get(&key(FILLER)).expect("filler").state().index, 0);
    }

    #[test]
    fn test_mid_roll_splits_on_chapters() {
        let mut map = enumerators(&[1, 1, 1]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::count(FillerKind::MidRoll, key(FILLER), 1));
        let chapters = vec![
            MediaChapter::new(1, TimeDelta::zero(), TimeDelta::minutes(10)),
            MediaChapter::new(2, TimeDelta::minutes(10), TimeDelta::minutes(20)),
            MediaChapter::new(3, TimeDelta::minutes(20), TimeDelta::minutes(30)),
        ];

        let result = add_filler(&mut map, &item, &content(at(9, 0, 0), 30), &chapters).expect("filler");

        assert_eq!(
            kinds(&result),
            vec![
                FillerKind::None,
                FillerKind::MidRoll,
                FillerKind::None,
                FillerKind::MidRoll,
                FillerKind::None
            ]
        );
        assert_eq!(result[2].in_point, TimeDelta::minutes(10));
        assert_eq!(result[4].finish, at(9, 32, 0));
    }

    #[test]
    fn test_mid_roll_without_chapters_is_skipped() {
        let mut map = enumerators(&[1]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::count(FillerKind::MidRoll, key(FILLER), 1));

        let result = add_filler(&mut map, &item, &content(at(9, 0, 0), 30), &[]).expect("filler");
        assert_eq!(kinds(&result), vec![FillerKind::None]);
    }

    #[test]
    fn test_post_roll_pad_just_past_boundary() {
        let mut map = enumerators(&[5]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::pad(FillerKind::PostRoll, key(FILLER), 15))
            .with_filler(FillerPreset::fallback(key(FALLBACK)));

        let block = content(at(10, 0, 0), 16);
        let expected = end_time_with_filler(&map, &item, &block, &[]).expect("lookahead");
        let result = add_filler(&mut map, &item, &block, &[]).expect("filler");

        assert_eq!(expected, at(10, 30, 0));
        assert_eq!(result.last().map(|i| i.finish), Some(at(10, 30, 0)));
        assert_eq!(
            kinds(&result),
            vec![
                FillerKind::None,
                FillerKind::PostRoll,
                FillerKind::PostRoll,
                FillerKind::Fallback
            ]
        );
        assert_eq!(result[3].duration(), TimeDelta::minutes(4));
        assert_eq!(result[3].out_point, TimeDelta::zero());
    }

    #[test]
    fn test_post_roll_pad_exactly_on_boundary_pads_full_interval() {
        let mut map = enumerators(&[5]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::pad(FillerKind::PostRoll, key(FILLER), 15));

        let result = add_filler(&mut map, &item, &content(at(10, 0, 0), 30), &[]).expect("filler");

        assert_eq!(result.len(), 4);
        assert_eq!(result.last().map(|i| i.finish), Some(at(10, 45, 0)));
    }

    #[test]
    fn test_pre_roll_pad_goes_first() {
        let mut map = enumerators(&[5]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::pad(FillerKind::PreRoll, key(FILLER), 30));

        let result = add_filler(&mut map, &item, &content(at(10, 0, 0), 20), &[]).expect("filler");

        assert_eq!(
            kinds(&result),
            vec![FillerKind::PreRoll, FillerKind::PreRoll, FillerKind::None]
        );
        assert_eq!(result[2].start, at(10, 10, 0));
        assert_eq!(result[2].finish, at(10, 30, 0));
    }

    #[test]
    fn test_mid_roll_pad_spreads_over_breaks() {
        let mut map = enumerators(&[2]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::pad(FillerKind::MidRoll, key(FILLER), 30));
        let chapters = vec![
            MediaChapter::new(1, TimeDelta::zero(), TimeDelta::minutes(10)),
            MediaChapter::new(2, TimeDelta::minutes(10), TimeDelta::minutes(20)),
            MediaChapter::new(3, TimeDelta::minutes(20), TimeDelta::minutes(22)),
        ];

        let result = add_filler(&mut map, &item, &content(at(10, 0, 0), 22), &chapters).expect("filler");

        // eight minutes of pad over two breaks of four minutes
        assert_eq!(result.len(), 7);
        assert_eq!(result[1].filler_kind, FillerKind::MidRoll);
        assert_eq!(result[3].filler_kind, FillerKind::None);
        assert_eq!(result.last().map(|i| i.finish), Some(at(10, 30, 0)));
    }

    #[test]
    fn test_two_pads_disable_filler() {
        let mut map = enumerators(&[5]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::pad(FillerKind::PreRoll, key(FILLER), 15))
            .with_filler(FillerPreset::pad(FillerKind::PostRoll, key(FILLER), 15));

        let result = add_filler(&mut map, &item, &content(at(10, 0, 0), 16), &[]).expect("filler");
        assert_eq!(kinds(&result), vec![FillerKind::None]);
    }

    #[test]
    fn test_duration_filler_skips_one_oversized_item() {
        let mut map = enumerators(&[10, 3, 3, 20]);
        let item = ScheduleItem::one(0, key(CONTENT)).with_filler(FillerPreset::duration(
            FillerKind::PostRoll,
            key(FILLER),
            TimeDelta::minutes(6),
        ));

        let result = add_filler(&mut map, &item, &content(at(10, 0, 0), 30), &[]).expect("filler");

        let ids: Vec<u64> = result.iter().map(|i| i.media_item_id.value()).collect();
        assert_eq!(ids, vec![CONTENT, 101, 102]);
        assert_eq!(map.get(&key(FILLER)).expect("filler").state().index, 3);
    }

    #[test]
    fn test_random_count_is_deterministic() {
        let item = ScheduleItem::one(0, key(CONTENT)).with_filler({
            let mut preset = FillerPreset::count(FillerKind::PreRoll, key(FILLER), 3);
            preset.mode = FillerMode::RandomCount;
            preset
        });
        let map = enumerators(&[1, 1, 1, 1]);
        let block = content(at(10, 0, 0), 30);

        let first = plan_filler(&map, &item, &block, &[], false).expect("plan");
        let second = plan_filler(&map, &item, &block, &[], false).expect("plan");
        assert_eq!(first.items, second.items);
        assert!(first.items.len() <= 4);
    }

    #[test]
    fn test_tail_then_fallback_close_gap() {
        let mut map = enumerators(&[4]);
        let item = ScheduleItem::one(0, key(CONTENT))
            .with_filler(FillerPreset::tail(key(FILLER)))
            .with_filler(FillerPreset::fallback(key(FALLBACK)));
        let mut state = PlayoutBuilderState::new(
            ScheduleItemsEnumerator::new(1, false, CollectionEnumeratorState::default()),
            at(10, 0, 0),
        );
        let mut items = Vec::new();

        close_gap(&mut map, &item, &mut state, &mut items, at(10, 10, 0)).expect("gap");

        assert_eq!(
            kinds(&items),
            vec![FillerKind::Tail, FillerKind::Tail, FillerKind::Fallback]
        );
        assert_eq!(items[2].duration(), TimeDelta::minutes(2));
        assert_eq!(state.current_time, at(10, 10, 0));
    }
}
