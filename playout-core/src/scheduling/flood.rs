use playout_model::ScheduleItem;

use super::filler::{close_gap, plan_filler};
use super::state::{filler_start_time_after, next_occurrence, start_time_after};
use super::{PlayoutBuilderState, ScheduleContext, Scheduled, content_item, in_single_guide_group};
use crate::error::Result;

/// Plays items back to back until the next rule's fixed start or the hard
/// stop. An item that would run into the next fixed start is not played.
pub fn schedule(
    ctx: &mut ScheduleContext<'_>,
    mut state: PlayoutBuilderState,
    item: &ScheduleItem,
    next_item: &ScheduleItem,
) -> Result<Scheduled> {
    let hard_stop = ctx.hard_stop;
    let mut items = Vec::new();
    let mut scheduled_none = false;

    // a lone flood rule never blocks itself
    let next_fixed = next_item.start_time.filter(|_| next_item.id != item.id);

    while state.current_time < hard_stop {
        let Some(media) = ctx.enumerators.get(&item.collection)?.current().cloned() else {
            break;
        };

        let start = start_time_after(&state, item);
        if start >= hard_stop {
            scheduled_none = items.is_empty();
            state.current_time = hard_stop;
            break;
        }

        let content = content_item(item, &media, start, &state);
        let planned = plan_filler(ctx.enumerators, item, &content, &media.chapters, true)?;
        let end = planned.finish();

        let fits = match next_fixed {
            Some(time) => {
                let next_start = next_occurrence(state.current_time, time);
                next_start < start || next_start >= end
            }
            None => true,
        };
        if !fits {
            break;
        }

        items.extend(planned.commit(ctx.enumerators)?);
        state.current_time = end;
        state.in_flood = true;
        if !item.has_custom_title() {
            state.increment_guide_group();
        }
        ctx.enumerators
            .get_mut(&item.collection)?
            .move_next(Some(start));
    }

    state.in_flood = !items.is_empty() && state.current_time >= hard_stop;
    if !in_single_guide_group(&items) {
        state.decrement_guide_group();
    }
    if !state.in_flood && !scheduled_none {
        state.schedule_items.move_next();
    }

    let next_start = filler_start_time_after(&state, next_item, hard_stop);
    close_gap(ctx.enumerators, item, &mut state, &mut items, next_start)?;

    state.increment_guide_group();
    Ok((state, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerators::EnumeratorMap;
    use crate::scheduling::test_support::*;
    use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};
    use playout_model::{FillerKind, FillerPreset};

    fn run(
        map: &mut EnumeratorMap,
        state: PlayoutBuilderState,
        item: &ScheduleItem,
        next: &ScheduleItem,
        hard_stop: DateTime<FixedOffset>,
    ) -> Scheduled {
        let sizes = sizes(map);
        let mut ctx = ScheduleContext {
            enumerators: map,
            collection_sizes: &sizes,
            hard_stop,
        };
        schedule(&mut ctx, state, item, next).expect("schedule")
    }

    fn fixed(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("time")
    }

    #[test]
    fn test_floods_until_next_fixed_start() {
        let mut map = enumerators(&[(1, 10, &[25, 25, 25]), (2, 20, &[30])]);
        let flood = ScheduleItem::flood(0, key(1));
        let next = ScheduleItem::one(1, key(2)).with_start_time(fixed(8, 0));

        let (state, items) = run(&mut map, state(at(6, 0), 2), &flood, &next, at(23, 0));

        // 6:00, 6:25, 6:50, 7:15; the fifth would cross 8:00
        assert_eq!(ids(&items), vec![10, 11, 12, 10]);
        assert_eq!(state.current_time, at(7, 40));
        assert!(!state.in_flood);
        assert_eq!(state.schedule_items.current(), 1);
        assert_eq!(map.get(&key(1)).expect("content").state().index, 1);
    }

    #[test]
    fn test_flood_closes_gap_with_fallback() {
        let mut map = enumerators(&[(1, 10, &[25]), (3, 30, &[1])]);
        let flood = ScheduleItem::flood(0, key(1)).with_filler(FillerPreset::fallback(key(3)));
        let next = ScheduleItem::one(1, key(1)).with_start_time(fixed(7, 0));

        let (state, items) = run(&mut map, state(at(6, 0), 2), &flood, &next, at(23, 0));

        assert_eq!(items.len(), 3);
        assert_eq!(items[2].filler_kind, FillerKind::Fallback);
        assert_eq!(items[2].duration(), TimeDelta::minutes(10));
        assert_eq!(state.current_time, at(7, 0));
    }

    #[test]
    fn test_lone_flood_runs_to_hard_stop_and_stays_in_flood() {
        let mut map = enumerators(&[(1, 10, &[30])]);
        let flood = ScheduleItem::flood(0, key(1)).with_start_time(fixed(6, 0));

        let (state, items) = run(&mut map, state(at(6, 0), 1), &flood, &flood, at(8, 0));

        assert_eq!(items.len(), 4);
        assert!(state.in_flood);
        assert_eq!(state.current_time, at(8, 0));

        // resuming ignores the fixed start while flooding
        let (state, items) = run(&mut map, state, &flood, &flood, at(9, 0));
        assert_eq!(items[0].start, at(8, 0));
        assert_eq!(state.current_time, at(9, 0));
    }

    #[test]
    fn test_post_roll_count_interleaves() {
        let mut map = enumerators(&[(1, 10, &[20]), (2, 20, &[5])]);
        let flood = ScheduleItem::flood(0, key(1))
            .with_filler(FillerPreset::count(FillerKind::PostRoll, key(2), 2));
        let next = ScheduleItem::one(1, key(1)).with_start_time(fixed(7, 0));

        let (_, items) = run(&mut map, state(at(6, 0), 2), &flood, &next, at(23, 0));

        let kinds: Vec<FillerKind> = items.iter().map(|i| i.filler_kind).collect();
        assert_eq!(
            kinds,
            vec![
                FillerKind::None,
                FillerKind::PostRoll,
                FillerKind::PostRoll,
                FillerKind::None,
                FillerKind::PostRoll,
                FillerKind::PostRoll
            ]
        );
    }
}
