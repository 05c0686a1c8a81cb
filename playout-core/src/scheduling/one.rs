use playout_model::ScheduleItem;

use super::filler::{add_filler, close_gap};
use super::state::{filler_start_time_after, start_time_after};
use super::{PlayoutBuilderState, ScheduleContext, Scheduled, content_item, latest_finish};
use crate::error::Result;

/// Plays a single item from the rule's collection, then closes the gap to
/// the next rule.
pub fn schedule(
    ctx: &mut ScheduleContext<'_>,
    mut state: PlayoutBuilderState,
    item: &ScheduleItem,
    next_item: &ScheduleItem,
) -> Result<Scheduled> {
    let Some(media) = ctx.enumerators.get(&item.collection)?.current().cloned() else {
        return Ok((state, Vec::new()));
    };

    let start = start_time_after(&state, item);
    if start >= ctx.hard_stop {
        state.current_time = ctx.hard_stop;
        return Ok((state, Vec::new()));
    }

    let content = content_item(item, &media, start, &state);
    let mut items = add_filler(ctx.enumerators, item, &content, &media.chapters)?;
    state.current_time = latest_finish(&items).unwrap_or(content.finish);

    state.schedule_items.move_next();
    ctx.enumerators
        .get_mut(&item.collection)?
        .move_next(Some(start));

    let next_start = filler_start_time_after(&state, next_item, ctx.hard_stop);
    close_gap(ctx.enumerators, item, &mut state, &mut items, next_start)?;

    state.increment_guide_group();
    Ok((state, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::test_support::*;
    use chrono::{NaiveTime, TimeDelta};
    use playout_model::{FillerKind, FillerPreset, GuideGroup};

    #[test]
    fn test_one_plays_a_single_item_and_advances() {
        let mut map = enumerators(&[(1, 10, &[30, 30])]);
        let sizes = sizes(&map);
        let mut ctx = ScheduleContext {
            enumerators: &mut map,
            collection_sizes: &sizes,
            hard_stop: at(12, 0),
        };
        let item = ScheduleItem::one(0, key(1));
        let other = ScheduleItem::one(1, key(1));

        let (state, items) = schedule(&mut ctx, state(at(9, 0), 2), &item, &other).expect("schedule");

        assert_eq!(ids(&items), vec![10]);
        assert_eq!(state.current_time, at(9, 30));
        assert_eq!(state.schedule_items.current(), 1);
        assert_eq!(state.next_guide_group, GuideGroup::default().next());
        assert_eq!(ctx.enumerators.get(&key(1)).expect("content").state().index, 1);
    }

    #[test]
    fn test_gap_before_fixed_next_rule_gets_tail_then_fallback() {
        let mut map = enumerators(&[(1, 10, &[25]), (2, 20, &[2]), (3, 30, &[1])]);
        let sizes = sizes(&map);
        let mut ctx = ScheduleContext {
            enumerators: &mut map,
            collection_sizes: &sizes,
            hard_stop: at(12, 0),
        };
        let item = ScheduleItem::one(0, key(1))
            .with_filler(FillerPreset::tail(key(2)))
            .with_filler(FillerPreset::fallback(key(3)));
        let next = ScheduleItem::one(1, key(1))
            .with_start_time(NaiveTime::from_hms_opt(9, 30, 0).expect("time"));

        let (state, items) = schedule(&mut ctx, state(at(9, 0), 2), &item, &next).expect("schedule");

        let kinds: Vec<FillerKind> = items.iter().map(|i| i.filler_kind).collect();
        assert_eq!(
            kinds,
            vec![
                FillerKind::None,
                FillerKind::Tail,
                FillerKind::Tail,
                FillerKind::Fallback
            ]
        );
        assert_eq!(items[3].duration(), TimeDelta::minutes(1));
        assert_eq!(state.current_time, at(9, 30));
    }

    #[test]
    fn test_start_at_hard_stop_emits_nothing() {
        let mut map = enumerators(&[(1, 10, &[30])]);
        let sizes = sizes(&map);
        let mut ctx = ScheduleContext {
            enumerators: &mut map,
            collection_sizes: &sizes,
            hard_stop: at(10, 0),
        };
        let item = ScheduleItem::one(0, key(1))
            .with_start_time(NaiveTime::from_hms_opt(11, 0, 0).expect("time"));

        let (state, items) = schedule(&mut ctx, state(at(9, 0), 1), &item, &item).expect("schedule");

        assert!(items.is_empty());
        assert_eq!(state.current_time, at(10, 0));
        assert_eq!(state.schedule_items.state().index, 0);
    }
}
