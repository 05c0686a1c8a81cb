use playout_model::{MultipleMode, ScheduleItem};
use tracing::debug;

use super::filler::{add_filler, close_gap};
use super::state::{filler_start_time_after, start_time_after};
use super::{
    PlayoutBuilderState, ScheduleContext, Scheduled, content_item, in_single_guide_group,
    latest_finish,
};
use crate::enumerators::seeds;
use crate::error::Result;
use crate::expressions::evaluate_count;

/// How many items a fresh run of `item` plays.
fn initial_count(ctx: &ScheduleContext<'_>, item: &ScheduleItem, mode: &MultipleMode) -> Result<u32> {
    let enumerator = ctx.enumerators.get(&item.collection)?;
    let size = ctx
        .collection_sizes
        .get(&item.collection)
        .copied()
        .unwrap_or_else(|| enumerator.count());

    let count = match mode {
        MultipleMode::Count(count) => *count,
        MultipleMode::Expression(expression) => {
            let cursor = enumerator.state();
            let random = if size == 0 {
                0
            } else {
                let seed = seeds::derive_seed(cursor.seed ^ u64::from(item.index), cursor.index as u64);
                (seed % size as u64) as usize
            };
            evaluate_count(expression, size, random) as u32
        }
        MultipleMode::CollectionSize => size as u32,
        MultipleMode::PlaylistItemSize => enumerator.current_play_all_size().unwrap_or(1) as u32,
        MultipleMode::MultiEpisodeGroupSize => enumerator.current_group_size().unwrap_or(1) as u32,
    };

    debug!(schedule_item = item.index, ?mode, count, "Starting multiple");
    Ok(count)
}

/// Plays a counted run of items. The remaining count survives a hard stop
/// so the run resumes in the next build.
pub fn schedule(
    ctx: &mut ScheduleContext<'_>,
    mut state: PlayoutBuilderState,
    item: &ScheduleItem,
    mode: &MultipleMode,
    next_item: &ScheduleItem,
) -> Result<Scheduled> {
    let hard_stop = ctx.hard_stop;
    let mut items = Vec::new();

    let first_start = start_time_after(&state, item);
    if first_start >= hard_stop {
        state.current_time = hard_stop;
        return Ok((state, items));
    }
    state.current_time = first_start;

    if state.multiple_remaining.is_none() {
        state.multiple_remaining = Some(initial_count(ctx, item, mode)?);
    }

    while state.multiple_remaining.is_some_and(|remaining| remaining > 0)
        && state.current_time < hard_stop
    {
        let Some(media) = ctx.enumerators.get(&item.collection)?.current().cloned() else {
            break;
        };

        let start = start_time_after(&state, item);
        let content = content_item(item, &media, start, &state);
        let block = add_filler(ctx.enumerators, item, &content, &media.chapters)?;

        state.current_time = latest_finish(&block).unwrap_or(content.finish);
        state.multiple_remaining = state.multiple_remaining.map(|remaining| remaining - 1);
        if !item.has_custom_title() {
            state.increment_guide_group();
        }
        items.extend(block);

        ctx.enumerators
            .get_mut(&item.collection)?
            .move_next(Some(start));
    }

    if state.multiple_remaining == Some(0) {
        state.multiple_remaining = None;
        if !in_single_guide_group(&items) {
            state.decrement_guide_group();
        }
        state.schedule_items.move_next();
    }

    let next_start = filler_start_time_after(&state, next_item, hard_stop);
    close_gap(ctx.enumerators, item, &mut state, &mut items, next_start)?;

    state.increment_guide_group();
    Ok((state, items))
}
