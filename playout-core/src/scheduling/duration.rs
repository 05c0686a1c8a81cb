use chrono::{DateTime, FixedOffset, TimeDelta};
use playout_model::{PlayoutItem, ScheduleItem, TailMode};
use tracing::warn;

use super::filler::{add_fallback_filler, close_gap, plan_filler};
use super::state::start_time_after;
use super::{PlayoutBuilderState, ScheduleContext, Scheduled, content_item, in_single_guide_group};
use crate::error::Result;

fn close_block(state: &mut PlayoutBuilderState) {
    state.duration_finish = None;
    state.schedule_items.move_next();
}

/// Marks the block end on the final content item of a closed block.
fn set_guide_finish(items: &mut [PlayoutItem], block_end: DateTime<FixedOffset>) {
    if let Some(last) = items
        .iter_mut()
        .filter(|item| item.filler_kind.is_content())
        .max_by_key(|item| item.finish)
    {
        last.guide_finish = Some(block_end);
    }
}

/// Fills a block of `playout_duration` with whole items. The block closes at
/// the first item that would not fit along with its filler; `tail_mode`
/// decides what happens to the time left over.
pub fn schedule(
    ctx: &mut ScheduleContext<'_>,
    mut state: PlayoutBuilderState,
    item: &ScheduleItem,
    playout_duration: TimeDelta,
    tail_mode: TailMode,
) -> Result<Scheduled> {
    let hard_stop = ctx.hard_stop;
    let mut items = Vec::new();
    let mut block_end = None;
    let mut skipped = 0usize;

    while state.current_time < hard_stop {
        let enumerator = ctx.enumerators.get(&item.collection)?;
        let Some(media) = enumerator.current().cloned() else {
            break;
        };
        let cycle = enumerator.count().max(1);

        let start = start_time_after(&state, item);
        if start >= hard_stop {
            state.current_time = hard_stop;
            break;
        }
        let finish = *state.duration_finish.get_or_insert(start + playout_duration);

        if media.duration > playout_duration {
            warn!(
                title = %media.display_title(),
                duration = ?media.duration,
                ?playout_duration,
                "Skipping item that is longer than the block duration"
            );
            ctx.enumerators
                .get_mut(&item.collection)?
                .move_next(Some(start));
            skipped += 1;
            if skipped >= cycle {
                warn!(schedule_item = item.index, "No item fits the block duration");
                block_end = Some(finish);
                close_block(&mut state);
                break;
            }
            continue;
        }

        let content = content_item(item, &media, start, &state);
        let planned = plan_filler(ctx.enumerators, item, &content, &media.chapters, true)?;
        let end = planned.finish();

        if end <= finish {
            items.extend(planned.commit(ctx.enumerators)?);
            state.current_time = end;
            if !item.has_custom_title() {
                state.increment_guide_group();
            }
            ctx.enumerators
                .get_mut(&item.collection)?
                .move_next(Some(start));
        } else {
            if end - start > playout_duration {
                warn!(
                    block = ?(end - start),
                    ?playout_duration,
                    "Item with filler is longer than the block duration"
                );
            }
            block_end = Some(finish);
            close_block(&mut state);
            break;
        }
    }

    // the block can end exactly on the hard stop
    if let Some(finish) = state.duration_finish
        && state.current_time == finish
    {
        block_end = Some(finish);
        close_block(&mut state);
    }

    if !in_single_guide_group(&items) {
        state.decrement_guide_group();
    }

    if let Some(block_end) = block_end {
        match tail_mode {
            TailMode::Filler => {
                close_gap(ctx.enumerators, item, &mut state, &mut items, block_end)?;
                state.current_time = block_end;
            }
            TailMode::Offline => {
                add_fallback_filler(ctx.enumerators, item, &mut state, &mut items, block_end)?;
                state.current_time = block_end;
            }
            TailMode::None => {}
        }

        if tail_mode != TailMode::Offline {
            set_guide_finish(&mut items, block_end);
        }
    }

    state.increment_guide_group();
    Ok((state, items))
}
