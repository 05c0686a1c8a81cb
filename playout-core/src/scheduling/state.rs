use chrono::{DateTime, Days, FixedOffset, NaiveTime};
use playout_model::{GuideGroup, PlayoutAnchor, ScheduleItem, ScheduleItemKind};

use super::schedule_items::ScheduleItemsEnumerator;

/// Working state threaded through every scheduler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayoutBuilderState {
    pub schedule_items: ScheduleItemsEnumerator,
    pub current_time: DateTime<FixedOffset>,
    /// Items left to play for an unfinished `Multiple` rule.
    pub multiple_remaining: Option<u32>,
    /// End of the `Duration` block in progress.
    pub duration_finish: Option<DateTime<FixedOffset>>,
    pub in_flood: bool,
    pub in_duration_filler: bool,
    pub next_guide_group: GuideGroup,
}

impl PlayoutBuilderState {
    pub fn new(schedule_items: ScheduleItemsEnumerator, current_time: DateTime<FixedOffset>) -> Self {
        Self {
            schedule_items,
            current_time,
            multiple_remaining: None,
            duration_finish: None,
            in_flood: false,
            in_duration_filler: false,
            next_guide_group: GuideGroup::default(),
        }
    }

    /// Restores a state from a saved anchor.
    pub fn from_anchor(anchor: &PlayoutAnchor, schedule_items: ScheduleItemsEnumerator) -> Self {
        Self {
            schedule_items,
            current_time: anchor.next_start,
            multiple_remaining: anchor.multiple_remaining,
            duration_finish: anchor.duration_finish,
            in_flood: anchor.in_flood,
            in_duration_filler: anchor.in_duration_filler,
            next_guide_group: anchor.next_guide_group,
        }
    }

    pub fn to_anchor(&self) -> PlayoutAnchor {
        PlayoutAnchor {
            schedule_id: None,
            next_start: self.current_time,
            schedule_items_state: self.schedule_items.state(),
            multiple_remaining: self.multiple_remaining,
            duration_finish: self.duration_finish,
            in_flood: self.in_flood,
            in_duration_filler: self.in_duration_filler,
            next_guide_group: self.next_guide_group,
        }
    }

    /// Clears everything that belongs to a rule in progress.
    pub fn clear_rule_progress(&mut self) {
        self.multiple_remaining = None;
        self.duration_finish = None;
        self.in_flood = false;
        self.in_duration_filler = false;
    }

    pub fn increment_guide_group(&mut self) {
        self.next_guide_group = self.next_guide_group.next();
    }

    pub fn decrement_guide_group(&mut self) {
        self.next_guide_group = self.next_guide_group.previous();
    }

    /// Whether `item` is part-way through and must continue from the clock
    /// instead of waiting for its fixed start.
    pub fn is_incomplete(&self, item: &ScheduleItem) -> bool {
        match item.kind {
            ScheduleItemKind::Multiple { .. } => self.multiple_remaining.is_some(),
            ScheduleItemKind::Duration { .. } => {
                self.duration_finish.is_some() || self.in_duration_filler
            }
            ScheduleItemKind::Flood => self.in_flood,
            ScheduleItemKind::One => false,
        }
    }
}

/// The next occurrence of `start` on or after `time`, in `time`'s offset.
pub fn next_occurrence(time: DateTime<FixedOffset>, start: NaiveTime) -> DateTime<FixedOffset> {
    let local = time.naive_local();
    let mut target = local.date().and_time(start);
    if local.time() > start {
        target = target.checked_add_days(Days::new(1)).unwrap_or(target);
    }
    time + (target - local)
}

/// When `item` should start given the current clock.
pub fn start_time_after(state: &PlayoutBuilderState, item: &ScheduleItem) -> DateTime<FixedOffset> {
    match item.start_time {
        Some(start) if !state.is_incomplete(item) => next_occurrence(state.current_time, start),
        _ => state.current_time,
    }
}

/// Like [`start_time_after`] but never later than `hard_stop`; filler never
/// runs past the end of the build.
pub fn filler_start_time_after(
    state: &PlayoutBuilderState,
    item: &ScheduleItem,
    hard_stop: DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    start_time_after(state, item).min(hard_stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use playout_model::{CollectionEnumeratorState, CollectionId, CollectionKey};

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-5 * 3600)
            .expect("offset")
            .with_ymd_and_hms(2024, 3, 10, hour, minute, 0)
            .single()
            .expect("valid time")
    }

    fn state(time: DateTime<FixedOffset>) -> PlayoutBuilderState {
        PlayoutBuilderState::new(
            ScheduleItemsEnumerator::new(1, false, CollectionEnumeratorState::default()),
            time,
        )
    }

    fn key() -> CollectionKey {
        CollectionKey::Collection(CollectionId::new(1))
    }

    #[test]
    fn test_fixed_start_later_today_or_tomorrow() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("time");
        let item = ScheduleItem::one(0, key()).with_start_time(nine);

        assert_eq!(start_time_after(&state(at(8, 30)), &item), at(9, 0));
        assert_eq!(start_time_after(&state(at(9, 0)), &item), at(9, 0));
        assert_eq!(
            start_time_after(&state(at(9, 1)), &item),
            at(9, 0) + chrono::TimeDelta::days(1)
        );
    }

    #[test]
    fn test_incomplete_rules_ignore_fixed_start() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("time");
        let flood = ScheduleItem::flood(0, key()).with_start_time(nine);

        let mut flooding = state(at(10, 0));
        flooding.in_flood = true;
        assert_eq!(start_time_after(&flooding, &flood), at(10, 0));

        flooding.in_flood = false;
        assert_eq!(
            filler_start_time_after(&flooding, &flood, at(12, 0)),
            at(12, 0)
        );
    }

    #[test]
    fn test_anchor_round_trip() {
        let mut original = state(at(7, 15));
        original.multiple_remaining = Some(2);
        original.increment_guide_group();

        let anchor = original.to_anchor();
        let restored = PlayoutBuilderState::from_anchor(&anchor, original.schedule_items.clone());
        assert_eq!(restored, original);
    }
}
