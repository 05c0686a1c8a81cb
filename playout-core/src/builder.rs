//! Day-by-day orchestration of a playout build.
//!
//! A build window is cut at local midnights. Each day runs the mode
//! schedulers rule by rule against freshly built enumerators, then saves a
//! playout anchor and one collection anchor per key so the next day (or the
//! next build) resumes exactly where this one stopped.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, Utc};
use playout_model::{
    CollectionAnchor, CollectionEnumeratorState, CollectionKey, MediaItem, Playout, PlayoutAnchor,
    PlayoutBuildMode, ProgramSchedule, ScheduleItem,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::MediaCatalog;
use crate::enumerators::factory::{EnumeratorFactory, is_playable, playback_orders};
use crate::enumerators::seeds::SeedSource;
use crate::enumerators::EnumeratorMap;
use crate::error::{Result, SchedulingError};
use crate::scheduling::{
    self, PlayoutBuilderState, ScheduleContext, ScheduleItemsEnumerator, start_time_after,
};
use crate::selector;

/// Knobs for a build. `playout-config` produces these from its file and
/// environment layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSettings {
    pub days_to_build: u32,
    /// Items finishing this long before the build start are dropped.
    pub trim_history: TimeDelta,
    /// Rule visits at an unchanged clock before the build gives up.
    pub loop_detection_threshold: u32,
    pub skip_missing_items: bool,
    /// Base seed for brand-new enumerator states; entropy when unset.
    pub seed: Option<u64>,
    /// Channel-local offset used for day boundaries and fixed start times.
    pub utc_offset: FixedOffset,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            days_to_build: 2,
            trim_history: TimeDelta::hours(4),
            loop_detection_threshold: 6,
            skip_missing_items: false,
            seed: None,
            utc_offset: Utc.fix(),
        }
    }
}

/// Summary of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub mode: PlayoutBuildMode,
    pub start: DateTime<FixedOffset>,
    pub finish: DateTime<FixedOffset>,
    pub items_added: usize,
    /// Items replaced past the resume point plus items trimmed as history.
    pub items_removed: usize,
    pub days_built: usize,
    /// The build stopped early; the playout is consistent up to its anchor.
    pub cancelled: bool,
    pub next_start: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Default)]
struct SegmentOutcome {
    added: usize,
    removed: usize,
    cancelled: bool,
}

/// Start of the local day containing `time`.
fn day_start(time: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    time - time.time().signed_duration_since(NaiveTime::MIN)
}

/// Builds playouts from a catalog.
#[derive(Debug)]
pub struct PlayoutBuilder<'a, C: MediaCatalog + ?Sized> {
    catalog: &'a C,
    settings: BuilderSettings,
    seeds: SeedSource,
    cancellation: CancellationToken,
}

impl<'a, C: MediaCatalog + ?Sized> PlayoutBuilder<'a, C> {
    pub fn new(catalog: &'a C, settings: BuilderSettings) -> Self {
        let seeds = SeedSource::from_config(settings.seed);
        Self {
            catalog,
            settings,
            seeds,
            cancellation: CancellationToken::new(),
        }
    }

    /// Checked between rules; a cancelled build keeps everything scheduled
    /// so far and saves its anchors.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Builds `days_to_build` days from `now`.
    pub fn build(
        &self,
        playout: &mut Playout,
        mode: PlayoutBuildMode,
        now: DateTime<FixedOffset>,
    ) -> Result<BuildOutcome> {
        let start = now.with_timezone(&self.settings.utc_offset);
        let finish = start + TimeDelta::days(i64::from(self.settings.days_to_build));
        self.build_window(playout, mode, start, finish)
    }

    /// Builds the window `[start, finish)`. On error the playout is left as
    /// it was when validation fails; a scheduling failure part-way leaves the
    /// days completed before it.
    pub fn build_window(
        &self,
        playout: &mut Playout,
        mode: PlayoutBuildMode,
        start: DateTime<FixedOffset>,
        finish: DateTime<FixedOffset>,
    ) -> Result<BuildOutcome> {
        let start = start.with_timezone(&self.settings.utc_offset);
        let finish = finish.with_timezone(&self.settings.utc_offset);
        let media = self.validate(playout)?;

        info!(playout = %playout.id, ?mode, %start, %finish, "Building playout");

        let mut outcome = BuildOutcome {
            mode,
            start,
            finish,
            items_added: 0,
            items_removed: 0,
            days_built: 0,
            cancelled: false,
            next_start: None,
        };

        let mut random_start = false;
        match mode {
            PlayoutBuildMode::Continue => prune_old_checkpoints(playout, start),
            PlayoutBuildMode::Refresh => {
                outcome.items_removed += playout.items.len();
                self.prepare_refresh(playout, start);
            }
            PlayoutBuildMode::Reset => {
                outcome.items_removed += playout.items.len();
                playout.items.clear();
                playout.anchor = None;
                playout.collection_anchors.clear();
                random_start = true;
            }
        }

        let mut segment_start = start;
        let mut day_end = day_start(start) + TimeDelta::days(1);
        loop {
            let (segment_finish, checkpoint) = if day_end < finish {
                (day_end, true)
            } else {
                (finish, false)
            };
            if segment_start >= segment_finish && !checkpoint {
                break;
            }

            let day = day_start(segment_finish - TimeDelta::nanoseconds(1)).date_naive();
            let schedule = selector::schedule_for(playout, day).clone();
            let random = random_start && schedule.random_start_point;
            debug!(%segment_start, %segment_finish, schedule = %schedule.name, "Building day");

            let segment = self.build_segment(
                playout,
                &schedule,
                &media,
                segment_start,
                segment_finish,
                checkpoint,
                random,
            )?;
            random_start = false;
            outcome.items_added += segment.added;
            outcome.items_removed += segment.removed;
            outcome.days_built += 1;

            if segment.cancelled {
                warn!(playout = %playout.id, "Playout build cancelled");
                outcome.cancelled = true;
                break;
            }
            if !checkpoint {
                break;
            }

            segment_start = playout.anchor.as_ref().map_or(day_end, |a| a.next_start);
            day_end += TimeDelta::days(1);
        }

        let trim_before = start - self.settings.trim_history;
        let before = playout.items.len();
        playout.items.retain(|item| item.finish >= trim_before);
        outcome.items_removed += before - playout.items.len();

        for item in playout.items.iter().filter(|item| item.start > finish) {
            let grouped = playout
                .items
                .iter()
                .any(|other| !std::ptr::eq(other, item) && other.guide_group == item.guide_group);
            if !grouped {
                error!(start = %item.start, hard_stop = %finish, "Playout item scheduled after the hard stop");
            }
        }

        outcome.next_start = playout.anchor.as_ref().map(|a| a.next_start);
        info!(
            playout = %playout.id,
            added = outcome.items_added,
            removed = outcome.items_removed,
            days = outcome.days_built,
            cancelled = outcome.cancelled,
            "Playout build finished"
        );
        Ok(outcome)
    }

    /// Checks every schedule the playout can use and gathers the playable
    /// items behind each key. Nothing is mutated when this fails.
    fn validate(&self, playout: &Playout) -> Result<BTreeMap<CollectionKey, Vec<MediaItem>>> {
        let schedules =
            std::iter::once(&playout.schedule).chain(playout.alternates.iter().map(|a| &a.schedule));

        let mut media = BTreeMap::new();
        for schedule in schedules {
            if schedule.items.is_empty() {
                warn!(schedule = %schedule.name, "Schedule has no items");
                return Err(SchedulingError::InvalidSchedule(format!(
                    "schedule '{}' has no items",
                    schedule.name
                )));
            }
            schedule.validate()?;

            for key in schedule.collection_keys() {
                if media.contains_key(&key) {
                    continue;
                }
                let all = self.catalog.media_items(&key);
                let total = all.len();
                let items: Vec<MediaItem> = all
                    .into_iter()
                    .filter(|item| is_playable(item, self.settings.skip_missing_items))
                    .collect();
                if items.len() < total {
                    warn!(%key, skipped = total - items.len(), "Skipping unplayable media items");
                }
                if items.is_empty() {
                    error!(%key, "Unable to rebuild playout; collection has no valid items");
                    return Err(SchedulingError::EmptyCollection(key));
                }
                media.insert(key, items);
            }
        }
        Ok(media)
    }

    /// Drops items and the live anchor, then rewinds every collection to its
    /// earliest checkpoint on the build date.
    fn prepare_refresh(&self, playout: &mut Playout, start: DateTime<FixedOffset>) {
        playout.items.clear();
        playout.anchor = None;

        let date = start.date_naive();
        let midnight = day_start(start);
        let mut earliest: BTreeMap<CollectionKey, CollectionAnchor> = BTreeMap::new();
        for anchor in playout.collection_anchors.drain(..) {
            let Some(anchor_date) = anchor.anchor_date else {
                continue;
            };
            let anchor_date = anchor_date.with_timezone(&start.timezone());
            if anchor_date < midnight || anchor_date.date_naive() > date {
                continue;
            }
            match earliest.get(&anchor.collection_key) {
                Some(existing) if existing.anchor_date <= anchor.anchor_date => {}
                _ => {
                    earliest.insert(anchor.collection_key, anchor);
                }
            }
        }
        playout.collection_anchors = earliest.into_values().collect();

        if let Some(next_start) = playout.collection_anchors.iter().filter_map(|a| a.anchor_date).min() {
            let mut anchor = PlayoutAnchor::starting_at(next_start);
            anchor.schedule_items_state =
                CollectionEnumeratorState::with_seed(self.seeds.schedule_seed());
            debug!(%next_start, "Refreshing from checkpoint");
            playout.anchor = Some(anchor);
        }
    }

    /// Cursor state for `key`: the live anchor, else the latest checkpoint,
    /// else a fresh seed.
    fn enumerator_state(&self, playout: &Playout, key: &CollectionKey) -> CollectionEnumeratorState {
        playout
            .current_anchor(key)
            .or_else(|| {
                playout
                    .collection_anchors
                    .iter()
                    .filter(|a| a.collection_key == *key)
                    .max_by_key(|a| a.anchor_date)
            })
            .map(|a| a.enumerator_state)
            .unwrap_or_else(|| CollectionEnumeratorState::with_seed(self.seeds.seed_for(key)))
    }

    fn enumerators(
        &self,
        playout: &Playout,
        schedule: &ProgramSchedule,
        media: &BTreeMap<CollectionKey, Vec<MediaItem>>,
        random_start: bool,
    ) -> (EnumeratorMap, BTreeMap<CollectionKey, usize>) {
        let factory = EnumeratorFactory::new(self.catalog, schedule)
            .with_random_start(random_start)
            .with_skip_missing(self.settings.skip_missing_items);
        let orders = playback_orders(schedule);

        let mut map = EnumeratorMap::new();
        let mut sizes = BTreeMap::new();
        for key in schedule.collection_keys() {
            let items = media.get(&key).cloned().unwrap_or_default();
            let order = orders.get(&key).copied().unwrap_or_default();
            let state = self.enumerator_state(playout, &key);
            sizes.insert(key, items.len());
            map.insert(key, factory.build(key, items, order, state));
        }
        (map, sizes)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_segment(
        &self,
        playout: &mut Playout,
        schedule: &ProgramSchedule,
        media: &BTreeMap<CollectionKey, Vec<MediaItem>>,
        start: DateTime<FixedOffset>,
        finish: DateTime<FixedOffset>,
        save_checkpoint: bool,
        random_start: bool,
    ) -> Result<SegmentOutcome> {
        let mut outcome = SegmentOutcome::default();
        let sorted = schedule.sorted_items();
        let (mut enumerators, sizes) = self.enumerators(playout, schedule, media, random_start);

        let saved = playout.anchor.clone();
        let same_schedule = saved
            .as_ref()
            .is_some_and(|a| a.schedule_id.is_none_or(|id| id == schedule.id));
        let cursor_state = saved
            .as_ref()
            .filter(|_| same_schedule)
            .map(|a| a.schedule_items_state)
            .unwrap_or_else(|| CollectionEnumeratorState::with_seed(self.seeds.schedule_seed()));
        let schedule_items =
            ScheduleItemsEnumerator::new(sorted.len(), schedule.shuffle_schedule_items, cursor_state);

        let mut state = match &saved {
            Some(anchor) => {
                let mut state = PlayoutBuilderState::from_anchor(anchor, schedule_items);
                if !same_schedule {
                    debug!(schedule = %schedule.name, "Schedule changed; restarting rule cursor");
                    state.clear_rule_progress();
                }
                state
            }
            None => {
                let time = start_anchor(&schedule_items, &sorted, start);
                PlayoutBuilderState::new(schedule_items, time)
            }
        };

        if state.current_time >= finish {
            return Ok(outcome);
        }

        let resume = state.current_time;
        let before = playout.items.len();
        playout.items.retain(|item| item.start < resume);
        outcome.removed = before - playout.items.len();
        if outcome.removed > 0 {
            warn!(count = outcome.removed, %resume, "Removed items beyond the resume point");
        }

        let mut ctx = ScheduleContext {
            enumerators: &mut enumerators,
            collection_sizes: &sizes,
            hard_stop: finish,
        };
        let mut visits: HashMap<DateTime<FixedOffset>, u32> = HashMap::new();
        let mut empty_rules = BTreeSet::new();

        while state.current_time < finish {
            if self.cancellation.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let position = state.schedule_items.current();
            let item = rule_at(&sorted, position)?;
            let next_item = rule_at(&sorted, state.schedule_items.peek_next())?;

            // skipped empty rules leave the clock alone without looping
            if scheduling::has_content(ctx.enumerators, item)? {
                empty_rules.clear();
                let seen = visits.entry(state.current_time).or_default();
                *seen += 1;
                if *seen >= self.settings.loop_detection_threshold {
                    warn!(time = %state.current_time, "Failed to schedule beyond this time; aborting build");
                    return Err(SchedulingError::SchedulingLoop(state.current_time));
                }
            } else {
                empty_rules.insert(position);
            }

            let (next_state, items) = scheduling::schedule(&mut ctx, state, item, next_item)?;
            outcome.added += items.len();
            playout.items.extend(items);
            state = next_state;

            if empty_rules.len() >= sorted.len() {
                warn!(time = %state.current_time, "No schedule item has playable media; ending day");
                break;
            }
        }

        let anchor_item = rule_at(&sorted, state.schedule_items.current())?;
        let mut anchor = state.to_anchor();
        anchor.next_start = start_time_after(&state, anchor_item);
        anchor.schedule_id = Some(schedule.id);
        let checkpoint = save_checkpoint.then_some(anchor.next_start);
        playout.anchor = Some(anchor);

        save_collection_anchors(playout, &enumerators, checkpoint);
        Ok(outcome)
    }
}

/// Where scheduling starts without a saved anchor: midnight of the
/// segment's day, or the first rule's fixed start on that day.
fn start_anchor(
    schedule_items: &ScheduleItemsEnumerator,
    sorted: &[ScheduleItem],
    start: DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    let midnight = day_start(start);
    sorted
        .get(schedule_items.current())
        .and_then(|item| item.start_time)
        .map_or(midnight, |time| midnight + time.signed_duration_since(NaiveTime::MIN))
}

fn rule_at(sorted: &[ScheduleItem], position: usize) -> Result<&ScheduleItem> {
    sorted.get(position).ok_or_else(|| {
        SchedulingError::Internal(format!(
            "schedule item position {position} out of range for {} items",
            sorted.len()
        ))
    })
}

/// Drops checkpoints dated before the build day.
fn prune_old_checkpoints(playout: &mut Playout, start: DateTime<FixedOffset>) {
    let midnight = day_start(start);
    playout
        .collection_anchors
        .retain(|a| a.anchor_date.is_none_or(|date| date >= midnight));
}

/// Replaces the live anchor of every enumerated key. With a checkpoint date
/// the new anchor is dated instead, and older checkpoints are kept.
fn save_collection_anchors(
    playout: &mut Playout,
    enumerators: &EnumeratorMap,
    checkpoint: Option<DateTime<FixedOffset>>,
) {
    for key in enumerators.keys() {
        let Ok(enumerator) = enumerators.get(key) else {
            continue;
        };
        playout
            .collection_anchors
            .retain(|a| a.collection_key != *key || a.anchor_date.is_some());
        playout.collection_anchors.push(CollectionAnchor {
            collection_key: *key,
            enumerator_state: enumerator.state(),
            anchor_date: checkpoint,
        });
    }
}
