use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::collection::{CollectionEnumeratorState, CollectionKey};
use crate::filler::FillerKind;
use crate::ids::{MediaItemId, PlayoutId, ScheduleId};
use crate::media::MediaChapter;
use crate::numbers::GuideGroup;
use crate::schedule::ProgramSchedule;
use crate::template::PlayoutTemplate;

/// A materialized timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayoutItem {
    pub media_item_id: MediaItemId,
    pub start: DateTime<FixedOffset>,
    pub finish: DateTime<FixedOffset>,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_helpers::duration_ms"))]
    pub in_point: TimeDelta,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_helpers::duration_ms"))]
    pub out_point: TimeDelta,
    pub filler_kind: FillerKind,
    pub guide_group: GuideGroup,
    #[cfg_attr(feature = "serde", serde(default))]
    pub custom_title: Option<String>,
    /// End of the guide entry when it differs from `finish`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub guide_finish: Option<DateTime<FixedOffset>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub chapter_title: Option<String>,
}

impl PlayoutItem {
    /// A full-length entry for `media_item_id` starting at `start`.
    pub fn new(
        media_item_id: MediaItemId,
        start: DateTime<FixedOffset>,
        duration: TimeDelta,
        filler_kind: FillerKind,
        guide_group: GuideGroup,
    ) -> Self {
        Self {
            media_item_id,
            start,
            finish: start + duration,
            in_point: TimeDelta::zero(),
            out_point: duration,
            filler_kind,
            guide_group,
            custom_title: None,
            guide_finish: None,
            chapter_title: None,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.finish - self.start
    }

    /// The slice of this entry covering one chapter.
    pub fn for_chapter(&self, chapter: &MediaChapter) -> Self {
        Self {
            in_point: chapter.start,
            out_point: chapter.end,
            finish: self.start + chapter.duration(),
            chapter_title: chapter.title.clone(),
            ..self.clone()
        }
    }

    /// Moves the entry so it starts at `start`, keeping its length.
    pub fn retimed(mut self, start: DateTime<FixedOffset>) -> Self {
        let duration = self.duration();
        self.start = start;
        self.finish = start + duration;
        self
    }
}

/// Resume point saved at the end of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayoutAnchor {
    #[cfg_attr(feature = "serde", serde(default))]
    pub schedule_id: Option<ScheduleId>,
    pub next_start: DateTime<FixedOffset>,
    pub schedule_items_state: CollectionEnumeratorState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub multiple_remaining: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_finish: Option<DateTime<FixedOffset>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub in_flood: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub in_duration_filler: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub next_guide_group: GuideGroup,
}

impl PlayoutAnchor {
    pub fn starting_at(next_start: DateTime<FixedOffset>) -> Self {
        Self {
            schedule_id: None,
            next_start,
            schedule_items_state: CollectionEnumeratorState::default(),
            multiple_remaining: None,
            duration_finish: None,
            in_flood: false,
            in_duration_filler: false,
            next_guide_group: GuideGroup::default(),
        }
    }
}

/// Saved enumerator state for one collection key. Undated anchors hold the
/// latest state; dated anchors are day checkpoints used by refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionAnchor {
    pub collection_key: CollectionKey,
    pub enumerator_state: CollectionEnumeratorState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub anchor_date: Option<DateTime<FixedOffset>>,
}

/// A schedule that replaces the default one on the dates its template
/// matches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlternateSchedule {
    pub template: PlayoutTemplate,
    pub schedule: ProgramSchedule,
}

/// How a build treats existing items and anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlayoutBuildMode {
    /// Extend from the saved anchor.
    #[default]
    Continue,
    /// Rebuild from the day checkpoint covering the build start.
    Refresh,
    /// Discard everything and start over.
    Reset,
}

/// The timeline of one channel together with its resume state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Playout {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: PlayoutId,
    pub schedule: ProgramSchedule,
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternates: Vec<AlternateSchedule>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub items: Vec<PlayoutItem>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub anchor: Option<PlayoutAnchor>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub collection_anchors: Vec<CollectionAnchor>,
}

impl Playout {
    pub fn new(schedule: ProgramSchedule) -> Self {
        Self {
            id: PlayoutId::new(),
            schedule,
            alternates: Vec::new(),
            items: Vec::new(),
            anchor: None,
            collection_anchors: Vec::new(),
        }
    }

    pub fn with_alternate(
        mut self,
        template: PlayoutTemplate,
        schedule: ProgramSchedule,
    ) -> Self {
        self.alternates.push(AlternateSchedule { template, schedule });
        self
    }

    /// The undated anchor for `key`, if any.
    pub fn current_anchor(&self, key: &CollectionKey) -> Option<&CollectionAnchor> {
        self.collection_anchors
            .iter()
            .find(|a| a.collection_key == *key && a.anchor_date.is_none())
    }
}
