//! Core data model definitions shared across the playout crates.
//!
//! Everything in here is plain data: media items handed over by the catalog,
//! the schedule rules that describe a channel, the persisted enumerator
//! cursors, and the materialized playout timeline. The scheduling logic lives
//! in `playout-core`.
#![allow(missing_docs)]

pub mod collection;
pub mod error;
pub mod filler;
pub mod ids;
pub mod media;
pub mod numbers;
pub mod playout;
pub mod schedule;
#[cfg(feature = "serde")]
pub mod serde_helpers;
pub mod template;

pub use collection::{
    CollectionEnumeratorState, CollectionKey, CollectionWithItems,
    GroupedMediaItem, PlaybackOrder, PlaylistItem, flatten_groups,
};
pub use error::{FieldError, ModelError, Result as ModelResult, ValidationErrors};
pub use filler::{FillerKind, FillerMode, FillerPreset};
pub use ids::{
    CollectionId, MediaItemId, PlaylistId, PlayoutId, ScheduleId,
    ScheduleItemId, ShowId,
};
pub use media::{MediaChapter, MediaItem, MediaItemState, MediaKind};
pub use numbers::{EpisodeNumber, GuideGroup, SeasonNumber};
pub use playout::{
    AlternateSchedule, CollectionAnchor, Playout, PlayoutAnchor,
    PlayoutBuildMode, PlayoutItem,
};
pub use schedule::{
    GuideMode, MultipleMode, ProgramSchedule, ScheduleFillers, ScheduleItem,
    ScheduleItemKind, TailMode,
};
pub use template::{DayOfMonthSet, MonthSet, PlayoutTemplate, WeekdaySet};
