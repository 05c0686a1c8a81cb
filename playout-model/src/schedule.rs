use chrono::{NaiveTime, TimeDelta};

use crate::collection::{CollectionKey, PlaybackOrder};
use crate::error::ValidationErrors;
use crate::filler::{FillerKind, FillerPreset};
use crate::ids::{ScheduleId, ScheduleItemId};

/// How content from a rule appears in the program guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GuideMode {
    #[default]
    Normal,
    Filler,
}

/// What happens to the time left at the end of a duration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TailMode {
    /// Leave the remainder to the next rule.
    #[default]
    None,
    /// The channel is off air until the block ends.
    Offline,
    /// Close the remainder with tail and fallback filler.
    Filler,
}

/// How many items a `Multiple` rule plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "mode", content = "value", rename_all = "snake_case")
)]
pub enum MultipleMode {
    Count(u32),
    /// A count expression over `count` and `random`.
    Expression(String),
    CollectionSize,
    PlaylistItemSize,
    MultiEpisodeGroupSize,
}

/// Rule-specific parameters. Fields only exist on the kinds that use them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ScheduleItemKind {
    One,
    Multiple {
        count: MultipleMode,
    },
    Duration {
        #[cfg_attr(
            feature = "serde",
            serde(with = "crate::serde_helpers::duration_ms")
        )]
        playout_duration: TimeDelta,
        #[cfg_attr(feature = "serde", serde(default))]
        tail_mode: TailMode,
    },
    Flood,
}

impl ScheduleItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleItemKind::One => "one",
            ScheduleItemKind::Multiple { .. } => "multiple",
            ScheduleItemKind::Duration { .. } => "duration",
            ScheduleItemKind::Flood => "flood",
        }
    }
}

/// Filler presets attached to a rule, one slot per role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScheduleFillers {
    pub pre_roll: Option<FillerPreset>,
    pub mid_roll: Option<FillerPreset>,
    pub post_roll: Option<FillerPreset>,
    pub tail: Option<FillerPreset>,
    pub fallback: Option<FillerPreset>,
}

impl ScheduleFillers {
    /// Pre, mid and post roll, in that order.
    pub fn rolls(&self) -> impl Iterator<Item = &FillerPreset> {
        self.pre_roll
            .iter()
            .chain(self.mid_roll.iter())
            .chain(self.post_roll.iter())
    }

    pub fn all(&self) -> impl Iterator<Item = &FillerPreset> {
        self.rolls()
            .chain(self.tail.iter())
            .chain(self.fallback.iter())
    }
}

/// One rule of a program schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleItem {
    pub id: ScheduleItemId,
    pub index: u32,
    pub collection: CollectionKey,
    #[cfg_attr(feature = "serde", serde(default))]
    pub playback_order: PlaybackOrder,
    /// Fixed start as an offset into the local day; dynamic when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: Option<NaiveTime>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub custom_title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub guide_mode: GuideMode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fillers: ScheduleFillers,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: ScheduleItemKind,
}

impl ScheduleItem {
    pub fn new(index: u32, collection: CollectionKey, kind: ScheduleItemKind) -> Self {
        Self {
            id: ScheduleItemId::new(u64::from(index)),
            index,
            collection,
            playback_order: PlaybackOrder::default(),
            start_time: None,
            custom_title: None,
            guide_mode: GuideMode::Normal,
            fillers: ScheduleFillers::default(),
            kind,
        }
    }

    pub fn one(index: u32, collection: CollectionKey) -> Self {
        Self::new(index, collection, ScheduleItemKind::One)
    }

    pub fn flood(index: u32, collection: CollectionKey) -> Self {
        Self::new(index, collection, ScheduleItemKind::Flood)
    }

    pub fn multiple(index: u32, collection: CollectionKey, count: MultipleMode) -> Self {
        Self::new(index, collection, ScheduleItemKind::Multiple { count })
    }

    pub fn duration(
        index: u32,
        collection: CollectionKey,
        playout_duration: TimeDelta,
        tail_mode: TailMode,
    ) -> Self {
        Self::new(
            index,
            collection,
            ScheduleItemKind::Duration {
                playout_duration,
                tail_mode,
            },
        )
    }

    pub fn with_id(mut self, id: impl Into<ScheduleItemId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_playback_order(mut self, order: PlaybackOrder) -> Self {
        self.playback_order = order;
        self
    }

    pub fn with_start_time(mut self, start_time: NaiveTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_custom_title(mut self, title: impl Into<String>) -> Self {
        self.custom_title = Some(title.into());
        self
    }

    pub fn with_guide_mode(mut self, guide_mode: GuideMode) -> Self {
        self.guide_mode = guide_mode;
        self
    }

    /// Places the preset in the slot matching its kind.
    pub fn with_filler(mut self, preset: FillerPreset) -> Self {
        match preset.kind {
            FillerKind::PreRoll => self.fillers.pre_roll = Some(preset),
            FillerKind::MidRoll => self.fillers.mid_roll = Some(preset),
            FillerKind::PostRoll => self.fillers.post_roll = Some(preset),
            FillerKind::Tail => self.fillers.tail = Some(preset),
            FillerKind::Fallback => self.fillers.fallback = Some(preset),
            FillerKind::None | FillerKind::GuideMode => {}
        }
        self
    }

    pub fn is_fixed_start(&self) -> bool {
        self.start_time.is_some()
    }

    /// A non-blank custom title collapses the rule's output into one guide
    /// entry.
    pub fn has_custom_title(&self) -> bool {
        self.custom_title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty())
    }

    /// Primary content key followed by every filler key, in role order.
    pub fn collection_keys(&self) -> Vec<CollectionKey> {
        std::iter::once(self.collection)
            .chain(self.fillers.all().map(|preset| preset.collection))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let slots = [
            ("pre_roll", &self.fillers.pre_roll, FillerKind::PreRoll),
            ("mid_roll", &self.fillers.mid_roll, FillerKind::MidRoll),
            ("post_roll", &self.fillers.post_roll, FillerKind::PostRoll),
            ("tail", &self.fillers.tail, FillerKind::Tail),
            ("fallback", &self.fillers.fallback, FillerKind::Fallback),
        ];
        for (field, preset, expected) in slots {
            if let Some(preset) = preset {
                if preset.kind != expected {
                    errors.push(
                        format!("fillers.{field}.kind"),
                        format!("expected {expected:?}, found {:?}", preset.kind),
                    );
                }
                errors.collect(&format!("fillers.{field}"), preset.validate());
            }
        }

        let pads = self.fillers.rolls().filter(|f| f.is_pad()).count();
        if pads > 1 {
            errors.push("fillers", "only one pad-to-nearest-minute filler is allowed");
        }

        match &self.kind {
            ScheduleItemKind::Duration {
                playout_duration, ..
            } if *playout_duration <= TimeDelta::zero() => {
                errors.push("playout_duration", "must be positive");
            }
            ScheduleItemKind::Multiple {
                count: MultipleMode::Expression(text),
            } if text.trim().is_empty() => {
                errors.push("count", "expression must not be empty");
            }
            _ => {}
        }

        if self.playback_order == PlaybackOrder::ShuffleInOrder
            && !matches!(
                self.collection,
                CollectionKey::Collection(_)
                    | CollectionKey::MultiCollection(_)
                    | CollectionKey::SmartCollection(_)
            )
        {
            errors.push(
                "playback_order",
                "shuffle in order requires a collection source",
            );
        }

        errors.into_result()
    }
}

/// An ordered list of rules that describes a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramSchedule {
    pub id: ScheduleId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub keep_multi_part_episodes_together: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub treat_collections_as_shows: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub shuffle_schedule_items: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub random_start_point: bool,
    pub items: Vec<ScheduleItem>,
}

impl ProgramSchedule {
    pub fn new(name: impl Into<String>, items: Vec<ScheduleItem>) -> Self {
        Self {
            id: ScheduleId::new(),
            name: name.into(),
            keep_multi_part_episodes_together: false,
            treat_collections_as_shows: false,
            shuffle_schedule_items: false,
            random_start_point: false,
            items,
        }
    }

    /// Rules sorted by their index.
    pub fn sorted_items(&self) -> Vec<ScheduleItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.index);
        items
    }

    /// Every distinct collection key used by any rule.
    pub fn collection_keys(&self) -> Vec<CollectionKey> {
        let mut keys = Vec::new();
        for item in self.sorted_items() {
            for key in item.collection_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.items.is_empty() {
            errors.push("items", "a schedule needs at least one item");
        }

        for (position, item) in self.items.iter().enumerate() {
            errors.collect(&format!("items[{position}]"), item.validate());
        }

        let mut indices: Vec<u32> = self.items.iter().map(|i| i.index).collect();
        indices.sort_unstable();
        if indices.windows(2).any(|pair| pair[0] == pair[1]) {
            errors.push("items", "schedule item indices must be unique");
        }

        errors.into_result()
    }
}
