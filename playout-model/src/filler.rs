use chrono::TimeDelta;

use crate::collection::CollectionKey;
use crate::error::ValidationErrors;

/// Role of a playout item relative to the content it surrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FillerKind {
    /// Primary content.
    #[default]
    None,
    PreRoll,
    MidRoll,
    PostRoll,
    Tail,
    Fallback,
    /// Primary content that the rule asked to present as filler in the guide.
    GuideMode,
}

impl FillerKind {
    pub fn is_content(&self) -> bool {
        matches!(self, FillerKind::None | FillerKind::GuideMode)
    }
}

/// How much filler a preset contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FillerMode {
    /// Fill up to a fixed duration.
    Duration,
    /// Play a fixed number of items.
    #[default]
    Count,
    /// Pad so the block ends on a clock boundary.
    Pad,
    /// Play a seeded random number of items between zero and `count`.
    RandomCount,
}

/// A reusable filler configuration referenced by schedule rules.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillerPreset {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub kind: FillerKind,
    pub mode: FillerMode,
    pub collection: CollectionKey,
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "crate::serde_helpers::option_duration_ms")
    )]
    pub duration: Option<TimeDelta>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub count: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pad_to_nearest_minute: Option<u32>,
    /// Filler expression selecting which chapter boundaries receive
    /// mid-roll.
    #[cfg_attr(feature = "serde", serde(default))]
    pub expression: Option<String>,
}

impl FillerPreset {
    pub fn new(kind: FillerKind, mode: FillerMode, collection: CollectionKey) -> Self {
        Self {
            name: String::new(),
            kind,
            mode,
            collection,
            duration: None,
            count: None,
            pad_to_nearest_minute: None,
            expression: None,
        }
    }

    pub fn count(kind: FillerKind, collection: CollectionKey, count: u32) -> Self {
        let mut preset = Self::new(kind, FillerMode::Count, collection);
        preset.count = Some(count);
        preset
    }

    pub fn duration(
        kind: FillerKind,
        collection: CollectionKey,
        duration: TimeDelta,
    ) -> Self {
        let mut preset = Self::new(kind, FillerMode::Duration, collection);
        preset.duration = Some(duration);
        preset
    }

    pub fn pad(kind: FillerKind, collection: CollectionKey, minutes: u32) -> Self {
        let mut preset = Self::new(kind, FillerMode::Pad, collection);
        preset.pad_to_nearest_minute = Some(minutes);
        preset
    }

    /// Tail and fallback presets only need a collection.
    pub fn tail(collection: CollectionKey) -> Self {
        Self::new(FillerKind::Tail, FillerMode::Count, collection)
    }

    pub fn fallback(collection: CollectionKey) -> Self {
        Self::new(FillerKind::Fallback, FillerMode::Count, collection)
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pad presets with a usable boundary.
    pub fn is_pad(&self) -> bool {
        self.mode == FillerMode::Pad && self.pad_to_nearest_minute.is_some()
    }

    /// Checks every field and reports all problems together.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if matches!(self.kind, FillerKind::None | FillerKind::GuideMode) {
            errors.push("kind", "filler presets need a filler kind");
        }

        let rolls = matches!(
            self.kind,
            FillerKind::PreRoll | FillerKind::MidRoll | FillerKind::PostRoll
        );

        if rolls {
            match self.mode {
                FillerMode::Duration => match self.duration {
                    Some(d) if d > TimeDelta::zero() => {}
                    Some(_) => errors.push("duration", "must be positive"),
                    None => errors.push(
                        "duration",
                        "is required for duration filler",
                    ),
                },
                FillerMode::Count | FillerMode::RandomCount => {
                    if self.count.is_none() {
                        errors.push("count", "is required for count filler");
                    }
                }
                FillerMode::Pad => match self.pad_to_nearest_minute {
                    Some(m) if m > 0 && 60 % m == 0 => {}
                    Some(m) => errors.push(
                        "pad_to_nearest_minute",
                        format!("{m} does not divide an hour evenly"),
                    ),
                    None => errors.push(
                        "pad_to_nearest_minute",
                        "is required for pad filler",
                    ),
                },
            }
        }

        if self.expression.is_some() && self.kind != FillerKind::MidRoll {
            errors.push("expression", "only mid-roll filler uses expressions");
        }

        errors.into_result()
    }
}
