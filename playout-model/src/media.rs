use chrono::{NaiveDate, TimeDelta};

use crate::ids::{MediaItemId, ShowId};
use crate::numbers::{EpisodeNumber, SeasonNumber};

/// Kind of playable unit handed over by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaKind {
    #[default]
    Movie,
    Episode,
    MusicVideo,
    Song,
    Image,
    OtherVideo,
}

/// Availability of the file backing a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaItemState {
    #[default]
    Normal,
    FileNotFound,
    Unavailable,
}

/// A chapter mark inside a media item, as offsets from the item start.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaChapter {
    pub chapter_id: u32,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_helpers::duration_ms"))]
    pub start: TimeDelta,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_helpers::duration_ms"))]
    pub end: TimeDelta,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
}

impl MediaChapter {
    pub fn new(chapter_id: u32, start: TimeDelta, end: TimeDelta) -> Self {
        Self {
            chapter_id,
            start,
            end,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// A playable unit. Owned by the external catalog and immutable for the
/// duration of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItem {
    pub id: MediaItemId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: MediaKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub show_id: Option<ShowId>,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_helpers::duration_ms"))]
    pub duration: TimeDelta,
    #[cfg_attr(feature = "serde", serde(default))]
    pub release_date: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub season: Option<SeasonNumber>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub episode: Option<EpisodeNumber>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub track: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub chapters: Vec<MediaChapter>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: MediaItemState,
}

impl MediaItem {
    pub fn new(id: impl Into<MediaItemId>, kind: MediaKind, duration: TimeDelta) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            show_id: None,
            duration,
            release_date: None,
            season: None,
            episode: None,
            track: None,
            chapters: Vec::new(),
            state: MediaItemState::Normal,
        }
    }

    pub fn movie(id: impl Into<MediaItemId>, duration: TimeDelta) -> Self {
        Self::new(id, MediaKind::Movie, duration)
    }

    pub fn episode(
        id: impl Into<MediaItemId>,
        show_id: impl Into<ShowId>,
        duration: TimeDelta,
    ) -> Self {
        let mut item = Self::new(id, MediaKind::Episode, duration);
        item.show_id = Some(show_id.into());
        item
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_season_episode(mut self, season: u16, episode: u16) -> Self {
        self.season = Some(SeasonNumber::new(season));
        self.episode = Some(EpisodeNumber::new(episode));
        self
    }

    pub fn with_track(mut self, track: u32) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_chapters(mut self, chapters: Vec<MediaChapter>) -> Self {
        self.chapters = chapters;
        self
    }

    pub fn with_state(mut self, state: MediaItemState) -> Self {
        self.state = state;
        self
    }

    pub fn is_episode(&self) -> bool {
        self.kind == MediaKind::Episode
    }

    pub fn is_available(&self) -> bool {
        self.state == MediaItemState::Normal
    }

    /// Human readable label used in log output.
    pub fn display_title(&self) -> String {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Episode, Some(season), Some(episode)) => {
                format!("s{season}e{episode} - {}", self.title)
            }
            _ if self.title.is_empty() => format!("[media item {}]", self.id),
            _ => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_formats_episodes() {
        let episode = MediaItem::episode(7, 1, TimeDelta::minutes(22))
            .with_title("Pilot")
            .with_season_episode(1, 2);
        assert_eq!(episode.display_title(), "s01e02 - Pilot");

        let untitled = MediaItem::movie(9, TimeDelta::minutes(90));
        assert_eq!(untitled.display_title(), "[media item 9]");
    }

    #[test]
    fn test_media_item_serializes_duration_as_millis() {
        let item = MediaItem::movie(1, TimeDelta::seconds(90));
        let json = serde_json::to_value(&item).expect("serialize media item");
        assert_eq!(json["duration"], 90_000);

        let back: MediaItem =
            serde_json::from_value(json).expect("deserialize media item");
        assert_eq!(back, item);
    }
}
