use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Weekday};
use playout_core::{BuilderSettings, InMemoryCatalog, PlayoutBuilder, SchedulingError};
use playout_model::{
    CollectionId, CollectionKey, FillerKind, FillerPreset, MediaItem, MultipleMode, PlaybackOrder,
    Playout, PlayoutBuildMode, PlayoutItem, PlayoutTemplate, PlaylistId, PlaylistItem,
    ProgramSchedule, ScheduleItem, TailMode, WeekdaySet,
};
use tokio_util::sync::CancellationToken;

fn key(id: u64) -> CollectionKey {
    CollectionKey::Collection(CollectionId::new(id))
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset")
        .with_ymd_and_hms(2024, 5, day, hour, minute, 0)
        .single()
        .expect("valid time")
}

fn movies(first_id: u64, minutes: &[i64]) -> Vec<MediaItem> {
    minutes
        .iter()
        .enumerate()
        .map(|(i, m)| MediaItem::movie(first_id + i as u64, TimeDelta::minutes(*m)))
        .collect()
}

fn settings() -> BuilderSettings {
    BuilderSettings {
        seed: Some(42),
        trim_history: TimeDelta::days(30),
        ..BuilderSettings::default()
    }
}

fn schedule(items: Vec<ScheduleItem>) -> Playout {
    Playout::new(ProgramSchedule::new("test", items))
}

fn ids(items: &[PlayoutItem]) -> Vec<u64> {
    items.iter().map(|item| item.media_item_id.value()).collect()
}

fn content(items: &[PlayoutItem]) -> Vec<&PlayoutItem> {
    items.iter().filter(|item| item.filler_kind.is_content()).collect()
}

#[test]
fn duration_blocks_fill_exactly() {
    let catalog = InMemoryCatalog::new().with_collection(1, movies(10, &[60, 60, 60, 60]));
    let mut playout = schedule(vec![
        ScheduleItem::duration(0, key(1), TimeDelta::hours(3), TailMode::None)
            .with_playback_order(PlaybackOrder::Chronological),
    ]);

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 6, 0))
        .expect("build");

    assert_eq!(ids(&playout.items), vec![10, 11, 12, 13, 10, 11]);
    let guide_finishes: Vec<_> = playout.items.iter().map(|i| i.guide_finish).collect();
    assert_eq!(
        guide_finishes,
        vec![None, None, Some(at(1, 3, 0)), None, None, Some(at(1, 6, 0))]
    );
}

#[test]
fn offline_tail_leaves_gap_until_block_end() {
    let catalog = InMemoryCatalog::new().with_collection(1, movies(10, &[55]));
    let mut playout = schedule(vec![ScheduleItem::duration(
        0,
        key(1),
        TimeDelta::hours(2),
        TailMode::Offline,
    )]);

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 4, 0))
        .expect("build");

    let starts: Vec<_> = playout.items.iter().map(|i| i.start).collect();
    assert_eq!(starts, vec![at(1, 0, 0), at(1, 0, 55), at(1, 2, 0), at(1, 2, 55)]);
    assert!(playout.items.iter().all(|i| i.guide_finish.is_none()));
    assert_eq!(playout.anchor.expect("anchor").next_start, at(1, 4, 0));
}

#[test]
fn pad_to_nearest_quarter_hour() {
    let catalog = InMemoryCatalog::new()
        .with_collection(1, movies(10, &[16]))
        .with_collection(2, movies(20, &[30]))
        .with_collection(3, movies(30, &[1]));
    let pad = FillerPreset::pad(FillerKind::PostRoll, key(3), 15);
    let mut playout = schedule(vec![
        ScheduleItem::one(0, key(1)).with_filler(pad.clone()),
        ScheduleItem::one(1, key(2)).with_filler(pad),
    ]);

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 1, 20))
        .expect("build");

    let shows = content(&playout.items);
    // :16 pads to :30, and an end exactly on :00 pads a full interval
    assert_eq!(shows[0].start, at(1, 0, 0));
    assert_eq!(shows[1].start, at(1, 0, 30));
    assert_eq!(shows[2].start, at(1, 1, 15));
    assert!(
        playout
            .items
            .iter()
            .filter(|i| !i.filler_kind.is_content())
            .all(|i| i.filler_kind == FillerKind::PostRoll)
    );
    assert!(playout.items.windows(2).all(|w| w[0].finish == w[1].start));
}

#[test]
fn playlist_plays_entries_in_turn() {
    let playlist = CollectionKey::Playlist(PlaylistId::new(5));
    let catalog = InMemoryCatalog::new()
        .with_collection(1, movies(10, &[30]))
        .with_collection(2, movies(20, &[30, 30]))
        .with_collection(3, movies(30, &[30, 30]))
        .with_playlist(
            5,
            vec![
                PlaylistItem::new(0, key(1), PlaybackOrder::Chronological),
                PlaylistItem::new(1, key(2), PlaybackOrder::Chronological).play_all(),
                PlaylistItem::new(2, key(3), PlaybackOrder::Chronological),
            ],
        );
    let mut playout = schedule(vec![ScheduleItem::one(0, playlist)]);

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 4, 0))
        .expect("build");

    assert_eq!(ids(&playout.items), vec![10, 20, 21, 30, 10, 20, 21, 31]);
}

fn resumable_playout() -> (InMemoryCatalog, Playout) {
    let catalog = InMemoryCatalog::new()
        .with_collection(1, movies(10, &[20, 25, 35, 40, 22]))
        .with_collection(2, movies(20, &[45, 50, 30]))
        .with_collection(3, movies(30, &[2, 3, 4]));
    let playout = schedule(vec![
        ScheduleItem::multiple(0, key(1), MultipleMode::Count(2)),
        ScheduleItem::one(1, key(2))
            .with_playback_order(PlaybackOrder::Chronological)
            .with_filler(FillerPreset::count(FillerKind::PostRoll, key(3), 1)),
    ]);
    (catalog, playout)
}

fn timeline(items: &[PlayoutItem]) -> Vec<(u64, DateTime<FixedOffset>, DateTime<FixedOffset>, FillerKind)> {
    items
        .iter()
        .map(|i| (i.media_item_id.value(), i.start, i.finish, i.filler_kind))
        .collect()
}

#[test]
fn split_builds_match_a_single_build() {
    let (catalog, mut whole) = resumable_playout();
    let mut split = whole.clone();
    let builder = PlayoutBuilder::new(&catalog, settings());

    builder
        .build_window(&mut whole, PlayoutBuildMode::Reset, at(1, 0, 0), at(2, 12, 0))
        .expect("whole build");

    builder
        .build_window(&mut split, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 3, 0))
        .expect("first part");
    builder
        .build_window(&mut split, PlayoutBuildMode::Continue, at(1, 3, 0), at(1, 17, 0))
        .expect("second part");
    builder
        .build_window(&mut split, PlayoutBuildMode::Continue, at(1, 17, 0), at(2, 12, 0))
        .expect("third part");

    assert_eq!(timeline(&split.items), timeline(&whole.items));
    assert_eq!(split.anchor.map(|a| a.next_start), whole.anchor.map(|a| a.next_start));
}

#[test]
fn refresh_restarts_from_the_day_checkpoint() {
    let (catalog, mut playout) = resumable_playout();
    let builder = PlayoutBuilder::new(&catalog, settings());

    builder
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(3, 0, 0))
        .expect("initial build");
    let checkpoint = playout
        .collection_anchors
        .iter()
        .filter_map(|a| a.anchor_date)
        .min()
        .expect("day checkpoint");
    let first_after = playout
        .items
        .iter()
        .find(|i| i.start >= checkpoint && (10..15).contains(&i.media_item_id.value()))
        .map(|i| i.media_item_id)
        .expect("content after checkpoint");

    builder
        .build_window(&mut playout, PlayoutBuildMode::Refresh, at(2, 0, 0), at(2, 12, 0))
        .expect("refresh");

    assert_eq!(playout.items[0].start, checkpoint);
    assert_eq!(playout.items[0].media_item_id, first_after);
    assert!(playout.items.iter().all(|i| i.start >= checkpoint));
}

#[test]
fn cancelled_build_resumes_cleanly() {
    let (catalog, mut playout) = resumable_playout();
    let mut expected = playout.clone();
    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut expected, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 6, 0))
        .expect("reference build");

    let token = CancellationToken::new();
    token.cancel();
    let outcome = PlayoutBuilder::new(&catalog, settings())
        .with_cancellation(token)
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 6, 0))
        .expect("cancelled build");
    assert!(outcome.cancelled);
    assert!(playout.items.is_empty());

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Continue, at(1, 0, 0), at(1, 6, 0))
        .expect("resumed build");
    assert_eq!(timeline(&playout.items), timeline(&expected.items));
}

#[test]
fn empty_collection_fails_without_touching_playout() {
    let catalog = InMemoryCatalog::new()
        .with_collection(1, movies(10, &[30]))
        .with_collection(2, movies(20, &[0, 0]));
    let mut playout = schedule(vec![
        ScheduleItem::one(0, key(1)).with_filler(FillerPreset::count(FillerKind::PreRoll, key(2), 1)),
    ]);
    let before = playout.clone();

    let result = PlayoutBuilder::new(&catalog, settings()).build_window(
        &mut playout,
        PlayoutBuildMode::Reset,
        at(1, 0, 0),
        at(1, 6, 0),
    );

    assert!(matches!(result, Err(SchedulingError::EmptyCollection(k)) if k == key(2)));
    assert_eq!(playout, before);
}

#[test]
fn alternate_schedule_applies_on_matching_days() {
    let catalog = InMemoryCatalog::new()
        .with_collection(1, movies(10, &[30]))
        .with_collection(2, movies(20, &[30]));
    let mut saturdays = WeekdaySet::empty();
    saturdays.insert(Weekday::Sat);
    let template = PlayoutTemplate {
        days_of_week: saturdays,
        ..PlayoutTemplate::default()
    };
    let mut playout = schedule(vec![ScheduleItem::one(0, key(1))])
        .with_alternate(template, ProgramSchedule::new("weekend", vec![ScheduleItem::one(0, key(2))]));

    // 2024-05-04 is a Saturday
    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(3, 0, 0), at(6, 0, 0))
        .expect("build");

    for item in &playout.items {
        let expected = if item.start.date_naive() == at(4, 0, 0).date_naive() {
            20
        } else {
            10
        };
        assert_eq!(item.media_item_id.value(), expected, "item at {}", item.start);
    }
    assert_eq!(playout.items.len(), 144);
}

fn specials(first_id: u64, count: u64) -> Vec<MediaItem> {
    (0..count)
        .map(|i| {
            MediaItem::episode(first_id + i, 1u64, TimeDelta::minutes(30))
                .with_season_episode(0, i as u16 + 1)
        })
        .collect()
}

#[test]
fn specials_only_season_episode_collection_emits_nothing() {
    let catalog = InMemoryCatalog::new().with_collection(1, specials(10, 3));
    let mut playout = schedule(vec![
        ScheduleItem::one(0, key(1)).with_playback_order(PlaybackOrder::SeasonEpisode),
    ]);

    let outcome = PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 6, 0))
        .expect("build");

    assert_eq!(outcome.items_added, 0);
    assert!(playout.items.is_empty());
}

#[test]
fn empty_rule_is_skipped_between_playable_rules() {
    let catalog = InMemoryCatalog::new()
        .with_collection(1, specials(10, 3))
        .with_collection(2, movies(20, &[30]));
    let mut playout = schedule(vec![
        ScheduleItem::one(0, key(1)).with_playback_order(PlaybackOrder::SeasonEpisode),
        ScheduleItem::one(1, key(2)),
    ]);

    PlayoutBuilder::new(&catalog, settings())
        .build_window(&mut playout, PlayoutBuildMode::Reset, at(1, 0, 0), at(1, 6, 0))
        .expect("build");

    assert_eq!(playout.items.len(), 12);
    assert!(playout.items.iter().all(|i| i.media_item_id.value() == 20));
    assert!(playout.items.windows(2).all(|w| w[0].finish == w[1].start));
}
