//! Multi-part episode detection.
//!
//! Episode titles ending in a part marker (`Title (2)`, `Title Part 2`,
//! `Title (II)`, `Title Part Two`, each optionally followed by ` - Subtitle`)
//! are chained into one [`GroupedMediaItem`] while the part numbers keep
//! increasing by one.

use once_cell::sync::Lazy;
use playout_model::{
    CollectionWithItems, GroupedMediaItem, MediaItem, PlaybackOrder, ShowId,
};
use regex::Regex;

use crate::enumerators::comparer;

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*\((\d+)\)( - .*)?$").expect("numbered part regex should compile"));
static PART_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*\(?Part (\d+)\)?$").expect("part number regex should compile"));
static ROMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*\(([MDCLXVI]+)\)( - .*)?$").expect("roman part regex should compile")
});
static PART_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*Part (\w+)$").expect("part word regex should compile"));

/// Part number encoded in an episode title, if any.
pub fn part_number(title: &str) -> Option<u32> {
    if let Some(captures) = NUMBERED.captures(title)
        && let Ok(number) = captures[1].parse()
    {
        return Some(number);
    }
    if let Some(captures) = PART_NUMBER.captures(title)
        && let Ok(number) = captures[1].parse()
    {
        return Some(number);
    }
    if let Some(captures) = ROMAN.captures(title)
        && let Some(number) = roman(&captures[1])
    {
        return Some(number);
    }
    PART_WORD
        .captures(title)
        .and_then(|captures| english(&captures[1]))
}

fn roman(text: &str) -> Option<u32> {
    let number = match text.to_ascii_lowercase().as_str() {
        "i" => 1,
        "ii" => 2,
        "iii" => 3,
        "iv" => 4,
        "v" => 5,
        "vi" => 6,
        "vii" => 7,
        "viii" | "iix" => 8,
        "ix" => 9,
        "x" => 10,
        _ => return None,
    };
    Some(number)
}

fn english(text: &str) -> Option<u32> {
    let number = match text.to_ascii_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(number)
}

struct Pending {
    group: GroupedMediaItem,
    last: u32,
    show: Option<ShowId>,
}

#[derive(Default)]
struct Grouper {
    groups: Vec<GroupedMediaItem>,
    pending: Option<Pending>,
}

impl Grouper {
    fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.groups.push(pending.group);
        }
    }

    fn last(&self) -> u32 {
        self.pending.as_ref().map_or(0, |pending| pending.last)
    }

    fn ungrouped(&mut self, item: MediaItem) {
        self.flush();
        self.groups.push(GroupedMediaItem::single(item));
    }

    fn tagged(&mut self, item: MediaItem, number: u32) {
        if number <= self.last() {
            self.flush();
        }

        let last = self.last();
        if last == 0 {
            self.pending = Some(Pending {
                show: item.show_id,
                group: GroupedMediaItem::single(item),
                last: number,
            });
        } else if number == last + 1
            && let Some(pending) = self.pending.as_mut()
        {
            pending.group.additional.push(item);
            pending.last = number;
        } else {
            self.ungrouped(item);
        }
    }

    /// With cross-show boundaries, an untagged episode from another show is
    /// absorbed when the pending show's next episode continues the run.
    fn absorbs(&self, item: &MediaItem, rest: &[MediaItem]) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if item.show_id == pending.show {
            return false;
        }
        rest.iter()
            .find(|next| next.show_id == pending.show)
            .and_then(|next| part_number(&next.title))
            .is_some_and(|number| number == pending.last + 1)
    }
}

/// Groups consecutive parts of multi-part episodes. Episodes are processed
/// per show in chronological order unless `cross_show` is set, in which case
/// all episodes form one sequence. Anything that is not an episode follows as
/// a single.
pub fn group_media_items(items: &[MediaItem], cross_show: bool) -> Vec<GroupedMediaItem> {
    let episodes: Vec<&MediaItem> = items.iter().filter(|item| item.is_episode()).collect();

    let scopes: Vec<Vec<MediaItem>> = if cross_show {
        vec![episodes.iter().map(|item| (*item).clone()).collect()]
    } else {
        let mut shows: Vec<Option<ShowId>> = Vec::new();
        for episode in &episodes {
            if !shows.contains(&episode.show_id) {
                shows.push(episode.show_id);
            }
        }
        shows
            .into_iter()
            .map(|show| {
                episodes
                    .iter()
                    .filter(|item| item.show_id == show)
                    .map(|item| (*item).clone())
                    .collect()
            })
            .collect()
    };

    let mut grouper = Grouper::default();
    for mut scope in scopes {
        scope.sort_by(comparer::chronological);
        for position in 0..scope.len() {
            let item = scope[position].clone();
            match part_number(&item.title) {
                Some(number) => grouper.tagged(item, number),
                None if cross_show && grouper.absorbs(&item, &scope[position + 1..]) => {
                    if let Some(pending) = grouper.pending.as_mut() {
                        pending.group.additional.push(item);
                    }
                }
                None => grouper.ungrouped(item),
            }
        }
        grouper.flush();
    }

    let mut groups = grouper.groups;
    groups.extend(
        items
            .iter()
            .filter(|item| !item.is_episode())
            .cloned()
            .map(GroupedMediaItem::single),
    );
    groups
}

/// Groups for a multi-collection: every member scheduled as a group becomes
/// one unit in its own order, the rest are singles (or multi-part groups when
/// `keep_multi_part` is set).
pub fn group_multi_collection(
    members: &[CollectionWithItems],
    keep_multi_part: bool,
    cross_show: bool,
) -> Vec<GroupedMediaItem> {
    let mut groups = Vec::new();
    let mut loose = Vec::new();
    for member in members {
        if member.schedule_as_group {
            let mut items = member.items.clone();
            if member.playback_order != PlaybackOrder::Custom {
                items.sort_by(comparer::chronological);
            }
            let mut items = items.into_iter();
            if let Some(first) = items.next() {
                groups.push(GroupedMediaItem::new(first, items.collect()));
            }
        } else {
            loose.extend(member.items.iter().cloned());
        }
    }

    if keep_multi_part {
        groups.extend(group_media_items(&loose, cross_show));
    } else {
        groups.extend(loose.into_iter().map(GroupedMediaItem::single));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn named(titles: &[&str]) -> Vec<MediaItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| episode(i as u64 + 1, 1, title))
            .collect()
    }

    fn episode(id: u64, show: u64, title: &str) -> MediaItem {
        MediaItem::episode(id, show, TimeDelta::minutes(22))
            .with_title(title)
            .with_release_date(NaiveDate::from_ymd_opt(2000, 1, id as u32).expect("date"))
    }

    fn shape(groups: &[GroupedMediaItem]) -> Vec<Vec<u64>> {
        groups
            .iter()
            .map(|group| group.iter().map(|item| item.id.value()).collect())
            .collect()
    }

    #[test]
    fn test_not_grouped_grouped_not_grouped() {
        for titles in [
            ["Episode 1", "Episode 2 (1)", "Episode 3 (2)", "Episode 4"],
            ["Episode 1 - More", "Episode 2 (1) - Title", "Episode 3 (2) - After", "Episode 4 - Dash"],
            ["Episode 1", "Episode 2 Part 1", "Episode 3 Part 2", "Episode 4"],
        ] {
            let groups = group_media_items(&named(&titles), false);
            assert_eq!(shape(&groups), vec![vec![1], vec![2, 3], vec![4]]);
        }
    }

    #[test]
    fn test_grouped_not_grouped() {
        for titles in [
            ["Episode 1 (1)", "Episode 2 (2)", "Episode 3"],
            ["Episode 1 Part 1", "Episode 2 Part 2", "Episode 3"],
            ["Episode 1 (I)", "Episode 2 (II)", "Episode 3"],
            ["Episode 1 Part One", "Episode 2 Part Two", "Episode 3"],
        ] {
            let groups = group_media_items(&named(&titles), false);
            assert_eq!(shape(&groups), vec![vec![1, 2], vec![3]]);
        }
    }

    #[test]
    fn test_grouped_not_grouped_grouped() {
        let titles = ["Episode 1 (1)", "Episode 2 (2)", "Episode 3", "Episode 4 (1)", "Episode 5 (2)"];
        let groups = group_media_items(&named(&titles), false);
        assert_eq!(shape(&groups), vec![vec![1, 2], vec![3], vec![4, 5]]);
    }

    #[test]
    fn test_grouped_grouped() {
        let titles = ["Episode 1 (1)", "Episode 2 (2)", "Episode 3 (1)", "Episode 4 (2)"];
        let groups = group_media_items(&named(&titles), false);
        assert_eq!(shape(&groups), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_part_two_without_part_one_starts_group() {
        let titles = ["Episode 1", "Episode 2 (2)", "Episode 3 (1)", "Episode 4 (2)"];
        let groups = group_media_items(&named(&titles), false);
        assert_eq!(shape(&groups), vec![vec![1], vec![2], vec![3, 4]]);
    }

    #[test]
    fn test_skipped_part_ends_group() {
        let titles = ["Episode 1 (1)", "Episode 2 (2)", "Episode 3 (4)", "Episode 4"];
        let groups = group_media_items(&named(&titles), false);
        assert_eq!(shape(&groups), vec![vec![1, 2], vec![3], vec![4]]);
    }

    #[test]
    fn test_repeated_part_restarts_group() {
        let titles = ["Episode 1 (1)", "Episode 2 (2)", "Episode 3 (2)"];
        let groups = group_media_items(&named(&titles), false);
        assert_eq!(shape(&groups), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_cross_show_absorbs_interleaved_episode() {
        let items = vec![
            episode(1, 1, "Mystery (1)"),
            episode(2, 2, "Unrelated"),
            episode(3, 1, "Mystery (2)"),
            episode(4, 2, "Another"),
        ];
        let groups = group_media_items(&items, true);
        assert_eq!(shape(&groups), vec![vec![1, 2, 3], vec![4]]);

        let per_show = group_media_items(&items, false);
        assert_eq!(shape(&per_show), vec![vec![1, 3], vec![2], vec![4]]);
    }

    #[test]
    fn test_non_episodes_follow_as_singles() {
        let mut items = named(&["Episode 1 (1)", "Episode 2 (2)"]);
        items.insert(0, MediaItem::movie(99, TimeDelta::minutes(90)));
        let groups = group_media_items(&items, false);
        assert_eq!(shape(&groups), vec![vec![1, 2], vec![99]]);
    }
}
