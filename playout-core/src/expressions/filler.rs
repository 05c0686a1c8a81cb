use chrono::TimeDelta;
use playout_model::MediaChapter;
use tracing::{debug, warn};

use super::{Scope, Value, parse};

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// Keeps the chapter boundaries accepted by a mid-roll filler expression.
///
/// Every chapter end except the last is a candidate, offered in order. The
/// returned chapters merge everything between accepted boundaries, so their
/// ends are the accepted points followed by the end of the final chapter.
pub fn filter_chapters(
    expression: &str,
    chapters: &[MediaChapter],
    item_duration: TimeDelta,
) -> Vec<MediaChapter> {
    if chapters.len() <= 1 {
        return chapters.to_vec();
    }

    let whole = || {
        let start = chapters.first().map_or(TimeDelta::zero(), |c| c.start);
        let end = chapters.last().map_or(item_duration, |c| c.end);
        vec![MediaChapter::new(0, start, end)]
    };

    let parsed = match parse(expression) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(%expression, %error, "Failed to parse filler expression");
            return whole();
        }
    };

    let total = seconds(item_duration);
    let candidates = &chapters[..chapters.len() - 1];
    let mut accepted: Vec<usize> = Vec::new();
    let mut last_point = 0.0;

    for (position, chapter) in candidates.iter().enumerate() {
        let point = seconds(chapter.end);
        let mut scope = Scope::new();
        scope.insert("point", Value::Number(point));
        scope.insert("last_mid_filler", Value::Number(point - last_point));
        scope.insert("matched_points", Value::Number(accepted.len() as f64));
        scope.insert("total_points", Value::Number(candidates.len() as f64));
        scope.insert("total_duration", Value::Number(total));
        scope.insert(
            "total_progress",
            Value::Number(if total > 0.0 { point / total } else { 0.0 }),
        );
        scope.insert("remaining_duration", Value::Number(total - point));
        scope.insert(
            "title",
            Value::Text(chapter.title.clone().unwrap_or_default()),
        );
        scope.insert("chapter_num", Value::Number((position + 1) as f64));

        match parsed.evaluate(&scope) {
            Ok(value) if value.is_truthy() => {
                accepted.push(position);
                last_point = point;
            }
            Ok(_) => {}
            Err(error) => {
                debug!(%expression, %error, point, "Filler expression rejected chapter boundary");
            }
        }
    }

    if accepted.is_empty() {
        return whole();
    }

    let mut result = Vec::with_capacity(accepted.len() + 1);
    let mut start = chapters[0].start;
    for position in accepted.into_iter().chain(std::iter::once(chapters.len() - 1)) {
        let ending = &chapters[position];
        let mut merged = MediaChapter::new(ending.chapter_id, start, ending.end);
        merged.title = ending.title.clone();
        start = ending.end;
        result.push(merged);
    }
    result
}
