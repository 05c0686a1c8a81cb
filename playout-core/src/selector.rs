//! Picks the schedule that applies on a given local date.

use chrono::{Datelike, Months, NaiveDate};
use playout_model::{Playout, PlayoutTemplate, ProgramSchedule};

/// Resolves a range start. A day the month does not have rolls forward to
/// the first of the next month.
fn range_start(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let month = month.clamp(1, 12);
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_months(Months::new(1))
    })
}

/// Resolves a range end. A day the month does not have clamps back to the
/// month's last day.
fn range_end(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let month = month.clamp(1, 12);
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    })
}

fn in_date_range(template: &PlayoutTemplate, date: NaiveDate) -> bool {
    if let (Some(start_year), Some(end_year)) = (template.start_year, template.end_year) {
        let start = range_start(start_year, template.start_month, template.start_day);
        let end = range_end(end_year, template.end_month, template.end_day);
        return match (start, end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        };
    }

    let year = date.year();
    let (Some(start), Some(end)) = (
        range_start(year, template.start_month, template.start_day),
        range_end(year, template.end_month, template.end_day),
    ) else {
        return false;
    };

    let wraps = (template.start_month, template.start_day) > (template.end_month, template.end_day);
    if wraps {
        date >= start || date <= end
    } else {
        start <= date && date <= end
    }
}

/// Whether `template` applies on `date`: every calendar set must contain the
/// date and, when limited, the date must fall inside the range.
pub fn template_matches(template: &PlayoutTemplate, date: NaiveDate) -> bool {
    template.matches_calendar(date)
        && (!template.limit_to_date_range || in_date_range(template, date))
}

/// First template matching `date`, in the order given.
pub fn select_template(templates: &[PlayoutTemplate], date: NaiveDate) -> Option<&PlayoutTemplate> {
    templates
        .iter()
        .find(|template| template_matches(template, date))
}

/// The alternate schedule for `date`, or the playout's default schedule.
pub fn schedule_for(playout: &Playout, date: NaiveDate) -> &ProgramSchedule {
    playout
        .alternates
        .iter()
        .find(|alternate| template_matches(&alternate.template, date))
        .map_or(&playout.schedule, |alternate| &alternate.schedule)
}
