use chrono::{Datelike, NaiveDate, Weekday};

/// Set of weekdays, bit `n` for `Weekday::num_days_from_monday() == n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        WeekdaySet(0)
    }

    pub const fn all() -> Self {
        WeekdaySet(0b0111_1111)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Set of days of the month, bits 1 through 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DayOfMonthSet(u32);

impl DayOfMonthSet {
    pub const fn empty() -> Self {
        DayOfMonthSet(0)
    }

    pub const fn all() -> Self {
        DayOfMonthSet(!1)
    }

    pub fn insert(&mut self, day: u32) {
        if (1..=31).contains(&day) {
            self.0 |= 1 << day;
        }
    }

    pub fn contains(&self, day: u32) -> bool {
        (1..=31).contains(&day) && self.0 & (1 << day) != 0
    }
}

impl FromIterator<u32> for DayOfMonthSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = DayOfMonthSet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Set of months, bits 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MonthSet(u16);

impl MonthSet {
    pub const fn empty() -> Self {
        MonthSet(0)
    }

    pub const fn all() -> Self {
        MonthSet(0b0001_1111_1111_1110)
    }

    pub fn insert(&mut self, month: u32) {
        if (1..=12).contains(&month) {
            self.0 |= 1 << month;
        }
    }

    pub fn contains(&self, month: u32) -> bool {
        (1..=12).contains(&month) && self.0 & (1 << month) != 0
    }
}

impl FromIterator<u32> for MonthSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = MonthSet::empty();
        for month in iter {
            set.insert(month);
        }
        set
    }
}

/// Date rule deciding when an alternate schedule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayoutTemplate {
    #[cfg_attr(feature = "serde", serde(default))]
    pub index: u32,
    pub days_of_week: WeekdaySet,
    pub days_of_month: DayOfMonthSet,
    pub months_of_year: MonthSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limit_to_date_range: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_month: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_day: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_year: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_month: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_day: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_year: Option<i32>,
}

impl Default for PlayoutTemplate {
    fn default() -> Self {
        Self {
            index: 0,
            days_of_week: WeekdaySet::all(),
            days_of_month: DayOfMonthSet::all(),
            months_of_year: MonthSet::all(),
            limit_to_date_range: false,
            start_month: 1,
            start_day: 1,
            start_year: None,
            end_month: 12,
            end_day: 31,
            end_year: None,
        }
    }
}

impl PlayoutTemplate {
    /// Restricts the template to an annual month/day range.
    pub fn with_date_range(
        mut self,
        start: (u32, u32),
        end: (u32, u32),
    ) -> Self {
        self.limit_to_date_range = true;
        (self.start_month, self.start_day) = start;
        (self.end_month, self.end_day) = end;
        self
    }

    /// Pins the range to explicit years.
    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = Some(start_year);
        self.end_year = Some(end_year);
        self
    }

    /// Whether the weekday, day-of-month and month bitsets all include
    /// `date`. The date range is checked separately by the selector.
    pub fn matches_calendar(&self, date: NaiveDate) -> bool {
        self.days_of_week.contains(date.weekday())
            && self.days_of_month.contains(date.day())
            && self.months_of_year.contains(date.month())
    }
}
