use chrono::{Datelike, NaiveDate};

/// Format used for every date written into page names and day headings.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Separator between the start and end label of a week page name.
pub const RANGE_SEPARATOR: &str = " - ";

/// One Sunday-to-Saturday week.
///
/// Weeks are numbered the way the workspace locale does it: a week starts on
/// Sunday and week 1 is the week containing 1 January, so a week straddling
/// the new year belongs to the new year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_label: String,
    pub end_label: String,
    pub week: u32,
    pub year: i32,
}

impl WeekRange {
    fn starting(start: NaiveDate, week: u32, year: i32) -> Self {
        let end = start + chrono::Duration::days(6);
        Self {
            start,
            end,
            start_label: format_date(start),
            end_label: format_date(end),
            week,
            year,
        }
    }

    /// The week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let (week, year) = week_of(date);
        Self::starting(sunday_on_or_before(date), week, year)
    }

    /// Name of the news page for this week: "DD.MM.YYYY - DD.MM.YYYY".
    pub fn page_name(&self) -> String {
        format!("{}{}{}", self.start_label, RANGE_SEPARATOR, self.end_label)
    }

    /// Date of the given weekday (0 = Sunday) within this week.
    pub fn day_date(&self, day_of_week: u32) -> NaiveDate {
        self.start + chrono::Duration::days(i64::from(day_of_week.min(6)))
    }

    /// Parse a page name produced by [`WeekRange::page_name`].
    pub fn from_page_name(name: &str) -> Option<Self> {
        let (start, end) = name.trim().split_once(RANGE_SEPARATOR)?;
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).ok()?;
        if (end - start).num_days() != 6 {
            return None;
        }
        let (week, year) = week_of(start);
        Some(Self::starting(start, week, year))
    }
}

/// An entry of the week picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekOption {
    pub offset: i32,
    pub label: String,
    pub is_current: bool,
    pub range: WeekRange,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Sunday that opens week 1 of `year`.
fn first_week_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(sunday_on_or_before)
}

fn weeks_in_year(year: i32) -> Option<u32> {
    let this = first_week_start(year)?;
    let next = first_week_start(year + 1)?;
    u32::try_from((next - this).num_days() / 7).ok()
}

/// Week number and week-year of `date`.
pub fn week_of(date: NaiveDate) -> (u32, i32) {
    let sunday = sunday_on_or_before(date);
    // The Saturday decides the year so that week 1 always holds 1 January.
    let year = (sunday + chrono::Duration::days(6)).year();
    let week = first_week_start(year)
        .map(|first| (sunday - first).num_days() / 7 + 1)
        .and_then(|w| u32::try_from(w).ok())
        .unwrap_or(1);
    (week, year)
}

/// Years a week may be resolved in.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9998;

/// `today` moved by a whole number of weeks, or `None` past the end of the calendar.
pub fn offset_date(today: NaiveDate, offset: i32) -> Option<NaiveDate> {
    today.checked_add_signed(chrono::Duration::weeks(i64::from(offset)))
}

/// Resolve an explicit week number and year into a range.
///
/// Without a week number the week containing `today` is used. A missing year
/// defaults to the week-year of `today`. Week numbers or years outside the
/// calendar fall back to the current week instead of failing.
pub fn resolve_week(today: NaiveDate, week: Option<u32>, year: Option<i32>) -> WeekRange {
    let Some(week) = week else {
        return WeekRange::containing(today);
    };
    let year = year.unwrap_or_else(|| week_of(today).1);

    if !YEARS.contains(&year) {
        log::debug!("Year {} out of range, using current week", year);
        return WeekRange::containing(today);
    }
    match (first_week_start(year), weeks_in_year(year)) {
        (Some(first), Some(count)) if (1..=count).contains(&week) => {
            let start = first + chrono::Duration::weeks(i64::from(week - 1));
            WeekRange::starting(start, week, year)
        }
        _ => {
            log::debug!("Week {} of {} does not exist, using current week", week, year);
            WeekRange::containing(today)
        }
    }
}

/// Resolve the week `offset` weeks away from `today`.
///
/// Returns `None` when that week lies outside the supported years; the
/// current week is never substituted for it.
pub fn resolve_offset(today: NaiveDate, offset: i32) -> Option<WeekRange> {
    let date = offset_date(today, offset).filter(|d| YEARS.contains(&d.year()))?;
    Some(WeekRange::containing(date))
}

/// Selectable weeks from `-range` to `+range` around the current one.
pub fn week_options(today: NaiveDate, range: u32) -> Vec<WeekOption> {
    let range = i32::try_from(range).unwrap_or(i32::MAX / 2);
    (-range..=range)
        .filter_map(|offset| {
            let week = resolve_offset(today, offset)?;
            let span = week.page_name();
            let is_current = offset == 0;
            let label = if is_current {
                format!("Current Week ({})", span)
            } else {
                span
            };
            Some(WeekOption {
                offset,
                label,
                is_current,
                range: week,
            })
        })
        .collect()
}
