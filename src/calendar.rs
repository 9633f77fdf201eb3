use chrono::{Datelike, Months, NaiveDate};

use crate::models::Task;

pub const GRID_CELLS: i64 = 42; // 6 rows x 7 days
pub const MAX_PILLS: usize = 3;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One square of the month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub other_month: bool,
    pub today: bool,
}

impl DayCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Only days of the displayed month accept clicks and show tasks.
    pub fn is_interactive(&self) -> bool {
        !self.other_month
    }
}

/// The month currently displayed. Holds (year, month) only so stepping
/// from the 31st never skips a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        MonthCursor { first: date.with_day(1).unwrap_or(date) }
    }

    /// `month0` is zero-indexed (0 = January).
    pub fn new(year: i32, month0: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month0 + 1, 1).map(|first| MonthCursor { first })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month0(&self) -> u32 {
        self.first.month0()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn previous(&self) -> Self {
        MonthCursor { first: self.first.checked_sub_months(Months::new(1)).unwrap_or(self.first) }
    }

    pub fn next(&self) -> Self {
        MonthCursor { first: self.first.checked_add_months(Months::new(1)).unwrap_or(self.first) }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month0() == self.month0()
    }

    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0() as usize], self.year())
    }
}

pub fn days_in_month(year: i32, month0: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month0 + 1, 1) else {
        return 0;
    };
    match first.checked_add_months(Months::new(1)) {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        None => 31,
    }
}

/// Build the Sunday-first month grid: trailing days of the previous month,
/// every day of the month, then `42 - (leading + days)` days of the next month.
/// A non-positive remainder emits no trailing cells.
pub fn build_grid(year: i32, month0: u32, today: NaiveDate) -> Vec<DayCell> {
    let Some(cursor) = MonthCursor::new(year, month0) else {
        return Vec::new();
    };
    let first = cursor.first_day();
    let first_weekday = first.weekday().num_days_from_sunday() as i64;
    let days = days_in_month(year, month0) as i64;

    let mut cells = Vec::with_capacity(GRID_CELLS as usize);

    // Previous month, ascending
    for offset in (1..=first_weekday).rev() {
        if let Some(date) = first.checked_sub_days(chrono::Days::new(offset as u64)) {
            cells.push(DayCell { date, other_month: true, today: false });
        }
    }

    for day in 1..=days {
        if let Some(date) = first.with_day(day as u32) {
            cells.push(DayCell { date, other_month: false, today: date == today });
        }
    }

    let remaining = GRID_CELLS - (first_weekday + days);
    let next_first = cursor.next().first_day();
    for offset in 0..remaining.max(0) {
        if let Some(date) = next_first.checked_add_days(chrono::Days::new(offset as u64)) {
            cells.push(DayCell { date, other_month: true, today: false });
        }
    }

    cells
}

/// Tasks placed on `date`, corrective first, original order kept within each type.
pub fn tasks_for_day<'a>(tasks: &'a [Task], date: NaiveDate) -> Vec<&'a Task> {
    let mut day_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.placement_date() == Some(date))
        .collect();
    // sort_by_key is stable
    day_tasks.sort_by_key(|task| task.task_type.sort_rank());
    day_tasks
}

/// What a day cell shows: at most three pills and an overflow count.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary<'a> {
    pub pills: Vec<&'a Task>,
    pub overflow: Option<usize>,
}

impl DaySummary<'_> {
    pub fn overflow_label(&self) -> Option<String> {
        self.overflow.map(|n| format!("+{n} more"))
    }
}

pub fn summarize_day<'a>(tasks: &'a [Task], date: NaiveDate) -> DaySummary<'a> {
    let mut pills = tasks_for_day(tasks, date);
    let overflow = pills.len().checked_sub(MAX_PILLS).filter(|n| *n > 0);
    pills.truncate(MAX_PILLS);
    DaySummary { pills, overflow }
}

/// Tooltip text of a pill.
pub fn pill_tooltip(task: &Task) -> String {
    format!("{} ({})", task.title, task.status)
}

/// `YYYY-MM-DD`, zero padded.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM` month argument.
pub fn parse_month_arg(raw: &str) -> Option<MonthCursor> {
    let (year, month) = raw.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    MonthCursor::new(year, month - 1)
}
