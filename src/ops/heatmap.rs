use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::model::activity::ActivityLedger;

/// Days before today that still count towards the heatmap
pub const WINDOW_DAYS: i64 = 365;

/// Highest activity level
pub const MAX_LEVEL: u8 = 4;

/// Bucket a day's completion count into a level 0–4
pub fn level_for_count(count: usize) -> u8 {
    match count {
        0 => 0,
        1..=2 => 1,
        3..=7 => 2,
        8..=14 => 3,
        _ => MAX_LEVEL,
    }
}

/// Activity level of `date` as seen from `today`.
///
/// Future dates and dates more than a year back are always 0, whatever the
/// ledger holds for them.
pub fn activity_level(ledger: &ActivityLedger, date: NaiveDate, today: NaiveDate) -> u8 {
    let age = (today - date).num_days();
    if !(0..=WINDOW_DAYS).contains(&age) {
        return 0;
    }
    level_for_count(ledger.get(date).total())
}

/// One day in the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub count: usize,
    pub level: u8,
}

/// Month marker on a week column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLabel {
    /// e.g. `Oct'25`
    pub short: String,
    /// e.g. `Oct 2025`
    pub title: String,
}

impl MonthLabel {
    fn for_date(date: NaiveDate) -> Self {
        MonthLabel {
            short: date.format("%b'%y").to_string(),
            title: date.format("%b %Y").to_string(),
        }
    }
}

/// One column: Sunday through Saturday
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Week {
    pub label: Option<MonthLabel>,
    /// Indexed by weekday, 0 = Sunday. `None` past today in the last week.
    pub days: [Option<HeatCell>; 7],
}

/// A projected year of activity, laid out in week columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub today: NaiveDate,
    /// First day of the full (uncapped) range, always a Sunday
    pub start: NaiveDate,
    /// Week columns in the full range, before the cap was applied
    pub total_weeks: usize,
    /// Shown columns, oldest first
    pub weeks: Vec<Week>,
}

impl Heatmap {
    /// Row-major view: 7 rows (Sunday first), one entry per shown week
    pub fn rows(&self) -> Vec<Vec<Option<&HeatCell>>> {
        (0..7)
            .map(|row| {
                self.weeks
                    .iter()
                    .map(|week| week.days[row].as_ref())
                    .collect()
            })
            .collect()
    }

    /// Every real (dated) cell, oldest first
    pub fn cells(&self) -> impl Iterator<Item = &HeatCell> {
        self.weeks
            .iter()
            .flat_map(|week| week.days.iter().flatten())
    }

    /// First shown day whose completions count towards a level.
    ///
    /// Later of the first shown cell and the start of the level window;
    /// padding days before that render as level 0 whatever the ledger holds.
    pub fn counted_since(&self) -> NaiveDate {
        let cutoff = self
            .today
            .checked_sub_days(Days::new(WINDOW_DAYS as u64))
            .unwrap_or(NaiveDate::MIN);
        self.cells()
            .next()
            .map_or(cutoff, |first| first.date.max(cutoff))
    }

    /// Completions on the shown days from `counted_since` to today
    pub fn counted_total(&self) -> usize {
        let since = self.counted_since();
        self.cells()
            .filter(|cell| cell.date >= since)
            .map(|cell| cell.count)
            .sum()
    }
}

/// Sunday on or before the same date one year before `today`
pub fn window_start(today: NaiveDate) -> NaiveDate {
    let year_ago = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN);
    let back = u64::from(year_ago.weekday().num_days_from_sunday());
    year_ago.checked_sub_days(Days::new(back)).unwrap_or(year_ago)
}

/// Project the ledger onto a week grid ending at `today`.
///
/// The full range is built first; if it has more than `max_weeks` columns
/// the oldest ones are dropped. Month labels are placed before truncation,
/// on the column holding the 1st of each month.
pub fn project(ledger: &ActivityLedger, today: NaiveDate, max_weeks: usize) -> Heatmap {
    let start = window_start(today);
    let mut weeks: Vec<Week> = Vec::new();

    for (index, date) in start.iter_days().take_while(|d| *d <= today).enumerate() {
        let (col, row) = (index / 7, index % 7);
        if col == weeks.len() {
            weeks.push(Week {
                label: None,
                days: Default::default(),
            });
        }
        let week = &mut weeks[col];
        if date.day() == 1 && week.label.is_none() {
            week.label = Some(MonthLabel::for_date(date));
        }
        week.days[row] = Some(HeatCell {
            date,
            count: ledger.get(date).total(),
            level: activity_level(ledger, date, today),
        });
    }

    let total_weeks = weeks.len();
    if total_weeks > max_weeks {
        weeks.drain(..total_weeks - max_weeks);
    }

    Heatmap {
        today,
        start,
        total_weeks,
        weeks,
    }
}
