use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::activity::{ActivityLedger, ActivityLog, DayRecord};
use crate::model::store::TaskStore;
use crate::model::task::{Subtask, Task, TaskFilter};

/// Days shown by the recent-activity calendar
pub const RECENT_DAYS: u64 = 30;

pub fn filtered_tasks(store: &TaskStore, filter: TaskFilter) -> Vec<&Task> {
    store.iter().filter(|t| filter.matches(t)).collect()
}

/// Tasks still open
pub fn active_count(store: &TaskStore) -> usize {
    store.iter().filter(|t| !t.completed).count()
}

fn raw_percentage(task: &Task) -> f64 {
    if task.completed {
        100.0
    } else if task.subtasks.is_empty() {
        0.0
    } else {
        task.completed_subtasks() as f64 / task.subtasks.len() as f64 * 100.0
    }
}

/// 100 for a completed task, otherwise the share of completed subtasks
pub fn task_completion_percentage(task: &Task) -> u8 {
    raw_percentage(task).round() as u8
}

/// Mean completion across all tasks, 0 when there are none
pub fn overall_completion(store: &TaskStore) -> u8 {
    if store.is_empty() {
        return 0;
    }
    let sum: f64 = store.iter().map(raw_percentage).sum();
    (sum / store.len() as f64).round() as u8
}

/// Subtask progress for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubtaskStats {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

pub fn subtask_stats(task: &Task) -> SubtaskStats {
    SubtaskStats {
        completed: task.completed_subtasks(),
        total: task.subtasks.len(),
        percentage: task_completion_percentage(task),
    }
}

// ---------------------------------------------------------------------------
// Day details
// ---------------------------------------------------------------------------

/// What was completed on a day, resolved against the live store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDetails<'a> {
    pub tasks: Vec<&'a Task>,
    /// Subtasks completed on their own, i.e. not as part of completing the
    /// parent that same day
    pub subtasks: Vec<(&'a Task, &'a Subtask)>,
}

impl DayDetails<'_> {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.subtasks.is_empty()
    }
}

/// Resolve a day's record. Ids of deleted tasks or subtasks are skipped.
pub fn day_details<'a>(
    store: &'a TaskStore,
    ledger: &ActivityLedger,
    date: NaiveDate,
) -> DayDetails<'a> {
    let record = ledger.get(date);
    let tasks = store
        .iter()
        .filter(|t| record.tasks_completed.contains(&t.id))
        .collect();
    let subtasks = record
        .subtasks_completed
        .iter()
        .filter_map(|&id| store.find_subtask(id))
        .filter(|(parent, _)| !record.tasks_completed.contains(&parent.id))
        .collect();
    DayDetails { tasks, subtasks }
}

/// How many of `task`'s subtasks are in the day's record
pub fn subtasks_completed_that_day(task: &Task, record: &DayRecord) -> usize {
    task.subtasks
        .iter()
        .filter(|s| record.subtasks_completed.contains(&s.id))
        .count()
}

/// Headline numbers for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub tasks_completed: usize,
    pub subtasks_completed: usize,
    /// Tasks currently in the store
    pub total_tasks: usize,
    /// Tasks completed that day as a share of `total_tasks`
    pub completion_rate: u8,
    pub level: u8,
}

pub fn day_summary(
    store: &TaskStore,
    ledger: &ActivityLedger,
    date: NaiveDate,
    today: NaiveDate,
) -> DaySummary {
    let record = ledger.get(date);
    let tasks_completed = record.tasks_completed.len();
    let total_tasks = store.len();
    let completion_rate = if total_tasks == 0 {
        0
    } else {
        (tasks_completed as f64 / total_tasks as f64 * 100.0).round() as u8
    };
    DaySummary {
        date,
        tasks_completed,
        subtasks_completed: record.subtasks_completed.len(),
        total_tasks,
        completion_rate,
        level: crate::ops::heatmap::activity_level(ledger, date, today),
    }
}

// ---------------------------------------------------------------------------
// Recent calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecentDay {
    pub date: NaiveDate,
    pub active: bool,
}

/// The last `RECENT_DAYS` days ending today, oldest first, marked by the log
pub fn recent_calendar(log: &ActivityLog, today: NaiveDate) -> Vec<RecentDay> {
    (0..RECENT_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| RecentDay {
            date,
            active: log.contains(date),
        })
        .collect()
}
