use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::{SubtaskId, TaskId};

/// Which id set a completion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Task,
    Subtask,
}

/// Ids completed on one calendar day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    #[serde(default)]
    pub tasks_completed: BTreeSet<TaskId>,
    #[serde(default)]
    pub subtasks_completed: BTreeSet<SubtaskId>,
}

static EMPTY_DAY: DayRecord = DayRecord::new();

impl DayRecord {
    pub const fn new() -> Self {
        DayRecord {
            tasks_completed: BTreeSet::new(),
            subtasks_completed: BTreeSet::new(),
        }
    }

    /// Completions of both kinds on this day
    pub fn total(&self) -> usize {
        self.tasks_completed.len() + self.subtasks_completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks_completed.is_empty() && self.subtasks_completed.is_empty()
    }

    pub fn contains(&self, kind: CompletionKind, id: u64) -> bool {
        match kind {
            CompletionKind::Task => self.tasks_completed.contains(&id),
            CompletionKind::Subtask => self.subtasks_completed.contains(&id),
        }
    }

    /// Returns true if the id was not already present
    pub fn insert(&mut self, kind: CompletionKind, id: u64) -> bool {
        self.ids_mut(kind).insert(id)
    }

    /// Returns true if the id was present
    pub fn remove(&mut self, kind: CompletionKind, id: u64) -> bool {
        self.ids_mut(kind).remove(&id)
    }

    fn ids_mut(&mut self, kind: CompletionKind) -> &mut BTreeSet<u64> {
        match kind {
            CompletionKind::Task => &mut self.tasks_completed,
            CompletionKind::Subtask => &mut self.subtasks_completed,
        }
    }
}

/// Per-day completion history, keyed by date.
///
/// A date is present once something has been recorded for it. Records may
/// be emptied again by a same-day reversal but are never dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLedger {
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        ActivityLedger::default()
    }

    /// The record for `date`, or an empty one if nothing was ever recorded
    pub fn get(&self, date: NaiveDate) -> &DayRecord {
        self.days.get(&date).unwrap_or(&EMPTY_DAY)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// The record for `date`, created if absent
    pub fn entry(&mut self, date: NaiveDate) -> &mut DayRecord {
        self.days.entry(date).or_default()
    }

    /// The existing record for `date`, without creating one
    pub fn existing_mut(&mut self, date: NaiveDate) -> Option<&mut DayRecord> {
        self.days.get_mut(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Days in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayRecord)> {
        self.days.iter().map(|(d, r)| (*d, r))
    }

    /// Highest task and subtask ids referenced anywhere in the history
    pub fn highest_ids(&self) -> (TaskId, SubtaskId) {
        let mut task = 0;
        let mut sub = 0;
        for record in self.days.values() {
            if let Some(&id) = record.tasks_completed.last() {
                task = task.max(id);
            }
            if let Some(&id) = record.subtasks_completed.last() {
                sub = sub.max(id);
            }
        }
        (task, sub)
    }
}

/// Sorted, duplicate-free list of days that ever had a completion.
///
/// Deserializing goes through `From<Vec<NaiveDate>>`, so a hand-edited or
/// legacy snapshot is normalized on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct ActivityLog {
    dates: Vec<NaiveDate>,
}

impl From<Vec<NaiveDate>> for ActivityLog {
    fn from(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        ActivityLog { dates }
    }
}

impl From<ActivityLog> for Vec<NaiveDate> {
    fn from(log: ActivityLog) -> Self {
        log.dates
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        ActivityLog::default()
    }

    /// Insert keeping order; returns true if the date was new
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        match self.dates.binary_search(&date) {
            Ok(_) => false,
            Err(pos) => {
                self.dates.insert(pos, date);
                true
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
