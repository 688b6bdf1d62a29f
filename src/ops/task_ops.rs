use chrono::{DateTime, NaiveDate, Utc};

use crate::model::store::TaskStore;
use crate::model::task::{Subtask, SubtaskId, Task, TaskId};

/// A completion change made by a toggle, for the activity ledger to mirror.
///
/// Completing and uncompleting a task are deliberately not symmetric:
/// completion cascades to every subtask, uncompletion only reopens the task
/// itself. Both variants carry the full subtask id list because the ledger
/// records (and reverts) the subtasks alongside the task either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Task went open → done; all of its subtasks were force-completed
    CompleteCascade {
        task: TaskId,
        subtasks: Vec<SubtaskId>,
    },
    /// Task went done → open; subtasks kept their state
    UncompleteLocal {
        task: TaskId,
        subtasks: Vec<SubtaskId>,
    },
    CompleteSubtask(SubtaskId),
    UncompleteSubtask(SubtaskId),
}

/// Result of an edit. Blank text deletes instead of renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Renamed,
    Deleted,
    NotFound,
}

/// Trimmed text, or None if it is blank
fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Add a task at the end of the list. Blank text, or running out of ids,
/// creates nothing.
pub fn add_task(store: &mut TaskStore, text: &str, now: DateTime<Utc>) -> Option<TaskId> {
    let text = clean_text(text)?;
    let id = store.alloc_task_id()?;
    store.insert(Task::new(id, text, now));
    Some(id)
}

/// Remove a task and its subtasks. The ledger is left alone.
pub fn delete_task(store: &mut TaskStore, id: TaskId) -> bool {
    store.remove(id).is_some()
}

/// Flip a task's completion state
pub fn toggle_task(store: &mut TaskStore, id: TaskId, today: NaiveDate) -> Option<Completion> {
    if store.get(id)?.completed {
        uncomplete_local(store, id)
    } else {
        complete_cascade(store, id, today)
    }
}

/// Complete an open task and every one of its subtasks, all dated `today`
pub fn complete_cascade(
    store: &mut TaskStore,
    id: TaskId,
    today: NaiveDate,
) -> Option<Completion> {
    let task = store.get_mut(id)?;
    if task.completed {
        return None;
    }
    for sub in &mut task.subtasks {
        sub.set_completed(true, today);
    }
    task.set_completed(true, today);
    Some(Completion::CompleteCascade {
        task: id,
        subtasks: task.subtasks.iter().map(|s| s.id).collect(),
    })
}

/// Reopen a completed task. Subtasks stay as they are.
pub fn uncomplete_local(store: &mut TaskStore, id: TaskId) -> Option<Completion> {
    let task = store.get_mut(id)?;
    if !task.completed {
        return None;
    }
    task.completed = false;
    task.completion_date = None;
    Some(Completion::UncompleteLocal {
        task: id,
        subtasks: task.subtasks.iter().map(|s| s.id).collect(),
    })
}

/// Rename a task; blank text deletes it
pub fn edit_task(store: &mut TaskStore, id: TaskId, text: &str) -> EditOutcome {
    let Some(text) = clean_text(text) else {
        return if delete_task(store, id) {
            EditOutcome::Deleted
        } else {
            EditOutcome::NotFound
        };
    };
    match store.get_mut(id) {
        Some(task) => {
            task.text = text;
            EditOutcome::Renamed
        }
        None => EditOutcome::NotFound,
    }
}

/// Drop every completed task. Returns how many were removed.
pub fn clear_completed(store: &mut TaskStore) -> usize {
    let before = store.len();
    store.retain(|task| !task.completed);
    before - store.len()
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

/// Append a subtask to `parent`. Blank text or a missing parent creates nothing.
pub fn add_subtask(store: &mut TaskStore, parent: TaskId, text: &str) -> Option<SubtaskId> {
    let text = clean_text(text)?;
    store.get(parent)?;
    let id = store.alloc_subtask_id()?;
    let task = store.get_mut(parent)?;
    task.subtasks.push(Subtask::new(id, text));
    Some(id)
}

pub fn delete_subtask(store: &mut TaskStore, parent: TaskId, sub: SubtaskId) -> bool {
    let Some(task) = store.get_mut(parent) else {
        return false;
    };
    let before = task.subtasks.len();
    task.subtasks.retain(|s| s.id != sub);
    task.subtasks.len() != before
}

/// Flip one subtask. The parent's own state is never touched.
pub fn toggle_subtask(
    store: &mut TaskStore,
    parent: TaskId,
    sub: SubtaskId,
    today: NaiveDate,
) -> Option<Completion> {
    let subtask = store.get_mut(parent)?.subtask_mut(sub)?;
    let now_completed = !subtask.completed;
    subtask.set_completed(now_completed, today);
    Some(if now_completed {
        Completion::CompleteSubtask(sub)
    } else {
        Completion::UncompleteSubtask(sub)
    })
}

/// Rename a subtask; blank text deletes it
pub fn edit_subtask(store: &mut TaskStore, parent: TaskId, sub: SubtaskId, text: &str) -> EditOutcome {
    let Some(text) = clean_text(text) else {
        return if delete_subtask(store, parent, sub) {
            EditOutcome::Deleted
        } else {
            EditOutcome::NotFound
        };
    };
    match store.get_mut(parent).and_then(|t| t.subtask_mut(sub)) {
        Some(subtask) => {
            subtask.text = text;
            EditOutcome::Renamed
        }
        None => EditOutcome::NotFound,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// One task with three subtasks, one task without
    fn sample_store() -> (TaskStore, TaskId, Vec<SubtaskId>, TaskId) {
        let mut store = TaskStore::new();
        let now = Utc::now();
        let a = add_task(&mut store, "Write report", now).unwrap();
        let subs = ["Outline", "Draft", "Proofread"]
            .iter()
            .map(|t| add_subtask(&mut store, a, t).unwrap())
            .collect();
        let b = add_task(&mut store, "Buy milk", now).unwrap();
        (store, a, subs, b)
    }

    fn assert_date_invariant(store: &TaskStore) {
        for task in store.iter() {
            assert_eq!(task.completed, task.completion_date.is_some());
            for sub in &task.subtasks {
                assert_eq!(sub.completed, sub.completion_date.is_some());
            }
        }
    }

    // --- Add / edit / delete ---

    #[test]
    fn test_add_task_trims_and_assigns_ids() {
        let mut store = TaskStore::new();
        let a = add_task(&mut store, "  Buy milk  ", Utc::now()).unwrap();
        let b = add_task(&mut store, "Call mom", Utc::now()).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.get(a).unwrap().text, "Buy milk");
    }

    #[test]
    fn test_add_blank_is_noop() {
        let mut store = TaskStore::new();
        assert!(add_task(&mut store, "   ", Utc::now()).is_none());
        assert!(store.is_empty());
        assert_eq!(store.next_task_id(), Some(1));

        let a = add_task(&mut store, "x", Utc::now()).unwrap();
        assert!(add_subtask(&mut store, a, "\t").is_none());
        assert!(store.get(a).unwrap().subtasks.is_empty());
    }

    #[test]
    fn test_add_subtask_missing_parent() {
        let mut store = TaskStore::new();
        assert!(add_subtask(&mut store, 42, "orphan").is_none());
        assert_eq!(store.next_subtask_id(), Some(1));
    }

    #[test]
    fn test_subtask_ids_unique_across_tasks() {
        let (mut store, a, subs, b) = sample_store();
        let extra = add_subtask(&mut store, b, "Check fridge").unwrap();
        assert!(!subs.contains(&extra));
        assert_eq!(store.find_subtask(extra).unwrap().0.id, b);
        assert_eq!(store.get(a).unwrap().subtasks.len(), 3);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (mut store, _, _, b) = sample_store();
        assert!(delete_task(&mut store, b));
        let c = add_task(&mut store, "Another", Utc::now()).unwrap();
        assert!(c > b);
    }

    #[test]
    fn test_edit_task_renames() {
        let (mut store, a, _, _) = sample_store();
        assert_eq!(edit_task(&mut store, a, " Final report "), EditOutcome::Renamed);
        assert_eq!(store.get(a).unwrap().text, "Final report");
    }

    #[test]
    fn test_edit_task_blank_deletes() {
        let (mut store, a, _, _) = sample_store();
        assert_eq!(edit_task(&mut store, a, "  "), EditOutcome::Deleted);
        assert!(store.get(a).is_none());
        assert_eq!(edit_task(&mut store, a, ""), EditOutcome::NotFound);
    }

    #[test]
    fn test_edit_subtask_blank_deletes() {
        let (mut store, a, subs, _) = sample_store();
        assert_eq!(edit_subtask(&mut store, a, subs[1], "Rough draft"), EditOutcome::Renamed);
        assert_eq!(store.get(a).unwrap().subtask(subs[1]).unwrap().text, "Rough draft");
        assert_eq!(edit_subtask(&mut store, a, subs[1], ""), EditOutcome::Deleted);
        let remaining: Vec<_> = store.get(a).unwrap().subtasks.iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec![subs[0], subs[2]]);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let (mut store, a, _, _) = sample_store();
        let today = day("2025-05-01");
        assert!(toggle_task(&mut store, 99, today).is_none());
        assert!(toggle_subtask(&mut store, a, 99, today).is_none());
        assert!(toggle_subtask(&mut store, 99, 1, today).is_none());
        assert!(!delete_task(&mut store, 99));
        assert!(!delete_subtask(&mut store, a, 99));
        assert_eq!(edit_task(&mut store, 99, "x"), EditOutcome::NotFound);
        assert_eq!(edit_subtask(&mut store, a, 99, "x"), EditOutcome::NotFound);
        assert_eq!(store.len(), 2);
    }

    // --- Completion ---

    #[test]
    fn test_complete_cascades_to_subtasks() {
        let (mut store, a, subs, _) = sample_store();
        let today = day("2025-05-01");
        let change = toggle_task(&mut store, a, today).unwrap();
        assert_eq!(
            change,
            Completion::CompleteCascade {
                task: a,
                subtasks: subs.clone()
            }
        );
        let task = store.get(a).unwrap();
        assert!(task.completed);
        assert_eq!(task.completion_date, Some(today));
        for sub in &task.subtasks {
            assert!(sub.completed);
            assert_eq!(sub.completion_date, task.completion_date);
        }
    }

    #[test]
    fn test_cascade_redates_already_completed_subtasks() {
        let (mut store, a, subs, _) = sample_store();
        toggle_subtask(&mut store, a, subs[0], day("2025-04-20"));
        toggle_task(&mut store, a, day("2025-05-01"));
        let sub = store.get(a).unwrap().subtask(subs[0]).unwrap();
        assert_eq!(sub.completion_date, Some(day("2025-05-01")));
    }

    #[test]
    fn test_uncomplete_leaves_subtasks() {
        let (mut store, a, subs, _) = sample_store();
        let today = day("2025-05-01");
        toggle_task(&mut store, a, today);
        let change = toggle_task(&mut store, a, today).unwrap();
        assert_eq!(
            change,
            Completion::UncompleteLocal {
                task: a,
                subtasks: subs
            }
        );
        let task = store.get(a).unwrap();
        assert!(!task.completed);
        assert!(task.completion_date.is_none());
        assert!(task.subtasks.iter().all(|s| s.completed));
        assert!(task.subtasks.iter().all(|s| s.completion_date == Some(today)));
    }

    #[test]
    fn test_explicit_variants_reject_wrong_state() {
        let (mut store, a, _, _) = sample_store();
        let today = day("2025-05-01");
        assert!(uncomplete_local(&mut store, a).is_none());
        assert!(complete_cascade(&mut store, a, today).is_some());
        assert!(complete_cascade(&mut store, a, today).is_none());
    }

    #[test]
    fn test_toggle_subtask_never_touches_parent() {
        let (mut store, a, subs, _) = sample_store();
        let today = day("2025-05-01");
        for &s in &subs {
            assert_eq!(
                toggle_subtask(&mut store, a, s, today),
                Some(Completion::CompleteSubtask(s))
            );
        }
        assert!(!store.get(a).unwrap().completed);

        toggle_task(&mut store, a, today);
        assert_eq!(
            toggle_subtask(&mut store, a, subs[0], today),
            Some(Completion::UncompleteSubtask(subs[0]))
        );
        assert!(store.get(a).unwrap().completed);
    }

    #[test]
    fn test_completion_date_invariant_over_toggle_sequence() {
        let (mut store, a, subs, b) = sample_store();
        let days = ["2025-05-01", "2025-05-01", "2025-05-02", "2025-05-04", "2025-05-04"];
        for (i, d) in days.iter().enumerate() {
            toggle_task(&mut store, a, day(d));
            assert_date_invariant(&store);
            toggle_task(&mut store, b, day(d));
            assert_date_invariant(&store);
            toggle_subtask(&mut store, a, subs[i % subs.len()], day(d));
            assert_date_invariant(&store);
        }
    }

    #[test]
    fn test_clear_completed() {
        let (mut store, a, _, b) = sample_store();
        toggle_task(&mut store, b, day("2025-05-01"));
        assert_eq!(clear_completed(&mut store), 1);
        assert!(store.get(b).is_none());
        assert!(store.get(a).is_some());
        assert_eq!(clear_completed(&mut store), 0);
    }
}
