//! Top-level user actions on a [`Board`].
//!
//! Each action runs the whole pipeline in order (task store, then activity
//! ledger, then streak) against a single `today` supplied by the caller, and
//! marks the parts of the board it changed so only those get written back.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::model::board::Board;
use crate::model::task::{SubtaskId, TaskId};
use crate::ops::task_ops::{self, Completion, EditOutcome};
use crate::ops::{activity_ops, streak};

/// Bring derived state up to date when the board is first loaded: seed an
/// empty ledger from existing completions, then recompute the streak.
pub fn startup(board: &mut Board, today: NaiveDate) {
    if activity_ops::bootstrap_from_store(&mut board.ledger, &mut board.log, &board.store, today) {
        board.dirty.ledger = true;
        board.dirty.log = true;
    }
    refresh_streak(board, today);
}

pub fn add_task(board: &mut Board, text: &str, now: DateTime<Utc>) -> Option<TaskId> {
    let id = task_ops::add_task(&mut board.store, text, now)?;
    board.dirty.tasks = true;
    Some(id)
}

pub fn add_subtask(board: &mut Board, parent: TaskId, text: &str) -> Option<SubtaskId> {
    let id = task_ops::add_subtask(&mut board.store, parent, text)?;
    board.dirty.tasks = true;
    Some(id)
}

pub fn toggle_task(board: &mut Board, id: TaskId, today: NaiveDate) -> Option<Completion> {
    let change = task_ops::toggle_task(&mut board.store, id, today)?;
    after_completion(board, today, &change);
    Some(change)
}

pub fn toggle_subtask(
    board: &mut Board,
    parent: TaskId,
    sub: SubtaskId,
    today: NaiveDate,
) -> Option<Completion> {
    let change = task_ops::toggle_subtask(&mut board.store, parent, sub, today)?;
    after_completion(board, today, &change);
    Some(change)
}

pub fn edit_task(board: &mut Board, id: TaskId, text: &str) -> EditOutcome {
    let outcome = task_ops::edit_task(&mut board.store, id, text);
    if outcome != EditOutcome::NotFound {
        board.dirty.tasks = true;
    }
    outcome
}

pub fn edit_subtask(board: &mut Board, parent: TaskId, sub: SubtaskId, text: &str) -> EditOutcome {
    let outcome = task_ops::edit_subtask(&mut board.store, parent, sub, text);
    if outcome != EditOutcome::NotFound {
        board.dirty.tasks = true;
    }
    outcome
}

pub fn delete_task(board: &mut Board, id: TaskId) -> bool {
    let removed = task_ops::delete_task(&mut board.store, id);
    board.dirty.tasks |= removed;
    removed
}

pub fn delete_subtask(board: &mut Board, parent: TaskId, sub: SubtaskId) -> bool {
    let removed = task_ops::delete_subtask(&mut board.store, parent, sub);
    board.dirty.tasks |= removed;
    removed
}

pub fn clear_completed(board: &mut Board) -> usize {
    let removed = task_ops::clear_completed(&mut board.store);
    board.dirty.tasks |= removed > 0;
    removed
}

fn after_completion(board: &mut Board, today: NaiveDate, change: &Completion) {
    board.dirty.tasks = true;
    let ledger_before = board.ledger.clone();
    let log_before = board.log.len();
    activity_ops::apply_completion(&mut board.ledger, &mut board.log, today, change);
    board.dirty.ledger |= board.ledger != ledger_before;
    board.dirty.log |= board.log.len() != log_before;
    refresh_streak(board, today);
}

fn refresh_streak(board: &mut Board, today: NaiveDate) {
    let before = board.streak;
    let log_before = board.log.len();
    let after = streak::recompute(&mut board.streak, &board.ledger, &mut board.log, today);
    if after != before {
        debug!(?before, ?after, "streak changed");
        board.dirty.streak = true;
    }
    board.dirty.log |= board.log.len() != log_before;
}
