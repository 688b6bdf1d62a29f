use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::activity::{ActivityLedger, ActivityLog, CompletionKind};
use crate::model::store::TaskStore;
use crate::ops::task_ops::Completion;

/// Record one completion on `date`. Idempotent.
pub fn record_completion(
    ledger: &mut ActivityLedger,
    log: &mut ActivityLog,
    date: NaiveDate,
    kind: CompletionKind,
    id: u64,
) -> bool {
    let added = ledger.entry(date).insert(kind, id);
    log.insert(date);
    added
}

/// Take back a completion recorded on `date`.
///
/// Only an existing record is touched and an emptied record stays in the
/// ledger. The activity log is never pruned.
pub fn revert_completion(
    ledger: &mut ActivityLedger,
    log: &mut ActivityLog,
    date: NaiveDate,
    kind: CompletionKind,
    id: u64,
) -> bool {
    let Some(record) = ledger.existing_mut(date) else {
        return false;
    };
    let removed = record.remove(kind, id);
    if !record.is_empty() {
        log.insert(date);
    }
    removed
}

/// Mirror a toggle into `today`'s record.
///
/// Reversals only ever reach today's record: a completion logged on an
/// earlier day stays in the history even if the item is reopened now.
pub fn apply_completion(
    ledger: &mut ActivityLedger,
    log: &mut ActivityLog,
    today: NaiveDate,
    change: &Completion,
) {
    debug!(?change, %today, "applying completion to ledger");
    match change {
        Completion::CompleteCascade { task, subtasks } => {
            record_completion(ledger, log, today, CompletionKind::Task, *task);
            for &sub in subtasks {
                record_completion(ledger, log, today, CompletionKind::Subtask, sub);
            }
        }
        Completion::UncompleteLocal { task, subtasks } => {
            revert_completion(ledger, log, today, CompletionKind::Task, *task);
            for &sub in subtasks {
                revert_completion(ledger, log, today, CompletionKind::Subtask, sub);
            }
        }
        Completion::CompleteSubtask(sub) => {
            record_completion(ledger, log, today, CompletionKind::Subtask, *sub);
        }
        Completion::UncompleteSubtask(sub) => {
            revert_completion(ledger, log, today, CompletionKind::Subtask, *sub);
        }
    }
}

/// Seed an empty ledger from tasks that are already completed.
///
/// Everything currently completed is attributed to `today`; there is no
/// better date to use. Does nothing once the ledger has any history.
pub fn bootstrap_from_store(
    ledger: &mut ActivityLedger,
    log: &mut ActivityLog,
    store: &TaskStore,
    today: NaiveDate,
) -> bool {
    if !ledger.is_empty() {
        return false;
    }
    let tasks: Vec<u64> = store.iter().filter(|t| t.completed).map(|t| t.id).collect();
    let subtasks: Vec<u64> = store
        .iter()
        .flat_map(|t| t.subtasks.iter())
        .filter(|s| s.completed)
        .map(|s| s.id)
        .collect();
    if tasks.is_empty() && subtasks.is_empty() {
        return false;
    }

    info!(
        tasks = tasks.len(),
        subtasks = subtasks.len(),
        %today,
        "seeding empty activity ledger from completed tasks"
    );
    for id in tasks {
        record_completion(ledger, log, today, CompletionKind::Task, id);
    }
    for id in subtasks {
        record_completion(ledger, log, today, CompletionKind::Subtask, id);
    }
    true
}
