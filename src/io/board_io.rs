use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::io::kv::{KeyValueStore, StorageError};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::model::activity::{ActivityLedger, ActivityLog};
use crate::model::board::Board;
use crate::model::store::TaskStore;
use crate::model::streak::StreakState;
use crate::model::task::{SubtaskId, Task, TaskId};

pub const TASKS_KEY: &str = "tasks";
pub const STREAK_KEY: &str = "streak";
pub const ACTIVITY_LOG_KEY: &str = "activityLog";
pub const DAILY_ACTIVITY_KEY: &str = "dailyActivity";
pub const LAST_IDS_KEY: &str = "lastIds";

/// Highest ids handed out so far. Without them, deleting the newest task
/// would free its id for the next load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LastIds {
    #[serde(default)]
    task: TaskId,
    #[serde(default)]
    subtask: SubtaskId,
}

/// Load all four parts of the board.
///
/// Each key is read on its own: a missing, unreadable or malformed value
/// becomes that part's empty default without affecting the others.
/// Malformed values are copied to the recovery log first.
pub fn load_board(kv: &dyn KeyValueStore) -> Board {
    let tasks: Vec<Task> = load_value(kv, TASKS_KEY);
    let ledger: ActivityLedger = load_value(kv, DAILY_ACTIVITY_KEY);
    let log: ActivityLog = load_value(kv, ACTIVITY_LOG_KEY);
    let mut streak: StreakState = load_value(kv, STREAK_KEY);
    let last: LastIds = load_value(kv, LAST_IDS_KEY);

    let mut store = TaskStore::from_tasks(tasks);
    store.reserve_ids(last.task, last.subtask);
    // Ids referenced by history must not be handed out again
    let (task_id, subtask_id) = ledger.highest_ids();
    store.reserve_ids(task_id, subtask_id);

    streak.longest = streak.longest.max(streak.count);

    debug!(
        tasks = store.len(),
        days = ledger.len(),
        active_days = log.len(),
        "board loaded"
    );
    Board {
        store,
        ledger,
        log,
        streak,
        dirty: Default::default(),
    }
}

fn load_value<T: DeserializeOwned + Default>(kv: &dyn KeyValueStore, key: &str) -> T {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "could not read stored value, starting empty");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "stored value is malformed, starting empty");
            if let Some(dir) = kv.dir() {
                log_recovery(
                    dir,
                    RecoveryEntry {
                        timestamp: Utc::now(),
                        category: RecoveryCategory::Load,
                        description: format!("unreadable {} replaced with empty value", key),
                        fields: vec![
                            ("Key".to_string(), key.to_string()),
                            ("Error".to_string(), e.to_string()),
                        ],
                        body: raw,
                    },
                );
            }
            T::default()
        }
    }
}

/// Write back every part marked dirty, then mark the board clean.
pub fn save_board(kv: &mut dyn KeyValueStore, board: &mut Board) -> Result<(), StorageError> {
    let dirty = board.dirty;
    if dirty.tasks {
        save_value(kv, TASKS_KEY, &board.store.to_vec())?;
        let last = LastIds {
            task: board.store.last_task_id(),
            subtask: board.store.last_subtask_id(),
        };
        save_value(kv, LAST_IDS_KEY, &last)?;
    }
    if dirty.ledger {
        save_value(kv, DAILY_ACTIVITY_KEY, &board.ledger)?;
    }
    if dirty.log {
        save_value(kv, ACTIVITY_LOG_KEY, &board.log)?;
    }
    if dirty.streak {
        save_value(kv, STREAK_KEY, &board.streak)?;
    }
    board.mark_clean();
    Ok(())
}

fn save_value<T: Serialize>(
    kv: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::SerializeError {
        key: key.to_string(),
        source: e,
    })?;
    if let Err(e) = kv.set(key, &json) {
        if let Some(dir) = kv.dir() {
            log_recovery(
                dir,
                RecoveryEntry {
                    timestamp: Utc::now(),
                    category: RecoveryCategory::Write,
                    description: format!("could not save {}", key),
                    fields: vec![("Key".to_string(), key.to_string())],
                    body: json,
                },
            );
        }
        return Err(e);
    }
    debug!(key, bytes = json.len(), "saved");
    Ok(())
}
