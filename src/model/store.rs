use indexmap::IndexMap;

use super::task::{Subtask, SubtaskId, Task, TaskId};

/// Arena of live tasks keyed by id, in insertion order.
///
/// Ids come from two monotonic counters (one per kind). Removing a task drops
/// it from the map but never rewinds a counter, so an id handed out once is
/// never handed out again by this store.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, Task>,
    /// `None` once every id up to `u64::MAX` has been used
    next_task_id: Option<TaskId>,
    next_subtask_id: Option<SubtaskId>,
}

impl Default for TaskStore {
    fn default() -> Self {
        TaskStore::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore {
            tasks: IndexMap::new(),
            next_task_id: Some(1),
            next_subtask_id: Some(1),
        }
    }

    /// Build a store from a persisted task list. Counters resume one past
    /// the highest id present.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = TaskStore::new();
        for task in tasks {
            store.reserve_ids(
                task.id,
                task.subtasks.iter().map(|s| s.id).max().unwrap_or(0),
            );
            store.tasks.insert(task.id, task);
        }
        store
    }

    /// Make sure the counters are past the given ids
    pub fn reserve_ids(&mut self, highest_task: TaskId, highest_subtask: SubtaskId) {
        self.next_task_id = advance_past(self.next_task_id, highest_task);
        self.next_subtask_id = advance_past(self.next_subtask_id, highest_subtask);
    }

    /// Hand out the next task id, or `None` when they have run out
    pub fn alloc_task_id(&mut self) -> Option<TaskId> {
        let id = self.next_task_id?;
        self.next_task_id = id.checked_add(1);
        Some(id)
    }

    pub fn alloc_subtask_id(&mut self) -> Option<SubtaskId> {
        let id = self.next_subtask_id?;
        self.next_subtask_id = id.checked_add(1);
        Some(id)
    }

    pub fn next_task_id(&self) -> Option<TaskId> {
        self.next_task_id
    }

    pub fn next_subtask_id(&self) -> Option<SubtaskId> {
        self.next_subtask_id
    }

    /// Highest task id handed out or reserved so far, 0 if none
    pub fn last_task_id(&self) -> TaskId {
        self.next_task_id.map_or(TaskId::MAX, |next| next - 1)
    }

    pub fn last_subtask_id(&self) -> SubtaskId {
        self.next_subtask_id.map_or(SubtaskId::MAX, |next| next - 1)
    }

    pub fn insert(&mut self, task: Task) {
        self.reserve_ids(task.id, task.subtasks.iter().map(|s| s.id).max().unwrap_or(0));
        self.tasks.insert(task.id, task);
    }

    /// Remove a task, keeping the order of the remaining ones
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.shift_remove(&id)
    }

    pub fn retain(&mut self, mut f: impl FnMut(&Task) -> bool) {
        self.tasks.retain(|_, task| f(task));
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Find a subtask anywhere in the store, with its parent
    pub fn find_subtask(&self, id: SubtaskId) -> Option<(&Task, &Subtask)> {
        self.tasks
            .values()
            .find_map(|task| task.subtask(id).map(|sub| (task, sub)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Snapshot of the task list in display order
    pub fn to_vec(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }
}

fn advance_past(next: Option<u64>, highest: u64) -> Option<u64> {
    let past = highest.checked_add(1)?;
    next.map(|next| next.max(past))
}
