use super::activity::{ActivityLedger, ActivityLog};
use super::store::TaskStore;
use super::streak::StreakState;

/// All tracker state: the task tree plus the history derived from it.
///
/// Each part is persisted under its own key and loads (or falls back to
/// empty) independently of the others.
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub store: TaskStore,
    pub ledger: ActivityLedger,
    pub log: ActivityLog,
    pub streak: StreakState,
    /// Parts changed since the last save
    pub dirty: Dirty,
}

/// Which persisted parts of a [`Board`] need rewriting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub tasks: bool,
    pub ledger: bool,
    pub log: bool,
    pub streak: bool,
}

impl Dirty {
    pub fn all() -> Self {
        Dirty {
            tasks: true,
            ledger: true,
            log: true,
            streak: true,
        }
    }

    pub fn any(self) -> bool {
        self.tasks || self.ledger || self.log || self.streak
    }
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn mark_clean(&mut self) {
        self.dirty = Dirty::default();
    }
}
