use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::task::{SubtaskId, TaskFilter, TaskId};

#[derive(Parser)]
#[command(name = "tally", about = concat!("tally v", env!("CARGO_PKG_VERSION"), " - tasks, streaks and a year of activity"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use the tally data in this directory instead of searching upward
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// Treat this date as today
    #[arg(long, global = true, hide = true, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .tally/ directory here
    Init(InitArgs),
    /// Add a task
    Add(AddArgs),
    /// Add a subtask to a task
    Sub(SubArgs),
    /// Complete or reopen a task (completing also completes its subtasks)
    Toggle(TaskArgs),
    /// Complete or reopen a subtask
    ToggleSub(SubtaskArgs),
    /// Change a task's text (empty text deletes it)
    Edit(EditArgs),
    /// Change a subtask's text (empty text deletes it)
    EditSub(EditSubArgs),
    /// Delete a task and its subtasks
    Rm(TaskArgs),
    /// Delete a subtask
    RmSub(SubtaskArgs),
    /// Delete all completed tasks
    Clear,
    /// List tasks
    List(ListArgs),
    /// Show completion statistics
    Stats,
    /// Show the current and longest streak
    Streak,
    /// Show the activity heatmap for the last year
    Heatmap(HeatmapArgs),
    /// Show what was completed on a day
    Day(DayArgs),
    /// Show active days over the last 30 days
    Calendar,
    /// Show the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite config.toml even if .tally/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct SubArgs {
    /// Parent task ID
    pub task: TaskId,
    /// Subtask text
    pub text: String,
}

#[derive(Args)]
pub struct TaskArgs {
    /// Task ID
    pub task: TaskId,
}

#[derive(Args)]
pub struct SubtaskArgs {
    /// Parent task ID
    pub task: TaskId,
    /// Subtask ID
    pub sub: SubtaskId,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub task: TaskId,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct EditSubArgs {
    /// Parent task ID
    pub task: TaskId,
    /// Subtask ID
    pub sub: SubtaskId,
    /// New text
    pub text: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Which tasks to show (all, active, completed)
    #[arg(long, default_value = "all", value_parser = TaskFilter::parse)]
    pub filter: TaskFilter,
}

#[derive(Args)]
pub struct HeatmapArgs {
    /// Maximum number of week columns (default from config)
    #[arg(long)]
    pub weeks: Option<usize>,
}

#[derive(Args)]
pub struct DayArgs {
    /// Date to show (YYYY-MM-DD)
    pub date: NaiveDate,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Print the path to the recovery log
    Path,
}
