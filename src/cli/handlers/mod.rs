mod init;
pub use init::cmd_init;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io;
use crate::io::config_io;
use crate::io::kv::FileStore;
use crate::io::lock::DataLock;
use crate::io::recovery;
use crate::model::board::Board;
use crate::model::config::Config;
use crate::model::task::{Task, TaskId};
use crate::ops::task_ops::EditOutcome;
use crate::ops::{actions, heatmap, stats};

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Where and when a command runs
struct Context {
    data_dir: PathBuf,
    config: Config,
    today: NaiveDate,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let data_dir_arg = cli.data_dir.as_deref().map(Path::new);

    let cmd = match cli.command {
        // Init runs before there is anything to discover
        Commands::Init(args) => return cmd_init(args, data_dir_arg),
        cmd => cmd,
    };

    let data_dir = match data_dir_arg {
        Some(dir) => config_io::resolve_data_dir(dir)?,
        None => config_io::discover_data_dir(&std::env::current_dir()?)?,
    };
    let ctx = Context {
        config: config_io::read_config(&data_dir)?,
        data_dir,
        today,
        json: cli.json,
    };
    debug!(data_dir = %ctx.data_dir.display(), %today, "dispatching");

    match cmd {
        Commands::Init(_) => unreachable!("init is handled before discovery"),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Sub(args) => cmd_sub(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::ToggleSub(args) => cmd_toggle_sub(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::EditSub(args) => cmd_edit_sub(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::RmSub(args) => cmd_rm_sub(&ctx, args),
        Commands::Clear => cmd_clear(&ctx),

        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Streak => cmd_streak(&ctx),
        Commands::Heatmap(args) => cmd_heatmap(&ctx, args),
        Commands::Day(args) => cmd_day(&ctx, args),
        Commands::Calendar => cmd_calendar(&ctx),
        Commands::Recovery(args) => cmd_recovery(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the board under the lock, bring it up to date for today, run
/// `action`, and write back whatever changed.
///
/// Changes from the startup pass are saved even when `action` fails.
fn with_board<T>(ctx: &Context, action: impl FnOnce(&mut Board) -> CmdResult<T>) -> CmdResult<T> {
    let _lock = DataLock::acquire_default(&ctx.data_dir)?;
    let mut kv = FileStore::new(&ctx.data_dir);
    let mut board = board_io::load_board(&kv);
    actions::startup(&mut board, ctx.today);

    let result = action(&mut board);
    if board.dirty.any() {
        debug!(dirty = ?board.dirty, "saving");
        board_io::save_board(&mut kv, &mut board)?;
    }
    result
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn find_task(board: &Board, id: TaskId) -> CmdResult<&Task> {
    board
        .store
        .get(id)
        .ok_or_else(|| format!("task not found: {}", id).into())
}

/// Print a task after a change, as JSON or as a tree
fn show_task(ctx: &Context, task: &Task) -> CmdResult {
    if ctx.json {
        print_json(&task_to_json(task))
    } else {
        print_lines(&format_task_tree(task, ctx.config.list.width));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    with_board(ctx, |board| {
        let id = actions::add_task(board, &args.text, Utc::now()).ok_or(
            if board.store.next_task_id().is_none() {
                "no task ids left"
            } else {
                "task text cannot be empty"
            },
        )?;
        if ctx.json {
            print_json(&task_to_json(find_task(board, id)?))
        } else {
            println!("{}", id);
            Ok(())
        }
    })
}

fn cmd_sub(ctx: &Context, args: SubArgs) -> CmdResult {
    with_board(ctx, |board| {
        find_task(board, args.task)?;
        let id = actions::add_subtask(board, args.task, &args.text).ok_or(
            if board.store.next_subtask_id().is_none() {
                "no subtask ids left"
            } else {
                "subtask text cannot be empty"
            },
        )?;
        if ctx.json {
            let task = find_task(board, args.task)?;
            let sub = task.subtask(id).ok_or("subtask vanished after insert")?;
            print_json(&subtask_to_json(sub))
        } else {
            println!("{}", id);
            Ok(())
        }
    })
}

fn cmd_toggle(ctx: &Context, args: TaskArgs) -> CmdResult {
    with_board(ctx, |board| {
        actions::toggle_task(board, args.task, ctx.today)
            .ok_or_else(|| format!("task not found: {}", args.task))?;
        show_task(ctx, find_task(board, args.task)?)
    })
}

fn cmd_toggle_sub(ctx: &Context, args: SubtaskArgs) -> CmdResult {
    with_board(ctx, |board| {
        find_task(board, args.task)?;
        actions::toggle_subtask(board, args.task, args.sub, ctx.today)
            .ok_or_else(|| format!("subtask not found: {} in task {}", args.sub, args.task))?;
        show_task(ctx, find_task(board, args.task)?)
    })
}

fn report_edit(ctx: &Context, outcome: EditOutcome, what: String) -> CmdResult {
    let verb = match outcome {
        EditOutcome::Renamed => "renamed",
        EditOutcome::Deleted => "deleted",
        EditOutcome::NotFound => return Err(format!("{} not found", what).into()),
    };
    if ctx.json {
        print_json(&serde_json::json!({ "result": verb }))
    } else {
        println!("{} {}", verb, what);
        Ok(())
    }
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    with_board(ctx, |board| {
        let outcome = actions::edit_task(board, args.task, &args.text);
        report_edit(ctx, outcome, format!("task {}", args.task))
    })
}

fn cmd_edit_sub(ctx: &Context, args: EditSubArgs) -> CmdResult {
    with_board(ctx, |board| {
        let outcome = actions::edit_subtask(board, args.task, args.sub, &args.text);
        report_edit(ctx, outcome, format!("subtask {}", args.sub))
    })
}

fn cmd_rm(ctx: &Context, args: TaskArgs) -> CmdResult {
    with_board(ctx, |board| {
        if !actions::delete_task(board, args.task) {
            return Err(format!("task not found: {}", args.task).into());
        }
        report_edit(ctx, EditOutcome::Deleted, format!("task {}", args.task))
    })
}

fn cmd_rm_sub(ctx: &Context, args: SubtaskArgs) -> CmdResult {
    with_board(ctx, |board| {
        if !actions::delete_subtask(board, args.task, args.sub) {
            return Err(format!("subtask not found: {} in task {}", args.sub, args.task).into());
        }
        report_edit(ctx, EditOutcome::Deleted, format!("subtask {}", args.sub))
    })
}

fn cmd_clear(ctx: &Context) -> CmdResult {
    with_board(ctx, |board| {
        let removed = actions::clear_completed(board);
        if ctx.json {
            print_json(&serde_json::json!({ "removed": removed }))
        } else {
            println!("cleared {} completed {}", removed, if removed == 1 { "task" } else { "tasks" });
            Ok(())
        }
    })
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    with_board(ctx, |board| {
        let tasks = stats::filtered_tasks(&board.store, args.filter);
        let active = stats::active_count(&board.store);
        if ctx.json {
            print_json(&TaskListJson {
                filter: args.filter,
                active,
                tasks: tasks.iter().map(|t| task_to_json(t)).collect(),
            })
        } else {
            print_lines(&format_task_listing(&tasks, active, ctx.config.list.width));
            Ok(())
        }
    })
}

fn cmd_stats(ctx: &Context) -> CmdResult {
    with_board(ctx, |board| {
        let active = stats::active_count(&board.store);
        let summary = StatsJson {
            total: board.store.len(),
            active,
            completed: board.store.len() - active,
            overall_completion: stats::overall_completion(&board.store),
            active_days: board.log.len(),
            streak: streak_to_json(&board.streak),
        };
        if ctx.json {
            print_json(&summary)
        } else {
            print_lines(&format_stats(&summary));
            Ok(())
        }
    })
}

fn cmd_streak(ctx: &Context) -> CmdResult {
    with_board(ctx, |board| {
        if ctx.json {
            print_json(&streak_to_json(&board.streak))
        } else {
            print_lines(&format_streak(&board.streak));
            Ok(())
        }
    })
}

fn cmd_heatmap(ctx: &Context, args: HeatmapArgs) -> CmdResult {
    with_board(ctx, |board| {
        let max_weeks = args.weeks.unwrap_or(ctx.config.heatmap.max_weeks);
        let map = heatmap::project(&board.ledger, ctx.today, max_weeks);
        if ctx.json {
            return print_json(&map);
        }
        let color = ctx.config.heatmap.color && std::io::stdout().is_terminal();
        print_lines(&render_heatmap(&map, color));
        println!();
        println!("{}", heatmap_legend(color));
        println!("{}", heatmap_footer(&map));
        Ok(())
    })
}

fn cmd_day(ctx: &Context, args: DayArgs) -> CmdResult {
    with_board(ctx, |board| {
        let summary = stats::day_summary(&board.store, &board.ledger, args.date, ctx.today);
        let details = stats::day_details(&board.store, &board.ledger, args.date);
        let record = board.ledger.get(args.date);
        if ctx.json {
            print_json(&day_to_json(summary, &details, record))
        } else {
            print_lines(&format_day(&summary, &details, record, ctx.config.list.width));
            Ok(())
        }
    })
}

fn cmd_calendar(ctx: &Context) -> CmdResult {
    with_board(ctx, |board| {
        let days = stats::recent_calendar(&board.log, ctx.today);
        if ctx.json {
            print_json(&CalendarJson {
                active_days: days.iter().filter(|d| d.active).count(),
                days,
            })
        } else {
            print_lines(&format_calendar(&days));
            Ok(())
        }
    })
}

fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> CmdResult {
    if let Some(RecoveryAction::Path) = args.action {
        println!("{}", recovery::recovery_log_path(&ctx.data_dir).display());
        return Ok(());
    }
    match recovery::read_recovery_log(&ctx.data_dir) {
        Some(log) if ctx.json => print_json(&serde_json::json!({ "log": log })),
        Some(log) => {
            print!("{}", log);
            Ok(())
        }
        None if ctx.json => print_json(&serde_json::json!({ "log": null })),
        None => {
            println!("no recovery log");
            Ok(())
        }
    }
}
