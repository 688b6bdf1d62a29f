use chrono::{DateTime, NaiveDate, Utc};
use crossterm::style::{Color, Stylize};
use serde::Serialize;

use crate::model::activity::DayRecord;
use crate::model::streak::StreakState;
use crate::model::task::{Subtask, SubtaskId, Task, TaskFilter, TaskId};
use crate::ops::heatmap::Heatmap;
use crate::ops::stats::{self, DayDetails, DaySummary, RecentDay};
use crate::util::unicode::{fit_to_width, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    /// 100 when completed, otherwise share of completed subtasks
    pub percentage: u8,
    pub subtasks: Vec<SubtaskJson>,
}

#[derive(Serialize)]
pub struct SubtaskJson {
    pub id: SubtaskId,
    pub text: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub filter: TaskFilter,
    pub active: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct StreakJson {
    pub count: u32,
    pub longest: u32,
    pub last_active_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overall_completion: u8,
    pub active_days: usize,
    pub streak: StreakJson,
}

#[derive(Serialize)]
pub struct DayTaskJson {
    pub id: TaskId,
    pub text: String,
    pub subtasks_completed: usize,
}

#[derive(Serialize)]
pub struct DaySubtaskJson {
    pub task: TaskId,
    pub id: SubtaskId,
    pub text: String,
}

#[derive(Serialize)]
pub struct DayJson {
    #[serde(flatten)]
    pub summary: DaySummary,
    pub tasks: Vec<DayTaskJson>,
    pub subtasks: Vec<DaySubtaskJson>,
}

#[derive(Serialize)]
pub struct CalendarJson {
    pub active_days: usize,
    pub days: Vec<RecentDay>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn subtask_to_json(sub: &Subtask) -> SubtaskJson {
    SubtaskJson {
        id: sub.id,
        text: sub.text.clone(),
        completed: sub.completed,
        completion_date: sub.completion_date,
    }
}

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        text: task.text.clone(),
        completed: task.completed,
        created_at: task.created_at,
        completion_date: task.completion_date,
        percentage: stats::task_completion_percentage(task),
        subtasks: task.subtasks.iter().map(subtask_to_json).collect(),
    }
}

pub fn streak_to_json(streak: &StreakState) -> StreakJson {
    StreakJson {
        count: streak.count,
        longest: streak.longest,
        last_active_date: streak.last_active_date,
    }
}

pub fn day_to_json(summary: DaySummary, details: &DayDetails<'_>, record: &DayRecord) -> DayJson {
    DayJson {
        summary,
        tasks: details
            .tasks
            .iter()
            .map(|t| DayTaskJson {
                id: t.id,
                text: t.text.clone(),
                subtasks_completed: stats::subtasks_completed_that_day(t, record),
            })
            .collect(),
        subtasks: details
            .subtasks
            .iter()
            .map(|(parent, sub)| DaySubtaskJson {
                task: parent.id,
                id: sub.id,
                text: sub.text.clone(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn check_char(completed: bool) -> char {
    if completed { 'x' } else { ' ' }
}

/// One task as a single line: `[x]   3 text  1/2 50%`
pub fn format_task_line(task: &Task, width: usize) -> String {
    let head = format!("[{}] {:>3} ", check_char(task.completed), task.id);
    if task.subtasks.is_empty() {
        return format!("{}{}", head, truncate_to_width(&task.text, width));
    }
    let progress = stats::subtask_stats(task);
    format!(
        "{}{}  {}/{} {}%",
        head,
        fit_to_width(&task.text, width),
        progress.completed,
        progress.total,
        progress.percentage
    )
}

fn format_subtask_line(sub: &Subtask, width: usize) -> String {
    format!(
        "      [{}] {:>3} {}",
        check_char(sub.completed),
        sub.id,
        truncate_to_width(&sub.text, width)
    )
}

/// A task followed by its subtasks, indented
pub fn format_task_tree(task: &Task, width: usize) -> Vec<String> {
    let mut lines = vec![format_task_line(task, width)];
    for sub in &task.subtasks {
        lines.push(format_subtask_line(sub, width));
    }
    lines
}

pub fn format_task_listing(tasks: &[&Task], active: usize, width: usize) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["no tasks".to_string()];
    }
    let mut lines: Vec<String> = tasks
        .iter()
        .flat_map(|t| format_task_tree(t, width))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "{} active {}",
        active,
        if active == 1 { "task" } else { "tasks" }
    ));
    lines
}

fn plural_days(n: u32) -> &'static str {
    if n == 1 { "day" } else { "days" }
}

pub fn format_streak(streak: &StreakState) -> Vec<String> {
    let mut lines = vec![format!(
        "streak: {} {} (longest {})",
        streak.count,
        plural_days(streak.count),
        streak.longest
    )];
    match streak.last_active_date {
        Some(date) => lines.push(format!("last active: {}", date)),
        None => lines.push("last active: never".to_string()),
    }
    lines
}

pub fn format_stats(stats: &StatsJson) -> Vec<String> {
    vec![
        format!(
            "tasks: {} total, {} active, {} completed",
            stats.total, stats.active, stats.completed
        ),
        format!("overall completion: {}%", stats.overall_completion),
        format!("active days: {}", stats.active_days),
        format!(
            "streak: {} {} (longest {})",
            stats.streak.count,
            plural_days(stats.streak.count),
            stats.streak.longest
        ),
    ]
}

pub fn format_day(
    summary: &DaySummary,
    details: &DayDetails<'_>,
    record: &DayRecord,
    width: usize,
) -> Vec<String> {
    let mut lines = vec![summary.date.format("%A, %B %-d, %Y").to_string()];
    lines.push(format!(
        "{} tasks, {} subtasks completed ({}% of {} tasks, level {})",
        summary.tasks_completed,
        summary.subtasks_completed,
        summary.completion_rate,
        summary.total_tasks,
        summary.level
    ));
    if details.is_empty() {
        lines.push("nothing completed".to_string());
        return lines;
    }
    for task in &details.tasks {
        let mut line = format!("  [x] {:>3} {}", task.id, truncate_to_width(&task.text, width));
        let subs = stats::subtasks_completed_that_day(task, record);
        if subs > 0 {
            line.push_str(&format!(" (+{} subtasks)", subs));
        }
        lines.push(line);
    }
    for (parent, sub) in &details.subtasks {
        lines.push(format!(
            "  [x] {:>3} {}  (in {})",
            sub.id,
            truncate_to_width(&sub.text, width),
            parent.id
        ));
    }
    lines
}

/// Last 30 days as one row of marks, oldest first
pub fn format_calendar(days: &[RecentDay]) -> Vec<String> {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };
    let marks: String = days
        .iter()
        .map(|d| if d.active { '■' } else { '·' })
        .collect();
    let active = days.iter().filter(|d| d.active).count();
    vec![
        format!("{} .. {}", first.date, last.date),
        marks,
        format!("{} of {} days active", active, days.len()),
    ]
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

const LEVEL_GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];
const LEVEL_COLORS: [Color; 5] = [
    Color::DarkGrey,
    Color::Rgb { r: 14, g: 68, b: 41 },
    Color::Rgb { r: 0, g: 109, b: 50 },
    Color::Rgb { r: 38, g: 166, b: 65 },
    Color::Rgb { r: 57, g: 211, b: 83 },
];
const ROW_LABELS: [&str; 7] = ["", "Mon", "", "Wed", "", "Fri", ""];
const GUTTER: usize = 4;

fn level_cell(level: u8, color: bool) -> String {
    let idx = usize::from(level).min(LEVEL_GLYPHS.len() - 1);
    let glyph = LEVEL_GLYPHS[idx].to_string();
    if color {
        glyph.with(LEVEL_COLORS[idx]).to_string()
    } else {
        glyph
    }
}

/// Month label row. A label that would overlap the previous one is dropped.
fn month_row(heatmap: &Heatmap) -> String {
    let mut row = " ".repeat(GUTTER);
    for (col, week) in heatmap.weeks.iter().enumerate() {
        let Some(label) = &week.label else { continue };
        let pos = GUTTER + col * 2;
        let len = row.chars().count();
        if len > pos {
            continue;
        }
        row.extend(std::iter::repeat_n(' ', pos - len));
        row.push_str(&label.short);
    }
    row.trim_end().to_string()
}

/// Render the grid: a month label row, then Sunday through Saturday rows.
pub fn render_heatmap(heatmap: &Heatmap, color: bool) -> Vec<String> {
    let mut lines = vec![month_row(heatmap)];
    for (row, cells) in heatmap.rows().into_iter().enumerate() {
        let mut line = format!("{:<width$}", ROW_LABELS[row], width = GUTTER);
        let body: Vec<String> = cells
            .into_iter()
            .map(|cell| match cell {
                Some(cell) => level_cell(cell.level, color),
                None => " ".to_string(),
            })
            .collect();
        line.push_str(&body.join(" "));
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub fn heatmap_legend(color: bool) -> String {
    let cells: Vec<String> = (0..LEVEL_GLYPHS.len() as u8)
        .map(|level| level_cell(level, color))
        .collect();
    format!("Less {} More", cells.join(" "))
}

/// Footer line summarising the shown window
pub fn heatmap_footer(heatmap: &Heatmap) -> String {
    let shown = heatmap.weeks.len();
    let mut line = format!(
        "{} completions since {}",
        heatmap.counted_total(),
        heatmap.counted_since().format("%b %-d, %Y")
    );
    if shown < heatmap.total_weeks {
        line.push_str(&format!(" ({} of {} weeks shown)", shown, heatmap.total_weeks));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::activity::{ActivityLedger, CompletionKind};
    use crate::ops::heatmap;
    use insta::assert_snapshot;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(id: TaskId, text: &str) -> Task {
        Task::new(id, text.to_string(), "2025-06-01T09:00:00Z".parse().unwrap())
    }

    fn ledger(entries: &[(&str, u64)]) -> ActivityLedger {
        let mut ledger = ActivityLedger::new();
        for &(date, n) in entries {
            for id in 0..n {
                ledger.entry(day(date)).insert(CompletionKind::Subtask, id);
            }
        }
        ledger
    }

    #[test]
    fn task_listing() {
        let mut report = task(1, "Write the quarterly report");
        report.subtasks.push(Subtask::new(1, "Outline".into()));
        report.subtasks.push(Subtask::new(2, "Draft".into()));
        report.subtasks[0].set_completed(true, day("2025-06-02"));
        let mut milk = task(2, "Buy milk");
        milk.set_completed(true, day("2025-06-02"));

        let lines = format_task_listing(&[&report, &milk], 1, 16);
        assert_snapshot!(lines.join("\n"), @r"
        [ ]   1 Write the quart…  1/2 50%
              [x]   1 Outline
              [ ]   2 Draft
        [x]   2 Buy milk

        1 active task
        ");
    }

    #[test]
    fn empty_listing() {
        assert_eq!(format_task_listing(&[], 0, 40), vec!["no tasks"]);
    }

    #[test]
    fn streak_lines() {
        let streak = StreakState {
            count: 1,
            longest: 4,
            last_active_date: Some(day("2025-06-02")),
        };
        assert_eq!(
            format_streak(&streak),
            vec!["streak: 1 day (longest 4)", "last active: 2025-06-02"]
        );
        assert_eq!(format_streak(&StreakState::default())[1], "last active: never");
    }

    #[test]
    fn calendar_marks_active_days() {
        let days = vec![
            RecentDay { date: day("2025-06-01"), active: true },
            RecentDay { date: day("2025-06-02"), active: false },
            RecentDay { date: day("2025-06-03"), active: true },
        ];
        assert_eq!(
            format_calendar(&days),
            vec!["2025-06-01 .. 2025-06-03", "■·■", "2 of 3 days active"]
        );
    }

    #[test]
    fn heatmap_last_four_weeks() {
        // 2025-10-22 is a Wednesday; the last four columns start 2025-09-28
        let ledger = ledger(&[
            ("2025-10-01", 1),
            ("2025-10-06", 10),
            ("2025-10-14", 5),
            ("2025-10-22", 15),
        ]);
        let map = heatmap::project(&ledger, day("2025-10-22"), 4);
        assert_snapshot!(render_heatmap(&map, false).join("\n"), @r"
            Oct'25
            · · · ·
        Mon · ▓ · ·
            · · ▒ ·
        Wed ░ · · █
            · · ·
        Fri · · ·
            · · ·
        ");
        assert_eq!(
            heatmap_footer(&map),
            "31 completions since Sep 28, 2025 (4 of 53 weeks shown)"
        );
    }

    #[test]
    fn month_labels_sit_over_their_columns() {
        let ledger = ActivityLedger::new();
        // 2025-03-02 is a Sunday; Feb 1 is in the first shown column, Mar 1 in the fifth
        let map = heatmap::project(&ledger, day("2025-03-02"), 6);
        let labels: Vec<_> = map
            .weeks
            .iter()
            .filter_map(|w| w.label.as_ref().map(|l| l.short.as_str()))
            .collect();
        assert_eq!(labels, vec!["Feb'25", "Mar'25"]);
        assert_eq!(month_row(&map), "    Feb'25  Mar'25");
    }

    #[test]
    fn footer_ignores_days_past_the_level_window() {
        // 2025-10-19 is a Sunday; the first column starts 2024-10-13
        let ledger = ledger(&[("2024-10-14", 6), ("2025-10-19", 2)]);
        let map = heatmap::project(&ledger, day("2025-10-19"), 60);
        assert_eq!(map.weeks.len(), map.total_weeks);
        assert_eq!(heatmap_footer(&map), "2 completions since Oct 19, 2024");
    }

    #[test]
    fn legend_without_color() {
        assert_eq!(heatmap_legend(false), "Less · ░ ▒ ▓ █ More");
    }

    #[test]
    fn colored_cells_carry_escape_codes() {
        let cell = level_cell(4, true);
        assert!(cell.starts_with("\u{1b}["));
        assert!(cell.contains('█'));
    }

    #[test]
    fn day_listing() {
        let mut report = task(1, "Report");
        report.subtasks.push(Subtask::new(1, "Outline".into()));
        report.subtasks.push(Subtask::new(2, "Draft".into()));
        let mut store = crate::model::store::TaskStore::from_tasks(vec![report, task(2, "Milk")]);
        let date = day("2025-06-02");
        let mut ledger = ActivityLedger::new();
        ledger.entry(date).insert(CompletionKind::Task, 1);
        ledger.entry(date).insert(CompletionKind::Subtask, 1);
        ledger.entry(date).insert(CompletionKind::Subtask, 2);
        store.get_mut(1).unwrap().set_completed(true, date);

        let summary = stats::day_summary(&store, &ledger, date, date);
        let details = stats::day_details(&store, &ledger, date);
        let lines = format_day(&summary, &details, ledger.get(date), 40);
        assert_snapshot!(lines.join("\n"), @r"
        Monday, June 2, 2025
        1 tasks, 2 subtasks completed (50% of 2 tasks, level 2)
          [x]   1 Report (+2 subtasks)
        ");
    }
}
