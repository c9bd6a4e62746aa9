use std::collections::BTreeSet;
use std::io::{self, Write};

use chrono::{DateTime, Local, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::board::{DeleteScope, TaskBoard};
use crate::config::Config;
use crate::error::CliError;
use crate::grid::{self, current_time_marker, find_overlaps, slot_start, DayGrid, SLOTS_PER_DAY};
use crate::lifecycle::{due_date_urgency, is_blocked, ready_to_start, DueUrgency};
use crate::models::{EnergyLevel, RecurrenceType, Task, TaskDraft, TaskPatch, TaskStatus};
use crate::recurrence::Termination;
use crate::storage::Store;
use crate::temporal::{format_estimate, format_hhmm, parse_flexible_time, TemporalParser};

type CmdResult<T = ()> = Result<T, CliError>;

/// Fields accepted by `add`.
#[derive(Debug, Default, Clone)]
pub struct AddArgs {
    pub title: String,
    pub project: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub start: Option<String>,
    pub critical: bool,
    pub energy: Option<String>,
    pub estimate: Option<u32>,
    pub recur: Option<String>,
    pub depends: Vec<u64>,
}

/// Fields accepted by `edit`. An empty string clears an optional field.
#[derive(Debug, Default, Clone)]
pub struct EditArgs {
    pub title: Option<String>,
    pub project: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub start: Option<String>,
    pub critical: Option<bool>,
    pub energy: Option<String>,
    pub estimate: Option<u32>,
    pub recur: Option<String>,
    pub depends: Option<Vec<u64>>,
}

fn clock() -> (DateTime<Utc>, NaiveDate) {
    (Utc::now(), Local::now().date_naive())
}

fn parser_for(cfg: &Config, today: NaiveDate) -> TemporalParser {
    TemporalParser::new(today, cfg.date_order)
}

fn parse_date(parser: &TemporalParser, input: &str) -> CmdResult<NaiveDate> {
    parser
        .parse_date_input(input)
        .ok_or_else(|| CliError::InvalidDate(input.to_string()))
}

fn parse_optional_date(parser: &TemporalParser, input: &str) -> CmdResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(parser, input).map(Some)
    }
}

fn parse_energy(input: &str) -> CmdResult<EnergyLevel> {
    input.parse().map_err(CliError::InvalidArgument)
}

fn parse_recurrence(input: &str) -> CmdResult<RecurrenceType> {
    input.parse().map_err(CliError::InvalidArgument)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn with_board<T>(cfg: &Config, f: impl FnOnce(&mut TaskBoard) -> CmdResult<T>) -> CmdResult<T> {
    let store = Store::new(&cfg.db_path);
    let mut board = store.load()?;
    let out = f(&mut board)?;
    store.save(&board)?;
    Ok(out)
}

/// Adds a new task and returns its id.
///
/// Dates accept ISO (`2025-12-01`), shorthand (`T+3`) or phrases ("next friday").
pub fn cmd_add(cfg: &Config, args: AddArgs, silent: bool) -> CmdResult<u64> {
    let (now, today) = clock();
    let parser = parser_for(cfg, today);

    let mut draft = TaskDraft::new(args.title);
    draft.project = args.project;
    draft.notes = args.notes;
    draft.critical = args.critical;
    draft.time_estimate = args.estimate;
    draft.dependencies = args.depends.into_iter().collect();
    if let Some(due) = &args.due {
        draft.due_date = Some(parse_date(&parser, due)?);
    }
    if let Some(start) = &args.start {
        draft.start_date = Some(parse_date(&parser, start)?);
    }
    if let Some(energy) = &args.energy {
        draft.energy_level = Some(parse_energy(energy)?);
    }
    if let Some(recur) = &args.recur {
        draft.recurrence_type = parse_recurrence(recur)?;
    }

    let task = with_board(cfg, |board| Ok(board.create(draft, now)))?;
    if !silent {
        println!("Task added (id = {})", task.id);
    }
    Ok(task.id)
}

/// Adds a task from a free-text line, pulling out the first date phrase.
pub fn cmd_quick_add(cfg: &Config, text: &str, silent: bool) -> CmdResult<u64> {
    let (now, today) = clock();
    let parser = parser_for(cfg, today);
    let task = with_board(cfg, |board| Ok(board.quick_add(text, &parser, now)))?;
    if !silent {
        match task.due_date {
            Some(due) => println!("Task added (id = {}): \"{}\" due {}", task.id, task.title, due),
            None => println!("Task added (id = {}): \"{}\"", task.id, task.title),
        }
    }
    Ok(task.id)
}

/// Marks a task as complete, rolling recurring tasks forward.
pub fn cmd_complete(cfg: &Config, id: u64, silent: bool) -> CmdResult {
    let (now, today) = clock();
    let done = with_board(cfg, |board| {
        board.complete(id, now, today).ok_or(CliError::TaskNotFound(id))
    })?;
    if !silent {
        println!("Task {} marked as complete.", id);
        if let Some(next) = done.spawned {
            let when = next.start_date.or(next.due_date);
            println!(
                "Next occurrence created (id = {}) on {}",
                next.id,
                when.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
            );
        }
    }
    Ok(())
}

/// Moves one or more tasks to `status`, reporting successes and failures.
pub fn cmd_status(cfg: &Config, ids: &[u64], status: &str, silent: bool) -> CmdResult {
    let status: TaskStatus = status.parse().map_err(CliError::InvalidArgument)?;
    let (now, today) = clock();
    let report = with_board(cfg, |board| Ok(board.bulk_set_status(ids, status, now, today)))?;
    if !silent {
        println!(
            "Moved {} task(s) to {} ({} not found).",
            report.succeeded, status, report.failed
        );
    }
    Ok(())
}

/// Removes a task, or the task and the rest of its series.
pub fn cmd_remove(cfg: &Config, id: u64, series: bool, silent: bool) -> CmdResult {
    let scope = if series {
        DeleteScope::ThisAndFuture
    } else {
        DeleteScope::ThisOccurrence
    };
    let removed = with_board(cfg, |board| match board.delete(id, scope) {
        0 => Err(CliError::TaskNotFound(id)),
        n => Ok(n),
    })?;
    if !silent {
        println!("Removed {} task(s).", removed);
    }
    Ok(())
}

/// Edits an existing task's details.
pub fn cmd_edit(cfg: &Config, id: u64, args: EditArgs, silent: bool) -> CmdResult {
    let (now, today) = clock();
    let parser = parser_for(cfg, today);

    let mut patch = TaskPatch {
        title: args.title,
        project: args.project.map(non_empty),
        notes: args.notes.map(non_empty),
        critical: args.critical,
        time_estimate: args.estimate.map(Some),
        dependencies: args.depends.map(|d| d.into_iter().collect::<BTreeSet<u64>>()),
        ..Default::default()
    };
    if let Some(due) = &args.due {
        patch.due_date = Some(parse_optional_date(&parser, due)?);
    }
    if let Some(start) = &args.start {
        patch.start_date = Some(parse_optional_date(&parser, start)?);
    }
    if let Some(energy) = &args.energy {
        patch.energy_level = Some(parse_energy(energy)?);
    }
    if let Some(recur) = &args.recur {
        patch.recurrence_type = Some(parse_recurrence(recur)?);
    }

    with_board(cfg, |board| {
        board.update(id, patch, now).ok_or(CliError::TaskNotFound(id))
    })?;
    if !silent {
        println!("Task {} updated.", id);
    }
    Ok(())
}

/// Places a task on the day grid at a time (`9`, `2:30pm`) or slot index.
pub fn cmd_schedule(
    cfg: &Config,
    id: u64,
    at: &str,
    date: Option<&str>,
    silent: bool,
) -> CmdResult {
    let (_, today) = clock();
    let parser = parser_for(cfg, today);
    let day = match date {
        Some(d) => parse_date(&parser, d)?,
        None => today,
    };
    let slot = match at.trim().strip_prefix('@') {
        Some(index) => index
            .parse::<usize>()
            .map_err(|_| CliError::InvalidArgument(format!("bad slot '{}'", at)))?,
        None => {
            let time = parse_flexible_time(at).ok_or_else(|| CliError::InvalidTime(at.to_string()))?;
            grid::slot_of(time)
        }
    };

    let placement = with_board(cfg, |board| {
        if board.get(id).is_none() {
            return Err(CliError::TaskNotFound(id));
        }
        Ok(board.schedule(id, slot, day, today))
    })?;
    if !silent {
        match placement {
            Some(p) => {
                println!(
                    "Task {} scheduled {} {}-{}",
                    id,
                    day,
                    format_hhmm(p.start_time),
                    format_hhmm(p.end_time)
                );
                if p.promoted {
                    println!("Moved from backlog to todo.");
                }
            }
            None => println!("Slot {} is outside the day; nothing changed.", slot),
        }
    }
    Ok(())
}

/// Grows or shrinks a scheduled task by whole slots.
pub fn cmd_resize(cfg: &Config, id: u64, slots: i32, silent: bool) -> CmdResult {
    let minutes = with_board(cfg, |board| board.resize(id, slots).ok_or(CliError::TaskNotFound(id)))?;
    if !silent {
        println!("Task {} now estimated at {} min.", id, minutes);
    }
    Ok(())
}

/// Removes a task from the grid, keeping its status.
pub fn cmd_unschedule(cfg: &Config, id: u64, silent: bool) -> CmdResult {
    with_board(cfg, |board| board.unschedule(id).ok_or(CliError::TaskNotFound(id)))?;
    if !silent {
        println!("Task {} unscheduled.", id);
    }
    Ok(())
}

/// Adds a task to today's My Day, or dismisses it.
pub fn cmd_focus(cfg: &Config, id: u64, dismiss: bool, silent: bool) -> CmdResult {
    let (_, today) = clock();
    with_board(cfg, |board| {
        let changed = if dismiss {
            board.dismiss_from_my_day(id, today)
        } else {
            board.add_to_my_day(id, today)
        };
        changed.ok_or(CliError::TaskNotFound(id))
    })?;
    if !silent {
        let verb = if dismiss { "dismissed from" } else { "added to" };
        println!("Task {} {} My Day.", id, verb);
    }
    Ok(())
}

/// Pre-generates occurrences for a recurring task.
pub fn cmd_recur(
    cfg: &Config,
    id: u64,
    count: Option<u32>,
    until: Option<&str>,
    silent: bool,
) -> CmdResult {
    let (now, today) = clock();
    let parser = parser_for(cfg, today);
    let until = until.map(|u| parse_date(&parser, u)).transpose()?;

    let report = with_board(cfg, |board| {
        let task = board.get(id).ok_or(CliError::TaskNotFound(id))?;
        if !task.recurrence_type.is_recurring() {
            return Err(CliError::InvalidArgument(format!("Task {} does not recur", id)));
        }
        let termination = match (until, count) {
            (Some(date), _) => Termination::Until(date),
            (None, Some(n)) => Termination::Count(n),
            (None, None) => Termination::Count(task.recurrence_type.default_count()),
        };
        Ok(board.generate_series(id, termination, now))
    })?;
    if !silent {
        println!(
            "Generated {} occurrence(s), {} already existed, {} failed.",
            report.succeeded, report.skipped, report.failed
        );
    }
    Ok(())
}

fn urgency_cell(task: &Task, today: NaiveDate) -> Cell {
    let (label, color) = match due_date_urgency(task, today) {
        DueUrgency::Overdue => ("overdue", Color::Red),
        DueUrgency::Today => ("today", Color::Red),
        DueUrgency::Soon => ("soon", Color::Yellow),
        DueUrgency::Ok => ("ok", Color::Green),
        DueUrgency::None => ("-", Color::Grey),
    };
    Cell::new(label).fg(color)
}

fn flags(task: &Task, all: &[Task], today: NaiveDate) -> String {
    let mut out = Vec::new();
    if task.critical {
        out.push("critical");
    }
    if is_blocked(task, all) {
        out.push("blocked");
    }
    if ready_to_start(task, today) {
        out.push("ready");
    }
    if task.recurrence_type.is_recurring() {
        out.push("recurring");
    }
    out.join(",")
}

fn time_range(task: &Task) -> String {
    match (task.start_time, task.end_time) {
        (Some(s), Some(e)) => format!("{}-{}", format_hhmm(s), format_hhmm(e)),
        (Some(s), None) => format_hhmm(s),
        _ => String::new(),
    }
}

fn task_table(tasks: &[Task], all: &[Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Project").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Est").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Urg").add_attribute(Attribute::Bold),
            Cell::new("Energy").add_attribute(Attribute::Bold),
            Cell::new("Flags").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let status_color = match t.status {
            TaskStatus::Done => Color::Green,
            TaskStatus::InProgress => Color::Cyan,
            TaskStatus::Todo => Color::Yellow,
            TaskStatus::Backlog => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(t.project.clone().unwrap_or_default()),
            Cell::new(t.status).fg(status_color),
            Cell::new(t.start_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(time_range(t)),
            Cell::new(t.time_estimate.map(format_estimate).unwrap_or_default()),
            Cell::new(t.due_date.map(|d| d.to_string()).unwrap_or_default()),
            urgency_cell(t, today),
            Cell::new(t.energy_level),
            Cell::new(flags(t, all, today)),
        ]);
    }
    table
}

/// Lists tasks in priority order.
///
/// `backlog` restricts the list to the backlog column with deferred tasks last.
pub fn cmd_list(cfg: &Config, all: bool, backlog: bool) -> CmdResult {
    let (_, today) = clock();
    let board = Store::new(&cfg.db_path).load()?;
    let tasks = if backlog {
        board.backlog(today)
    } else {
        board.by_priority(all)
    };
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    println!("{}", task_table(&tasks, board.tasks(), today));
    Ok(())
}

/// Shows today's focus list.
pub fn cmd_my_day(cfg: &Config) -> CmdResult {
    let (_, today) = clock();
    let board = Store::new(&cfg.db_path).load()?;
    let tasks: Vec<Task> = board.my_day(today).into_iter().cloned().collect();
    if tasks.is_empty() {
        println!("Nothing in My Day.");
        return Ok(());
    }
    println!("{}", task_table(&tasks, board.tasks(), today));
    Ok(())
}

/// Prints the occupied part of a day's grid with overlaps and the "now" line.
pub fn cmd_day(cfg: &Config, date: Option<&str>) -> CmdResult {
    let (_, today) = clock();
    let parser = parser_for(cfg, today);
    let day = match date {
        Some(d) => parse_date(&parser, d)?,
        None => today,
    };
    let board = Store::new(&cfg.db_path).load()?;
    let day_grid = DayGrid::build(board.tasks(), day);
    let conflicts = day_grid.conflicting_slots();
    let now_slot = (day == today).then(|| current_time_marker(Local::now().time()) as usize);

    let occupied: Vec<usize> = (0..SLOTS_PER_DAY).filter(|&s| !day_grid.is_free(s)).collect();
    if occupied.is_empty() {
        println!("Nothing scheduled on {}.", day);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Slot").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Tasks").add_attribute(Attribute::Bold),
        ]);
    for slot in occupied {
        let start = slot_start(slot).map(format_hhmm).unwrap_or_default();
        let titles: Vec<String> = day_grid.slots[slot]
            .iter()
            .filter_map(|id| board.get(*id))
            .map(|t| format!("#{} {}", t.id, t.title))
            .collect();
        let mut time_cell = Cell::new(start);
        if now_slot == Some(slot) {
            time_cell = time_cell.add_attribute(Attribute::Bold).fg(Color::Cyan);
        }
        let mut tasks_cell = Cell::new(titles.join(" | "));
        if conflicts.contains(&slot) {
            tasks_cell = tasks_cell.fg(Color::Red);
        }
        table.add_row(vec![Cell::new(slot), time_cell, tasks_cell]);
    }
    println!("{table}");

    for (a, b) in find_overlaps(board.tasks(), day) {
        println!("Overlap: task {} and task {}", a, b);
    }
    Ok(())
}

/// Shows how a piece of text would be read as a date or time.
pub fn cmd_parse(cfg: &Config, text: &str) -> CmdResult {
    let (_, today) = clock();
    let parser = parser_for(cfg, today);
    if let Some(date) = parser.parse_shorthand(text) {
        println!("shorthand -> {}", date);
    } else if let Some(found) = parser.parse_natural_language_date(text) {
        println!("date -> {} (matched \"{}\", rest \"{}\")", found.date, found.matched, found.remaining);
    } else if let Some(time) = parse_flexible_time(text) {
        println!("time -> {}", format_hhmm(time));
    } else {
        return Err(CliError::InvalidDate(text.to_string()));
    }
    Ok(())
}

/// Resets the database by deleting all tasks.
pub fn cmd_reset(cfg: &Config, force: bool) -> CmdResult {
    if !force {
        print!("Are you sure you want to delete all tasks? This cannot be undone. [y/N] ");
        io::stdout().flush().map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    Store::new(&cfg.db_path).delete()?;
    println!("Database reset successfully.");
    Ok(())
}
