//! Derived task facts: urgency, readiness, blocking and My Day membership.
//!
//! Nothing in here stores state. `today` and `now` are always passed in so the
//! results depend only on the arguments.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Task, TaskStatus};

/// How close a task's due date is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueUrgency {
    Overdue,
    Today,
    /// Due within the next three days.
    Soon,
    Ok,
    /// No due date, or the task is already done.
    None,
}

/// Classifies the due date of `task` relative to `today`.
///
/// # Returns
/// - [`DueUrgency::None`] if the task is done or has no due date.
/// - [`DueUrgency::Soon`] when the due date is one to three days away.
pub fn due_date_urgency(task: &Task, today: NaiveDate) -> DueUrgency {
    if task.is_done() {
        return DueUrgency::None;
    }
    let Some(due) = task.due_date else {
        return DueUrgency::None;
    };
    let days_left = (due - today).num_days();
    match days_left {
        d if d < 0 => DueUrgency::Overdue,
        0 => DueUrgency::Today,
        1..=3 => DueUrgency::Soon,
        _ => DueUrgency::Ok,
    }
}

/// A backlog task is ready once its start date has arrived (or it has none).
pub fn ready_to_start(task: &Task, today: NaiveDate) -> bool {
    task.status == TaskStatus::Backlog && task.start_date.map_or(true, |d| d <= today)
}

/// Dependencies of `task` that exist and are not done yet.
///
/// Ids that match no task are ignored.
pub fn blocking_tasks<'a>(task: &Task, all: &'a [Task]) -> Vec<&'a Task> {
    if task.is_done() {
        return Vec::new();
    }
    all.iter()
        .filter(|other| task.dependencies.contains(&other.id) && !other.is_done())
        .collect()
}

/// True iff some dependency resolves to an existing task that is not done.
///
/// Advisory only; a blocked task can still change status.
pub fn is_blocked(task: &Task, all: &[Task]) -> bool {
    if task.is_done() {
        return false;
    }
    task.dependencies
        .iter()
        .any(|dep| all.iter().any(|other| other.id == *dep && !other.is_done()))
}

/// Membership of the daily focus list.
///
/// A `my_day_date` before today means the task was dismissed, equal to today
/// means it was added by hand. Otherwise tasks join once their start date is reached.
pub fn is_in_my_day(task: &Task, today: NaiveDate) -> bool {
    if task.is_done() {
        return false;
    }
    match task.my_day_date {
        Some(marker) if marker < today => false,
        Some(marker) if marker == today => true,
        _ => task.start_date.map_or(false, |d| d <= today),
    }
}

/// Sets the status and keeps `completed_at` consistent with it.
///
/// Returns `true` when the status actually changed.
pub fn apply_status(task: &mut Task, status: TaskStatus, now: DateTime<Utc>) -> bool {
    if task.status == status {
        if status == TaskStatus::Done && task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
        return false;
    }
    task.status = status;
    task.completed_at = if status == TaskStatus::Done { Some(now) } else { None };
    true
}

/// PromoteOnSchedule: putting a backlog task on the grid moves it to todo.
///
/// Returns `true` if the task was promoted.
pub fn promote_on_schedule(task: &mut Task) -> bool {
    if task.status == TaskStatus::Backlog {
        task.status = TaskStatus::Todo;
        true
    } else {
        false
    }
}

/// Would giving `task_id` the dependency set `deps` close a cycle?
///
/// Returns the first offending dependency id. A self reference counts.
pub fn dependency_cycle(task_id: u64, deps: &BTreeSet<u64>, all: &[Task]) -> Option<u64> {
    let edges: HashMap<u64, &BTreeSet<u64>> = all
        .iter()
        .filter(|t| t.id != task_id)
        .map(|t| (t.id, &t.dependencies))
        .collect();

    deps.iter().copied().find(|&dep| {
        let mut stack = vec![dep];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == task_id {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = edges.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    })
}
