//! Expansion of recurrence patterns into occurrence dates and sibling tasks.

use chrono::{Duration, NaiveDate};

use crate::models::{RecurrenceType, Task, TaskDraft, TaskStatus};
use crate::temporal::add_months;

/// Hard stop for open-ended iteration: until-mode and the next-occurrence search.
/// Count mode yields exactly the number asked for.
pub const MAX_ITERATIONS: u32 = 365;

/// When a series stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exactly this many occurrences.
    Count(u32),
    /// Every occurrence up to and including this day.
    Until(NaiveDate),
}

impl RecurrenceType {
    /// Occurrence count that covers a comparable horizon for each pattern.
    pub fn default_count(&self) -> u32 {
        match self {
            RecurrenceType::None => 0,
            RecurrenceType::Daily => 14,
            RecurrenceType::Weekly => 8,
            RecurrenceType::Biweekly => 6,
            RecurrenceType::Monthly => 6,
        }
    }

    /// The `k`-th step after `anchor`, computed from the anchor rather than by
    /// chaining so monthly dates keep their day-of-month when the month allows.
    pub fn step_from(&self, anchor: NaiveDate, k: u32) -> Option<NaiveDate> {
        let k = i64::from(k);
        match self {
            RecurrenceType::None => None,
            RecurrenceType::Daily => anchor.checked_add_signed(Duration::try_days(k)?),
            RecurrenceType::Weekly => anchor.checked_add_signed(Duration::try_days(7 * k)?),
            RecurrenceType::Biweekly => anchor.checked_add_signed(Duration::try_days(14 * k)?),
            RecurrenceType::Monthly => add_months(anchor, k),
        }
    }
}

/// Future occurrence dates after `start`, in ascending order.
///
/// `start` itself is never included. An unrecognized pattern, a zero count or
/// an end date before the start yield an empty list.
pub fn generate_occurrences(
    start: NaiveDate,
    pattern: RecurrenceType,
    termination: Termination,
) -> Vec<NaiveDate> {
    if !pattern.is_recurring() {
        return Vec::new();
    }

    let mut dates = Vec::new();
    match termination {
        Termination::Count(n) => {
            for k in 1..=n {
                match pattern.step_from(start, k) {
                    Some(d) => dates.push(d),
                    None => break,
                }
            }
        }
        Termination::Until(until) => {
            if until < start {
                tracing::debug!(%start, %until, "end date precedes start; no occurrences");
                return dates;
            }
            for k in 1..=MAX_ITERATIONS {
                match pattern.step_from(start, k) {
                    Some(d) if d <= until => dates.push(d),
                    _ => break,
                }
            }
        }
    }
    dates
}

/// First date on the pattern from `original` that lies strictly after `today`.
///
/// Used when a recurring task is completed late and nothing was pre-generated.
pub fn next_occurrence_after(
    original: NaiveDate,
    pattern: RecurrenceType,
    today: NaiveDate,
) -> Option<NaiveDate> {
    (1..=MAX_ITERATIONS)
        .map_while(|k| pattern.step_from(original, k))
        .find(|d| *d > today)
}

/// The date a series is anchored on: start date, else due date.
pub fn anchor_date(task: &Task) -> Option<NaiveDate> {
    task.start_date.or(task.due_date)
}

/// Builds sibling drafts for `parent` on each of `dates`.
///
/// Dates are interpreted the way [`anchor_date`] picks them. When the parent
/// has both a start and a due date, the gap between them is kept for every
/// sibling.
pub fn materialize_occurrences(parent: &Task, dates: &[NaiveDate]) -> Vec<TaskDraft> {
    let offset = match (parent.start_date, parent.due_date) {
        (Some(start), Some(due)) => Some(due - start),
        _ => None,
    };

    dates
        .iter()
        .filter_map(|&date| {
            let (start_date, due_date) = match (parent.start_date, offset) {
                (Some(_), Some(gap)) => (Some(date), Some(date.checked_add_signed(gap)?)),
                (Some(_), None) => (Some(date), None),
                (None, _) => (None, Some(date)),
            };
            Some(sibling_draft(parent, start_date, due_date))
        })
        .collect()
}

/// A single sibling placed at `date` on the parent's anchor.
pub fn occurrence_at(parent: &Task, date: NaiveDate) -> Option<TaskDraft> {
    materialize_occurrences(parent, &[date]).into_iter().next()
}

fn sibling_draft(
    parent: &Task,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
) -> TaskDraft {
    TaskDraft {
        title: parent.title.clone(),
        project: parent.project.clone(),
        notes: parent.notes.clone(),
        status: Some(TaskStatus::Backlog),
        critical: parent.critical,
        start_date,
        start_time: parent.start_time,
        end_time: parent.end_time,
        due_date,
        my_day_date: None,
        time_estimate: parent.time_estimate,
        energy_level: Some(parent.energy_level),
        recurrence_type: parent.recurrence_type,
        recurrence_parent_id: Some(parent.recurrence_parent_id.unwrap_or(parent.id)),
        series_id: parent.series_id,
        dependencies: Default::default(),
    }
}
