//! Day planner model: 48 half-hour slots per day.
//!
//! Slot `i` covers minutes `[30 * i, 30 * i + 30)` after midnight. The grid is
//! orthogonal to status except for placement, which applies PromoteOnSchedule.

use std::ops::Range;

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::lifecycle::promote_on_schedule;
use crate::models::Task;

pub const SLOT_MINUTES: u32 = 30;
pub const SLOTS_PER_DAY: usize = 48;
/// Duration used when a task has no estimate.
pub const DEFAULT_DURATION: u32 = 30;
/// Shortest duration a resize can produce.
pub const MIN_DURATION: u32 = 15;

const MINUTES_PER_DAY: u32 = 24 * 60;
const LAST_MINUTE: u32 = MINUTES_PER_DAY - 1;

/// What a placement changed besides the times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// PromoteOnSchedule moved the task from backlog to todo.
    pub promoted: bool,
    /// The placement was for today and the task joined My Day.
    pub added_to_my_day: bool,
}

/// Start time of `slot`, or `None` past the end of the day.
pub fn slot_start(slot: usize) -> Option<NaiveTime> {
    if slot >= SLOTS_PER_DAY {
        return None;
    }
    time_from_minutes(slot as u32 * SLOT_MINUTES)
}

/// Slot containing `time`.
pub fn slot_of(time: NaiveTime) -> usize {
    (minutes_of(time) / SLOT_MINUTES) as usize
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    let m = minutes.min(LAST_MINUTE);
    NaiveTime::from_hms_opt(m / 60, m % 60, 0)
}

fn end_from(start: NaiveTime, duration: u32) -> Option<NaiveTime> {
    time_from_minutes(minutes_of(start).saturating_add(duration))
}

/// Drops `task` onto `slot` of `date`.
///
/// Sets the start date and time, derives the end from the estimate (30
/// minutes when unset, never past 23:59) and fills in a missing due date.
/// Side effects: PromoteOnSchedule (backlog becomes todo) and, when `date` is
/// `today`, the task is added to My Day.
///
/// A slot outside the day is declined and leaves the task untouched.
pub fn place(task: &mut Task, slot: usize, date: NaiveDate, today: NaiveDate) -> Option<Placement> {
    let Some(start) = slot_start(slot) else {
        tracing::debug!(task = task.id, slot, "declined placement outside the day");
        return None;
    };
    let end = end_from(start, task.time_estimate.unwrap_or(DEFAULT_DURATION))?;

    task.start_date = Some(date);
    task.start_time = Some(start);
    task.end_time = Some(end);
    if task.due_date.is_none() {
        task.due_date = Some(date);
    }
    let promoted = promote_on_schedule(task);
    let added_to_my_day = date == today;
    if added_to_my_day {
        task.my_day_date = Some(today);
    }

    Some(Placement {
        start_time: start,
        end_time: end,
        promoted,
        added_to_my_day,
    })
}

/// Drags the bottom edge by `delta_slots` half hours.
///
/// The estimate never drops below 15 minutes; the end time is recomputed
/// from the unchanged start. Returns the new estimate.
pub fn resize(task: &mut Task, delta_slots: i32) -> u32 {
    let current = i64::from(task.time_estimate.unwrap_or(DEFAULT_DURATION));
    let wanted = current + i64::from(delta_slots) * i64::from(SLOT_MINUTES);
    let clamped = wanted.clamp(i64::from(MIN_DURATION), i64::from(MINUTES_PER_DAY)) as u32;
    if i64::from(clamped) != wanted {
        tracing::debug!(task = task.id, wanted, clamped, "resize clamped");
    }

    task.time_estimate = Some(clamped);
    if let Some(start) = task.start_time {
        task.end_time = end_from(start, clamped);
    }
    clamped
}

/// Takes the task off the grid. Status and My Day are left alone.
pub fn unschedule(task: &mut Task) {
    task.start_time = None;
    task.end_time = None;
}

/// `[start, end)` in minutes after midnight, if the task has a start time.
pub fn interval(task: &Task) -> Option<Range<u32>> {
    let start = minutes_of(task.start_time?);
    let end = match task.end_time {
        Some(end) => minutes_of(end),
        None => start.saturating_add(task.time_estimate.unwrap_or(DEFAULT_DURATION)),
    };
    Some(start..end.max(start).min(MINUTES_PER_DAY))
}

/// Slots the task covers; 09:00 to 09:45 covers slots 18 and 19.
pub fn occupied_slots(task: &Task) -> Range<usize> {
    match interval(task) {
        Some(r) if !r.is_empty() => {
            let first = (r.start / SLOT_MINUTES) as usize;
            let last = r.end.div_ceil(SLOT_MINUTES) as usize;
            first..last.min(SLOTS_PER_DAY)
        }
        Some(r) => {
            let slot = (r.start / SLOT_MINUTES) as usize;
            slot..slot
        }
        None => 0..0,
    }
}

/// Same-day tasks whose half-open intervals intersect.
pub fn overlaps(a: &Task, b: &Task) -> bool {
    if a.start_date.is_none() || a.start_date != b.start_date {
        return false;
    }
    match (interval(a), interval(b)) {
        (Some(x), Some(y)) => x.start < y.end && y.start < x.end,
        _ => false,
    }
}

/// All overlapping pairs on `date`, smaller id first. Display only.
pub fn find_overlaps(tasks: &[Task], date: NaiveDate) -> Vec<(u64, u64)> {
    let on_day: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.start_date == Some(date) && t.start_time.is_some())
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in on_day.iter().enumerate() {
        for b in &on_day[i + 1..] {
            if overlaps(a, b) {
                pairs.push((a.id.min(b.id), a.id.max(b.id)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Position of the "now" line in slot units.
pub fn current_time_marker(time: NaiveTime) -> f64 {
    let minutes = f64::from(minutes_of(time)) + f64::from(time.second()) / 60.0;
    minutes / f64::from(SLOT_MINUTES)
}

/// Slot-indexed view of one day.
#[derive(Debug, Clone)]
pub struct DayGrid {
    pub date: NaiveDate,
    /// Task ids occupying each slot, in placement order.
    pub slots: Vec<Vec<u64>>,
}

impl DayGrid {
    pub fn build(tasks: &[Task], date: NaiveDate) -> DayGrid {
        let mut slots = vec![Vec::new(); SLOTS_PER_DAY];
        let mut scheduled: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.start_date == Some(date) && t.start_time.is_some())
            .collect();
        scheduled.sort_by_key(|t| (t.start_time, t.id));

        for task in scheduled {
            for slot in occupied_slots(task) {
                slots[slot].push(task.id);
            }
        }
        DayGrid { date, slots }
    }

    /// Slots holding more than one task.
    pub fn conflicting_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_free(&self, slot: usize) -> bool {
        self.slots.get(slot).map_or(false, |ids| ids.is_empty())
    }
}
