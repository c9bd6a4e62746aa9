#![allow(dead_code)]

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use planust::models::{EnergyLevel, RecurrenceType, Task, TaskStatus};

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Wednesday.
pub fn today() -> NaiveDate {
    ymd(2026, 10, 14)
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap()
}

pub fn task(id: u64, title: &str) -> Task {
    Task {
        id,
        title: title.into(),
        project: None,
        notes: None,
        status: TaskStatus::Backlog,
        critical: false,
        start_date: None,
        start_time: None,
        end_time: None,
        due_date: None,
        my_day_date: None,
        time_estimate: None,
        energy_level: EnergyLevel::Medium,
        recurrence_type: RecurrenceType::None,
        recurrence_parent_id: None,
        series_id: None,
        dependencies: BTreeSet::new(),
        created_at: now(),
        completed_at: None,
    }
}

pub fn done(mut t: Task) -> Task {
    t.status = TaskStatus::Done;
    t.completed_at = Some(now());
    t
}
