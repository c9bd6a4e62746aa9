//! # Planust
//!
//! Scheduling and lifecycle engine for a personal task tracker.
//!
//! The library works on plain [`Task`](models::Task) records and never touches
//! the clock or the disk on its own: `today` and `now` are arguments, and
//! persistence lives in [`storage`] for the command line front end.
//!
//! * [`temporal`]: shorthand (`T+3`, `W-1`), natural language dates ("next
//!   friday", "in 2 weeks", `15/1`) and loose times (`930`, `2:30 pm`).
//! * [`lifecycle`]: urgency, readiness, dependency blocking and My Day.
//! * [`priority`]: the ordering used for every list.
//! * [`recurrence`]: occurrence dates and sibling tasks for recurring work.
//! * [`grid`]: the 30-minute day planner (place, resize, unschedule, overlaps).
//! * [`board`]: create/update/complete/delete over a collection of tasks.

pub mod board;
pub mod commands;
pub mod config;
pub mod error;
pub mod grid;
pub mod lifecycle;
pub mod models;
pub mod priority;
pub mod recurrence;
pub mod storage;
pub mod temporal;
