//! The task collection and the operations exposed to the calling layer.
//!
//! Every operation works on one task at a time. Batch operations are a loop
//! of single-task operations and report how many succeeded; nothing is rolled
//! back. Unknown ids are declined with `None` rather than an error.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::grid::{self, Placement};
use crate::lifecycle::{apply_status, blocking_tasks, dependency_cycle, is_in_my_day};
use crate::models::{EnergyLevel, Task, TaskDraft, TaskPatch, TaskStatus};
use crate::priority::{compare_priority, sort_backlog, sort_by_priority};
use crate::recurrence::{
    anchor_date, generate_occurrences, materialize_occurrences, next_occurrence_after,
    occurrence_at, Termination,
};
use crate::temporal::TemporalParser;

/// Outcome of a batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Items left alone on purpose, such as occurrences that already exist.
    pub skipped: usize,
    /// Ids created or touched by the successful steps.
    pub ids: Vec<u64>,
}

/// How much of a recurring series a delete removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    ThisOccurrence,
    /// This task and every later task of the same series.
    ThisAndFuture,
}

/// Result of completing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Task,
    /// Next occurrence created because none was pre-generated.
    pub spawned: Option<Task>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    /// Lower bound for the next id. Never moves backwards, so ids of deleted
    /// tasks are not handed out again.
    next_id: u64,
}

impl TaskBoard {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskBoard { tasks, next_id: 0 }
    }

    /// Restores a board together with its saved id counter.
    pub fn with_next_id(tasks: Vec<Task>, next_id: u64) -> Self {
        TaskBoard { tasks, next_id }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Id the next created task will get.
    pub fn next_id(&self) -> u64 {
        let after_max = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.next_id.max(after_max)
    }

    /// Adds a task built from `draft` and returns it.
    ///
    /// Missing fields fall back to backlog status and medium energy. A blank
    /// title becomes "Untitled".
    pub fn create(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Task {
        let id = self.next_id();
        self.next_id = id + 1;
        let title = match draft.title.trim() {
            "" => "Untitled".to_string(),
            t => t.to_string(),
        };
        let mut dependencies = draft.dependencies;
        dependencies.remove(&id);

        let mut task = Task {
            id,
            title,
            project: draft.project,
            notes: draft.notes,
            status: TaskStatus::Backlog,
            critical: draft.critical,
            start_date: draft.start_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            due_date: draft.due_date,
            my_day_date: draft.my_day_date,
            time_estimate: draft.time_estimate,
            energy_level: draft.energy_level.unwrap_or(EnergyLevel::Medium),
            recurrence_type: draft.recurrence_type,
            recurrence_parent_id: draft.recurrence_parent_id,
            series_id: draft.series_id,
            dependencies,
            created_at: now,
            completed_at: None,
        };
        apply_status(&mut task, draft.status.unwrap_or_default(), now);
        tracing::debug!(id, title = %task.title, "created task");
        self.tasks.push(task.clone());
        task
    }

    /// Shallow-merges `patch` into task `id`.
    ///
    /// Status changes keep `completed_at` in step. Dependencies that point at
    /// the task itself or would close a cycle are dropped. Recurrence fields
    /// are stored as given; call [`TaskBoard::generate_series`] to expand them.
    pub fn update(&mut self, id: u64, patch: TaskPatch, now: DateTime<Utc>) -> Option<Task> {
        let dependencies = patch
            .dependencies
            .map(|deps| self.acyclic_dependencies(id, deps));
        let task = self.get_mut(id)?;

        if let Some(title) = patch.title {
            if !title.trim().is_empty() {
                task.title = title.trim().to_string();
            }
        }
        if let Some(project) = patch.project {
            task.project = project;
        }
        if let Some(notes) = patch.notes {
            task.notes = notes;
        }
        if let Some(critical) = patch.critical {
            task.critical = critical;
        }
        if let Some(d) = patch.start_date {
            task.start_date = d;
        }
        if let Some(t) = patch.start_time {
            task.start_time = t;
        }
        if let Some(t) = patch.end_time {
            task.end_time = t;
        }
        if let Some(d) = patch.due_date {
            task.due_date = d;
        }
        if let Some(d) = patch.my_day_date {
            task.my_day_date = d;
        }
        if let Some(e) = patch.time_estimate {
            task.time_estimate = e;
        }
        if let Some(e) = patch.energy_level {
            task.energy_level = e;
        }
        if let Some(r) = patch.recurrence_type {
            task.recurrence_type = r;
        }
        if let Some(deps) = dependencies {
            task.dependencies = deps;
        }
        if let Some(status) = patch.status {
            apply_status(task, status, now);
        }
        Some(task.clone())
    }

    fn acyclic_dependencies(&self, id: u64, deps: BTreeSet<u64>) -> BTreeSet<u64> {
        deps.into_iter()
            .filter(|&dep| {
                let single = BTreeSet::from([dep]);
                let closes = dependency_cycle(id, &single, &self.tasks).is_some();
                if closes {
                    tracing::warn!(task = id, dependency = dep, "dropping dependency that would form a cycle");
                }
                !closes
            })
            .collect()
    }

    /// Moves a task to another column. Moving to done goes through
    /// [`TaskBoard::complete`] so recurring tasks roll forward.
    pub fn set_status(
        &mut self,
        id: u64,
        status: TaskStatus,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Option<Task> {
        if status == TaskStatus::Done {
            return self.complete(id, now, today).map(|c| c.task);
        }
        let task = self.get_mut(id)?;
        apply_status(task, status, now);
        Some(task.clone())
    }

    /// Marks a task as done.
    ///
    /// If the task recurs and no later open occurrence of its series exists,
    /// the next occurrence strictly after `today` is created.
    pub fn complete(&mut self, id: u64, now: DateTime<Utc>, today: NaiveDate) -> Option<Completion> {
        let task = self.get_mut(id)?;
        let newly_done = apply_status(task, TaskStatus::Done, now);
        if task.recurrence_type.is_recurring() && task.series_id.is_none() {
            task.series_id = Some(Uuid::new_v4());
        }
        let task = task.clone();

        if !newly_done || !task.recurrence_type.is_recurring() {
            return Some(Completion { task, spawned: None });
        }
        if self.has_pending_occurrence(&task) {
            tracing::debug!(id, "next occurrence already generated");
            return Some(Completion { task, spawned: None });
        }

        let Some(original) = anchor_date(&task) else {
            tracing::debug!(id, "recurring task has no start or due date; nothing to roll forward");
            return Some(Completion { task, spawned: None });
        };
        let spawned = next_occurrence_after(original, task.recurrence_type, today)
            .and_then(|date| occurrence_at(&task, date))
            .map(|draft| self.create(draft, now));
        if let Some(next) = &spawned {
            tracing::info!(id, next = next.id, "created next occurrence");
        }
        Some(Completion { task, spawned })
    }

    fn has_pending_occurrence(&self, task: &Task) -> bool {
        let pivot = anchor_date(task);
        self.tasks.iter().any(|other| {
            other.id != task.id
                && !other.is_done()
                && same_series(other, task)
                && match (anchor_date(other), pivot) {
                    (Some(d), Some(p)) => d > p,
                    _ => true,
                }
        })
    }

    /// Removes a task, or with [`DeleteScope::ThisAndFuture`] the task and
    /// every later task of its series. Returns how many tasks were removed.
    pub fn delete(&mut self, id: u64, scope: DeleteScope) -> usize {
        let Some(target) = self.get(id).cloned() else {
            return 0;
        };
        let before = self.tasks.len();
        match scope {
            DeleteScope::ThisOccurrence => self.tasks.retain(|t| t.id != id),
            DeleteScope::ThisAndFuture => {
                let pivot = anchor_date(&target);
                self.tasks.retain(|t| {
                    let doomed = t.id == id
                        || (same_series(t, &target)
                            && match (pivot, anchor_date(t)) {
                                (Some(p), Some(d)) => d >= p,
                                (None, _) => true,
                                (Some(_), None) => false,
                            });
                    !doomed
                });
            }
        }
        let removed = before - self.tasks.len();
        tracing::debug!(id, ?scope, removed, "deleted tasks");
        removed
    }

    /// Pre-generates future occurrences of a recurring task.
    ///
    /// Dates that already have an occurrence in the series are skipped.
    pub fn generate_series(
        &mut self,
        parent_id: u64,
        termination: Termination,
        now: DateTime<Utc>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let Some(parent) = self.get_mut(parent_id) else {
            tracing::debug!(parent_id, "cannot expand unknown task");
            return report;
        };
        if parent.series_id.is_none() && parent.recurrence_type.is_recurring() {
            parent.series_id = Some(Uuid::new_v4());
        }
        let parent = parent.clone();
        let Some(anchor) = anchor_date(&parent) else {
            tracing::debug!(parent_id, "recurring task has no start or due date");
            return report;
        };

        let existing: BTreeSet<NaiveDate> = self
            .tasks
            .iter()
            .filter(|t| same_series(t, &parent))
            .filter_map(anchor_date)
            .collect();
        let dates: Vec<NaiveDate> = generate_occurrences(anchor, parent.recurrence_type, termination)
            .into_iter()
            .filter(|d| {
                let fresh = !existing.contains(d);
                if !fresh {
                    report.skipped += 1;
                }
                fresh
            })
            .collect();

        let drafts = materialize_occurrences(&parent, &dates);
        report.failed = dates.len() - drafts.len();
        for draft in drafts {
            let task = self.create(draft, now);
            report.succeeded += 1;
            report.ids.push(task.id);
        }
        tracing::info!(parent_id, created = report.succeeded, skipped = report.skipped, "expanded series");
        report
    }

    /// Applies `status` to each id independently.
    pub fn bulk_set_status(
        &mut self,
        ids: &[u64],
        status: TaskStatus,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for &id in ids {
            match self.set_status(id, status, now, today) {
                Some(_) => {
                    report.succeeded += 1;
                    report.ids.push(id);
                }
                None => report.failed += 1,
            }
        }
        report
    }

    /// Places a task on the grid. See [`grid::place`] for the side effects.
    pub fn schedule(&mut self, id: u64, slot: usize, date: NaiveDate, today: NaiveDate) -> Option<Placement> {
        grid::place(self.get_mut(id)?, slot, date, today)
    }

    pub fn resize(&mut self, id: u64, delta_slots: i32) -> Option<u32> {
        Some(grid::resize(self.get_mut(id)?, delta_slots))
    }

    pub fn unschedule(&mut self, id: u64) -> Option<Task> {
        let task = self.get_mut(id)?;
        grid::unschedule(task);
        Some(task.clone())
    }

    pub fn add_to_my_day(&mut self, id: u64, today: NaiveDate) -> Option<Task> {
        let task = self.get_mut(id)?;
        task.my_day_date = Some(today);
        Some(task.clone())
    }

    /// Hides a task from today's My Day, even if its start date has arrived.
    pub fn dismiss_from_my_day(&mut self, id: u64, today: NaiveDate) -> Option<Task> {
        let task = self.get_mut(id)?;
        task.my_day_date = today.pred_opt();
        Some(task.clone())
    }

    /// Creates a task from free text such as "call bob next friday".
    ///
    /// The first date phrase becomes the due date and is removed from the
    /// title. A shorthand code like `W+1` only counts when it is the whole
    /// input, so a stray "w" or "t" in a title is left alone.
    pub fn quick_add(&mut self, text: &str, parser: &TemporalParser, now: DateTime<Utc>) -> Task {
        let mut draft = TaskDraft::new(text.trim());
        if let Some(date) = parser.parse_shorthand(text) {
            draft.due_date = Some(date);
        } else if let Some(found) = parser.parse_natural_language_date(text) {
            draft.due_date = Some(found.date);
            if !found.remaining.is_empty() {
                draft.title = found.remaining;
            }
        }
        self.create(draft, now)
    }

    /// Today's focus list in priority order.
    pub fn my_day(&self, today: NaiveDate) -> Vec<&Task> {
        let mut list: Vec<&Task> = self.tasks.iter().filter(|t| is_in_my_day(t, today)).collect();
        list.sort_by(|a, b| compare_priority(a, b));
        list
    }

    /// Backlog column, actionable tasks first.
    pub fn backlog(&self, today: NaiveDate) -> Vec<Task> {
        let mut list: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Backlog)
            .cloned()
            .collect();
        sort_backlog(&mut list, today);
        list
    }

    /// Every task, or only open ones, in priority order.
    pub fn by_priority(&self, include_done: bool) -> Vec<Task> {
        let mut list: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| include_done || !t.is_done())
            .cloned()
            .collect();
        sort_by_priority(&mut list);
        list
    }

    pub fn blockers(&self, id: u64) -> Vec<&Task> {
        match self.get(id) {
            Some(task) => blocking_tasks(task, &self.tasks),
            None => Vec::new(),
        }
    }
}

/// Two tasks belong to the same recurrence series.
///
/// Falls back to the parent link for records written before series ids existed.
fn same_series(a: &Task, b: &Task) -> bool {
    if a.series_id.is_some() && a.series_id == b.series_id {
        return true;
    }
    let root = |t: &Task| t.recurrence_parent_id.unwrap_or(t.id);
    (a.recurrence_parent_id.is_some() || b.recurrence_parent_id.is_some()) && root(a) == root(b)
}
