use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::Task;

/// Total order used for every task list.
///
/// 1. Critical tasks first.
/// 2. Earliest due date; undated tasks after all dated ones.
/// 3. Energy level, high before medium before low.
/// 4. Creation time, oldest first, then id.
pub fn compare_priority(a: &Task, b: &Task) -> Ordering {
    b.critical
        .cmp(&a.critical)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.energy_level.cmp(&a.energy_level))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts in place by [`compare_priority`].
pub fn sort_by_priority(tasks: &mut [Task]) {
    tasks.sort_by(compare_priority);
}

/// Backlog ordering: tasks that cannot start yet go last.
///
/// Within each half the usual priority order applies.
pub fn sort_backlog(tasks: &mut [Task], today: NaiveDate) {
    let deferred = |t: &Task| t.start_date.map_or(false, |d| d > today);
    tasks.sort_by(|a, b| {
        deferred(a)
            .cmp(&deferred(b))
            .then_with(|| compare_priority(a, b))
    });
}
