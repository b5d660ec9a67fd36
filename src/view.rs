// view.rs

use chrono::{DateTime, Utc};

use crate::reminder::Reminder;
use crate::todo::Task;

/// Tasks split into the three lists the user sees. Derived on demand, never
/// stored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Categorized<'a> {
    /// Soonest due date first.
    pub overdue: Vec<&'a Task>,
    /// Newest first.
    pub pending: Vec<&'a Task>,
    /// Newest first.
    pub completed: Vec<&'a Task>,
}

impl Categorized<'_> {
    pub fn len(&self) -> usize {
        self.overdue.len() + self.pending.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn categorize(tasks: &[Task], now: DateTime<Utc>) -> Categorized<'_> {
    let mut view = Categorized::default();

    for task in tasks {
        if task.completed {
            view.completed.push(task);
        } else if task.due_date.is_some_and(|due| due < now) {
            view.overdue.push(task);
        } else {
            view.pending.push(task);
        }
    }

    // sort_by_key is stable, so ties keep their original order.
    view.overdue.sort_by_key(|t| t.due_date);
    view.pending.sort_by_key(|t| std::cmp::Reverse(t.created_date));
    view.completed.sort_by_key(|t| std::cmp::Reverse(t.created_date));
    view
}

/// Reminders not yet acknowledged, earliest time of day first.
pub fn active_reminders(reminders: &[Reminder]) -> Vec<&Reminder> {
    let mut active: Vec<&Reminder> = reminders.iter().filter(|r| !r.completed).collect();
    active.sort_by_key(|r| r.minute_of_day());
    active
}
