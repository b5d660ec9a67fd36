// stats.rs

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::todo::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub monthly_completed: usize,
    pub total_tasks: usize,
    /// Percent of all tasks, open or done, completed during `now`'s month.
    pub completion_rate: u32,
}

/// Month and year are compared in `now`'s timezone.
pub fn compute_stats<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Stats {
    let tz = now.timezone();
    let (month, year) = (now.month(), now.year());

    let monthly_completed = tasks
        .iter()
        .filter_map(|t| t.completed_date.as_ref())
        .map(|d: &DateTime<Utc>| d.with_timezone(&tz))
        .filter(|d| d.month() == month && d.year() == year)
        .count();

    let total_tasks = tasks.len();
    let completion_rate = if total_tasks > 0 {
        (monthly_completed as f64 / total_tasks as f64 * 100.0).round() as u32
    } else {
        0
    };

    Stats {
        monthly_completed,
        total_tasks,
        completion_rate,
    }
}
