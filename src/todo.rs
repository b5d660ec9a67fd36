// todo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    // Records written before due dates existed have no such field.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: TaskId,
        text: String,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_date: now,
            completed_date: None,
            due_date,
        }
    }

    /// Flips completion, keeping `completed_date` in step with `completed`.
    /// Returns the new completion state.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.completed = !self.completed;
        self.completed_date = if self.completed { Some(now) } else { None };
        self.completed
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}
