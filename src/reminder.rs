// reminder.rs

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub type ReminderId = i64;

/// Lifecycle of a reminder, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Armed,
    Fired,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    /// "HH:MM", kept alongside `hours`/`minutes` for readers of the raw file.
    pub time: String,
    pub hours: u32,
    pub minutes: u32,
    pub created_at: DateTime<Utc>,
    pub triggered: bool,
    pub completed: bool,
}

impl Reminder {
    pub fn new(id: ReminderId, time: NaiveTime, now: DateTime<Utc>) -> Self {
        Self {
            id,
            time: time.format("%H:%M").to_string(),
            hours: time.hour(),
            minutes: time.minute(),
            created_at: now,
            triggered: false,
            completed: false,
        }
    }

    pub fn state(&self) -> ReminderState {
        match (self.triggered, self.completed) {
            (_, true) => ReminderState::Done,
            (true, false) => ReminderState::Fired,
            (false, false) => ReminderState::Armed,
        }
    }

    pub fn minute_of_day(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    /// Exact hour and minute match. A minute that passes without a poll is
    /// never caught up.
    pub fn is_due_at(&self, time: NaiveTime) -> bool {
        self.state() == ReminderState::Armed
            && self.hours == time.hour()
            && self.minutes == time.minute()
    }
}
