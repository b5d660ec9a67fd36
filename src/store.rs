// store.rs
//
// The task and reminder collections plus every operation allowed to change
// them. Each mutation writes the whole affected collection back before it
// returns.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::clock::{Clock, IdGenerator};
use crate::dates::{parse_due_date, parse_time_of_day};
use crate::error::{Result, StoreError};
use crate::events::{EventSink, StoreEvent};
use crate::reminder::{Reminder, ReminderId};
use crate::stats::{Stats, compute_stats};
use crate::storage::{KvStore, REMINDERS_KEY, TASKS_KEY};
use crate::todo::{Task, TaskId};
use crate::view::{Categorized, active_reminders, categorize};

/// How an edit treats the due date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DueDateEdit {
    #[default]
    Unchanged,
    Clear,
    SetTo(String),
}

pub struct TodoStore {
    tasks: Vec<Task>,
    reminders: Vec<Reminder>,
    backend: Box<dyn KvStore>,
    clock: Box<dyn Clock>,
    events: Box<dyn EventSink>,
    ids: IdGenerator,
}

impl TodoStore {
    /// Loads both collections from `backend`. Missing keys start empty; a
    /// value that does not parse is an error rather than a silent reset.
    pub fn open(
        backend: impl KvStore + 'static,
        clock: impl Clock + 'static,
        events: impl EventSink + 'static,
    ) -> Result<Self> {
        let tasks: Vec<Task> = load(&backend, TASKS_KEY)?;
        let reminders: Vec<Reminder> = load(&backend, REMINDERS_KEY)?;

        let mut ids = IdGenerator::new();
        tasks.iter().for_each(|t| ids.observe(t.id));
        reminders.iter().for_each(|r| ids.observe(r.id));

        info!(
            tasks = tasks.len(),
            reminders = reminders.len(),
            "todo store opened"
        );

        Ok(Self {
            tasks,
            reminders,
            backend: Box::new(backend),
            clock: Box::new(clock),
            events: Box::new(events),
            ids,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn reminder(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn categorized(&self) -> Categorized<'_> {
        categorize(&self.tasks, self.clock.now())
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.tasks, &self.clock.now().with_timezone(&chrono::Local))
    }

    pub fn active_reminders(&self) -> Vec<&Reminder> {
        active_reminders(&self.reminders)
    }

    pub fn add_task(&mut self, text: &str, due_date: Option<&str>) -> Result<Task> {
        let now = self.clock.now();
        let text = self.require_text(text, "Please enter a task")?;
        let due_date = match due_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(self.check(parse_due_date(raw, &now.with_timezone(&chrono::Local)))?),
            None => None,
        };

        let task = Task::new(self.next_id(now)?, text, due_date, now);
        debug!(id = task.id, "adding task");
        self.tasks.push(task.clone());
        self.emit(StoreEvent::TaskAdded(task.clone()));
        self.save_tasks()?;
        Ok(task)
    }

    /// Flips completion. Returns the updated task, or `None` for an unknown id.
    pub fn toggle_task(&mut self, id: TaskId) -> Result<Option<Task>> {
        let now = self.clock.now();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle of unknown task ignored");
            return Ok(None);
        };

        let done = task.toggle(now);
        let task = task.clone();
        debug!(id, done, "toggled task");
        if done {
            self.emit(StoreEvent::TaskCompleted(task.clone()));
        } else {
            self.emit(StoreEvent::TaskUncompleted(task.clone()));
        }
        self.save_tasks()?;
        Ok(Some(task))
    }

    /// Validates everything first and only then touches the task, so a
    /// rejected edit leaves it exactly as it was.
    pub fn edit_task(
        &mut self,
        id: TaskId,
        new_text: Option<&str>,
        new_due_date: DueDateEdit,
    ) -> Result<Option<Task>> {
        if self.task(id).is_none() {
            debug!(id, "edit of unknown task ignored");
            return Ok(None);
        }

        let text = match new_text {
            Some(raw) => Some(self.require_text(raw, "Task text cannot be empty")?),
            None => None,
        };
        let now = self.clock.now().with_timezone(&chrono::Local);
        let due_date = match new_due_date {
            DueDateEdit::Unchanged => None,
            DueDateEdit::Clear => Some(None),
            DueDateEdit::SetTo(raw) => Some(Some(self.check(parse_due_date(&raw, &now))?)),
        };

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(text) = text {
            task.text = text;
        }
        if let Some(due) = due_date {
            task.due_date = due;
        }
        let task = task.clone();

        debug!(id, "edited task");
        self.emit(StoreEvent::TaskEdited(task.clone()));
        self.save_tasks()?;
        Ok(Some(task))
    }

    /// Returns whether a task was removed.
    pub fn delete_task(&mut self, id: TaskId) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "delete of unknown task ignored");
            return Ok(false);
        }

        debug!(id, "deleted task");
        self.emit(StoreEvent::TaskDeleted(id));
        self.save_tasks()?;
        Ok(true)
    }

    pub fn set_reminder(&mut self, time_of_day: &str) -> Result<Reminder> {
        let time = self.check(parse_time_of_day(time_of_day))?;
        let now = self.clock.now();

        let reminder = Reminder::new(self.next_id(now)?, time, now);
        debug!(id = reminder.id, time = %reminder.time, "setting reminder");
        self.reminders.push(reminder.clone());
        self.emit(StoreEvent::ReminderSet(reminder.clone()));
        self.save_reminders()?;
        Ok(reminder)
    }

    /// Marks a reminder acknowledged. Returns whether one was found.
    pub fn complete_reminder(&mut self, id: ReminderId) -> Result<bool> {
        let Some(reminder) = self.reminders.iter_mut().find(|r| r.id == id) else {
            debug!(id, "completion of unknown reminder ignored");
            return Ok(false);
        };
        reminder.completed = true;

        self.emit(StoreEvent::ReminderCompleted(id));
        self.save_reminders()?;
        Ok(true)
    }

    pub fn delete_reminder(&mut self, id: ReminderId) -> Result<bool> {
        let before = self.reminders.len();
        self.reminders.retain(|r| r.id != id);
        if self.reminders.len() == before {
            debug!(id, "delete of unknown reminder ignored");
            return Ok(false);
        }

        self.emit(StoreEvent::ReminderDeleted(id));
        self.save_reminders()?;
        Ok(true)
    }

    /// Polls against the store clock's time of day.
    pub fn poll_reminders(&mut self) -> Result<Vec<Reminder>> {
        let time = self.clock.local_time();
        self.poll_reminders_at(time)
    }

    /// Fires every armed reminder set for exactly this hour and minute and
    /// returns them. A fired reminder never matches again.
    pub fn poll_reminders_at(&mut self, time: NaiveTime) -> Result<Vec<Reminder>> {
        let mut fired = Vec::new();
        for reminder in self.reminders.iter_mut().filter(|r| r.is_due_at(time)) {
            reminder.triggered = true;
            fired.push(reminder.clone());
        }
        if fired.is_empty() {
            return Ok(fired);
        }

        let pending_tasks = self.pending_count();
        info!(count = fired.len(), pending_tasks, "reminders fired");
        for reminder in &fired {
            self.emit(StoreEvent::ReminderFired {
                reminder: reminder.clone(),
                pending_tasks,
            });
        }
        self.save_reminders()?;
        Ok(fired)
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> Result<i64> {
        let last = self.ids.last();
        self.ids.next_id(now).ok_or(StoreError::IdsExhausted(last))
    }

    fn require_text(&mut self, raw: &str, msg: &str) -> Result<String> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(self.reject(msg));
        }
        Ok(text.to_string())
    }

    /// Routes validation failures through the event sink as well.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|e| match e {
            StoreError::Validation(msg) => self.reject(&msg),
            other => other,
        })
    }

    fn reject(&mut self, msg: &str) -> StoreError {
        debug!(msg, "validation failed");
        self.emit(StoreEvent::ValidationFailed(msg.to_string()));
        StoreError::validation(msg)
    }

    fn emit(&mut self, event: StoreEvent) {
        self.events.emit(event);
    }

    fn save_tasks(&mut self) -> Result<()> {
        persist(self.backend.as_mut(), TASKS_KEY, &self.tasks)
    }

    fn save_reminders(&mut self) -> Result<()> {
        persist(self.backend.as_mut(), REMINDERS_KEY, &self.reminders)
    }
}

fn load<T: DeserializeOwned>(backend: &dyn KvStore, key: &str) -> Result<Vec<T>> {
    match backend.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

fn persist<T: Serialize>(backend: &mut dyn KvStore, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    backend.set(key, &raw).inspect_err(|e| {
        error!(key, "failed to persist: {}", e);
    })
}
