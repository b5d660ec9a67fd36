// events.rs

use std::sync::mpsc;

use crate::reminder::{Reminder, ReminderId};
use crate::todo::{Task, TaskId};

/// Notifications the store emits after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TaskAdded(Task),
    TaskCompleted(Task),
    TaskUncompleted(Task),
    TaskEdited(Task),
    TaskDeleted(TaskId),
    ReminderSet(Reminder),
    ReminderFired {
        reminder: Reminder,
        pending_tasks: usize,
    },
    ReminderCompleted(ReminderId),
    ReminderDeleted(ReminderId),
    ValidationFailed(String),
}

impl StoreEvent {
    /// Short user-facing message, as shown in the status line.
    pub fn message(&self) -> String {
        match self {
            StoreEvent::TaskAdded(_) => "Task added successfully!".to_string(),
            StoreEvent::TaskCompleted(_) => "✓ Great job! Task completed!".to_string(),
            StoreEvent::TaskUncompleted(_) => "Task marked as not done".to_string(),
            StoreEvent::TaskEdited(_) => "Task updated".to_string(),
            StoreEvent::TaskDeleted(_) => "Task deleted".to_string(),
            StoreEvent::ReminderSet(r) => format!("Reminder set for {}", r.time),
            StoreEvent::ReminderFired { pending_tasks, .. } => reminder_body(*pending_tasks),
            StoreEvent::ReminderCompleted(_) => "Reminder completed".to_string(),
            StoreEvent::ReminderDeleted(_) => "Reminder deleted".to_string(),
            StoreEvent::ValidationFailed(msg) => msg.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StoreEvent::ValidationFailed(_))
    }
}

pub fn reminder_body(pending_tasks: usize) -> String {
    match pending_tasks {
        0 => "Reminder: no pending tasks, nice!".to_string(),
        1 => "Reminder: you have 1 pending task".to_string(),
        n => format!("Reminder: you have {} pending tasks", n),
    }
}

pub trait EventSink: Send {
    fn emit(&mut self, event: StoreEvent);
}

/// Drops every event.
impl EventSink for () {
    fn emit(&mut self, _event: StoreEvent) {}
}

/// Forwards to a channel; a hung-up receiver is not an error for the store.
impl EventSink for mpsc::Sender<StoreEvent> {
    fn emit(&mut self, event: StoreEvent) {
        let _ = self.send(event);
    }
}

/// Delivers every event to each sink in order.
pub struct Fanout(pub Vec<Box<dyn EventSink>>);

impl EventSink for Fanout {
    fn emit(&mut self, event: StoreEvent) {
        for sink in &mut self.0 {
            sink.emit(event.clone());
        }
    }
}
