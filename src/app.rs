// app.rs
use crate::dates::due_date_input;
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::notify::DesktopNotifier;
use crate::reminder::{Reminder, ReminderId};
use crate::store::{DueDateEdit, TodoStore};
use crate::todo::{Task, TaskId};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::warn;

/// How long a status message stays on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    AddingText,
    AddingDueDate,
    EditingText,
    EditingDueDate,
    SettingReminder,
    ConfirmDelete,
    ViewingStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Tasks,
    Reminders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Task(TaskId),
    Reminder(ReminderId),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

pub struct App {
    pub store: Arc<Mutex<TodoStore>>,
    events: mpsc::Receiver<StoreEvent>,
    notifier: DesktopNotifier,

    pub input_mode: InputMode,
    pub focus: Focus,
    pub input_text: String,
    pub input_due_date: String,
    pub editing_id: Option<TaskId>,
    original_due_input: String,
    pub pending_delete: Option<DeleteTarget>,
    pub selected: usize,
    pub selected_reminder: usize,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        store: Arc<Mutex<TodoStore>>,
        events: mpsc::Receiver<StoreEvent>,
        notifier: DesktopNotifier,
    ) -> Self {
        Self {
            store,
            events,
            notifier,
            input_mode: InputMode::Normal,
            focus: Focus::Tasks,
            input_text: String::new(),
            input_due_date: String::new(),
            editing_id: None,
            original_due_input: String::new(),
            pending_delete: None,
            selected: 0,
            selected_reminder: 0,
            status: None,
        }
    }

    /// The store stays usable after a panic elsewhere; its data is only ever
    /// replaced wholesale.
    pub fn lock(&self) -> MutexGuard<'_, TodoStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tasks in on-screen order: overdue, pending, completed.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let store = self.lock();
        let view = store.categorized();
        view.overdue
            .into_iter()
            .chain(view.pending)
            .chain(view.completed)
            .cloned()
            .collect()
    }

    pub fn visible_reminders(&self) -> Vec<Reminder> {
        self.lock().active_reminders().into_iter().cloned().collect()
    }

    pub fn selected_task(&self) -> Option<Task> {
        self.visible_tasks().into_iter().nth(self.selected)
    }

    pub fn selected_reminder(&self) -> Option<Reminder> {
        self.visible_reminders().into_iter().nth(self.selected_reminder)
    }

    pub fn select_next(&mut self) {
        match self.focus {
            Focus::Tasks => {
                if self.selected + 1 < self.visible_tasks().len() {
                    self.selected += 1;
                }
            }
            Focus::Reminders => {
                if self.selected_reminder + 1 < self.visible_reminders().len() {
                    self.selected_reminder += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            Focus::Tasks => self.selected = self.selected.saturating_sub(1),
            Focus::Reminders => self.selected_reminder = self.selected_reminder.saturating_sub(1),
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Tasks => Focus::Reminders,
            Focus::Reminders => Focus::Tasks,
        };
    }

    fn clamp_selection(&mut self) {
        let tasks = self.visible_tasks().len();
        self.selected = self.selected.min(tasks.saturating_sub(1));
        let reminders = self.visible_reminders().len();
        self.selected_reminder = self.selected_reminder.min(reminders.saturating_sub(1));
    }

    pub fn begin_add(&mut self) {
        self.input_mode = InputMode::AddingText;
        self.input_text.clear();
        self.input_due_date.clear();
        self.status = None;
    }

    /// Enter on the text step. Blank text goes straight to the store so the
    /// rejection comes from the same rule as everywhere else.
    pub fn submit_add_text(&mut self) {
        if self.input_text.trim().is_empty() {
            self.submit_add();
        } else {
            self.input_mode = InputMode::AddingDueDate;
        }
    }

    pub fn submit_add(&mut self) {
        let result = self
            .lock()
            .add_task(&self.input_text, Some(&self.input_due_date));
        if self.report(result).is_some() {
            self.input_text.clear();
            self.input_due_date.clear();
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn begin_edit_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.editing_id = Some(task.id);
        self.input_text = task.text.clone();
        self.original_due_input = task.due_date.as_ref().map(due_date_input).unwrap_or_default();
        self.input_due_date = self.original_due_input.clone();
        self.input_mode = InputMode::EditingText;
        self.status = None;
    }

    pub fn submit_edit_text(&mut self) {
        self.input_mode = InputMode::EditingDueDate;
    }

    /// Enter on the due date step: blank clears the date, an untouched
    /// prefill keeps it.
    pub fn submit_edit(&mut self) {
        let trimmed = self.input_due_date.trim();
        let due = if trimmed.is_empty() {
            DueDateEdit::Clear
        } else if trimmed == self.original_due_input {
            DueDateEdit::Unchanged
        } else {
            DueDateEdit::SetTo(trimmed.to_string())
        };
        self.finish_edit(due);
    }

    /// Esc on the due date step: save the text, leave the date alone.
    pub fn submit_edit_keep_due(&mut self) {
        self.finish_edit(DueDateEdit::Unchanged);
    }

    fn finish_edit(&mut self, due: DueDateEdit) {
        let Some(id) = self.editing_id else {
            self.input_mode = InputMode::Normal;
            return;
        };
        let result = self.lock().edit_task(id, Some(&self.input_text), due);
        if let Some(outcome) = self.report(result) {
            if outcome.is_none() {
                self.set_status("Task no longer exists", true);
            }
            self.cancel_input();
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(task) = self.selected_task() {
            let result = self.lock().toggle_task(task.id);
            self.report(result);
        }
    }

    pub fn request_delete(&mut self) {
        let target = match self.focus {
            Focus::Tasks => self.selected_task().map(|t| DeleteTarget::Task(t.id)),
            Focus::Reminders => self.selected_reminder().map(|r| DeleteTarget::Reminder(r.id)),
        };
        if let Some(target) = target {
            self.pending_delete = Some(target);
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self, yes: bool) {
        if let (true, Some(target)) = (yes, self.pending_delete) {
            let result = match target {
                DeleteTarget::Task(id) => self.lock().delete_task(id),
                DeleteTarget::Reminder(id) => self.lock().delete_reminder(id),
            };
            self.report(result);
        }
        self.pending_delete = None;
        self.input_mode = InputMode::Normal;
        self.clamp_selection();
    }

    pub fn begin_reminder(&mut self) {
        self.input_mode = InputMode::SettingReminder;
        self.input_text.clear();
        self.status = None;
    }

    pub fn submit_reminder(&mut self) {
        let result = self.lock().set_reminder(&self.input_text);
        if self.report(result).is_some() {
            self.cancel_input();
        }
    }

    pub fn complete_selected_reminder(&mut self) {
        if let Some(reminder) = self.selected_reminder() {
            let result = self.lock().complete_reminder(reminder.id);
            self.report(result);
            self.clamp_selection();
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_text.clear();
        self.input_due_date.clear();
        self.editing_id = None;
        self.original_due_input.clear();
    }

    /// Which input buffer the current mode types into.
    pub fn active_input(&mut self) -> Option<&mut String> {
        match self.input_mode {
            InputMode::AddingText | InputMode::EditingText | InputMode::SettingReminder => {
                Some(&mut self.input_text)
            }
            InputMode::AddingDueDate | InputMode::EditingDueDate => Some(&mut self.input_due_date),
            _ => None,
        }
    }

    /// Turns store events into status messages and desktop notifications.
    pub fn drain_events(&mut self) {
        let events: Vec<StoreEvent> = self.events.try_iter().collect();
        for event in events {
            self.notifier.notify_event(&event);
            self.set_status(event.message(), event.is_error());
        }
    }

    pub fn expire_status(&mut self) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.shown_at.elapsed() >= STATUS_TTL)
        {
            self.status = None;
        }
    }

    pub fn set_status<S: Into<String>>(&mut self, text: S, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    /// Validation failures already reach the user through the event stream;
    /// anything else means the data may not be on disk.
    fn report<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        self.drain_events();
        match result {
            Ok(value) => Some(value),
            Err(StoreError::Validation(_)) => None,
            Err(e) => {
                warn!("{}", e);
                self.set_status(e.to_string(), true);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration as Dur, TimeZone, Utc};

    fn app() -> (App, ManualClock, MemoryStore) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let backend = MemoryStore::new();
        let (tx, rx) = mpsc::channel();
        let store = TodoStore::open(backend.clone(), clock.clone(), tx).unwrap();
        let app = App::new(Arc::new(Mutex::new(store)), rx, DesktopNotifier::new(false));
        (app, clock, backend)
    }

    fn add(app: &mut App, text: &str, due: &str) {
        app.begin_add();
        app.input_text = text.to_string();
        app.submit_add_text();
        app.input_due_date = due.to_string();
        app.submit_add();
    }

    #[test]
    fn test_add_flow() {
        let (mut app, _, _) = app();
        add(&mut app, "Buy milk", "");
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.visible_tasks().len(), 1);
        assert_eq!(app.status.as_ref().unwrap().text, "Task added successfully!");
    }

    #[test]
    fn test_blank_text_stays_in_text_step() {
        let (mut app, _, backend) = app();
        app.begin_add();
        app.input_text = "   ".to_string();
        app.submit_add_text();
        assert_eq!(app.input_mode, InputMode::AddingText);
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert_eq!(status.text, "Please enter a task");
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn test_bad_due_date_keeps_input() {
        let (mut app, _, _) = app();
        add(&mut app, "Buy milk", "someday");
        assert_eq!(app.input_mode, InputMode::AddingDueDate);
        assert_eq!(app.input_text, "Buy milk");
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_visible_order_overdue_first() {
        let (mut app, clock, _) = app();
        add(&mut app, "later", "");
        clock.advance(Dur::minutes(1));
        add(&mut app, "late", "2024-01-01");
        let texts: Vec<String> = app.visible_tasks().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["late", "later"]);
    }

    #[test]
    fn test_edit_clear_and_keep_due_date() {
        let (mut app, _, _) = app();
        add(&mut app, "Pay rent", "2024-07-01");

        app.begin_edit_selected();
        assert_eq!(app.input_due_date, "2024-07-01");
        app.input_text = "Pay the rent".to_string();
        app.submit_edit_text();
        app.submit_edit();
        let task = app.selected_task().unwrap();
        assert_eq!(task.text, "Pay the rent");
        assert!(task.due_date.is_some());

        app.begin_edit_selected();
        app.submit_edit_text();
        app.input_due_date.clear();
        app.submit_edit();
        assert_eq!(app.selected_task().unwrap().due_date, None);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_edit_esc_on_due_keeps_date() {
        let (mut app, _, _) = app();
        add(&mut app, "Pay rent", "2024-07-01");
        let before = app.selected_task().unwrap().due_date;

        app.begin_edit_selected();
        app.input_text = "Rent".to_string();
        app.submit_edit_text();
        app.input_due_date = "garbage".to_string();
        app.submit_edit_keep_due();

        let task = app.selected_task().unwrap();
        assert_eq!(task.text, "Rent");
        assert_eq!(task.due_date, before);
    }

    #[test]
    fn test_toggle_and_delete_with_confirmation() {
        let (mut app, _, _) = app();
        add(&mut app, "a", "");
        app.toggle_selected();
        assert!(app.selected_task().unwrap().completed);

        app.request_delete();
        assert_eq!(app.input_mode, InputMode::ConfirmDelete);
        app.confirm_delete(false);
        assert_eq!(app.visible_tasks().len(), 1);

        app.request_delete();
        app.confirm_delete(true);
        assert!(app.visible_tasks().is_empty());
        assert_eq!(app.status.as_ref().unwrap().text, "Task deleted");
    }

    #[test]
    fn test_reminder_flow() {
        let (mut app, _, _) = app();
        app.begin_reminder();
        app.input_text = "18:00".to_string();
        app.submit_reminder();
        assert_eq!(app.visible_reminders().len(), 1);

        app.toggle_focus();
        app.complete_selected_reminder();
        assert!(app.visible_reminders().is_empty());
        assert_eq!(app.lock().reminders().len(), 1);
    }

    #[test]
    fn test_failed_save_shows_warning() {
        let (mut app, _, backend) = app();
        backend.fail_writes(true);
        add(&mut app, "unsaved", "");
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("may not be saved"));
    }

    #[test]
    fn test_selection_is_bounded() {
        let (mut app, _, _) = app();
        add(&mut app, "a", "");
        add(&mut app, "b", "");
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 1);
        app.select_prev();
        app.select_prev();
        assert_eq!(app.selected, 0);
    }
}
