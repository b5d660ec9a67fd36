// notify.rs
//
// OS-level notifications for fired reminders and completed tasks. Purely
// advisory: a desktop without a notification service only gets a log line.

use tracing::warn;

#[cfg(all(unix, not(target_os = "macos")))]
use notify_rust::Notification;

#[cfg(target_os = "windows")]
use notifica::notify;

#[cfg(target_os = "macos")]
use mac_notification_sys::send_notification;

use crate::events::{EventSink, StoreEvent};

const APP_NAME: &str = "Daily Todo";

/// Event sink that turns reminder and completion events into desktop
/// notifications.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn notify_event(&self, event: &StoreEvent) {
        if !self.enabled {
            return;
        }
        let (summary, body) = match event {
            StoreEvent::ReminderFired { .. } => ("Todo Reminder", event.message()),
            StoreEvent::TaskCompleted(task) => (
                "Task completed",
                format!("\"{}\" is done. Great job!", task.text),
            ),
            _ => return,
        };
        if let Err(e) = show(summary, &body) {
            warn!("Desktop notification failed: {}", e);
        }
    }
}

impl EventSink for DesktopNotifier {
    fn emit(&mut self, event: StoreEvent) {
        self.notify_event(&event);
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn show(summary: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .appname(APP_NAME)
        .summary(summary)
        .body(body)
        .show()?;
    Ok(())
}

#[cfg(target_os = "windows")]
fn show(summary: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    let _ = notify(APP_NAME, &format!("{}: {}", summary, body));
    Ok(())
}

#[cfg(target_os = "macos")]
fn show(summary: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    send_notification(APP_NAME, Some(summary), body, None)?;
    Ok(())
}

#[cfg(not(any(unix, target_os = "windows")))]
fn show(_summary: &str, _body: &str) -> Result<(), Box<dyn std::error::Error>> {
    Err("Desktop notifications not supported on this OS".into())
}
