//daemon.rs
use crate::store::TodoStore;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background thread that checks reminders on a fixed cadence. Polls once
/// right away, then every `interval`, until stopped or dropped.
pub struct ReminderDaemon {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderDaemon {
    pub fn start(store: Arc<Mutex<TodoStore>>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || run(store, interval, stop_rx));
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the loop and waits for the in-flight poll, if any, to finish.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the loop just like an explicit message.
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("reminder daemon thread panicked");
            }
        }
    }

    /// Blocks until the loop ends on its own (a poisoned store lock).
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReminderDaemon {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(store: Arc<Mutex<TodoStore>>, interval: Duration, stop_rx: mpsc::Receiver<()>) {
    debug!(?interval, "reminder daemon started");
    loop {
        match store.lock() {
            Ok(mut store) => {
                if let Err(e) = store.poll_reminders() {
                    warn!("Reminder poll failed: {}", e);
                }
            }
            Err(_) => {
                error!("todo store lock poisoned, stopping reminder daemon");
                return;
            }
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("reminder daemon stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::StoreEvent;
    use crate::storage::MemoryStore;
    use chrono::{NaiveTime, TimeZone, Utc};
    use std::time::Instant;

    fn shared_store(clock: ManualClock) -> (Arc<Mutex<TodoStore>>, mpsc::Receiver<StoreEvent>) {
        let (tx, rx) = mpsc::channel();
        let store = TodoStore::open(MemoryStore::new(), clock, tx).unwrap();
        (Arc::new(Mutex::new(store)), rx)
    }

    #[test]
    fn test_daemon_fires_due_reminder_once() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap());
        clock.set_local_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let (store, events) = shared_store(clock);
        store.lock().unwrap().set_reminder("08:00").unwrap();
        let _ = events.recv_timeout(Duration::from_secs(1));

        let mut daemon = ReminderDaemon::start(store.clone(), Duration::from_millis(10));
        let fired = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(fired, StoreEvent::ReminderFired { .. }));

        // Several more polls in the same minute fire nothing new.
        thread::sleep(Duration::from_millis(60));
        daemon.stop();
        assert!(events.try_recv().is_err());
        assert!(store.lock().unwrap().reminders()[0].triggered);
    }

    #[test]
    fn test_stop_is_prompt_and_idempotent() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap());
        let (store, _events) = shared_store(clock);

        let mut daemon = ReminderDaemon::start(store, Duration::from_secs(3600));
        assert!(daemon.is_running());

        let started = Instant::now();
        daemon.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!daemon.is_running());
        daemon.stop();
    }
}
