// clock.rs
//
// Time and id sources the store consumes. Both are swappable so the store can
// be driven deterministically.

use chrono::{DateTime, Local, NaiveTime, Utc};
use std::sync::{Arc, Mutex};

pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;

    /// Wall-clock time of day, used to match reminders.
    fn local_time(&self) -> NaiveTime {
        self.now().with_timezone(&Local).time()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    local_time: Arc<Mutex<Option<NaiveTime>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            local_time: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::TimeDelta) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }

    /// Pins the time of day independently of the host timezone.
    pub fn set_local_time(&self, time: NaiveTime) {
        if let Ok(mut guard) = self.local_time.lock() {
            *guard = Some(time);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|g| *g).unwrap_or_else(|e| *e.into_inner())
    }

    fn local_time(&self) -> NaiveTime {
        let pinned = self.local_time.lock().ok().and_then(|g| *g);
        pinned.unwrap_or_else(|| self.now().with_timezone(&Local).time())
    }
}

/// Monotonic id source: milliseconds since the epoch, bumped so that every id
/// is larger than the previous one and than any id seen at load time.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn observe(&mut self, id: i64) {
        self.last = self.last.max(id);
    }

    /// `None` once the last id handed out or observed is `i64::MAX`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> Option<i64> {
        let id = now.timestamp_millis().max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }
}
