use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::sync::Mutex;

/// Source of application timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for deterministic timestamps.
///
/// A new `FixedClock` is frozen at the instant it was created. `set` and
/// `advance` move it explicitly; nothing else changes its value.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn frozen() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    /// Sets the clock from a `YYYY-MM-DD HH:MM:SS` string interpreted as UTC.
    pub fn set_str(&self, datetime: &str) -> Result<()> {
        let parsed = NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")?;
        self.set(parsed.and_utc());
        Ok(())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}
