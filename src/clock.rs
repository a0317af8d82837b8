use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Source of wall-clock time for sessions and feedback expiry.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Start at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::default())
    }

    /// Move time forward, saturating at the largest representable instant.
    pub fn advance(&self, by: Duration) {
        let now = self.now.get();
        match now.checked_add_signed(by) {
            Some(next) => self.now.set(next),
            None => {
                tracing::warn!(?by, "clock advance out of range, saturating");
                self.now.set(if by < Duration::zero() {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                });
            }
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
