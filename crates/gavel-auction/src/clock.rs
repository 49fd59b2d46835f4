//! Source of "now" for the engine.

use chrono::{DateTime, Utc};

/// Supplies wall-clock time to rooms.
///
/// The engine never reads the system clock itself; tests hand it a clock
/// they control.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
