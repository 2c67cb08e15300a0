//! Clock port — where the local wall-clock time comes from.

use chrono::{Local, NaiveTime};

/// Source of the local time of day.
///
/// Only used to align schedules to local midnight; waiting itself uses the
/// monotonic `tokio` clock.
pub trait Clock {
    /// Current local time of day, with sub-second precision.
    fn time_of_day(&self) -> NaiveTime;
}

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}
