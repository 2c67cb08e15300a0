//! Periodic task — a drift-free recurring invoker aligned to local midnight.
//!
//! The first deadline is the next multiple of the interval counted from local
//! midnight. Every later deadline is the previous deadline plus the interval,
//! never "now plus the interval", so a slow callback or a late wake-up does
//! not shift the schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{NaiveTime, Timelike};
use lightsrv_domain::error::{LightsrvError, ValidationError};
use lightsrv_domain::time::{TimeOfDay, seconds_until_next_multiple};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::ports::{Clock, SystemClock};

/// Time from `now` to the next multiple of `interval_secs` since midnight,
/// counting sub-second precision. Zero only when `now` sits exactly on a
/// boundary.
#[must_use]
pub fn delay_until_aligned(now: NaiveTime, interval_secs: u32) -> Duration {
    let whole = seconds_until_next_multiple(TimeOfDay::from(now), interval_secs);
    let fraction = Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000));
    if fraction.is_zero() {
        return Duration::from_secs(u64::from(whole));
    }
    let whole = if whole == 0 { interval_secs } else { whole };
    Duration::from_secs(u64::from(whole)) - fraction
}

/// Handle on a running periodic task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Start invoking `task` every `interval_secs`, aligned to local midnight
    /// on the system clock.
    ///
    /// Must be called from within a `tokio` runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroInterval`] when `interval_secs` is 0.
    pub fn start<F>(
        name: impl Into<String>,
        interval_secs: u32,
        immediate: bool,
        task: F,
    ) -> Result<Self, LightsrvError>
    where
        F: FnMut() + Send + 'static,
    {
        Self::start_with_clock(name, interval_secs, immediate, SystemClock, task)
    }

    /// Like [`start`](Self::start), reading the wall clock through `clock`.
    ///
    /// When `immediate` is set, `task` runs once synchronously before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroInterval`] when `interval_secs` is 0.
    pub fn start_with_clock<C, F>(
        name: impl Into<String>,
        interval_secs: u32,
        immediate: bool,
        clock: C,
        mut task: F,
    ) -> Result<Self, LightsrvError>
    where
        C: Clock,
        F: FnMut() + Send + 'static,
    {
        if interval_secs == 0 {
            return Err(ValidationError::ZeroInterval.into());
        }
        let name = name.into();

        if immediate {
            tracing::debug!(task = %name, "immediate invocation");
            task();
        }

        let period = Duration::from_secs(u64::from(interval_secs));
        let delay = delay_until_aligned(clock.time_of_day(), interval_secs);
        // Anchor the grid now; the spawned future may first be polled much later.
        let first_deadline = Instant::now() + delay;
        let cancelled = Arc::new(AtomicBool::new(false));
        tracing::info!(task = %name, interval_secs, first_in = ?delay, "periodic task scheduled");

        let flag = Arc::clone(&cancelled);
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            let mut deadline = first_deadline;
            loop {
                tokio::time::sleep_until(deadline).await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                tracing::trace!(task = %task_name, "fire");
                task();
                deadline += period;
            }
        });

        Ok(Self {
            name,
            cancelled,
            handle,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stop the task. No invocation starts after this returns.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!(task = %self.name, "periodic task cancelled");
        }
        self.handle.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
