//! Countdown tick source for the questions phase.
//!
//! A timer is a spawned task that sends one [`TimerEvent`] per period into
//! the driver's queue. It never touches session state. Each timer carries an
//! epoch so events from a cancelled timer can be recognised and dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed period from the timer started with `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub epoch: u64,
}

/// Starts tick tasks with a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct TimerCoordinator {
    period: Duration,
}

impl Default for TimerCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}

impl TimerCoordinator {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn a timer that emits `ticks` events, the first one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, epoch: u64, ticks: u64, events: mpsc::Sender<TimerEvent>) -> TimerHandle {
        let period = self.period;
        debug!(epoch, ticks, ?period, "timer started");

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..ticks {
                interval.tick().await;
                if events.send(TimerEvent { epoch }).await.is_err() {
                    break;
                }
            }
        });

        TimerHandle { epoch, task }
    }
}

/// Owner of a running timer. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    epoch: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop the timer. No further events are sent once this returns,
    /// though events already queued may still be delivered.
    pub fn cancel(self) {
        debug!(epoch = self.epoch, "timer cancelled");
        // Drop aborts the task.
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
