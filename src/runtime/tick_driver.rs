//! Tokio fixed-interval tick driver.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::DriverConfig;
use crate::core::{RegistryError, Scheduler};

/// Shortest interval the driver will tick at.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Calls [`Scheduler::update`] on a fixed interval with the measured real
/// elapsed time, multiplied by a time scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickDriver {
    tick: Duration,
    time_scale: f64,
}

impl TickDriver {
    /// Driver ticking every `tick` at real time. A zero interval is raised
    /// to [`MIN_TICK`].
    pub const fn new(tick: Duration) -> Self {
        Self {
            tick: if tick.is_zero() { MIN_TICK } else { tick },
            time_scale: 1.0,
        }
    }

    /// Create a driver from validated configuration.
    pub fn from_config(cfg: &DriverConfig) -> Result<Self, RegistryError> {
        cfg.validate()
            .map_err(|e| RegistryError::InvalidConfig(format!("driver invalid: {e}")))?;
        Ok(Self::new(Duration::from_millis(cfg.tick_millis)).with_time_scale(cfg.time_scale))
    }

    /// Simulated seconds per real second.
    #[must_use]
    pub const fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Tick interval.
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Simulated seconds per real second.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Drive an exclusively borrowed scheduler until `shutdown` resolves.
    /// Returns the number of ticks delivered.
    pub async fn run<F>(&self, scheduler: &mut Scheduler, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        self.drive(|dt| scheduler.update(dt), shutdown).await
    }

    /// Drive a scheduler shared with other tasks. The lock is held only for
    /// the duration of each update.
    pub async fn run_shared<F>(&self, scheduler: &Mutex<Scheduler>, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        self.drive(|dt| scheduler.lock().update(dt), shutdown).await
    }

    async fn drive<U, F>(&self, mut update: U, shutdown: F) -> u64
    where
        U: FnMut(f64),
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        tokio::pin!(shutdown);
        let mut last = Instant::now();
        let mut ticks = 0_u64;
        tracing::debug!(
            "tick driver started: every {:?} at scale {}",
            self.tick,
            self.time_scale
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    let now = Instant::now();
                    let real = now.saturating_duration_since(last);
                    last = now;
                    update(real.as_secs_f64() * self.time_scale);
                    ticks += 1;
                }
            }
        }

        tracing::info!("tick driver stopped after {} ticks", ticks);
        ticks
    }
}
