//! Time source for the control loops.
//!
//! The loops read time and sleep only through [`Clock`], so tests run the
//! same code against [`ManualClock`] without waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source with a blocking sleep.
pub trait Clock: Send {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block for `period`.
    fn sleep(&self, period: Duration);
}

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, period: Duration) {
        if !period.is_zero() {
            thread::sleep(period);
        }
    }
}

/// Simulated clock.
///
/// Every `now()` call advances time by `tick`; `sleep` advances it by the
/// requested period. Clones share the same time line.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
    tick_nanos: u64,
}

impl ManualClock {
    /// Clock that only moves on `sleep` and `advance`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that also moves by `tick` on every read.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            tick_nanos: tick.as_nanos() as u64,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Current time without ticking.
    pub fn peek(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let before = self.nanos.fetch_add(self.tick_nanos, Ordering::Relaxed);
        Duration::from_nanos(before + self.tick_nanos)
    }

    fn sleep(&self, period: Duration) {
        self.advance(period);
    }
}
