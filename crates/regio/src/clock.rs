//! Clocks for poll budgets.
//!
//! The poller only ever asks "how many milliseconds now?". [`SystemClock`]
//! answers from a monotonic [`Instant`]; [`FakeClock`] answers from an atomic
//! counter that tests advance by hand, so timing behaviour is deterministic.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic source of the current time in milliseconds
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since an arbitrary, fixed origin
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Wall-clock time measured from the moment the clock was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Fake clock for deterministic testing
///
/// Time only moves when [`FakeClock::advance`] or [`FakeClock::set`] is
/// called. Share it with the code under test through an `Arc`.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake clock at a fixed time
    #[must_use]
    pub fn at(time_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(time_ms),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.current_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Move the clock forward by a number of milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, time_ms: u64) {
        self.current_ms.store(time_ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}
