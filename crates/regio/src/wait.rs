//! Bounded polling.
//!
//! [`Poller::wait_for`] re-runs an asynchronous condition until it yields a
//! truthy value, fails, or the time budget runs out. The budget covers the
//! whole sequence: the deadline is fixed when polling starts and retries
//! only ever see what is left of it.
//!
//! ```text
//! Polling ──truthy──────────────► Succeeded
//!    │ ├────Err(e)──────────────► Failed(e)        (never retried)
//!    │ └────falsy, budget <= 0──► TimedOut(error_msg)
//!    └──────falsy, budget > 0───► Polling
//! ```

use crate::clock::{Clock, SystemClock};
use crate::result::{RegioError, RegioResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// Default timeout for wait operations (1 second)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1000;

/// Default timeout error message
pub const DEFAULT_ERROR_MSG: &str = "Timeout";

/// Options for wait operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Budget for the whole polling sequence, in milliseconds
    pub timeout_ms: u64,
    /// Message of the timeout error
    pub error_msg: String,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            error_msg: DEFAULT_ERROR_MSG.to_string(),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the timeout error message
    #[must_use]
    pub fn with_error_msg(mut self, error_msg: impl Into<String>) -> Self {
        self.error_msg = error_msg.into();
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Values a condition can settle with
pub trait Truthy {
    /// Whether polling should stop
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for usize {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

/// Time left for one polling sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    started_at_ms: u64,
    timeout_ms: u64,
}

impl PollBudget {
    /// Start a budget at `now_ms`
    #[must_use]
    pub const fn start(now_ms: u64, timeout_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            timeout_ms,
        }
    }

    /// `timeout - elapsed`; zero or negative once exhausted
    ///
    /// Saturates at the `i64` bounds, so budgets beyond `i64::MAX` stay
    /// positive.
    #[must_use]
    pub fn remaining_ms(&self, now_ms: u64) -> i64 {
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        let remaining = i128::from(self.timeout_ms) - i128::from(elapsed);
        i64::try_from(remaining).unwrap_or(if remaining > 0 { i64::MAX } else { i64::MIN })
    }

    /// Absolute deadline on the clock the budget was started with
    #[must_use]
    pub const fn deadline_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.timeout_ms)
    }
}

/// Polls conditions against a clock
#[derive(Debug, Clone, Default)]
pub struct Poller<C = SystemClock> {
    clock: C,
}

impl Poller<SystemClock> {
    /// Create a poller on the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> Poller<C> {
    /// Create a poller on a specific clock
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// The clock budgets are measured on
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Poll `condition` until it settles truthy
    ///
    /// Attempts run back to back with no delay beyond a yield to the
    /// scheduler. `timeout_ms = 0` allows exactly one attempt.
    ///
    /// # Errors
    ///
    /// - the condition's own error, unchanged, on the attempt that produced it
    /// - [`RegioError::Timeout`] carrying `options.error_msg` once the budget
    ///   is spent
    pub async fn wait_for<F, Fut, T>(&self, mut condition: F, options: &WaitOptions) -> RegioResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RegioResult<T>>,
        T: Truthy,
    {
        let budget = PollBudget::start(self.clock.now_ms(), options.timeout_ms);
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            let value = match condition().await {
                Ok(value) => value,
                Err(err) => {
                    debug!(attempts, error = %err, "condition failed, not retrying");
                    return Err(err);
                }
            };
            if value.is_truthy() {
                debug!(attempts, "condition met");
                return Ok(());
            }

            let remaining_ms = budget.remaining_ms(self.clock.now_ms());
            if remaining_ms <= 0 {
                debug!(attempts, timeout_ms = options.timeout_ms, "poll budget exhausted");
                return Err(RegioError::Timeout {
                    message: options.error_msg.clone(),
                });
            }
            trace!(attempts, remaining_ms, "condition falsy, retrying");
            tokio::task::yield_now().await;
        }
    }
}

/// Poll `condition` on the system clock
pub async fn wait_for<F, Fut, T>(condition: F, options: &WaitOptions) -> RegioResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RegioResult<T>>,
    T: Truthy,
{
    Poller::new().wait_for(condition, options).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    /// Condition that counts calls, advances a fake clock by `step_ms` per
    /// call and turns truthy on call `truthy_on` (never if `None`).
    fn stepping(
        clock: &Arc<FakeClock>,
        calls: &Arc<AtomicUsize>,
        step_ms: u64,
        truthy_on: Option<usize>,
    ) -> impl FnMut() -> std::future::Ready<RegioResult<bool>> {
        let clock = Arc::clone(clock);
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            clock.advance_ms(step_ms);
            std::future::ready(Ok(truthy_on.is_some_and(|k| n >= k)))
        }
    }

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, 1000);
            assert_eq!(opts.error_msg, "Timeout");
        }

        #[test]
        fn test_wait_options_builders() {
            let opts = WaitOptions::new().with_timeout(30).with_error_msg("gone");
            assert_eq!(opts.timeout_ms, 30);
            assert_eq!(opts.error_msg, "gone");
            assert_eq!(opts.timeout(), Duration::from_millis(30));
        }

        #[test]
        fn test_wait_options_partial_yaml() {
            let opts: WaitOptions = serde_yaml_ng::from_str("timeout_ms: 250").unwrap();
            assert_eq!(opts.timeout_ms, 250);
            assert_eq!(opts.error_msg, DEFAULT_ERROR_MSG);
        }
    }

    mod truthy_tests {
        use super::*;

        #[test]
        fn test_truthy_values() {
            assert!(true.is_truthy());
            assert!(!false.is_truthy());
            assert!(3usize.is_truthy());
            assert!(!0usize.is_truthy());
            assert!(Some(0).is_truthy());
            assert!(!None::<u8>.is_truthy());
            assert!(vec![1].is_truthy());
            assert!(!Vec::<u8>::new().is_truthy());
        }
    }

    mod budget_tests {
        use super::*;

        #[test]
        fn test_remaining_counts_from_fixed_start() {
            let budget = PollBudget::start(1000, 100);
            assert_eq!(budget.remaining_ms(1000), 100);
            assert_eq!(budget.remaining_ms(1030), 70);
            assert_eq!(budget.remaining_ms(1100), 0);
            assert_eq!(budget.remaining_ms(1150), -50);
            assert_eq!(budget.deadline_ms(), 1100);
        }

        #[test]
        fn test_huge_budget_saturates() {
            let budget = PollBudget::start(0, u64::MAX);
            assert_eq!(budget.remaining_ms(10), i64::MAX);
            assert_eq!(budget.deadline_ms(), u64::MAX);
            assert_eq!(PollBudget::start(0, 0).remaining_ms(u64::MAX), i64::MIN);
        }

        #[test]
        fn test_zero_budget_is_spent_immediately() {
            let budget = PollBudget::start(5, 0);
            assert_eq!(budget.remaining_ms(5), 0);
        }
    }

    mod poller_tests {
        use super::*;

        #[tokio::test]
        async fn test_stops_on_first_truthy() {
            let clock = Arc::new(FakeClock::new());
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));

            poller
                .wait_for(stepping(&clock, &calls, 1, Some(3)), &WaitOptions::new())
                .await
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_always_falsy_times_out_with_message() {
            let clock = Arc::new(FakeClock::new());
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));
            let options = WaitOptions::new().with_timeout(50).with_error_msg("never came");

            let err = poller
                .wait_for(stepping(&clock, &calls, 10, None), &options)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "never came");
            assert!(err.is_timeout());
            assert_eq!(calls.load(Ordering::SeqCst), 5);
            assert_eq!(clock.now_ms(), 50);
        }

        #[tokio::test]
        async fn test_error_short_circuits_on_kth_call() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let poller = Poller::with_clock(FakeClock::new());

            let err = poller
                .wait_for(
                    move || {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        async move {
                            if n == 3 {
                                Err(RegioError::driver("lookup exploded"))
                            } else {
                                Ok(false)
                            }
                        }
                    },
                    &WaitOptions::new(),
                )
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "Driver error: lookup exploded");
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_retries_never_extend_the_deadline() {
            let clock = Arc::new(FakeClock::at(1_000));
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));

            let result = poller
                .wait_for(
                    stepping(&clock, &calls, 30, None),
                    &WaitOptions::new().with_timeout(100),
                )
                .await;

            assert!(result.unwrap_err().is_timeout());
            // 30, 60, 90 leave budget; 120 is past the fixed deadline of 1100
            assert_eq!(calls.load(Ordering::SeqCst), 4);
            assert_eq!(clock.now_ms(), 1_120);
        }

        #[tokio::test]
        async fn test_max_timeout_keeps_retrying() {
            let clock = Arc::new(FakeClock::new());
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));

            poller
                .wait_for(
                    stepping(&clock, &calls, 10, Some(3)),
                    &WaitOptions::new().with_timeout(u64::MAX),
                )
                .await
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_zero_timeout_allows_one_attempt() {
            let clock = Arc::new(FakeClock::new());
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));
            let options = WaitOptions::new().with_timeout(0).with_error_msg("X");

            let err = poller
                .wait_for(stepping(&clock, &calls, 0, None), &options)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "X");
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_zero_timeout_truthy_first_attempt_succeeds() {
            let clock = Arc::new(FakeClock::new());
            let calls = Arc::new(AtomicUsize::new(0));
            let poller = Poller::with_clock(Arc::clone(&clock));

            poller
                .wait_for(
                    stepping(&clock, &calls, 5, Some(1)),
                    &WaitOptions::new().with_timeout(0),
                )
                .await
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_vec_condition() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            wait_for(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(vec![(); n]) }
                },
                &WaitOptions::new(),
            )
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }

    mod system_clock_scenarios {
        use super::*;

        #[tokio::test]
        async fn test_falsy_condition_rejects_near_timeout() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let started = Instant::now();

            let err = wait_for(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(false) }
                },
                &WaitOptions::new().with_timeout(30),
            )
            .await
            .unwrap_err();

            let elapsed = started.elapsed();
            assert_eq!(err.to_string(), "Timeout");
            assert!(elapsed >= Duration::from_millis(29), "elapsed {elapsed:?}");
            assert!(elapsed < Duration::from_millis(1_000), "elapsed {elapsed:?}");
            assert!(calls.load(Ordering::SeqCst) > 1);
        }

        #[tokio::test]
        async fn test_zero_timeout_rejects_immediately() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);

            let err = wait_for(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(false) }
                },
                &WaitOptions::new().with_timeout(0).with_error_msg("X"),
            )
            .await
            .unwrap_err();

            assert_eq!(err.to_string(), "X");
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_slow_condition_eventually_true() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);

            wait_for(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(n >= 2)
                    }
                },
                &WaitOptions::new().with_timeout(500),
            )
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_attempts_fill_exactly_the_budget(timeout in 0u64..300, step in 1u64..50) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let clock = Arc::new(FakeClock::new());
                let calls = Arc::new(AtomicUsize::new(0));
                let poller = Poller::with_clock(Arc::clone(&clock));

                let result = runtime.block_on(poller.wait_for(
                    stepping(&clock, &calls, step, None),
                    &WaitOptions::new().with_timeout(timeout),
                ));

                prop_assert!(result.unwrap_err().is_timeout());
                let expected = timeout.div_ceil(step).max(1) as usize;
                prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            }
        }
    }
}
