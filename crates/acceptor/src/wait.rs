//! Bounded polling.
//!
//! Every wait in the crate goes through [`poll_until`]: sample a condition
//! at a fixed interval strictly before the deadline, report once when the
//! deadline passes. Built on `tokio::time` so tests can pause the clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Options for a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Total time allowed
    pub timeout: Duration,
    /// Time between samples
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitOutcome<T> {
    /// Value produced by the condition, `None` on timeout
    pub value: Option<T>,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was sampled
    pub attempts: u32,
}

impl<T> WaitOutcome<T> {
    /// Whether the condition was met before the deadline
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

/// Sample `probe` until it yields `Some` or the timeout elapses.
///
/// The probe is always sampled at least once. Samples only happen strictly
/// before the deadline, so a condition first true at or after the deadline
/// is reported as a timeout.
pub async fn poll_until<T, F, Fut>(options: WaitOptions, mut probe: F) -> WaitOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        if let Some(value) = probe().await {
            return WaitOutcome {
                value: Some(value),
                elapsed: start.elapsed(),
                attempts,
            };
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(options.poll_interval.min(deadline - now)).await;
        if Instant::now() >= deadline {
            break;
        }
    }

    WaitOutcome {
        value: None,
        elapsed: start.elapsed(),
        attempts,
    }
}

/// Wait for a boolean condition
pub async fn wait_for<F, Fut>(options: WaitOptions, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(options, || {
        let fut = condition();
        async move { fut.await.then_some(()) }
    })
    .await
    .is_success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout, Duration::from_secs(10));
            assert_eq!(opts.poll_interval, Duration::from_millis(100));
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new()
                .with_timeout(Duration::from_secs(3))
                .with_poll_interval(Duration::from_millis(20));
            assert_eq!(opts.timeout, Duration::from_secs(3));
            assert_eq!(opts.poll_interval, Duration::from_millis(20));
        }
    }

    mod poll_tests {
        use super::*;

        fn opts(timeout_ms: u64) -> WaitOptions {
            WaitOptions::new()
                .with_timeout(Duration::from_millis(timeout_ms))
                .with_poll_interval(Duration::from_millis(50))
        }

        #[tokio::test(start_paused = true)]
        async fn test_immediate_success_samples_once() {
            let outcome = poll_until(opts(1000), || async { Some(7) }).await;
            assert_eq!(outcome.value, Some(7));
            assert_eq!(outcome.attempts, 1);
            assert_eq!(outcome.elapsed, Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_condition_before_deadline_succeeds() {
            let start = Instant::now();
            let appear = start + Duration::from_millis(400);
            let outcome = poll_until(opts(1000), || async move {
                (Instant::now() >= appear).then_some("ready")
            })
            .await;
            assert!(outcome.is_success());
            assert_eq!(outcome.elapsed, Duration::from_millis(400));
        }

        #[tokio::test(start_paused = true)]
        async fn test_condition_at_deadline_times_out() {
            let start = Instant::now();
            let appear = start + Duration::from_millis(1000);
            let outcome = poll_until(opts(1000), || async move {
                (Instant::now() >= appear).then_some(())
            })
            .await;
            assert!(!outcome.is_success());
            assert_eq!(outcome.elapsed, Duration::from_millis(1000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_samples_once() {
            let calls = AtomicU32::new(0);
            let outcome: WaitOutcome<()> = poll_until(opts(0), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;
            assert!(!outcome.is_success());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_bool() {
            let start = Instant::now();
            let after_100ms = || async move { start.elapsed() >= Duration::from_millis(100) };
            assert!(wait_for(opts(500), after_100ms).await);
            assert!(!wait_for(opts(200), || async { false }).await);
        }
    }
}
