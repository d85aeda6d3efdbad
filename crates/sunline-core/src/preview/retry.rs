// ── Client retry policy ──
//
// Bounded backoff for preview loads. `attempt` is 0-based and counts tries
// that have already failed. The policy is a plain state machine so any
// driver (a tokio task, a UI timer, a test) applies it identically.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Reference backoff schedule, in milliseconds.
pub const RETRY_DELAYS_MS: [u64; 3] = [2000, 5000, 10000];

/// Whether another try is allowed after `attempt` failures, under the
/// reference schedule.
pub fn should_retry(attempt: u32) -> bool {
    usize::try_from(attempt).is_ok_and(|a| a < RETRY_DELAYS_MS.len())
}

/// Delay before the next try, clamped to the last schedule entry.
///
/// Total: callers may ask past the retry limit (e.g. for logging).
pub fn next_retry_delay_ms(attempt: u32) -> u64 {
    let last = RETRY_DELAYS_MS.len() - 1;
    let index = usize::try_from(attempt).map_or(last, |a| a.min(last));
    RETRY_DELAYS_MS[index]
}

// ── RetryPolicy ─────────────────────────────────────────────────────

/// A fixed, ordered backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RETRY_DELAYS_MS.iter().copied().map(Duration::from_millis))
    }
}

impl RetryPolicy {
    /// Build a policy from a schedule. An empty schedule never retries.
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// Policy that gives up after the first failure.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        usize::try_from(attempt).is_ok_and(|a| a < self.delays.len())
    }

    /// Schedule entry at `min(attempt, last)`, or zero for an empty schedule.
    pub fn next_retry_delay(&self, attempt: u32) -> Duration {
        let Some(last) = self.delays.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let index = usize::try_from(attempt).map_or(last, |a| a.min(last));
        self.delays[index]
    }
}

// ── PreviewLoad state machine ───────────────────────────────────────

/// What the driver should do after a failed try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then call [`PreviewLoad::wake`].
    RetryAfter(Duration),
    /// The schedule is exhausted; the load is terminally failed.
    GiveUp,
}

/// Lifecycle of one preview load.
///
/// ```text
/// Loading{0} --fail--> Waiting{0} --wake--> Loading{1} --fail--> ... --> Failed
///     |                                          |
///     +------------------ success ---------------+--> Loaded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewLoad {
    /// A fetch is in flight; `attempt` earlier tries have failed.
    Loading { attempt: u32 },
    /// Waiting out the backoff after failure number `attempt + 1`.
    Waiting { attempt: u32, delay: Duration },
    Loaded { attempts: u32 },
    Failed { attempts: u32 },
}

impl Default for PreviewLoad {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewLoad {
    pub fn new() -> Self {
        Self::Loading { attempt: 0 }
    }

    /// Failed tries so far.
    pub fn attempt(&self) -> u32 {
        match *self {
            Self::Loading { attempt } | Self::Waiting { attempt, .. } => attempt,
            Self::Loaded { attempts } => attempts.saturating_sub(1),
            Self::Failed { attempts } => attempts,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Failed { .. })
    }

    /// The in-flight fetch succeeded.
    pub fn succeed(&mut self) {
        if let Self::Loading { attempt } = *self {
            *self = Self::Loaded {
                attempts: attempt + 1,
            };
        }
    }

    /// The in-flight fetch failed. Returns what to do next.
    ///
    /// Calling this outside `Loading` leaves the state alone and reports
    /// `GiveUp` for terminal states.
    pub fn fail(&mut self, policy: &RetryPolicy) -> RetryDecision {
        match *self {
            Self::Loading { attempt } => {
                if policy.should_retry(attempt) {
                    let delay = policy.next_retry_delay(attempt);
                    *self = Self::Waiting { attempt, delay };
                    RetryDecision::RetryAfter(delay)
                } else {
                    *self = Self::Failed {
                        attempts: attempt + 1,
                    };
                    RetryDecision::GiveUp
                }
            }
            Self::Waiting { delay, .. } => RetryDecision::RetryAfter(delay),
            Self::Loaded { .. } | Self::Failed { .. } => RetryDecision::GiveUp,
        }
    }

    /// The backoff elapsed; start the next try.
    pub fn wake(&mut self) {
        if let Self::Waiting { attempt, .. } = *self {
            *self = Self::Loading {
                attempt: attempt + 1,
            };
        }
    }
}

// ── Async driver ────────────────────────────────────────────────────

/// Final result of [`load_with_retry`].
#[derive(Debug)]
pub enum LoadOutcome<T, E> {
    Loaded { value: T, attempts: u32 },
    Failed { error: E, attempts: u32 },
}

impl<T, E> LoadOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Loaded { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Loaded { value, .. } => Ok(value),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

/// Drive `fetch` through a [`PreviewLoad`] until it succeeds or the
/// schedule runs out. `fetch` receives the current 0-based attempt.
pub async fn load_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut fetch: F) -> LoadOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut state = PreviewLoad::new();
    loop {
        let attempt = state.attempt();
        match fetch(attempt).await {
            Ok(value) => {
                state.succeed();
                return LoadOutcome::Loaded {
                    value,
                    attempts: attempt + 1,
                };
            }
            Err(error) => match state.fail(policy) {
                RetryDecision::RetryAfter(delay) => {
                    debug!(attempt, ?delay, %error, "preview load failed, retrying");
                    tokio::time::sleep(delay).await;
                    state.wake();
                }
                RetryDecision::GiveUp => {
                    warn!(attempts = attempt + 1, %error, "preview load failed, giving up");
                    return LoadOutcome::Failed {
                        error,
                        attempts: attempt + 1,
                    };
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn retries_within_reference_schedule() {
        assert!(should_retry(0));
        assert!(should_retry(1));
        assert!(should_retry(2));
        assert!(!should_retry(3));
        assert!(!should_retry(u32::MAX));
    }

    #[test]
    fn delay_is_capped_at_last_entry() {
        assert_eq!(next_retry_delay_ms(0), 2000);
        assert_eq!(next_retry_delay_ms(1), 5000);
        assert_eq!(next_retry_delay_ms(2), 10000);
        assert_eq!(next_retry_delay_ms(3), 10000);
        assert_eq!(next_retry_delay_ms(u32::MAX), 10000);
    }

    #[test]
    fn policy_matches_free_functions() {
        let policy = RetryPolicy::default();
        for attempt in 0..6 {
            assert_eq!(policy.should_retry(attempt), should_retry(attempt));
            assert_eq!(
                policy.next_retry_delay(attempt),
                Duration::from_millis(next_retry_delay_ms(attempt))
            );
        }
    }

    #[test]
    fn empty_policy_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(0));
        assert_eq!(policy.next_retry_delay(0), Duration::ZERO);
    }

    #[test]
    fn state_machine_walks_the_schedule() {
        let policy = RetryPolicy::default();
        let mut load = PreviewLoad::new();

        assert_eq!(load.fail(&policy), RetryDecision::RetryAfter(Duration::from_secs(2)));
        load.wake();
        assert_eq!(load, PreviewLoad::Loading { attempt: 1 });

        assert_eq!(load.fail(&policy), RetryDecision::RetryAfter(Duration::from_secs(5)));
        load.wake();
        assert_eq!(load.fail(&policy), RetryDecision::RetryAfter(Duration::from_secs(10)));
        load.wake();
        assert_eq!(load, PreviewLoad::Loading { attempt: 3 });

        assert_eq!(load.fail(&policy), RetryDecision::GiveUp);
        assert_eq!(load, PreviewLoad::Failed { attempts: 4 });
        assert!(load.is_terminal());

        // Terminal states stay put.
        load.wake();
        load.succeed();
        assert_eq!(load, PreviewLoad::Failed { attempts: 4 });
    }

    #[test]
    fn success_after_retry_is_terminal() {
        let policy = RetryPolicy::default();
        let mut load = PreviewLoad::new();
        let _ = load.fail(&policy);
        load.wake();
        load.succeed();
        assert_eq!(load, PreviewLoad::Loaded { attempts: 2 });
        assert_eq!(load.attempt(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_sleeps_between_tries_and_recovers() {
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let outcome = load_with_retry(&RetryPolicy::default(), |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 2 {
                    Err(format!("boom {attempt}"))
                } else {
                    Ok("image")
                }
            }
        })
        .await;

        assert_eq!(calls.get(), 3);
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.into_result().unwrap(), "image");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(7000) && elapsed < Duration::from_millis(7100));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_gives_up_after_schedule() {
        let started = Instant::now();

        let outcome: LoadOutcome<(), String> =
            load_with_retry(&RetryPolicy::default(), |attempt| async move {
                Err(format!("boom {attempt}"))
            })
            .await;

        match outcome {
            LoadOutcome::Failed { error, attempts } => {
                assert_eq!(attempts, 4);
                assert_eq!(error, "boom 3");
            }
            LoadOutcome::Loaded { .. } => panic!("expected failure"),
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(17000) && elapsed < Duration::from_millis(17100));
    }
}
