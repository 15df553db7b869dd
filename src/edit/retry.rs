use std::time::Duration;

use super::error::EditResult;

/// Error-message fragments that mark a failure as worth another attempt.
const TRANSIENT_SIGNATURES: [&str; 3] = ["500", "503", "INTERNAL"];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait applied after the given 1-based attempt fails: `base × 2^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

pub fn is_transient(message: &str) -> bool {
    TRANSIENT_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Runs `attempt_fn` until it succeeds, fails with a non-transient error, or
/// the attempt budget is spent. The closure receives the 1-based attempt number.
pub fn run_with_retry<T, S, F>(
    policy: &RetryPolicy,
    sleeper: &S,
    label: &str,
    mut attempt_fn: F,
) -> EditResult<T>
where
    S: Sleeper + ?Sized,
    F: FnMut(u32) -> EditResult<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match attempt_fn(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(label, attempt, "edit request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                let message = err.to_string();
                if attempt >= max_attempts || !is_transient(&message) {
                    tracing::warn!(label, attempt, error = %message, "edit request failed");
                    return Err(err);
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %message,
                    "transient edit failure; retrying"
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct RecordingSleeper {
    pub(crate) slept: std::cell::RefCell<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub(crate) fn new() -> Self {
        Self {
            slept: std::cell::RefCell::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditError;

    fn service_error(status: u16, body: &str) -> EditError {
        EditError::Service {
            status,
            message: body.to_string(),
        }
    }

    #[test]
    fn is_transient_matches_known_signatures_only() {
        assert!(is_transient("service returned HTTP 503: unavailable"));
        assert!(is_transient("HTTP 500"));
        assert!(is_transient("status: INTERNAL"));
        assert!(!is_transient("HTTP 400: invalid argument"));
        assert!(!is_transient("internal error"));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
    }

    #[test]
    fn two_transient_failures_then_success_uses_three_attempts() {
        let sleeper = RecordingSleeper::new();
        let mut attempts = Vec::new();
        let result = run_with_retry(&RetryPolicy::default(), &sleeper, "test", |attempt| {
            attempts.push(attempt);
            match attempt {
                1 => Err(service_error(503, "overloaded")),
                2 => Err(service_error(500, "status INTERNAL")),
                _ => Ok("image"),
            }
        });

        assert_eq!(result.expect("third attempt should succeed"), "image");
        assert_eq!(attempts, vec![1, 2, 3]);
        assert_eq!(
            *sleeper.slept.borrow(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn non_transient_failure_stops_after_one_attempt() {
        let sleeper = RecordingSleeper::new();
        let mut attempts = 0;
        let err = run_with_retry(&RetryPolicy::default(), &sleeper, "test", |_| {
            attempts += 1;
            Err::<(), _>(service_error(400, "bad request"))
        })
        .expect_err("non-transient failure should propagate");

        assert!(matches!(err, EditError::Service { status: 400, .. }));
        assert_eq!(attempts, 1);
        assert!(sleeper.slept.borrow().is_empty());
    }

    #[test]
    fn exhausted_budget_returns_last_error_without_final_delay() {
        let sleeper = RecordingSleeper::new();
        let mut attempts = 0;
        let err = run_with_retry(&RetryPolicy::default(), &sleeper, "test", |attempt| {
            attempts += 1;
            Err::<(), _>(service_error(503, &format!("attempt {attempt}")))
        })
        .expect_err("all attempts fail");

        assert_eq!(attempts, 3);
        assert!(err.to_string().contains("attempt 3"));
        assert_eq!(sleeper.slept.borrow().len(), 2);
    }
}
