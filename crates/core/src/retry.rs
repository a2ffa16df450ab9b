//! Bounded retry combinator.
//!
//! Runs an async operation until it succeeds, the caller aborts, or the
//! attempt budget (`max_retries + 1`) is spent. The outcome is a plain value:
//! the combinator knows nothing about the caller's error type beyond what the
//! classifier closure says about it.

use std::future::Future;

/// What to do after a failed attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryDecision {
    /// Try again if budget remains.
    Retry,
    /// Stop now and report the error as-is.
    Abort,
}

/// Result of a bounded retry run.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error; `error` is the last one.
    Exhausted { error: E, attempts: u32 },
    /// The classifier stopped the loop early.
    Aborted { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Collapse into a `Result`, dropping the attempt count.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Succeeded { value, .. } => Ok(value),
            Self::Exhausted { error, .. } | Self::Aborted { error, .. } => Err(error),
        }
    }
}

/// Retry budget.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `operation` with 1-based attempt numbers.
    ///
    /// `on_failure` sees every error (for logging and state updates) and
    /// decides whether the loop may continue.
    pub async fn run<T, E, Op, Fut, OnFailure>(
        &self,
        mut operation: Op,
        mut on_failure: OnFailure,
    ) -> RetryOutcome<T, E>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        OnFailure: FnMut(u32, &E) -> RetryDecision,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) => {
                    if on_failure(attempt, &error) == RetryDecision::Abort {
                        return RetryOutcome::Aborted {
                            error,
                            attempts: attempt,
                        };
                    }
                    if attempt >= max_attempts {
                        return RetryOutcome::Exhausted {
                            error,
                            attempts: attempt,
                        };
                    }
                }
            }
        }
    }
}
