//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Errors produced by the retry engine.
//!
//! Every error here is terminal for the session: the engine never retries on
//! its own after returning one. Overflow in backoff arithmetic is not an
//! error; it degrades to the maximum interval.

use crate::gateway::FailureCause;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of processing one failure.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The failure is excluded from retry; the original cause is forwarded unchanged.
    #[error(transparent)]
    Terminal(FailureCause),

    /// The retry budget ran out.
    #[error("Retries exhausted: {attempts}/{max}")]
    Exhausted {
        /// Attempt count at the time of exhaustion
        attempts: u64,
        /// Configured maximum
        max: u64,
        /// The failure that found the budget empty
        #[source]
        cause: FailureCause,
    },

    /// A pre-retry hook failed, aborting this attempt.
    #[error("pre-retry hook failed: {0}")]
    Hook(#[from] HookError),

    /// A failure reached the engine without a cause.
    ///
    /// This is an internal invariant violation, never a retry path.
    #[error("retry signal carried no failure cause")]
    MissingCause,

    /// The owning connection shut down while the retry was pending.
    #[error("retry cancelled")]
    Cancelled,
}

impl RetryError {
    /// Returns the failure cause behind this error, if there is one.
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Terminal(cause) | Self::Exhausted { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns `true` if the retry budget ran out.
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns `true` if the failure was classified as non-retryable.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Returns `true` if the retry was cancelled by shutdown.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure reported by a pre-retry hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// A hook failed with a message.
    #[error("{0}")]
    Message(String),

    /// A hook failed with an underlying error.
    #[error(transparent)]
    Source(Box<dyn StdError + Send + Sync>),
}

impl HookError {
    /// Creates a hook error from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an underlying error.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Source(Box::new(error))
    }
}

impl From<std::io::Error> for HookError {
    fn from(error: std::io::Error) -> Self {
        Self::from_error(error)
    }
}

/// Invalid retry policy configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The jitter factor must lie in `[0.0, 1.0]`.
    #[error("jitter factor must be within [0.0, 1.0], got {0}")]
    JitterFactor(f64),

    /// The first backoff exceeds the maximum interval.
    #[error("first backoff {first:?} exceeds max backoff interval {max:?}")]
    BackoffRange {
        /// Configured first backoff
        first: Duration,
        /// Configured maximum interval
        max: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CloseStatus;

    #[test]
    fn test_terminal_is_transparent() {
        let error = RetryError::Terminal(FailureCause::close(CloseStatus::new(
            4004,
            "Authentication failed.",
        )));
        assert_eq!(
            error.to_string(),
            "gateway closed with status 4004 (Authentication failed.)"
        );
        assert!(error.is_terminal());
        assert_eq!(
            error.cause().and_then(FailureCause::close_status).map(CloseStatus::code),
            Some(4004)
        );
    }

    #[test]
    fn test_exhausted_reports_count_and_max() {
        let error = RetryError::Exhausted {
            attempts: 5,
            max: 5,
            cause: FailureCause::message("connection reset"),
        };
        assert_eq!(error.to_string(), "Retries exhausted: 5/5");
        assert!(error.is_exhausted());
        assert!(error.source().is_some());
    }

    #[test]
    fn test_hook_error_conversion() {
        let error: RetryError = HookError::message("socket teardown failed").into();
        assert_eq!(
            error.to_string(),
            "pre-retry hook failed: socket teardown failed"
        );
        assert!(error.cause().is_none());
    }

    #[test]
    fn test_policy_error_display() {
        assert_eq!(
            PolicyError::JitterFactor(1.5).to_string(),
            "jitter factor must be within [0.0, 1.0], got 1.5"
        );
    }
}
