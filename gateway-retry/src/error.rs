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

//! Top-level error type for gateway retries.
//!
//! Errors are layered:
//!
//! 1. **Failure layer**: why a connection ended ([`FailureCause`])
//! 2. **Retry layer**: why retrying stopped ([`RetryError`], [`HookError`])
//! 3. **Configuration layer**: why a policy was rejected ([`PolicyError`])
//!
//! [`GatewayError`] composes the retry and configuration layers and is what
//! [`GatewayRuntime::run`](crate::gateway::GatewayRuntime::run) returns.
//!
//! [`HookError`]: crate::reconnection::HookError

use crate::gateway::{CloseStatus, FailureCause};
use crate::reconnection::{PolicyError, RetryError};
use std::error::Error as StdError;
use std::fmt;

/// The unified error returned by the gateway runtime.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::GatewayError;
/// use gateway_retry::gateway::{CloseStatus, FailureCause};
///
/// let error = GatewayError::from(FailureCause::close(CloseStatus::from_code(4004)));
/// assert!(error.is_terminal());
/// assert_eq!(error.close_status().map(CloseStatus::code), Some(4004));
/// ```
#[derive(Debug)]
pub enum GatewayError {
    /// Retrying stopped for good.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gateway_retry::GatewayError;
    /// use gateway_retry::gateway::FailureCause;
    /// use gateway_retry::reconnection::RetryError;
    ///
    /// let error = GatewayError::Retry(RetryError::Exhausted {
    ///     attempts: 5,
    ///     max: 5,
    ///     cause: FailureCause::message("read timed out"),
    /// });
    /// assert!(error.is_exhausted());
    /// assert_eq!(error.to_string(), "retry error: Retries exhausted: 5/5");
    /// ```
    Retry(RetryError),

    /// The retry policy was invalid.
    Policy(PolicyError),
}

impl GatewayError {
    /// Returns `true` if this is a retry-layer error.
    #[must_use]
    pub const fn is_retry_error(&self) -> bool {
        matches!(self, Self::Retry(_))
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_policy_error(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Returns `true` if the retry budget ran out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Retry(e) if e.is_exhausted())
    }

    /// Returns `true` if the failure was not retryable.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Retry(e) if e.is_terminal())
    }

    /// Returns `true` if the runtime was shut down mid-retry.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Retry(e) if e.is_cancelled())
    }

    /// Returns `true` if a fresh session might succeed later.
    ///
    /// Exhausted budgets and hook failures are transient. Non-retryable
    /// closes and configuration errors are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Retry(RetryError::Exhausted { .. } | RetryError::Hook(_)) => true,
            Self::Retry(_) | Self::Policy(_) => false,
        }
    }

    /// The failure cause behind this error, if any.
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Retry(e) => e.cause(),
            Self::Policy(_) => None,
        }
    }

    /// The close status behind this error, if the connection was closed
    /// with one.
    pub fn close_status(&self) -> Option<&CloseStatus> {
        self.cause().and_then(FailureCause::close_status)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry(e) => write!(f, "retry error: {}", e),
            Self::Policy(e) => write!(f, "policy error: {}", e),
        }
    }
}

impl StdError for GatewayError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Retry(e) => Some(e),
            Self::Policy(e) => Some(e),
        }
    }
}

impl From<RetryError> for GatewayError {
    fn from(error: RetryError) -> Self {
        Self::Retry(error)
    }
}

impl From<PolicyError> for GatewayError {
    fn from(error: PolicyError) -> Self {
        Self::Policy(error)
    }
}

impl From<FailureCause> for GatewayError {
    fn from(cause: FailureCause) -> Self {
        Self::Retry(RetryError::Terminal(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconnection::HookError;
    use std::time::Duration;

    #[test]
    fn test_terminal_keeps_close_status() {
        let status = CloseStatus::new(4014, "Disallowed intent(s).");
        let error = GatewayError::from(FailureCause::close(status.clone()));

        assert!(error.is_retry_error());
        assert!(error.is_terminal());
        assert!(!error.is_recoverable());
        assert_eq!(error.close_status(), Some(&status));
    }

    #[test]
    fn test_exhausted_is_recoverable() {
        let error = GatewayError::from(RetryError::Exhausted {
            attempts: 3,
            max: 3,
            cause: FailureCause::close(CloseStatus::ABNORMAL_CLOSE),
        });

        assert!(error.is_exhausted());
        assert!(error.is_recoverable());
        assert_eq!(error.close_status(), Some(&CloseStatus::ABNORMAL_CLOSE));
    }

    #[test]
    fn test_hook_error_has_no_cause() {
        let error = GatewayError::from(RetryError::Hook(HookError::message("boom")));
        assert!(error.cause().is_none());
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_policy_error() {
        let error = GatewayError::from(PolicyError::BackoffRange {
            first: Duration::from_secs(10),
            max: Duration::from_secs(1),
        });

        assert!(error.is_policy_error());
        assert!(!error.is_cancelled());
        assert!(error.to_string().starts_with("policy error: "));
    }

    #[test]
    fn test_error_source_chain() {
        let error = GatewayError::from(RetryError::Cancelled);
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "retry cancelled");
    }
}
