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

//! Logging and metrics for gateway retries.
//!
//! - **[`RetryMetrics`]**: retry and terminal-error counters
//! - **[`MetricsHook`]**: a pre-retry hook feeding [`RetryMetrics`]
//! - **[`log_retry_error`]**: structured logging of the error that ended a session
//!
//! # Structured Logging
//!
//! With the `tracing` feature enabled, the engine logs each decision at
//! `debug` level and every terminal outcome at `warn` or `error`. Install any
//! `tracing` subscriber to collect them.
//!
//! ```rust
//! use gateway_retry::gateway::FailureCause;
//! use gateway_retry::observability::log_retry_error;
//! use gateway_retry::reconnection::RetryError;
//!
//! log_retry_error(&RetryError::Terminal(FailureCause::PartialDisconnect));
//! ```

mod metrics;

pub use self::metrics::{MetricsHook, RetryMetrics};

use crate::reconnection::RetryError;

/// Logs the error that ended a retry sequence with structured context.
///
/// Budget exhaustion and non-retryable failures are logged at `ERROR`, hook
/// failures at `WARN` and cancellation at `INFO`.
#[cfg(feature = "tracing")]
pub fn log_retry_error(error: &RetryError) {
    match error {
        RetryError::Exhausted {
            attempts,
            max,
            cause,
        } => {
            tracing::error!(
                attempts = *attempts,
                max_retries = *max,
                cause = %cause,
                "Gateway retries exhausted"
            );
        }
        RetryError::Terminal(cause) => {
            tracing::error!(
                cause = %cause,
                close_code = ?cause.close_status().map(|status| status.code()),
                "Gateway failure is not retryable"
            );
        }
        RetryError::MissingCause => {
            tracing::error!("Gateway retry requested without a failure cause");
        }
        RetryError::Hook(e) => {
            tracing::warn!(error = %e, "Pre-retry hook aborted the retry");
        }
        RetryError::Cancelled => {
            tracing::info!("Gateway retry cancelled");
        }
    }
}

/// Logs the error that ended a retry sequence (no-op when tracing is disabled).
#[cfg(not(feature = "tracing"))]
#[inline]
pub fn log_retry_error(_error: &RetryError) {
    // No-op when tracing is disabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CloseStatus, FailureCause};
    use crate::reconnection::HookError;

    #[test]
    fn test_log_every_variant() {
        // Only checks that logging does not panic with or without a subscriber.
        log_retry_error(&RetryError::Terminal(FailureCause::close(CloseStatus::from_code(4004))));
        log_retry_error(&RetryError::Exhausted {
            attempts: 3,
            max: 3,
            cause: FailureCause::InvalidSession,
        });
        log_retry_error(&RetryError::MissingCause);
        log_retry_error(&RetryError::Hook(HookError::message("stale socket")));
        log_retry_error(&RetryError::Cancelled);
    }
}
