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

//! Counters for retry outcomes.
//!
//! Counters are atomic and can be shared across tasks. When the
//! `observability` feature is enabled every update is also exported through
//! the `metrics` crate facade.

use crate::gateway::ConnectionState;
use crate::reconnection::{HookError, PreRetryHook, RetryError, RetrySignal};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts retries by kind and terminal errors by cause.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{ConnectionState, FailureCause};
/// use gateway_retry::observability::RetryMetrics;
/// use gateway_retry::reconnection::{RetryError, RetrySignal};
/// use std::time::Duration;
///
/// let metrics = RetryMetrics::new();
/// metrics.record_retry(&RetrySignal::new(
///     FailureCause::message("reset by peer"),
///     1,
///     Duration::ZERO,
///     ConnectionState::Resuming,
/// ));
/// metrics.record_error(&RetryError::Cancelled);
///
/// assert_eq!(metrics.resumes(), 1);
/// assert_eq!(metrics.total_retries(), 1);
/// assert_eq!(metrics.cancelled(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RetryMetrics {
    /// Retries that resume the existing session
    resumes: AtomicU64,
    /// Retries that perform a fresh handshake
    reconnects: AtomicU64,
    /// Sessions ended by an exhausted retry budget
    exhausted: AtomicU64,
    /// Sessions ended by a non-retryable failure
    terminal: AtomicU64,
    /// Retries aborted by a failing hook
    hook_failures: AtomicU64,
    /// Retries abandoned because the connection was shut down
    cancelled: AtomicU64,
}

impl RetryMetrics {
    /// Creates a tracker with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scheduled retry.
    pub fn record_retry(&self, signal: &RetrySignal) {
        match signal.state() {
            ConnectionState::Resuming => {
                self.resumes.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.resumes").increment(1);
            }
            _ => {
                self.reconnects.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.reconnects").increment(1);
            }
        }
    }

    /// Records the error that ended a retry sequence.
    pub fn record_error(&self, error: &RetryError) {
        match error {
            RetryError::Exhausted { .. } => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.exhausted").increment(1);
            }
            RetryError::Terminal(_) | RetryError::MissingCause => {
                self.terminal.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.terminal").increment(1);
            }
            RetryError::Hook(_) => {
                self.hook_failures.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.hook_failures").increment(1);
            }
            RetryError::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "observability")]
                ::metrics::counter!("gateway.retry.cancelled").increment(1);
            }
        }
    }

    /// Returns the number of resume retries.
    #[must_use]
    pub fn resumes(&self) -> u64 {
        self.resumes.load(Ordering::Relaxed)
    }

    /// Returns the number of fresh-handshake retries.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Returns the number of retries of either kind.
    #[must_use]
    pub fn total_retries(&self) -> u64 {
        self.resumes().saturating_add(self.reconnects())
    }

    /// Returns the number of exhausted retry budgets.
    #[must_use]
    pub fn exhausted(&self) -> u64 {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// Returns the number of non-retryable failures.
    #[must_use]
    pub fn terminal(&self) -> u64 {
        self.terminal.load(Ordering::Relaxed)
    }

    /// Returns the number of failed hooks.
    #[must_use]
    pub fn hook_failures(&self) -> u64 {
        self.hook_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of cancelled retries.
    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.resumes.store(0, Ordering::Relaxed);
        self.reconnects.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
        self.terminal.store(0, Ordering::Relaxed);
        self.hook_failures.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);
    }
}

/// A pre-retry hook that records every scheduled retry.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::observability::{MetricsHook, RetryMetrics};
/// use gateway_retry::reconnection::{ReconnectContext, RetryEngine, RetryPolicy};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(RetryMetrics::new());
/// let engine = RetryEngine::new(RetryPolicy::default(), ReconnectContext::new())
///     .do_before_retry(MetricsHook::new(Arc::clone(&metrics)));
/// assert_eq!(engine.hooks().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MetricsHook {
    metrics: Arc<RetryMetrics>,
}

impl MetricsHook {
    /// Creates a hook recording into `metrics`.
    pub fn new(metrics: Arc<RetryMetrics>) -> Self {
        Self { metrics }
    }

    /// The tracker this hook records into.
    pub fn metrics(&self) -> &Arc<RetryMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl PreRetryHook for MetricsHook {
    async fn before_retry(&self, signal: &RetrySignal) -> Result<(), HookError> {
        self.metrics.record_retry(signal);
        Ok(())
    }
}
