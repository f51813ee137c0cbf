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

//! Immutable retry configuration.

use crate::gateway::NON_RETRYABLE_STATUS_CODES;
use crate::reconnection::error::PolicyError;
use crate::reconnection::scheduler::{Scheduler, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry engine.
///
/// A policy is built once and never changes afterwards. It may be shared by
/// several connections; the only state it touches while in use is the
/// thread-local random source behind jitter.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::reconnection::RetryPolicy;
/// use std::time::Duration;
///
/// // Default configuration
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.first_backoff(), Duration::from_secs(2));
/// assert!(policy.is_non_retryable(4004));
///
/// // Custom configuration
/// let policy = RetryPolicy::builder()
///     .first_backoff(Duration::from_secs(1))
///     .max_backoff_interval(Duration::from_secs(60))
///     .max_retries(10)
///     .jitter_factor(0.1)
///     .build()
///     .unwrap();
/// assert_eq!(policy.max_retries(), 10);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    /// Backoff of the first delayed attempt
    first_backoff: Duration,
    /// Upper bound for every delay, jitter included
    max_backoff_interval: Duration,
    /// Size of the retry budget
    max_retries: u64,
    /// Relative jitter magnitude in `[0.0, 1.0]`
    jitter_factor: f64,
    /// Close codes that end the session immediately, sorted
    non_retryable_codes: Vec<u16>,
    /// Time source for delays
    scheduler: Arc<dyn Scheduler>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            first_backoff: Duration::from_secs(2),
            max_backoff_interval: Duration::from_secs(120),
            max_retries: u64::MAX,
            jitter_factor: 0.5,
            non_retryable_codes: NON_RETRYABLE_STATUS_CODES.to_vec(),
            scheduler: Arc::new(TokioScheduler),
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("first_backoff", &self.first_backoff)
            .field("max_backoff_interval", &self.max_backoff_interval)
            .field("max_retries", &self.max_retries)
            .field("jitter_factor", &self.jitter_factor)
            .field("non_retryable_codes", &self.non_retryable_codes)
            .field("scheduler", &self.scheduler.name())
            .finish()
    }
}

impl RetryPolicy {
    /// Create a new builder for configuring a policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Builds a policy from plain settings, using the default scheduler.
    pub fn from_settings(settings: &RetrySettings) -> Result<Self, PolicyError> {
        Self::builder()
            .first_backoff(Duration::from_millis(settings.first_backoff_ms))
            .max_backoff_interval(Duration::from_millis(settings.max_backoff_ms))
            .max_retries(settings.max_retries)
            .jitter_factor(settings.jitter_factor)
            .non_retryable_codes(settings.non_retryable_codes.iter().copied())
            .build()
    }

    /// Returns a builder preloaded with this policy's values.
    pub fn mutate(&self) -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            first_backoff: self.first_backoff,
            max_backoff_interval: self.max_backoff_interval,
            max_retries: self.max_retries,
            jitter_factor: self.jitter_factor,
            non_retryable_codes: self.non_retryable_codes.clone(),
            scheduler: Arc::clone(&self.scheduler),
        }
    }

    /// Backoff of the first delayed attempt; also the lower bound for jitter.
    pub fn first_backoff(&self) -> Duration {
        self.first_backoff
    }

    /// Upper bound for every delay.
    pub fn max_backoff_interval(&self) -> Duration {
        self.max_backoff_interval
    }

    /// Size of the retry budget.
    pub fn max_retries(&self) -> u64 {
        self.max_retries
    }

    /// Relative jitter magnitude.
    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Close codes that end the session immediately.
    pub fn non_retryable_codes(&self) -> &[u16] {
        &self.non_retryable_codes
    }

    /// Returns `true` if `code` is excluded from retry.
    pub fn is_non_retryable(&self, code: u16) -> bool {
        self.non_retryable_codes.binary_search(&code).is_ok()
    }

    /// Time source for delays.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder {
    first_backoff: Duration,
    max_backoff_interval: Duration,
    max_retries: u64,
    jitter_factor: f64,
    non_retryable_codes: Vec<u16>,
    scheduler: Arc<dyn Scheduler>,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        RetryPolicy::default().mutate()
    }
}

impl RetryPolicyBuilder {
    /// Set the backoff of the first delayed attempt.
    pub fn first_backoff(mut self, backoff: Duration) -> Self {
        self.first_backoff = backoff;
        self
    }

    /// Set the maximum delay between attempts.
    pub fn max_backoff_interval(mut self, interval: Duration) -> Self {
        self.max_backoff_interval = interval;
        self
    }

    /// Set the size of the retry budget.
    pub fn max_retries(mut self, max: u64) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the jitter factor, which must lie in `[0.0, 1.0]`.
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor;
        self
    }

    /// Replace the set of non-retryable close codes.
    pub fn non_retryable_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.non_retryable_codes = codes.into_iter().collect();
        self
    }

    /// Set the scheduler used to wait out delays.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate and build the policy.
    pub fn build(mut self) -> Result<RetryPolicy, PolicyError> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(PolicyError::JitterFactor(self.jitter_factor));
        }
        if self.first_backoff > self.max_backoff_interval {
            return Err(PolicyError::BackoffRange {
                first: self.first_backoff,
                max: self.max_backoff_interval,
            });
        }

        self.non_retryable_codes.sort_unstable();
        self.non_retryable_codes.dedup();

        Ok(RetryPolicy {
            first_backoff: self.first_backoff,
            max_backoff_interval: self.max_backoff_interval,
            max_retries: self.max_retries,
            jitter_factor: self.jitter_factor,
            non_retryable_codes: self.non_retryable_codes,
            scheduler: self.scheduler,
        })
    }
}

/// Plain-data form of a [`RetryPolicy`], suitable for config files.
///
/// Missing fields take the policy defaults.
///
/// ```rust
/// # #[cfg(feature = "serde")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use gateway_retry::reconnection::{RetryPolicy, RetrySettings};
///
/// let settings: RetrySettings = serde_json::from_str(r#"{ "max_retries": 8 }"#)?;
/// let policy = RetryPolicy::from_settings(&settings)?;
/// assert_eq!(policy.max_retries(), 8);
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "serde"))]
/// # fn main() {}
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetrySettings {
    /// First backoff in milliseconds.
    ///
    /// Default: 2000
    pub first_backoff_ms: u64,

    /// Maximum backoff in milliseconds.
    ///
    /// Default: 120000
    pub max_backoff_ms: u64,

    /// Retry budget.
    ///
    /// Default: unlimited (`u64::MAX`)
    pub max_retries: u64,

    /// Jitter factor in `[0.0, 1.0]`.
    ///
    /// Default: 0.5
    pub jitter_factor: f64,

    /// Close codes excluded from retry.
    ///
    /// Default: [`NON_RETRYABLE_STATUS_CODES`]
    pub non_retryable_codes: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            first_backoff_ms: 2_000,
            max_backoff_ms: 120_000,
            max_retries: u64::MAX,
            jitter_factor: 0.5,
            non_retryable_codes: NON_RETRYABLE_STATUS_CODES.to_vec(),
        }
    }
}
