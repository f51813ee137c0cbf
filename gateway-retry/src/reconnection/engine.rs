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

//! The retry decision engine.
//!
//! For every abnormal connection end the engine decides whether to retry at
//! all, whether the next attempt resumes the session or performs a fresh
//! handshake, and how long to wait first. It then runs the pre-retry hooks
//! and waits out the delay.
//!
//! A failure goes through these steps, in order:
//!
//! 1. A missing cause is rejected as an invariant violation.
//! 2. Non-retryable failures are forwarded unchanged.
//! 3. An invalidated session resets the attempt counter.
//! 4. An exhausted budget ends the session.
//! 5. Resumable failures wait nothing on the first attempt and
//!    `backoff(attempts - 2)` afterwards; others wait `backoff(attempts - 1)`.
//! 6. The counter advances, jitter is applied to non-zero delays, and the
//!    signal is built from the pre-advance attempt index.
//! 7. Hooks run in order, then the delay elapses.

use crate::gateway::{ConnectionState, FailureCause};
use crate::reconnection::backoff::{apply_jitter, compute_backoff, compute_jitter};
use crate::reconnection::context::{INITIAL_ATTEMPT, ReconnectContext};
use crate::reconnection::error::RetryError;
use crate::reconnection::hooks::{HookChain, PreRetryHook};
use crate::reconnection::policy::RetryPolicy;
use crate::reconnection::signal::RetrySignal;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Decides and sequences retries for one gateway connection.
///
/// The engine holds no state of its own beyond the shared
/// [`ReconnectContext`]; callers must feed it one failure at a time (see
/// [`RetryPipeline`](crate::reconnection::RetryPipeline)).
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{CloseStatus, ConnectionState, FailureCause};
/// use gateway_retry::reconnection::{ReconnectContext, RetryEngine, RetryPolicy};
/// use std::time::Duration;
///
/// let context = ReconnectContext::new();
/// let engine = RetryEngine::new(RetryPolicy::default(), context.clone());
///
/// // First resumable failure: resume immediately.
/// let signal = engine
///     .decide(Some(FailureCause::close(CloseStatus::ABNORMAL_CLOSE)))
///     .unwrap();
/// assert_eq!(signal.state(), ConnectionState::Resuming);
/// assert_eq!(signal.backoff(), Duration::ZERO);
/// assert_eq!(context.attempts(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetryEngine {
    policy: RetryPolicy,
    context: ReconnectContext,
    hooks: HookChain,
}

impl RetryEngine {
    /// Creates an engine with no hooks.
    pub fn new(policy: RetryPolicy, context: ReconnectContext) -> Self {
        Self {
            policy,
            context,
            hooks: HookChain::new(),
        }
    }

    /// Returns an engine that also runs `hook` before each retry, after every
    /// hook registered so far.
    pub fn do_before_retry<H>(mut self, hook: H) -> Self
    where
        H: PreRetryHook + 'static,
    {
        self.hooks = self.hooks.then(hook);
        self
    }

    /// Replaces the hook chain.
    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    /// The policy this engine applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The shared attempt counter.
    pub fn context(&self) -> &ReconnectContext {
        &self.context
    }

    /// The registered hooks.
    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    /// Classifies a failure and builds its retry signal.
    ///
    /// This advances the attempt counter for every retryable failure that
    /// does not exhaust the budget. It runs no hooks and does not wait.
    pub fn decide(&self, failure: Option<FailureCause>) -> Result<RetrySignal, RetryError> {
        let cause = failure.ok_or(RetryError::MissingCause)?;

        if !cause.is_retryable(self.policy.non_retryable_codes()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(cause = %cause, "gateway failure is not retryable");
            return Err(RetryError::Terminal(cause));
        }

        if cause.invalidates_session() {
            #[cfg(feature = "tracing")]
            tracing::debug!("session invalidated, resetting retry budget");
            self.context.reset();
        }

        let attempt = self.context.attempts();
        let max_retries = self.policy.max_retries();
        if attempt >= max_retries {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                max_retries,
                cause = %cause,
                "gateway retries exhausted"
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                max: max_retries,
                cause,
            });
        }

        let min = self.policy.first_backoff();
        let max = self.policy.max_backoff_interval();

        let (backoff, state) = if cause.can_resume() {
            // Resume right away on the first attempt to miss as few events as possible.
            let backoff = if attempt == INITIAL_ATTEMPT {
                Duration::ZERO
            } else {
                compute_backoff(attempt.saturating_sub(2), min, max)
            };
            (backoff, ConnectionState::Resuming)
        } else {
            (
                compute_backoff(attempt.saturating_sub(1), min, max),
                ConnectionState::Reconnecting,
            )
        };

        self.context.next();

        let backoff = if backoff.is_zero() {
            backoff
        } else {
            let jitter = compute_jitter(backoff, min, max, self.policy.jitter_factor());
            apply_jitter(backoff, jitter)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            state = %state,
            backoff = ?backoff,
            cause = %cause,
            "scheduling gateway retry"
        );

        Ok(RetrySignal::new(cause, attempt, backoff, state))
    }

    /// Processes one failure to completion.
    ///
    /// Decides the retry, runs every hook in order, then waits out the delay
    /// on the policy's scheduler. Returns the signal once the next attempt may
    /// start. Cancelling `cancel` aborts a pending hook or delay with
    /// [`RetryError::Cancelled`].
    pub async fn on_failure(
        &self,
        failure: Option<FailureCause>,
        cancel: &CancellationToken,
    ) -> Result<RetrySignal, RetryError> {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let signal = self.decide(failure)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            result = self.hooks.run(&signal) => {
                if let Err(error) = result {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempt = signal.attempt(), error = %error, "pre-retry hook failed");
                    return Err(RetryError::Hook(error));
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = self.policy.scheduler().sleep(signal.backoff()) => {}
        }

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CloseStatus;
    use crate::reconnection::error::HookError;
    use crate::reconnection::hooks::hook_fn;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn policy(max_retries: u64, jitter_factor: f64) -> RetryPolicy {
        RetryPolicy::builder()
            .first_backoff(Duration::from_secs(2))
            .max_backoff_interval(Duration::from_secs(120))
            .max_retries(max_retries)
            .jitter_factor(jitter_factor)
            .build()
            .unwrap()
    }

    fn engine(max_retries: u64, jitter_factor: f64) -> RetryEngine {
        RetryEngine::new(policy(max_retries, jitter_factor), ReconnectContext::new())
    }

    fn resumable() -> FailureCause {
        FailureCause::close(CloseStatus::ABNORMAL_CLOSE)
    }

    fn not_resumable() -> FailureCause {
        FailureCause::close(CloseStatus::new(4000, "unknown error"))
    }

    fn advance_to(engine: &RetryEngine, attempts: u64) {
        while engine.context().attempts() < attempts {
            engine.context().next();
        }
    }

    #[test]
    fn test_missing_cause_is_rejected() {
        let engine = engine(5, 0.1);
        let error = engine.decide(None).unwrap_err();
        assert!(matches!(error, RetryError::MissingCause));
        assert_eq!(engine.context().attempts(), 1);
    }

    #[test]
    fn test_non_retryable_code_is_forwarded_unchanged() {
        let engine = engine(5, 0.1);
        let cause = FailureCause::close(CloseStatus::new(4004, "Authentication failed."));

        let error = engine.decide(Some(cause)).unwrap_err();

        match error {
            RetryError::Terminal(FailureCause::ProtocolClose(status)) => {
                assert_eq!(status.code(), 4004);
                assert_eq!(status.reason(), Some("Authentication failed."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(engine.context().attempts(), 1);
    }

    #[test]
    fn test_partial_disconnect_is_terminal() {
        let engine = engine(5, 0.1);
        let error = engine.decide(Some(FailureCause::PartialDisconnect)).unwrap_err();
        assert!(matches!(error, RetryError::Terminal(FailureCause::PartialDisconnect)));
    }

    #[test]
    fn test_first_resumable_attempt_is_immediate() {
        let engine = engine(5, 0.1);

        let signal = engine.decide(Some(resumable())).unwrap();

        assert_eq!(signal.attempt(), 1);
        assert_eq!(signal.backoff(), Duration::ZERO);
        assert_eq!(signal.state(), ConnectionState::Resuming);
        assert_eq!(engine.context().attempts(), 2);
    }

    #[test]
    fn test_second_resumable_attempt_uses_first_backoff() {
        let engine = engine(5, 0.1);
        advance_to(&engine, 2);

        let signal = engine.decide(Some(resumable())).unwrap();

        assert_eq!(signal.attempt(), 2);
        assert_eq!(signal.state(), ConnectionState::Resuming);
        assert!(signal.backoff() >= Duration::from_millis(2000));
        assert!(signal.backoff() <= Duration::from_millis(2200));
    }

    #[test]
    fn test_reconnect_backoff_scenario() {
        let engine = engine(5, 0.1);
        advance_to(&engine, 3);

        let signal = engine.decide(Some(not_resumable())).unwrap();

        assert_eq!(signal.attempt(), 3);
        assert_eq!(signal.state(), ConnectionState::Reconnecting);
        assert!(signal.backoff() >= Duration::from_millis(7200), "{:?}", signal.backoff());
        assert!(signal.backoff() <= Duration::from_millis(8800), "{:?}", signal.backoff());
        assert_eq!(engine.context().attempts(), 4);
    }

    #[test]
    fn test_first_reconnect_uses_first_backoff_without_jitter() {
        let engine = engine(5, 0.0);

        let signal = engine.decide(Some(not_resumable())).unwrap();

        assert_eq!(signal.state(), ConnectionState::Reconnecting);
        assert_eq!(signal.backoff(), Duration::from_secs(2));
    }

    #[test]
    fn test_generic_fault_resumes() {
        let engine = engine(5, 0.0);
        let signal = engine.decide(Some(FailureCause::message("read timed out"))).unwrap();
        assert_eq!(signal.state(), ConnectionState::Resuming);
    }

    #[test]
    fn test_exhaustion_reports_count_and_max() {
        let engine = engine(5, 0.1);
        for attempt in 1..5 {
            let signal = engine.decide(Some(resumable())).unwrap();
            assert_eq!(signal.attempt(), attempt);
        }

        let error = engine.decide(Some(resumable())).unwrap_err();

        match error {
            RetryError::Exhausted { attempts, max, cause } => {
                assert_eq!(attempts, 5);
                assert_eq!(max, 5);
                assert_eq!(cause.close_status(), Some(&CloseStatus::ABNORMAL_CLOSE));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Terminal: the counter is neither advanced nor reset.
        assert_eq!(engine.context().attempts(), 5);
    }

    #[test]
    fn test_invalid_session_resets_budget_first() {
        let engine = engine(5, 0.0);
        advance_to(&engine, 5);

        let signal = engine.decide(Some(FailureCause::InvalidSession)).unwrap();

        assert_eq!(signal.attempt(), 1);
        assert_eq!(signal.state(), ConnectionState::Reconnecting);
        assert_eq!(signal.backoff(), Duration::from_secs(2));
        assert_eq!(engine.context().attempts(), 2);
    }

    #[test]
    fn test_ordinary_reconnect_keeps_budget() {
        let engine = engine(5, 0.0);
        advance_to(&engine, 4);

        engine.decide(Some(not_resumable())).unwrap();

        assert_eq!(engine.context().attempts(), 5);
        assert!(engine.decide(Some(not_resumable())).unwrap_err().is_exhausted());
    }

    #[test]
    fn test_zero_budget_exhausts_immediately() {
        let engine = engine(0, 0.1);
        assert!(engine.decide(Some(resumable())).unwrap_err().is_exhausted());
    }

    #[test]
    fn test_delay_within_bounds_across_budget() {
        let engine = engine(64, 0.5);
        for _ in 0..63 {
            let signal = engine.decide(Some(not_resumable())).unwrap();
            assert!(signal.backoff() >= Duration::from_secs(2));
            assert!(signal.backoff() <= Duration::from_secs(120));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_failure_waits_out_backoff() {
        let engine = engine(5, 0.0);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let signal = engine.on_failure(Some(not_resumable()), &cancel).await.unwrap();

        assert_eq!(signal.backoff(), Duration::from_secs(2));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_failure_immediate_resume_does_not_wait() {
        let engine = engine(5, 0.5);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        engine.on_failure(Some(resumable()), &cancel).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hooks_run_before_delay() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let start = Instant::now();

        let engine = engine(5, 0.0).do_before_retry(hook_fn(move |signal: RetrySignal| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().unwrap().push((signal.attempt(), start.elapsed()));
                Ok(())
            }
        }));

        engine
            .on_failure(Some(not_resumable()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, Duration::ZERO)]);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hook_failure_aborts_attempt() {
        let engine = engine(5, 0.0).do_before_retry(hook_fn(|_signal: RetrySignal| async {
            Err(HookError::message("could not close stale socket"))
        }));

        let start = Instant::now();
        let error = engine
            .on_failure(Some(not_resumable()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, RetryError::Hook(_)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_delay() {
        let engine = engine(5, 0.0);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let error = engine.on_failure(Some(not_resumable()), &cancel).await.unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_hook() {
        let engine = engine(5, 0.0).do_before_retry(hook_fn(|_signal: RetrySignal| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let error = engine.on_failure(Some(resumable()), &cancel).await.unwrap_err();
        assert!(error.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_advance() {
        let engine = engine(5, 0.0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = engine.on_failure(Some(resumable()), &cancel).await.unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(engine.context().attempts(), 1);
    }
}
