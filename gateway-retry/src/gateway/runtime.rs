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

//! The connection runtime that drives a gateway session through retries.
//!
//! [`GatewayRuntime`] runs a user [`GatewayConnector`] in a loop. Each loop
//! iteration is one [`ConnectionCycle`]: a connect, an optional session
//! confirmation, and eventually a failure. Every failure is handed to a
//! [`RetryPipeline`], and the next cycle starts only once the pipeline says
//! so. The mode of the next cycle follows the retry decision: resume after
//! `Resuming`, a fresh handshake after `Reconnecting`.
//!
//! State changes are published on a broadcast channel; see
//! [`GatewayRuntime::subscribe`].

use crate::error::GatewayError;
use crate::gateway::{CloseStatus, ConnectionState, DisconnectBehavior, FailureCause, StateChange};
use crate::observability::{MetricsHook, RetryMetrics, log_retry_error};
use crate::reconnection::{
    HookError, PreRetryHook, ReconnectContext, RetryEngine, RetryError, RetryPipeline,
    RetryPolicy, RetrySettings, RetrySignal,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Default capacity of the state-change broadcast channel.
pub const DEFAULT_STATE_CAPACITY: usize = 64;

/// How a connection cycle should establish its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectMode {
    /// Perform a fresh handshake.
    Identify,
    /// Resume the previous session.
    Resume,
}

impl ConnectMode {
    fn after(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Resuming => Self::Resume,
            _ => Self::Identify,
        }
    }
}

/// Establishes and runs one gateway connection.
///
/// `run` should connect using [`ConnectionCycle::mode`], call
/// [`ConnectionCycle::confirm_session`] once the server acknowledges the
/// session, and return when the connection ends. `Ok(())` means the session
/// ended cleanly and the runtime stops; an error is handed to the retry
/// engine.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    /// Runs one connection cycle to completion.
    async fn run(&self, cycle: &ConnectionCycle) -> Result<(), FailureCause>;
}

/// One connection attempt as seen by a [`GatewayConnector`].
#[derive(Debug)]
pub struct ConnectionCycle {
    mode: ConnectMode,
    attempt: u64,
    context: ReconnectContext,
    states: broadcast::Sender<StateChange>,
    token: CancellationToken,
    confirmed: AtomicBool,
}

impl ConnectionCycle {
    /// Whether to identify or resume.
    pub fn mode(&self) -> ConnectMode {
        self.mode
    }

    /// The attempt counter when this cycle started.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Marks the session as established.
    ///
    /// Publishes `Connected` and resets the retry budget. Only the first call
    /// per cycle has an effect.
    pub fn confirm_session(&self) {
        if self.confirmed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.context.reset();
        let _ = self.states.send(StateChange::connected());

        #[cfg(feature = "tracing")]
        tracing::info!(mode = ?self.mode, "gateway session confirmed");
    }

    /// Returns `true` once [`confirm_session`](Self::confirm_session) was called.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// Completes when the runtime abandons this cycle.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Returns `true` if the runtime abandoned this cycle.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct CycleSlot {
    token: CancellationToken,
    close: Option<CloseStatus>,
}

#[derive(Debug)]
struct Shared {
    states: broadcast::Sender<StateChange>,
    shutdown: CancellationToken,
    cycle: Mutex<CycleSlot>,
}

impl Shared {
    fn emit(&self, change: StateChange) {
        // No subscribers is fine.
        let _ = self.states.send(change);
    }

    fn begin_cycle(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        let mut slot = self.cycle.lock();
        slot.token = token.clone();
        slot.close = None;
        token
    }

    fn take_close(&self) -> Option<CloseStatus> {
        self.cycle.lock().close.take()
    }
}

/// A cloneable handle for observing and closing a running gateway.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    shared: Arc<Shared>,
}

impl GatewayHandle {
    /// Subscribes to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.shared.states.subscribe()
    }

    /// Deliberately closes the current connection.
    ///
    /// Publishes `DisconnectedResume` for retry behaviors and `Disconnected`
    /// for stop behaviors. A retry behavior abandons the current cycle and
    /// feeds `status` to the retry engine as a protocol close, so the next
    /// cycle is decided like any other failure. A stop behavior shuts the
    /// runtime down. A retry close issued while no cycle is running has no
    /// further effect.
    pub fn close(&self, behavior: DisconnectBehavior, status: CloseStatus) {
        let keeps_session = behavior.action().keeps_session();

        #[cfg(feature = "tracing")]
        tracing::info!(behavior = %behavior, status = %status, "closing gateway connection");

        self.shared
            .emit(StateChange::for_disconnect(behavior, status.clone()));

        if keeps_session {
            let mut slot = self.shared.cycle.lock();
            slot.close = Some(status);
            slot.token.cancel();
        } else {
            self.shared.shutdown.cancel();
        }
    }

    /// Returns `true` once the runtime was shut down.
    pub fn is_closed(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }
}

struct StateChangeHook {
    shared: Arc<Shared>,
}

#[async_trait]
impl PreRetryHook for StateChangeHook {
    async fn before_retry(&self, signal: &RetrySignal) -> Result<(), HookError> {
        self.shared.emit(StateChange::retrying(signal));
        Ok(())
    }
}

/// Drives a [`GatewayConnector`] through connect, failure and retry.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use gateway_retry::gateway::{
///     ConnectionCycle, FailureCause, GatewayConnector, GatewayRuntime,
/// };
/// use gateway_retry::reconnection::RetryPolicy;
///
/// struct OneShot;
///
/// #[async_trait]
/// impl GatewayConnector for OneShot {
///     async fn run(&self, cycle: &ConnectionCycle) -> Result<(), FailureCause> {
///         cycle.confirm_session();
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runtime = GatewayRuntime::new(OneShot, RetryPolicy::default());
/// assert!(runtime.run().await.is_ok());
/// # }
/// ```
pub struct GatewayRuntime<C> {
    connector: C,
    engine: RetryEngine,
    context: ReconnectContext,
    metrics: Arc<RetryMetrics>,
    shared: Arc<Shared>,
}

impl<C> GatewayRuntime<C>
where
    C: GatewayConnector,
{
    /// Creates a runtime with the default state channel capacity.
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self::with_capacity(connector, policy, DEFAULT_STATE_CAPACITY)
    }

    /// Creates a runtime from plain settings.
    ///
    /// Returns [`GatewayError::Policy`] if the settings are rejected.
    pub fn from_settings(connector: C, settings: &RetrySettings) -> Result<Self, GatewayError> {
        let policy = RetryPolicy::from_settings(settings)?;
        Ok(Self::new(connector, policy))
    }

    /// Creates a runtime whose state channel buffers `capacity` changes.
    ///
    /// Subscribers that fall further behind observe `RecvError::Lagged`.
    pub fn with_capacity(connector: C, policy: RetryPolicy, capacity: usize) -> Self {
        let (states, _) = broadcast::channel(capacity.max(1));
        let shutdown = CancellationToken::new();
        let shared = Arc::new(Shared {
            states,
            cycle: Mutex::new(CycleSlot {
                token: shutdown.child_token(),
                close: None,
            }),
            shutdown,
        });

        let context = ReconnectContext::new();
        let metrics = Arc::new(RetryMetrics::new());
        let engine = RetryEngine::new(policy, context.clone())
            .do_before_retry(StateChangeHook {
                shared: Arc::clone(&shared),
            })
            .do_before_retry(MetricsHook::new(Arc::clone(&metrics)));

        Self {
            connector,
            engine,
            context,
            metrics,
            shared,
        }
    }

    /// Adds a hook run before each retry, after the built-in ones.
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: PreRetryHook + 'static,
    {
        self.engine = self.engine.do_before_retry(hook);
        self
    }

    /// Returns a handle for observing and closing the runtime.
    pub fn handle(&self) -> GatewayHandle {
        GatewayHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.shared.states.subscribe()
    }

    /// The attempt counter shared with the retry engine.
    pub fn context(&self) -> &ReconnectContext {
        &self.context
    }

    /// Retry counters for this runtime.
    pub fn metrics(&self) -> &Arc<RetryMetrics> {
        &self.metrics
    }

    /// Runs connection cycles until the session ends.
    ///
    /// Returns `Ok(())` when a cycle ends cleanly or the runtime is closed
    /// with a stop behavior, and the terminal error otherwise. A terminal
    /// error also publishes `Disconnected`.
    pub async fn run(self) -> Result<(), GatewayError> {
        let Self {
            connector,
            engine,
            context,
            metrics,
            shared,
        } = self;

        let mut pipeline = RetryPipeline::spawn(engine, shared.shutdown.child_token());
        let mut mode = ConnectMode::Identify;

        loop {
            if shared.shutdown.is_cancelled() {
                return Ok(());
            }

            let token = shared.begin_cycle();
            shared.emit(StateChange::connecting());

            #[cfg(feature = "tracing")]
            tracing::debug!(mode = ?mode, attempt = context.attempts(), "starting gateway connection cycle");

            let cycle = ConnectionCycle {
                mode,
                attempt: context.attempts(),
                context: context.clone(),
                states: shared.states.clone(),
                token: token.clone(),
                confirmed: AtomicBool::new(false),
            };

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                outcome = connector.run(&cycle) => Some(outcome),
            };

            let failure = match outcome {
                Some(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("gateway session ended");
                    return Ok(());
                }
                Some(Err(cause)) => cause,
                None => match shared.take_close() {
                    Some(status) => FailureCause::ProtocolClose(status),
                    None => return Ok(()),
                },
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(cause = %failure, "gateway connection failed");

            match pipeline.retry(Some(failure)).await {
                Ok(signal) => mode = ConnectMode::after(signal.state()),
                Err(RetryError::Cancelled) => {
                    metrics.record_error(&RetryError::Cancelled);
                    return Ok(());
                }
                Err(error) => {
                    metrics.record_error(&error);
                    log_retry_error(&error);

                    let status = error
                        .cause()
                        .and_then(FailureCause::close_status)
                        .cloned()
                        .unwrap_or(CloseStatus::ABNORMAL_CLOSE);
                    shared.emit(StateChange::disconnecting(
                        DisconnectBehavior::stop_abruptly(&error.to_string()),
                        status,
                    ));
                    return Err(error.into());
                }
            }
        }
    }
}

impl<C> std::fmt::Debug for GatewayRuntime<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRuntime")
            .field("engine", &self.engine)
            .field("attempts", &self.context.attempts())
            .field("closed", &self.shared.shutdown.is_cancelled())
            .finish()
    }
}
