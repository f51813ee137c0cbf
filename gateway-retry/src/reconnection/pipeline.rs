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

//! The sequential retry pipeline.
//!
//! [`RetryPipeline`] runs a [`RetryEngine`] on its own task. Failures go in
//! through a bounded channel and proceed signals come out once hooks and the
//! delay have completed. A failure is only taken off the channel after the
//! previous one has produced its proceed signal, so attempts never overlap.
//! The first terminal error stops the task and is returned by
//! [`RetryPipeline::join`].

use crate::gateway::FailureCause;
use crate::reconnection::engine::RetryEngine;
use crate::reconnection::error::RetryError;
use crate::reconnection::signal::RetrySignal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running retry engine fed one failure at a time.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{CloseStatus, FailureCause};
/// use gateway_retry::reconnection::{ReconnectContext, RetryEngine, RetryPipeline, RetryPolicy};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let engine = RetryEngine::new(RetryPolicy::default(), ReconnectContext::new());
/// let mut pipeline = RetryPipeline::spawn(engine, CancellationToken::new());
///
/// let signal = pipeline
///     .retry(Some(FailureCause::close(CloseStatus::ABNORMAL_CLOSE)))
///     .await
///     .unwrap();
/// assert_eq!(signal.attempt(), 1);
///
/// assert!(pipeline.join().await.is_ok());
/// # }
/// ```
#[derive(Debug)]
pub struct RetryPipeline {
    failures: Option<mpsc::Sender<Option<FailureCause>>>,
    proceed: mpsc::Receiver<RetrySignal>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), RetryError>>>,
}

impl RetryPipeline {
    /// Spawns the engine on a new task.
    ///
    /// Cancelling `cancel` aborts any pending hook or delay and stops the
    /// task with [`RetryError::Cancelled`].
    pub fn spawn(engine: RetryEngine, cancel: CancellationToken) -> Self {
        let (failures_tx, failures_rx) = mpsc::channel(1);
        let (proceed_tx, proceed_rx) = mpsc::channel(1);

        let task = tokio::spawn(run(engine, failures_rx, proceed_tx, cancel.clone()));

        Self {
            failures: Some(failures_tx),
            proceed: proceed_rx,
            cancel,
            task: Some(task),
        }
    }

    /// Submits a failure without waiting for its outcome.
    ///
    /// Returns `false` if the pipeline has already stopped.
    pub async fn submit(&self, failure: Option<FailureCause>) -> bool {
        match &self.failures {
            Some(failures) => failures.send(failure).await.is_ok(),
            None => false,
        }
    }

    /// Waits for the next proceed signal.
    ///
    /// Returns `None` once the pipeline has stopped; [`join`](Self::join)
    /// then reports why.
    pub async fn proceed(&mut self) -> Option<RetrySignal> {
        self.proceed.recv().await
    }

    /// Submits a failure and waits until the next attempt may start.
    ///
    /// If the failure ends the session, the terminal error is returned and the
    /// pipeline is stopped.
    pub async fn retry(&mut self, failure: Option<FailureCause>) -> Result<RetrySignal, RetryError> {
        if self.submit(failure).await {
            if let Some(signal) = self.proceed.recv().await {
                return Ok(signal);
            }
        }
        Err(self.finish().await.err().unwrap_or(RetryError::Cancelled))
    }

    /// Cancels any pending hook or delay and stops the pipeline.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` if the pipeline task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops accepting failures and waits for the task to finish.
    ///
    /// Returns the terminal error that stopped the pipeline, if any.
    pub async fn join(mut self) -> Result<(), RetryError> {
        self.finish().await
    }

    async fn finish(&mut self) -> Result<(), RetryError> {
        self.failures = None;
        // Drain so the task is never parked on a full proceed channel.
        while self.proceed.try_recv().is_ok() {}

        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(result) => result,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(_) => Err(RetryError::Cancelled),
        }
    }
}

impl Drop for RetryPipeline {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    engine: RetryEngine,
    mut failures: mpsc::Receiver<Option<FailureCause>>,
    proceed: mpsc::Sender<RetrySignal>,
    cancel: CancellationToken,
) -> Result<(), RetryError> {
    loop {
        let failure = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            failure = failures.recv() => match failure {
                Some(failure) => failure,
                None => return Ok(()),
            },
        };

        let signal = engine.on_failure(failure, &cancel).await?;

        // Cancellation also withholds a signal still waiting for channel space.
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            sent = proceed.send(signal) => sent,
        };
        if sent.is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("retry pipeline receiver dropped, stopping");
            return Ok(());
        }
    }
}
