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

//! Time source used to wait out retry delays.

use async_trait::async_trait;
use std::time::Duration;

/// Schedules the wait between a retry decision and the next attempt.
///
/// The engine performs no I/O other than waiting on its scheduler, so
/// injecting a scheduler is enough to make retry timing deterministic.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Completes once `duration` has elapsed.
    async fn sleep(&self, duration: Duration);

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Waits on the tokio timer.
///
/// Honors `tokio::time::pause`, so tests can run retries in virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    fn name(&self) -> &str {
        "TokioScheduler"
    }
}
