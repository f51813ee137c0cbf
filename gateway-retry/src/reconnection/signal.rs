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

use crate::gateway::{ConnectionState, FailureCause};
use std::fmt;
use std::time::Duration;

/// One retry decision: what failed, which attempt comes next, how long to
/// wait, and whether the next attempt resumes or reconnects.
///
/// Signals are immutable. The same instance is handed to every pre-retry
/// hook and then returned to the caller.
#[derive(Debug, Clone)]
pub struct RetrySignal {
    cause: FailureCause,
    attempt: u64,
    backoff: Duration,
    state: ConnectionState,
}

impl RetrySignal {
    /// Creates a signal.
    pub fn new(cause: FailureCause, attempt: u64, backoff: Duration, state: ConnectionState) -> Self {
        Self {
            cause,
            attempt,
            backoff,
            state,
        }
    }

    /// The failure that triggered this retry.
    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }

    /// The attempt index before the counter was advanced.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// The delay before the next attempt, jitter included.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// `Resuming` or `Reconnecting`.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` if the next attempt resumes the session.
    pub fn is_resume(&self) -> bool {
        self.state == ConnectionState::Resuming
    }
}

impl fmt::Display for RetrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempt {} in {:?} after: {}",
            self.state, self.attempt, self.backoff, self.cause
        )
    }
}
