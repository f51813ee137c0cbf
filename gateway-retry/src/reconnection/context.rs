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

//! The shared attempt counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Value of the counter before the first attempt of a retry budget.
pub const INITIAL_ATTEMPT: u64 = 1;

/// Attempt counter shared between the retry engine and the connection runtime.
///
/// Cloning the context yields another handle to the same counter. It counts
/// the attempt about to be made, starting at [`INITIAL_ATTEMPT`], and is only
/// ever changed through [`next`](Self::next) and [`reset`](Self::reset).
///
/// # Examples
///
/// ```rust
/// use gateway_retry::reconnection::ReconnectContext;
///
/// let context = ReconnectContext::new();
/// let runtime_handle = context.clone();
///
/// context.next();
/// context.next();
/// assert_eq!(runtime_handle.attempts(), 3);
///
/// // The runtime confirmed a resume.
/// runtime_handle.reset();
/// assert_eq!(context.attempts(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectContext {
    attempts: Arc<AtomicU64>,
}

impl Default for ReconnectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectContext {
    /// Creates a fresh context at [`INITIAL_ATTEMPT`].
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(AtomicU64::new(INITIAL_ATTEMPT)),
        }
    }

    /// Returns the attempt about to be made.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Advances to the next attempt.
    pub fn next(&self) {
        // Saturate rather than wrap; a wrapped counter would refill the budget.
        let _ = self
            .attempts
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1));
    }

    /// Restores the counter to [`INITIAL_ATTEMPT`], refilling the retry budget.
    pub fn reset(&self) {
        self.attempts.store(INITIAL_ATTEMPT, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial_attempt() {
        assert_eq!(ReconnectContext::new().attempts(), INITIAL_ATTEMPT);
        assert_eq!(ReconnectContext::default().attempts(), INITIAL_ATTEMPT);
    }

    #[test]
    fn test_next_increments_by_one() {
        let context = ReconnectContext::new();
        context.next();
        assert_eq!(context.attempts(), 2);
        context.next();
        assert_eq!(context.attempts(), 3);
    }

    #[test]
    fn test_reset_restores_initial_value() {
        let context = ReconnectContext::new();
        for _ in 0..10 {
            context.next();
        }
        context.reset();
        assert_eq!(context.attempts(), INITIAL_ATTEMPT);
    }

    #[test]
    fn test_clones_share_counter() {
        let engine_side = ReconnectContext::new();
        let runtime_side = engine_side.clone();

        engine_side.next();
        assert_eq!(runtime_side.attempts(), 2);

        runtime_side.reset();
        assert_eq!(engine_side.attempts(), 1);
    }

    #[test]
    fn test_next_saturates() {
        let context = ReconnectContext::new();
        context.attempts.store(u64::MAX, Ordering::Release);
        context.next();
        assert_eq!(context.attempts(), u64::MAX);
    }
}
