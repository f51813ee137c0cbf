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

//! Bounded exponential backoff and clamped jitter.
//!
//! Both functions are pure apart from the random source. All arithmetic is
//! checked: an overflowing backoff degrades to the maximum interval and an
//! overflowing jitter offset degrades to `i64::MAX × factor`.

use rand::Rng;
use std::time::Duration;

/// Computes `min × 2^iteration`, capped at `max`.
///
/// `iteration` is zero-based. Overflow of the intermediate value is treated as
/// a value larger than `max`.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::reconnection::compute_backoff;
/// use std::time::Duration;
///
/// let min = Duration::from_secs(2);
/// let max = Duration::from_secs(120);
///
/// assert_eq!(compute_backoff(0, min, max), Duration::from_secs(2));
/// assert_eq!(compute_backoff(2, min, max), Duration::from_secs(8));
/// assert_eq!(compute_backoff(10, min, max), max);
/// assert_eq!(compute_backoff(u64::MAX, min, max), max);
/// ```
pub fn compute_backoff(iteration: u64, min: Duration, max: Duration) -> Duration {
    let scaled = u32::try_from(iteration)
        .ok()
        .and_then(|shift| 1u128.checked_shl(shift))
        .and_then(|factor| min.as_nanos().checked_mul(factor));

    match scaled {
        Some(nanos) if nanos <= max.as_nanos() => from_nanos(nanos),
        _ => max,
    }
}

// `nanos` never exceeds `max.as_nanos()`, so the seconds fit in u64.
fn from_nanos(nanos: u128) -> Duration {
    let secs = (nanos / NANOS_PER_SEC) as u64;
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, subsec)
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Computes a random jitter offset, in milliseconds, for `next_backoff`.
///
/// The offset magnitude is `next_backoff × factor`, clamped so that
/// `next_backoff + jitter` always stays within `[min, max]`. When the clamped
/// range collapses and its upper bound is positive the jitter is drawn from
/// `[0, high)`; any other collapsed range yields no jitter.
///
/// The random source is thread-local, so a policy shared across connections
/// can be used concurrently.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::reconnection::compute_jitter;
/// use std::time::Duration;
///
/// let next = Duration::from_secs(8);
/// let jitter = compute_jitter(next, Duration::from_secs(2), Duration::from_secs(120), 0.1);
/// assert!((-800..800).contains(&jitter));
///
/// // Already at the maximum with no room below the minimum: nothing to add.
/// let max = Duration::from_secs(2);
/// assert_eq!(compute_jitter(max, max, max, 0.5), 0);
/// ```
pub fn compute_jitter(next_backoff: Duration, min: Duration, max: Duration, factor: f64) -> i64 {
    let offset = jitter_offset(next_backoff, factor);

    let next_ms = millis(next_backoff);
    let low = clamp_i64((millis(min) - next_ms).max(-i128::from(offset)));
    let high = clamp_i64((millis(max) - next_ms).min(i128::from(offset)));

    let mut rng = rand::rng();
    if low >= high {
        return if high > 0 { rng.random_range(0..high) } else { 0 };
    }
    rng.random_range(low..high)
}

/// Applies a signed millisecond jitter to a backoff, saturating at zero.
pub fn apply_jitter(backoff: Duration, jitter_ms: i64) -> Duration {
    let delta = Duration::from_millis(jitter_ms.unsigned_abs());
    if jitter_ms >= 0 {
        backoff.saturating_add(delta)
    } else {
        backoff.saturating_sub(delta)
    }
}

fn jitter_offset(next_backoff: Duration, factor: f64) -> i64 {
    let percent = (100.0 * factor) as u32;
    next_backoff
        .checked_mul(percent)
        .map(|scaled| scaled / 100)
        .and_then(|scaled| i64::try_from(scaled.as_millis()).ok())
        .unwrap_or_else(|| (i64::MAX as f64 * factor).round() as i64)
}

fn millis(duration: Duration) -> i128 {
    // u128 milliseconds of any Duration fit comfortably in i128.
    duration.as_millis() as i128
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
