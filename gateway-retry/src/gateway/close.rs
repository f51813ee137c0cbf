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

//! Close codes and deliberate-disconnect descriptors.
//!
//! A [`CloseStatus`] is the numeric code and optional reason that accompany a
//! closed gateway connection. Codes below [`GATEWAY_CODE_THRESHOLD`] belong to
//! the websocket layer and leave the session resumable; codes at or above it
//! are gateway-specific.

use std::fmt;
use std::sync::Arc;

/// First close code reserved for gateway-specific closures.
///
/// Closures below this value (normal, going-away, abnormal, ...) keep the
/// session resumable.
pub const GATEWAY_CODE_THRESHOLD: u16 = 4000;

/// Close codes that must never be retried.
///
/// - `4004`: authentication failed
/// - `4010`: invalid shard
/// - `4011`: sharding required
/// - `4012`: invalid API version
/// - `4013`: invalid intent(s)
/// - `4014`: disallowed intent(s)
pub const NON_RETRYABLE_STATUS_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

/// A close code paired with an optional human-readable reason.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::CloseStatus;
///
/// let status = CloseStatus::new(4000, "unknown error");
/// assert!(status.is_gateway_code());
/// assert_eq!(status.to_string(), "4000 (unknown error)");
///
/// assert!(!CloseStatus::ABNORMAL_CLOSE.is_gateway_code());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloseStatus {
    code: u16,
    reason: Option<String>,
}

impl CloseStatus {
    /// Normal closure, used when the client stops for good.
    pub const NORMAL_CLOSE: CloseStatus = CloseStatus {
        code: 1000,
        reason: None,
    };

    /// Abnormal closure, reported when the connection dropped without a close frame.
    pub const ABNORMAL_CLOSE: CloseStatus = CloseStatus {
        code: 1006,
        reason: None,
    };

    /// Creates a status with a reason.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: Some(reason.into()),
        }
    }

    /// Creates a status carrying only a code.
    pub const fn from_code(code: u16) -> Self {
        Self { code, reason: None }
    }

    /// Returns the numeric close code.
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the reason, if the remote sent one.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns `true` for gateway-specific codes (`>= 4000`).
    pub const fn is_gateway_code(&self) -> bool {
        self.code >= GATEWAY_CODE_THRESHOLD
    }
}

impl fmt::Display for CloseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.code, reason),
            None => write!(f, "{}", self.code),
        }
    }
}

/// What the runtime does after it closes a connection on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DisconnectAction {
    /// Close gracefully, keep the session and reconnect.
    Retry,
    /// Drop the socket without a close handshake, keep the session and reconnect.
    RetryAbruptly,
    /// Close gracefully and stop.
    Stop,
    /// Drop the socket and stop.
    StopAbruptly,
}

impl DisconnectAction {
    /// Returns `true` if the session is kept for a later resume.
    pub const fn keeps_session(self) -> bool {
        matches!(self, Self::Retry | Self::RetryAbruptly)
    }

    /// Returns `true` if the socket is dropped without a close frame.
    pub const fn is_abrupt(self) -> bool {
        matches!(self, Self::RetryAbruptly | Self::StopAbruptly)
    }
}

impl fmt::Display for DisconnectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::RetryAbruptly => write!(f, "retry_abruptly"),
            Self::Stop => write!(f, "stop"),
            Self::StopAbruptly => write!(f, "stop_abruptly"),
        }
    }
}

/// A deliberate disconnect: the action to take and, optionally, why.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{DisconnectAction, DisconnectBehavior};
///
/// let behavior = DisconnectBehavior::retry_abruptly("heartbeat missed");
/// assert_eq!(behavior.action(), DisconnectAction::RetryAbruptly);
/// assert!(behavior.action().keeps_session());
/// assert_eq!(behavior.cause(), Some("heartbeat missed"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectBehavior {
    action: DisconnectAction,
    cause: Option<Arc<str>>,
}

impl DisconnectBehavior {
    /// Creates a behavior from an action and an optional cause.
    pub fn new(action: DisconnectAction, cause: Option<&str>) -> Self {
        Self {
            action,
            cause: cause.map(Arc::from),
        }
    }

    /// Graceful close that keeps the session.
    pub fn retry(cause: &str) -> Self {
        Self::new(DisconnectAction::Retry, Some(cause))
    }

    /// Abrupt close that keeps the session.
    pub fn retry_abruptly(cause: &str) -> Self {
        Self::new(DisconnectAction::RetryAbruptly, Some(cause))
    }

    /// Graceful close that ends the session.
    pub fn stop() -> Self {
        Self::new(DisconnectAction::Stop, None)
    }

    /// Abrupt close that ends the session.
    pub fn stop_abruptly(cause: &str) -> Self {
        Self::new(DisconnectAction::StopAbruptly, Some(cause))
    }

    /// Returns the action.
    pub const fn action(&self) -> DisconnectAction {
        self.action
    }

    /// Returns the cause, if any.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl fmt::Display for DisconnectBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.action, cause),
            None => write!(f, "{}", self.action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_code_threshold() {
        assert!(!CloseStatus::NORMAL_CLOSE.is_gateway_code());
        assert!(!CloseStatus::from_code(3999).is_gateway_code());
        assert!(CloseStatus::from_code(4000).is_gateway_code());
        assert!(CloseStatus::from_code(4014).is_gateway_code());
    }

    #[test]
    fn test_close_status_display() {
        assert_eq!(CloseStatus::from_code(1001).to_string(), "1001");
        assert_eq!(
            CloseStatus::new(4004, "Authentication failed.").to_string(),
            "4004 (Authentication failed.)"
        );
    }

    #[test]
    fn test_non_retryable_codes_are_gateway_codes() {
        for code in NON_RETRYABLE_STATUS_CODES {
            assert!(CloseStatus::from_code(code).is_gateway_code());
        }
    }

    #[test]
    fn test_disconnect_actions() {
        assert!(DisconnectAction::Retry.keeps_session());
        assert!(DisconnectAction::RetryAbruptly.keeps_session());
        assert!(!DisconnectAction::Stop.keeps_session());
        assert!(!DisconnectAction::StopAbruptly.keeps_session());

        assert!(DisconnectAction::StopAbruptly.is_abrupt());
        assert!(!DisconnectAction::Retry.is_abrupt());
    }

    #[test]
    fn test_disconnect_behavior_display() {
        assert_eq!(DisconnectBehavior::stop().to_string(), "stop");
        assert_eq!(
            DisconnectBehavior::retry("reconnect requested").to_string(),
            "retry: reconnect requested"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_close_status_serde() {
        let status = CloseStatus::new(4009, "session timed out");
        let json = serde_json::to_string(&status).unwrap();
        let parsed: CloseStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
