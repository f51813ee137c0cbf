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

//! Connection lifecycle states and the state-change events built from them.

use crate::gateway::close::{CloseStatus, DisconnectBehavior};
use crate::reconnection::RetrySignal;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a gateway connection.
///
/// States are assigned, they never transition on their own:
///
/// - `Connecting` / `Connected` are reported by the runtime around each cycle.
/// - `Resuming` / `Reconnecting` are chosen by the retry engine for each retry.
/// - `Disconnected` / `DisconnectedResume` mark a deliberate close by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ConnectionState {
    /// A connection attempt is in progress.
    Connecting,
    /// The session is established and events are flowing.
    Connected,
    /// The next attempt will resume the existing session.
    Resuming,
    /// The next attempt will perform a fresh handshake.
    Reconnecting,
    /// The runtime closed the connection and discarded the session.
    Disconnected,
    /// The runtime closed the connection but kept the session for a resume.
    DisconnectedResume,
}

impl ConnectionState {
    /// Returns `true` for the states the retry engine assigns.
    pub const fn is_retrying(self) -> bool {
        matches!(self, Self::Resuming | Self::Reconnecting)
    }

    /// Returns `true` for deliberate-close markers.
    pub const fn is_disconnected(self) -> bool {
        matches!(self, Self::Disconnected | Self::DisconnectedResume)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Resuming => "RESUMING",
            Self::Reconnecting => "RECONNECTING",
            Self::Disconnected => "DISCONNECTED",
            Self::DisconnectedResume => "DISCONNECTED_RESUME",
        };
        f.write_str(name)
    }
}

/// An observable change in connection state.
///
/// Retry changes carry the attempt index and backoff; closing changes carry
/// the disconnect behavior and close status that produced them.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{CloseStatus, ConnectionState, DisconnectBehavior, StateChange};
///
/// let change = StateChange::resuming(
///     DisconnectBehavior::retry_abruptly("zombie connection"),
///     CloseStatus::ABNORMAL_CLOSE,
/// );
/// assert_eq!(change.state(), ConnectionState::DisconnectedResume);
/// assert_eq!(change.status(), Some(&CloseStatus::ABNORMAL_CLOSE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    state: ConnectionState,
    attempt: u64,
    backoff: Option<Duration>,
    closing: Option<(DisconnectBehavior, CloseStatus)>,
}

impl StateChange {
    fn plain(state: ConnectionState) -> Self {
        Self {
            state,
            attempt: 0,
            backoff: None,
            closing: None,
        }
    }

    /// A connection attempt started.
    pub fn connecting() -> Self {
        Self::plain(ConnectionState::Connecting)
    }

    /// The session was confirmed by the server.
    pub fn connected() -> Self {
        Self::plain(ConnectionState::Connected)
    }

    /// The retry engine scheduled another attempt.
    pub fn retrying(signal: &RetrySignal) -> Self {
        Self {
            state: signal.state(),
            attempt: signal.attempt(),
            backoff: Some(signal.backoff()),
            closing: None,
        }
    }

    /// The runtime closed the connection and dropped the session.
    pub fn disconnecting(behavior: DisconnectBehavior, status: CloseStatus) -> Self {
        Self::closing(ConnectionState::Disconnected, behavior, status)
    }

    /// The runtime closed the connection and kept the session for a resume.
    pub fn resuming(behavior: DisconnectBehavior, status: CloseStatus) -> Self {
        Self::closing(ConnectionState::DisconnectedResume, behavior, status)
    }

    /// Builds the closing change matching the behavior's action.
    pub fn for_disconnect(behavior: DisconnectBehavior, status: CloseStatus) -> Self {
        if behavior.action().keeps_session() {
            Self::resuming(behavior, status)
        } else {
            Self::disconnecting(behavior, status)
        }
    }

    fn closing(state: ConnectionState, behavior: DisconnectBehavior, status: CloseStatus) -> Self {
        Self {
            state,
            attempt: 0,
            backoff: None,
            closing: Some((behavior, status)),
        }
    }

    /// Returns the new state.
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the retry attempt index, `0` for non-retry changes.
    pub const fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Returns the backoff before the next attempt, for retry changes.
    pub const fn backoff(&self) -> Option<Duration> {
        self.backoff
    }

    /// Returns the disconnect behavior, for closing changes.
    pub fn behavior(&self) -> Option<&DisconnectBehavior> {
        self.closing.as_ref().map(|(behavior, _)| behavior)
    }

    /// Returns the close status, for closing changes.
    pub fn status(&self) -> Option<&CloseStatus> {
        self.closing.as_ref().map(|(_, status)| status)
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.backoff, &self.closing) {
            (Some(backoff), _) => write!(
                f,
                "{} (attempt {}, backoff {:?})",
                self.state, self.attempt, backoff
            ),
            (None, Some((behavior, status))) => {
                write!(f, "{} ({}, status {})", self.state, behavior, status)
            }
            (None, None) => write!(f, "{}", self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FailureCause;

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Resuming.to_string(), "RESUMING");
        assert_eq!(
            ConnectionState::DisconnectedResume.to_string(),
            "DISCONNECTED_RESUME"
        );
    }

    #[test]
    fn test_state_classification() {
        assert!(ConnectionState::Resuming.is_retrying());
        assert!(ConnectionState::Reconnecting.is_retrying());
        assert!(!ConnectionState::Connected.is_retrying());
        assert!(ConnectionState::Disconnected.is_disconnected());
        assert!(!ConnectionState::Connecting.is_disconnected());
    }

    #[test]
    fn test_retrying_change_copies_signal() {
        let signal = RetrySignal::new(
            FailureCause::InvalidSession,
            3,
            Duration::from_secs(8),
            ConnectionState::Reconnecting,
        );
        let change = StateChange::retrying(&signal);

        assert_eq!(change.state(), ConnectionState::Reconnecting);
        assert_eq!(change.attempt(), 3);
        assert_eq!(change.backoff(), Some(Duration::from_secs(8)));
        assert!(change.behavior().is_none());
        assert_eq!(
            change.to_string(),
            "RECONNECTING (attempt 3, backoff 8s)"
        );
    }

    #[test]
    fn test_for_disconnect_picks_state_from_action() {
        let keep = StateChange::for_disconnect(
            DisconnectBehavior::retry("resume requested"),
            CloseStatus::from_code(4000),
        );
        assert_eq!(keep.state(), ConnectionState::DisconnectedResume);

        let stop = StateChange::for_disconnect(DisconnectBehavior::stop(), CloseStatus::NORMAL_CLOSE);
        assert_eq!(stop.state(), ConnectionState::Disconnected);
        assert_eq!(stop.status(), Some(&CloseStatus::NORMAL_CLOSE));
        assert_eq!(stop.to_string(), "DISCONNECTED (stop, status 1000)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&ConnectionState::DisconnectedResume).unwrap();
        assert_eq!(json, "\"DISCONNECTED_RESUME\"");
    }
}
