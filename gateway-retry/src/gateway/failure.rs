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

//! Failure causes surfaced by the transport when a connection ends abnormally.
//!
//! Each abnormal termination of a gateway connection is reported as one
//! [`FailureCause`]. The retry engine classifies causes along two axes:
//!
//! - **Retryable**: may another connection attempt be made at all?
//! - **Resumable**: can the existing session be continued, or must a fresh
//!   handshake be performed?

use crate::gateway::close::{CloseStatus, GATEWAY_CODE_THRESHOLD};
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Why a gateway connection ended abnormally.
///
/// # Examples
///
/// ```rust
/// use gateway_retry::gateway::{CloseStatus, FailureCause, NON_RETRYABLE_STATUS_CODES};
///
/// let codes = NON_RETRYABLE_STATUS_CODES;
///
/// let auth_failed = FailureCause::close(CloseStatus::new(4004, "Authentication failed."));
/// assert!(!auth_failed.is_retryable(&codes));
///
/// let dropped = FailureCause::close(CloseStatus::ABNORMAL_CLOSE);
/// assert!(dropped.is_retryable(&codes));
/// assert!(dropped.can_resume());
///
/// assert!(!FailureCause::InvalidSession.can_resume());
/// ```
#[derive(Debug, Clone, Error)]
pub enum FailureCause {
    /// The remote side closed the connection with a status code.
    #[error("gateway closed with status {0}")]
    ProtocolClose(CloseStatus),

    /// The server invalidated the session; only a fresh handshake can recover.
    #[error("gateway session was invalidated")]
    InvalidSession,

    /// The transport is shutting down cooperatively.
    ///
    /// This is an internal signal rather than a remote failure and is never retried.
    #[error("gateway connection is shutting down")]
    PartialDisconnect,

    /// Any other fault: I/O errors, heartbeat timeouts, decode failures, ...
    #[error("gateway fault: {0}")]
    Generic(#[source] Arc<dyn StdError + Send + Sync>),
}

impl FailureCause {
    /// Wraps a protocol close status.
    pub fn close(status: CloseStatus) -> Self {
        Self::ProtocolClose(status)
    }

    /// Wraps any error as a generic fault.
    pub fn generic<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Generic(Arc::new(error))
    }

    /// Builds a generic fault from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Generic(Arc::new(FaultMessage(message.into())))
    }

    /// Returns the close status for protocol closes.
    pub fn close_status(&self) -> Option<&CloseStatus> {
        match self {
            Self::ProtocolClose(status) => Some(status),
            _ => None,
        }
    }

    /// Returns `true` if another connection attempt may be made.
    ///
    /// Protocol closes are retryable unless their code is listed in
    /// `non_retryable_codes`. Partial disconnects are never retryable; every
    /// other fault is.
    pub fn is_retryable(&self, non_retryable_codes: &[u16]) -> bool {
        match self {
            Self::ProtocolClose(status) => !non_retryable_codes.contains(&status.code()),
            Self::PartialDisconnect => false,
            Self::InvalidSession | Self::Generic(_) => true,
        }
    }

    /// Returns `true` if the session can be resumed rather than re-identified.
    ///
    /// Websocket-layer closes (`< 4000`) are resumable, gateway-specific
    /// closes are not. An invalidated session is never resumable; anything
    /// else is.
    pub fn can_resume(&self) -> bool {
        match self {
            Self::ProtocolClose(status) => status.code() < GATEWAY_CODE_THRESHOLD,
            Self::InvalidSession => false,
            Self::PartialDisconnect | Self::Generic(_) => true,
        }
    }

    /// Returns `true` if the server forced a fresh session.
    pub const fn invalidates_session(&self) -> bool {
        matches!(self, Self::InvalidSession)
    }
}

impl From<CloseStatus> for FailureCause {
    fn from(status: CloseStatus) -> Self {
        Self::ProtocolClose(status)
    }
}

impl From<std::io::Error> for FailureCause {
    fn from(error: std::io::Error) -> Self {
        Self::generic(error)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct FaultMessage(String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::close::NON_RETRYABLE_STATUS_CODES;
    use std::io;

    #[test]
    fn test_non_retryable_close_codes() {
        for code in NON_RETRYABLE_STATUS_CODES {
            let cause = FailureCause::close(CloseStatus::from_code(code));
            assert!(!cause.is_retryable(&NON_RETRYABLE_STATUS_CODES));
        }
    }

    #[test]
    fn test_other_close_codes_are_retryable() {
        for code in [1000, 1001, 1006, 4000, 4007, 4009] {
            let cause = FailureCause::close(CloseStatus::from_code(code));
            assert!(cause.is_retryable(&NON_RETRYABLE_STATUS_CODES), "code {code}");
        }
    }

    #[test]
    fn test_empty_code_list_retries_everything_but_partial_disconnect() {
        let cause = FailureCause::close(CloseStatus::from_code(4004));
        assert!(cause.is_retryable(&[]));
        assert!(!FailureCause::PartialDisconnect.is_retryable(&[]));
    }

    #[test]
    fn test_faults_are_retryable() {
        assert!(FailureCause::InvalidSession.is_retryable(&NON_RETRYABLE_STATUS_CODES));
        assert!(FailureCause::message("heartbeat timeout").is_retryable(&NON_RETRYABLE_STATUS_CODES));
        assert!(!FailureCause::PartialDisconnect.is_retryable(&NON_RETRYABLE_STATUS_CODES));
    }

    #[test]
    fn test_resumability() {
        assert!(FailureCause::close(CloseStatus::ABNORMAL_CLOSE).can_resume());
        assert!(FailureCause::close(CloseStatus::from_code(3999)).can_resume());
        assert!(!FailureCause::close(CloseStatus::from_code(4000)).can_resume());
        assert!(!FailureCause::InvalidSession.can_resume());

        let io_error = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(FailureCause::from(io_error).can_resume());
    }

    #[test]
    fn test_display_and_source() {
        let cause = FailureCause::close(CloseStatus::new(4009, "Session timed out"));
        assert_eq!(
            cause.to_string(),
            "gateway closed with status 4009 (Session timed out)"
        );
        assert_eq!(cause.close_status().map(CloseStatus::code), Some(4009));

        let cause = FailureCause::message("zlib stream corrupted");
        assert_eq!(cause.to_string(), "gateway fault: zlib stream corrupted");
        assert!(cause.source().is_some());
    }
}
