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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Architecture
//!
//! The crate is organized in three layers:
//!
//! - **[`gateway`]**: what the transport reports (failure causes, close
//!   statuses) and the connection runtime that drives a session
//! - **[`reconnection`]**: the retry engine, its policy, backoff arithmetic,
//!   attempt counter and pre-retry hooks
//! - **[`observability`]**: retry counters and structured logging
//!
//! # Retry Semantics
//!
//! | Failure                         | Retryable | Next attempt                 |
//! |---------------------------------|-----------|------------------------------|
//! | close code `< 4000`             | yes       | resume                       |
//! | close code `>= 4000`            | unless listed non-retryable | fresh handshake |
//! | invalid session                 | yes       | fresh handshake, budget reset |
//! | partial disconnect              | never     |                              |
//! | any other fault                 | yes       | resume                       |
//!
//! The first resume of an outage happens immediately; every other retry
//! waits for a jittered, bounded exponential backoff.
//!
//! # Feature Flags
//!
//! - `tracing`: structured logging through the `tracing` crate
//! - `observability` (default): `tracing` plus counters exported through the
//!   `metrics` crate
//! - `serde` (default): serialization for settings and state types

pub mod error;
pub mod gateway;
pub mod observability;
pub mod reconnection;

pub use error::GatewayError;
pub use gateway::{
    CloseStatus, ConnectionState, FailureCause, GatewayConnector, GatewayRuntime, StateChange,
};
pub use observability::{RetryMetrics, log_retry_error};
pub use reconnection::{ReconnectContext, RetryEngine, RetryError, RetryPolicy, RetrySignal};
