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

//! The gateway side of the retry boundary.
//!
//! This module holds everything the transport reports to the retry engine
//! and everything the engine reports back:
//!
//! - [`FailureCause`]: why a connection ended
//! - [`CloseStatus`] and [`DisconnectBehavior`]: how it ended
//! - [`ConnectionState`] and [`StateChange`]: what happens next
//! - [`GatewayRuntime`]: a connection loop wiring a [`GatewayConnector`] to
//!   the retry engine

mod close;
mod failure;
mod runtime;
mod state;

pub use close::{
    CloseStatus, DisconnectAction, DisconnectBehavior, GATEWAY_CODE_THRESHOLD,
    NON_RETRYABLE_STATUS_CODES,
};
pub use failure::FailureCause;
pub use runtime::{
    ConnectMode, ConnectionCycle, DEFAULT_STATE_CAPACITY, GatewayConnector, GatewayHandle,
    GatewayRuntime,
};
pub use state::{ConnectionState, StateChange};
