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

//! Retry decisions for gateway sessions.
//!
//! When a gateway connection ends abnormally, the [`RetryEngine`] decides
//! whether to retry, whether the retry resumes the existing session or
//! starts a new one, and how long to wait first.
//!
//! # Building Blocks
//!
//! - [`compute_backoff`] and [`compute_jitter`]: bounded exponential delays
//! - [`ReconnectContext`]: the attempt counter shared with the connection
//! - [`RetryPolicy`]: immutable configuration, built with [`RetryPolicy::builder`]
//! - [`HookChain`]: ordered side effects run before each retry
//! - [`RetryPipeline`]: runs an engine on its own task, one failure at a time
//!
//! # Examples
//!
//! ```
//! use gateway_retry::reconnection::{ReconnectContext, RetryEngine, RetryPolicy, hook_fn};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .first_backoff(Duration::from_secs(2))
//!     .max_backoff_interval(Duration::from_secs(120))
//!     .max_retries(5)
//!     .jitter_factor(0.1)
//!     .build()
//!     .unwrap();
//!
//! let engine = RetryEngine::new(policy, ReconnectContext::new())
//!     .do_before_retry(hook_fn(|signal| async move {
//!         println!("{signal}");
//!         Ok(())
//!     }));
//! assert_eq!(engine.hooks().len(), 1);
//! ```

mod backoff;
mod context;
mod engine;
mod error;
mod hooks;
mod pipeline;
mod policy;
mod scheduler;
mod signal;

pub use backoff::{apply_jitter, compute_backoff, compute_jitter};
pub use context::{INITIAL_ATTEMPT, ReconnectContext};
pub use engine::RetryEngine;
pub use error::{HookError, PolicyError, RetryError};
pub use hooks::{FnHook, HookChain, PreRetryHook, hook_fn};
pub use pipeline::RetryPipeline;
pub use policy::{RetryPolicy, RetryPolicyBuilder, RetrySettings};
pub use scheduler::{Scheduler, TokioScheduler};
pub use signal::RetrySignal;
