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

//! Pre-retry hooks.
//!
//! A hook runs after a retry has been decided and before its delay starts.
//! Hooks are the extension point for side effects such as publishing a
//! lifecycle event or tearing down a stale socket; the engine itself does no
//! I/O.
//!
//! # Examples
//!
//! ```rust
//! use gateway_retry::reconnection::{hook_fn, HookChain, HookError, RetrySignal};
//!
//! let chain = HookChain::new()
//!     .then(hook_fn(|signal: RetrySignal| async move {
//!         println!("retrying: {signal}");
//!         Ok(())
//!     }))
//!     .then(hook_fn(|_signal: RetrySignal| async move {
//!         Err(HookError::message("stale socket could not be closed"))
//!     }));
//!
//! assert_eq!(chain.len(), 2);
//! ```

use crate::reconnection::error::HookError;
use crate::reconnection::signal::RetrySignal;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// An asynchronous side effect run before each retry.
#[async_trait]
pub trait PreRetryHook: Send + Sync {
    /// Runs the side effect. An error aborts the retry.
    async fn before_retry(&self, signal: &RetrySignal) -> Result<(), HookError>;
}

#[async_trait]
impl<H> PreRetryHook for Arc<H>
where
    H: PreRetryHook + ?Sized,
{
    async fn before_retry(&self, signal: &RetrySignal) -> Result<(), HookError> {
        (**self).before_retry(signal).await
    }
}

/// A [`PreRetryHook`] backed by a closure. Created by [`hook_fn`].
pub struct FnHook<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Adapts a closure returning a future into a [`PreRetryHook`].
///
/// The closure receives its own clone of the signal so the returned future
/// can be `'static`.
pub fn hook_fn<F, Fut>(f: F) -> FnHook<F, Fut>
where
    F: Fn(RetrySignal) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send,
{
    FnHook {
        f,
        _future: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> PreRetryHook for FnHook<F, Fut>
where
    F: Fn(RetrySignal) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send,
{
    async fn before_retry(&self, signal: &RetrySignal) -> Result<(), HookError> {
        (self.f)(signal.clone()).await
    }
}

/// An ordered sequence of pre-retry hooks.
///
/// Hooks run strictly in registration order, each awaited to completion
/// before the next starts, all against the same signal. The first failure
/// stops the chain.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn PreRetryHook>>,
}

impl HookChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a chain with `hook` appended after every existing hook.
    pub fn then<H>(mut self, hook: H) -> Self
    where
        H: PreRetryHook + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Appends an already shared hook.
    pub fn then_shared(mut self, hook: Arc<dyn PreRetryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Appends every hook of `other`, keeping its order.
    pub fn append(mut self, other: HookChain) -> Self {
        self.hooks.extend(other.hooks);
        self
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in order, stopping at the first failure.
    pub async fn run(&self, signal: &RetrySignal) -> Result<(), HookError> {
        for hook in &self.hooks {
            hook.before_retry(signal).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
