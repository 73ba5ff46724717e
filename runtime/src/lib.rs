//! # Action Chain Runtime
//!
//! Runs an [`ActionChain`] as a stage of a host dispatch pipeline.
//!
//! ## Core Components
//!
//! - **`ActionChainMiddleware`**: Calls the host's `next`, then runs the chain
//!   for the same action and forwards what the handlers produced
//! - **Pending forwards**: Spawned onto tokio so they complete without the host
//!   awaiting them ([`ForwardHandle`] lets callers wait anyway)
//! - **`MiddlewareConfig`**: Runtime handle and metrics settings
//!
//! ## Example
//!
//! ```ignore
//! use action_chain_core::{ActionChain, FluxAction, Middleware};
//! use action_chain_runtime::create_action_chain_middleware;
//!
//! let middleware = create_action_chain_middleware(
//!     ActionChain::new().chain("PING", |_: &Value, _: &FluxAction| FluxAction::new("PONG")),
//! );
//!
//! // Inside the host pipeline, once per action:
//! let result = middleware.handle(&api, action, |action| reducer_dispatch(action))?;
//! ```

use action_chain_core::{Action, ActionChain, BoxFuture, Forward, HandlerKind, Middleware, MiddlewareApi};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Error types for the middleware runtime
pub mod error {
    use action_chain_core::ChainError;
    use thiserror::Error;

    /// Errors that can occur while running the chain middleware
    #[derive(Error, Debug)]
    pub enum MiddlewareError {
        /// A chain handler failed
        ///
        /// The host's `next` has already run when this is returned.
        #[error(transparent)]
        Chain(#[from] ChainError),

        /// A derivation handler matched but no tokio runtime is reachable
        ///
        /// Nothing ran: neither the host's `next` nor any handler.
        /// Configure one with [`MiddlewareConfig::with_runtime`](crate::MiddlewareConfig::with_runtime)
        /// when the host dispatches from outside a runtime.
        #[error("No tokio runtime available to drive pending forwards")]
        NoRuntime,

        /// A spawned forward task failed
        ///
        /// This typically means the host's dispatch panicked.
        #[error("Pending forward task failed: {0}")]
        TaskJoin(#[from] tokio::task::JoinError),
    }
}

pub use error::MiddlewareError;

/// Configuration for [`ActionChainMiddleware`]
///
/// # Example
///
/// ```ignore
/// let config = MiddlewareConfig::default()
///     .with_runtime(tokio::runtime::Handle::current())
///     .with_metrics(false);
///
/// let middleware = ActionChainMiddleware::with_config(chain, config);
/// ```
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    /// Runtime pending forwards are spawned on (defaults to the current runtime)
    pub runtime: Option<Handle>,
    /// Whether to record `action_chain.*` counters
    pub record_metrics: bool,
}

impl MiddlewareConfig {
    /// Create a configuration with default values
    #[must_use]
    pub const fn new() -> Self {
        Self {
            runtime: None,
            record_metrics: true,
        }
    }

    /// Spawn pending forwards on `runtime` instead of the current one
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Enable or disable metrics recording
    #[must_use]
    pub const fn with_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the pending forwards spawned for one action
///
/// Dropping the handle detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct ForwardHandle<O> {
    tasks: Vec<JoinHandle<O>>,
}

impl<O> ForwardHandle<O> {
    /// A handle with nothing to wait for
    #[must_use]
    pub const fn completed() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Number of spawned forwards
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no forwards were spawned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every spawned forward and return the dispatch values
    ///
    /// # Errors
    ///
    /// Returns [`MiddlewareError::TaskJoin`] if a forward task panicked.
    pub async fn wait(self) -> Result<Vec<O>, MiddlewareError> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            outputs.push(task.await?);
        }
        Ok(outputs)
    }
}

/// Middleware stage running an [`ActionChain`].
///
/// For every action: the host's `next` runs first, then the chain dispatches
/// the same action against the context. The host's own result is returned;
/// the chain's forwards are not observed by the pipeline.
///
/// # Type Parameters
///
/// - `A`: Action type
/// - `Api`: Middleware context supplied by the host
pub struct ActionChainMiddleware<A: Action, Api> {
    chain: Arc<ActionChain<A, Api>>,
    config: MiddlewareConfig,
}

impl<A: Action, Api> ActionChainMiddleware<A, Api> {
    /// Wrap a chain with default configuration
    #[must_use]
    pub fn new(chain: ActionChain<A, Api>) -> Self {
        Self::with_config(chain, MiddlewareConfig::default())
    }

    /// Wrap a chain with custom configuration
    #[must_use]
    pub fn with_config(chain: ActionChain<A, Api>, config: MiddlewareConfig) -> Self {
        Self {
            chain: Arc::new(chain),
            config,
        }
    }

    /// The wrapped chain
    #[must_use]
    pub fn chain(&self) -> &ActionChain<A, Api> {
        &self.chain
    }

    /// The middleware configuration
    #[must_use]
    pub const fn config(&self) -> &MiddlewareConfig {
        &self.config
    }
}

impl<A, Api> ActionChainMiddleware<A, Api>
where
    A: Action + Clone + Send + 'static,
    Api: MiddlewareApi<A> + Clone + Send + 'static,
    Api::Output: Send + 'static,
{
    /// Run `next`, then the chain, returning pending forwards unspawned.
    ///
    /// Concrete actions produced by handlers have already been dispatched when
    /// this returns. The pending futures dispatch their action once driven.
    ///
    /// # Errors
    ///
    /// Returns [`MiddlewareError::Chain`] if a handler failed.
    #[tracing::instrument(skip_all, name = "action_chain", fields(action_type = action.action_type()))]
    pub fn handle_collect<N>(
        &self,
        api: &Api,
        action: A,
        next: N,
    ) -> Result<(Api::Output, Vec<BoxFuture<'static, Api::Output>>), MiddlewareError>
    where
        N: FnOnce(A) -> Api::Output,
    {
        let result = next(action.clone());

        tracing::trace!("Host pipeline handled action, running chain");
        let forwards = self.chain.dispatch(&action, api)?;

        let mut dispatched = 0_u64;
        let mut pending = Vec::new();
        for forward in forwards {
            match forward {
                Forward::Dispatched(_) => dispatched += 1,
                Forward::Pending(future) => pending.push(future),
            }
        }

        tracing::debug!(dispatched, pending = pending.len(), "Chain forwarded actions");
        if self.config.record_metrics {
            metrics::counter!("action_chain.actions.processed").increment(1);
            metrics::counter!("action_chain.forwards", "mode" => "dispatched").increment(dispatched);
            metrics::counter!("action_chain.forwards", "mode" => "pending")
                .increment(pending.len() as u64);
        }

        Ok((result, pending))
    }

    /// Run `next`, then the chain, spawning pending forwards.
    ///
    /// When a derivation handler matches, the runtime is resolved before
    /// anything runs, so a missing runtime leaves the host and the context
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`MiddlewareError::Chain`]: A handler failed
    /// - [`MiddlewareError::NoRuntime`]: A derivation handler matched outside a runtime
    pub fn handle_tracked<N>(
        &self,
        api: &Api,
        action: A,
        next: N,
    ) -> Result<(Api::Output, ForwardHandle<Api::Output>), MiddlewareError>
    where
        N: FnOnce(A) -> Api::Output,
    {
        let runtime = if self.may_produce_pending(&action) {
            Some(self.runtime()?)
        } else {
            None
        };

        let action_type = action.action_type().to_owned();
        let (result, pending) = self.handle_collect(api, action, next)?;

        // Only derivation handlers produce pending forwards
        let tasks = match runtime {
            Some(runtime) => pending
                .into_iter()
                .map(|future| {
                    let span = tracing::trace_span!("pending_forward", action_type = %action_type);
                    runtime.spawn(future.instrument(span))
                })
                .collect(),
            None => Vec::new(),
        };

        Ok((result, ForwardHandle { tasks }))
    }

    fn may_produce_pending(&self, action: &A) -> bool {
        self.chain
            .get(action)
            .iter()
            .any(|handler| handler.kind() == HandlerKind::Derive)
    }

    fn runtime(&self) -> Result<Handle, MiddlewareError> {
        match &self.config.runtime {
            Some(runtime) => Ok(runtime.clone()),
            None => Handle::try_current().map_err(|_| {
                tracing::warn!("Derivation handler matched outside a tokio runtime");
                MiddlewareError::NoRuntime
            }),
        }
    }
}

impl<A, Api> Middleware<A, Api> for ActionChainMiddleware<A, Api>
where
    A: Action + Clone + Send + 'static,
    Api: MiddlewareApi<A> + Clone + Send + 'static,
    Api::Output: Send + 'static,
{
    type Error = MiddlewareError;

    fn handle<N>(&self, api: &Api, action: A, next: N) -> Result<Api::Output, MiddlewareError>
    where
        N: FnOnce(A) -> Api::Output,
    {
        // Dropping the handle detaches the forward tasks
        self.handle_tracked(api, action, next).map(|(result, _)| result)
    }
}

impl<A: Action, Api> Clone for ActionChainMiddleware<A, Api> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            config: self.config.clone(),
        }
    }
}

impl<A: Action, Api> std::fmt::Debug for ActionChainMiddleware<A, Api> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionChainMiddleware")
            .field("chain", &self.chain)
            .field("config", &self.config)
            .finish()
    }
}

/// Create a middleware stage running `chain` with default configuration.
#[must_use]
pub fn create_action_chain_middleware<A: Action, Api>(
    chain: ActionChain<A, Api>,
) -> ActionChainMiddleware<A, Api> {
    ActionChainMiddleware::new(chain)
}
