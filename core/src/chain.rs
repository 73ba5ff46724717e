//! The action chain registry
//!
//! An [`ActionChain`] is an ordered list of `(action type, handler)` cases.
//! For every action passing through the host pipeline the chain selects the
//! cases registered for the action's type and runs their handlers in
//! registration order. Actions produced by derivation handlers are forwarded
//! to the middleware context's `dispatch`, either immediately or once their
//! pending future resolves.
//!
//! # Example
//!
//! ```
//! use action_chain_core::{attach, ActionChain, FluxAction, MiddlewareApi};
//! use serde_json::Value;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone, Default)]
//! struct Api(Arc<Mutex<Vec<String>>>);
//!
//! impl MiddlewareApi<FluxAction> for Api {
//!     type State = ();
//!     type Output = ();
//!
//!     fn dispatch(&self, action: FluxAction) {
//!         self.0.lock().unwrap().push(action.action_type);
//!     }
//!
//!     fn get_state(&self) {}
//! }
//!
//! let chain = ActionChain::<FluxAction, Api>::new()
//!     .chain("PING", |_: &Value, _: &FluxAction| FluxAction::new("PONG"))
//!     .chain("PING", attach(|_: &FluxAction, api: &Api| api.dispatch(FluxAction::new("SEEN"))));
//!
//! let api = Api::default();
//! let forwards = chain.dispatch(&FluxAction::new("PING"), &api).unwrap();
//!
//! assert_eq!(forwards.len(), 1);
//! assert_eq!(*api.0.lock().unwrap(), vec!["PONG".to_string(), "SEEN".to_string()]);
//! ```

use crate::action::{resolve_type, Action, ChainTarget};
use crate::error::ChainError;
use crate::handler::{Handler, IntoHandler, NextAction};
use crate::middleware::MiddlewareApi;
use futures::future::BoxFuture;
use smallvec::SmallVec;
use std::fmt;

/// Policy for derivation handlers that return no action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyResultPolicy {
    /// Fail with [`ChainError::InvalidHandlerResult`]
    #[default]
    Reject,

    /// Treat the handler as having produced nothing
    Ignore,
}

/// One registered `(action type, handler)` pair
pub struct Case<A: Action, Api> {
    action_type: String,
    handler: Handler<A, Api>,
}

impl<A: Action, Api> Case<A, Api> {
    /// The action type this case matches
    #[must_use]
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// The registered handler
    #[must_use]
    pub const fn handler(&self) -> &Handler<A, Api> {
        &self.handler
    }
}

impl<A: Action, Api> Clone for Case<A, Api> {
    fn clone(&self) -> Self {
        Self {
            action_type: self.action_type.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<A: Action, Api> fmt::Debug for Case<A, Api> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("action_type", &self.action_type)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Outcome of forwarding one produced action to the middleware context
#[must_use = "pending forwards do nothing unless awaited"]
pub enum Forward<O> {
    /// The action was dispatched immediately; holds the dispatch's return value
    Dispatched(O),

    /// The action is still pending; the future dispatches it once resolved
    Pending(BoxFuture<'static, O>),
}

impl<O> Forward<O> {
    /// Check if the forward is still pending
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for the forward to complete and return the dispatch's value
    pub async fn settle(self) -> O {
        match self {
            Self::Dispatched(output) => output,
            Self::Pending(future) => future.await,
        }
    }
}

// Manual Debug implementation since BoxFuture doesn't implement Debug
impl<O: fmt::Debug> fmt::Debug for Forward<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched(output) => f.debug_tuple("Forward::Dispatched").field(output).finish(),
            Self::Pending(_) => write!(f, "Forward::Pending(<future>)"),
        }
    }
}

/// Wait for every forward, returning the dispatch values in order.
pub async fn settle_all<O>(forwards: Vec<Forward<O>>) -> Vec<O> {
    futures::future::join_all(forwards.into_iter().map(Forward::settle)).await
}

/// Ordered registry of `(action type, handler)` cases.
///
/// The case list only grows. Build it once during setup and share it
/// read-only afterwards; cloning is cheap since handlers are reference counted.
///
/// # Type Parameters
///
/// - `A`: The action type
/// - `Api`: The middleware context handed to side-effect handlers and used
///   to forward produced actions
pub struct ActionChain<A: Action, Api> {
    cases: Vec<Case<A, Api>>,
    empty_results: EmptyResultPolicy,
}

impl<A: Action, Api> ActionChain<A, Api> {
    /// Create an empty chain
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cases: Vec::new(),
            empty_results: EmptyResultPolicy::Reject,
        }
    }

    /// Set the policy for derivation handlers that return no action
    #[must_use]
    pub fn with_empty_result_policy(mut self, policy: EmptyResultPolicy) -> Self {
        self.empty_results = policy;
        self
    }

    /// The policy for derivation handlers that return no action
    #[must_use]
    pub const fn empty_result_policy(&self) -> EmptyResultPolicy {
        self.empty_results
    }

    /// Register `handler` for actions of the type resolved from `target`.
    ///
    /// `target` is a type string or an action creator (see [`ChainTarget`]).
    /// `handler` is a derivation closure or an already wrapped [`Handler`],
    /// typically from [`attach`](crate::handler::attach).
    #[must_use]
    pub fn chain<T, H>(mut self, target: &T, handler: H) -> Self
    where
        T: ChainTarget + ?Sized,
        H: IntoHandler<A, Api>,
    {
        self.cases.push(Case {
            action_type: resolve_type(target),
            handler: handler.into_handler(),
        });
        self
    }

    /// Like [`chain`](Self::chain), but rejects targets resolving to an empty type.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyActionType`] if the resolved type is empty.
    pub fn try_chain<T, H>(self, target: &T, handler: H) -> Result<Self, ChainError>
    where
        T: ChainTarget + ?Sized,
        H: IntoHandler<A, Api>,
    {
        if resolve_type(target).is_empty() {
            return Err(ChainError::EmptyActionType);
        }
        Ok(self.chain(target, handler))
    }

    /// Handlers registered for the action's type, in registration order
    #[must_use]
    pub fn get(&self, action: &A) -> SmallVec<[&Handler<A, Api>; 4]> {
        let action_type = action.action_type();
        self.cases
            .iter()
            .filter(|case| case.action_type == action_type)
            .map(|case| &case.handler)
            .collect()
    }

    /// Run every matching handler and collect what they produced.
    ///
    /// Empty results are left out, so the returned list may be shorter than
    /// the number of matching handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidHandlerResult`] as soon as a derivation
    /// handler produces nothing (unless [`EmptyResultPolicy::Ignore`] is set).
    /// Handlers that already ran keep their effects.
    pub fn handle(&self, action: &A, api: &Api) -> Result<Vec<NextAction<A>>, ChainError> {
        let mut results = Vec::new();
        for handler in self.get(action) {
            let next = self.run(handler, action, api)?;
            if !next.is_none() {
                results.push(next);
            }
        }
        Ok(results)
    }

    /// Run every matching handler and forward what they produced to `api`.
    ///
    /// Concrete actions are dispatched before this returns. Pending actions
    /// come back as [`Forward::Pending`]; the future dispatches the action once
    /// it resolves and must be driven by the caller (see [`settle_all`]).
    ///
    /// # Errors
    ///
    /// Same as [`handle`](Self::handle).
    pub fn dispatch(&self, action: &A, api: &Api) -> Result<Vec<Forward<Api::Output>>, ChainError>
    where
        A: Send + 'static,
        Api: MiddlewareApi<A> + Clone + Send + 'static,
        Api::Output: Send + 'static,
    {
        let mut forwards = Vec::new();
        for handler in self.get(action) {
            match self.run(handler, action, api)? {
                NextAction::None => {},
                NextAction::Ready(next) => forwards.push(Forward::Dispatched(api.dispatch(next))),
                NextAction::Pending(future) => {
                    let api = api.clone();
                    forwards.push(Forward::Pending(Box::pin(async move {
                        let next = future.await;
                        api.dispatch(next)
                    })));
                },
            }
        }
        Ok(forwards)
    }

    fn run(&self, handler: &Handler<A, Api>, action: &A, api: &Api) -> Result<NextAction<A>, ChainError> {
        match handler.handle_with(action, api) {
            Err(ChainError::InvalidHandlerResult { .. })
                if self.empty_results == EmptyResultPolicy::Ignore =>
            {
                Ok(NextAction::None)
            },
            result => result,
        }
    }

    /// Combine chains into a new one.
    ///
    /// Cases are concatenated in the order the chains are given, each keeping
    /// its internal order. The sources are left untouched and the result uses
    /// the default [`EmptyResultPolicy`].
    #[must_use]
    pub fn build<'a, I>(chains: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        Self {
            cases: chains
                .into_iter()
                .flat_map(|chain| chain.cases.iter().cloned())
                .collect(),
            empty_results: EmptyResultPolicy::default(),
        }
    }

    /// All registered cases, in registration order
    #[must_use]
    pub fn cases(&self) -> &[Case<A, Api>] {
        &self.cases
    }

    /// Registered action types, in registration order (duplicates included)
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(Case::action_type)
    }

    /// Number of registered cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Check if no cases are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Combine chains into a new one. See [`ActionChain::build`].
#[must_use]
pub fn combine_action_chains<'a, A, Api, I>(chains: I) -> ActionChain<A, Api>
where
    A: Action + 'a,
    Api: 'a,
    I: IntoIterator<Item = &'a ActionChain<A, Api>>,
{
    ActionChain::build(chains)
}

impl<A: Action, Api> Default for ActionChain<A, Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action, Api> Clone for ActionChain<A, Api> {
    fn clone(&self) -> Self {
        Self {
            cases: self.cases.clone(),
            empty_results: self.empty_results,
        }
    }
}

impl<A: Action, Api> fmt::Debug for ActionChain<A, Api> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionChain")
            .field("types", &self.types().collect::<Vec<_>>())
            .field("empty_results", &self.empty_results)
            .finish()
    }
}
