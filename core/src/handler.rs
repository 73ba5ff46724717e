//! Handler wrappers
//!
//! Handlers come in two shapes, and [`Handler`] presents both through one
//! invocation contract:
//!
//! - **Derivation** handlers ([`derive`]) compute the next action from the
//!   triggering action's payload. They must return an action or a pending
//!   action.
//! - **Side-effect** handlers ([`attach`]) receive the triggering action and the
//!   middleware context, perform their effects directly, and produce nothing for
//!   the chain to forward.
//!
//! # Example
//!
//! ```
//! use action_chain_core::handler::{attach, derive, Handler, HandlerKind};
//! use action_chain_core::FluxAction;
//! use serde_json::Value;
//!
//! let next: Handler<FluxAction, ()> =
//!     derive(|payload: &Value, _action: &FluxAction| FluxAction::new("NEXT").with_payload(payload.clone()));
//! assert_eq!(next.kind(), HandlerKind::Derive);
//!
//! let effect: Handler<FluxAction, ()> = attach(|_action: &FluxAction, _api: &()| {});
//! assert_eq!(effect.kind(), HandlerKind::Attach);
//! ```

use crate::action::Action;
use crate::error::ChainError;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Shared derivation function: `(payload, action) -> next action`
pub type DeriveFn<A> =
    Arc<dyn Fn(&<A as Action>::Payload, &A) -> NextAction<A> + Send + Sync>;

/// Shared side-effect function: `(action, context)`
pub type AttachFn<A, Api> = Arc<dyn Fn(&A, &Api) + Send + Sync>;

/// What a handler produced for the chain to forward.
pub enum NextAction<A> {
    /// Nothing to forward
    None,

    /// A concrete next action
    Ready(A),

    /// An action that becomes available once the future resolves
    Pending(BoxFuture<'static, A>),
}

impl<A> NextAction<A> {
    /// Wrap a future resolving to the next action
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    /// Check if nothing was produced
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Check if the next action is still pending
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Take the concrete action, if there is one
    #[must_use]
    pub fn into_ready(self) -> Option<A> {
        match self {
            Self::Ready(action) => Some(action),
            Self::None | Self::Pending(_) => None,
        }
    }

    /// Wait for the next action, if any was produced
    pub async fn resolve(self) -> Option<A> {
        match self {
            Self::None => None,
            Self::Ready(action) => Some(action),
            Self::Pending(future) => Some(future.await),
        }
    }
}

impl<A> From<A> for NextAction<A> {
    fn from(action: A) -> Self {
        Self::Ready(action)
    }
}

impl<A> From<Option<A>> for NextAction<A> {
    fn from(action: Option<A>) -> Self {
        action.map_or(Self::None, Self::Ready)
    }
}

// Manual Debug implementation since BoxFuture doesn't implement Debug
impl<A: fmt::Debug> fmt::Debug for NextAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NextAction::None"),
            Self::Ready(action) => f.debug_tuple("NextAction::Ready").field(action).finish(),
            Self::Pending(_) => write!(f, "NextAction::Pending(<future>)"),
        }
    }
}

/// Which shape a [`Handler`] was declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Computes the next action from the payload
    Derive,

    /// Performs effects through the middleware context
    Attach,
}

/// A handler registered in an [`ActionChain`](crate::chain::ActionChain).
///
/// # Type Parameters
///
/// - `A`: The action type
/// - `Api`: The middleware context side-effect handlers receive
pub enum Handler<A: Action, Api> {
    /// Derivation handler
    Derive(DeriveFn<A>),

    /// Side-effect handler
    Attach(AttachFn<A, Api>),
}

impl<A: Action, Api> Handler<A, Api> {
    /// Wrap a derivation function
    ///
    /// The function receives the action's payload and the action itself.
    /// Anything convertible into a [`NextAction`] may be returned: an action,
    /// an `Option` of one, or a [`NextAction`] directly.
    pub fn derive<F, R>(f: F) -> Self
    where
        F: Fn(&A::Payload, &A) -> R + Send + Sync + 'static,
        R: Into<NextAction<A>>,
    {
        Self::Derive(Arc::new(
            move |payload: &A::Payload, action: &A| -> NextAction<A> { f(payload, action).into() },
        ))
    }

    /// Wrap a side-effect function
    pub fn attach<F>(f: F) -> Self
    where
        F: Fn(&A, &Api) + Send + Sync + 'static,
    {
        Self::Attach(Arc::new(f))
    }

    /// The shape this handler was declared with
    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        match self {
            Self::Derive(_) => HandlerKind::Derive,
            Self::Attach(_) => HandlerKind::Attach,
        }
    }

    /// The wrapped derivation function, if this is a derivation handler
    #[must_use]
    pub const fn derive_fn(&self) -> Option<&DeriveFn<A>> {
        match self {
            Self::Derive(f) => Some(f),
            Self::Attach(_) => None,
        }
    }

    /// The wrapped side-effect function, if this is a side-effect handler
    #[must_use]
    pub const fn attach_fn(&self) -> Option<&AttachFn<A, Api>> {
        match self {
            Self::Attach(f) => Some(f),
            Self::Derive(_) => None,
        }
    }

    /// Invoke the handler without a middleware context
    ///
    /// # Errors
    ///
    /// - [`ChainError::InvalidHandlerResult`]: a derivation handler produced nothing
    /// - [`ChainError::MissingContext`]: this is a side-effect handler
    pub fn handle(&self, action: &A) -> Result<NextAction<A>, ChainError> {
        match self {
            Self::Derive(f) => derive_next(f, action),
            Self::Attach(_) => Err(ChainError::MissingContext {
                action_type: action.action_type().to_owned(),
            }),
        }
    }

    /// Invoke the handler with a middleware context
    ///
    /// Side-effect handlers always produce [`NextAction::None`].
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidHandlerResult`] if a derivation handler
    /// produced nothing.
    pub fn handle_with(&self, action: &A, api: &Api) -> Result<NextAction<A>, ChainError> {
        match self {
            Self::Derive(f) => derive_next(f, action),
            Self::Attach(f) => {
                f(action, api);
                Ok(NextAction::None)
            },
        }
    }
}

fn derive_next<A: Action>(f: &DeriveFn<A>, action: &A) -> Result<NextAction<A>, ChainError> {
    let next = f(action.payload(), action);
    if next.is_none() {
        return Err(ChainError::InvalidHandlerResult {
            action_type: action.action_type().to_owned(),
        });
    }
    Ok(next)
}

impl<A: Action, Api> Clone for Handler<A, Api> {
    fn clone(&self) -> Self {
        match self {
            Self::Derive(f) => Self::Derive(Arc::clone(f)),
            Self::Attach(f) => Self::Attach(Arc::clone(f)),
        }
    }
}

impl<A: Action, Api> fmt::Debug for Handler<A, Api> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derive(_) => write!(f, "Handler::Derive(<fn>)"),
            Self::Attach(_) => write!(f, "Handler::Attach(<fn>)"),
        }
    }
}

/// Wrap a derivation function as a [`Handler`].
///
/// Bare closures passed to [`ActionChain::chain`](crate::chain::ActionChain::chain)
/// are wrapped this way automatically.
pub fn derive<A, Api, F, R>(f: F) -> Handler<A, Api>
where
    A: Action,
    F: Fn(&A::Payload, &A) -> R + Send + Sync + 'static,
    R: Into<NextAction<A>>,
{
    Handler::derive(f)
}

/// Wrap a side-effect function as a [`Handler`].
///
/// The function receives the triggering action and the middleware context.
/// Whatever it does, the chain never forwards anything on its behalf.
pub fn attach<A, Api, F>(f: F) -> Handler<A, Api>
where
    A: Action,
    F: Fn(&A, &Api) + Send + Sync + 'static,
{
    Handler::attach(f)
}

/// Conversion into a [`Handler`].
///
/// Implemented for handlers themselves and for derivation closures of the
/// form `Fn(&Payload, &Action) -> impl Into<NextAction<Action>>`. Closure
/// parameters need explicit reference types so the closure is general over
/// their lifetimes.
pub trait IntoHandler<A: Action, Api> {
    /// Perform the conversion
    fn into_handler(self) -> Handler<A, Api>;
}

impl<A: Action, Api> IntoHandler<A, Api> for Handler<A, Api> {
    fn into_handler(self) -> Handler<A, Api> {
        self
    }
}

impl<A, Api, F, R> IntoHandler<A, Api> for F
where
    A: Action,
    F: Fn(&A::Payload, &A) -> R + Send + Sync + 'static,
    R: Into<NextAction<A>>,
{
    fn into_handler(self) -> Handler<A, Api> {
        Handler::derive(self)
    }
}
