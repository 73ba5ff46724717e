//! Traits describing the host dispatch pipeline
//!
//! The chain does not own a store or a dispatch loop. The host supplies both
//! through these traits:
//!
//! - [`MiddlewareApi`]: the per-action context (dispatch a new action, read state)
//! - [`Middleware`]: a stage wrapped around the host's `next` dispatcher

/// Capabilities the host pipeline hands to middleware for each action.
///
/// The chain never constructs a context. It receives one, passes it to
/// side-effect handlers and uses it to forward produced actions.
pub trait MiddlewareApi<A> {
    /// Snapshot type returned by [`get_state`](Self::get_state)
    type State;

    /// Value returned by [`dispatch`](Self::dispatch)
    type Output;

    /// Dispatch an action through the full pipeline
    fn dispatch(&self, action: A) -> Self::Output;

    /// Read the current state
    fn get_state(&self) -> Self::State;
}

/// A stage in the host's dispatch pipeline.
///
/// `handle` receives the context, the action, and `next`, the remainder of the
/// pipeline. Implementations decide when to call `next` and what to return.
pub trait Middleware<A, Api: MiddlewareApi<A>> {
    /// Error raised by this middleware
    type Error;

    /// Process one action
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn handle<N>(&self, api: &Api, action: A, next: N) -> Result<Api::Output, Self::Error>
    where
        N: FnOnce(A) -> Api::Output;
}
