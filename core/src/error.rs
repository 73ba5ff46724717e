//! Errors raised while registering or running chain handlers.

use thiserror::Error;

/// Errors that can occur while building or running an [`ActionChain`](crate::chain::ActionChain).
///
/// Only [`ChainError::InvalidHandlerResult`] is raised during dispatch.
/// Everything else a handler does wrong (panicking, a pending action that
/// never resolves, the host's dispatch failing) is left to the caller.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A derivation handler returned no action.
    ///
    /// Derivation handlers must produce an action or a pending action.
    /// Handlers that only perform effects should be registered with
    /// [`attach`](crate::handler::attach).
    #[error(
        "handler for `{action_type}` must return an action or a pending action; \
         use attach() for side-effect handlers"
    )]
    InvalidHandlerResult {
        /// Type of the action that triggered the handler
        action_type: String,
    },

    /// A side-effect handler was invoked without a middleware context.
    #[error("side-effect handler for `{action_type}` requires a middleware context")]
    MissingContext {
        /// Type of the action that triggered the handler
        action_type: String,
    },

    /// A chain target resolved to an empty action type.
    #[error("chain target resolved to an empty action type")]
    EmptyActionType,

    /// An action payload could not be converted to or from JSON.
    #[error("failed to convert action payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ChainError {
    /// Check if this is an invalid handler result error
    #[must_use]
    pub const fn is_invalid_handler_result(&self) -> bool {
        matches!(self, Self::InvalidHandlerResult { .. })
    }
}
