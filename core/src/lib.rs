//! # Action Chain Core
//!
//! Declarative "when action X arrives, run handler Y" rules for Redux-style
//! dispatch pipelines.
//!
//! ## Core Concepts
//!
//! - **Action**: A type string plus a payload ([`Action`], [`FluxAction`])
//! - **Chain target**: What a rule is keyed on, a type string or an action creator ([`ChainTarget`])
//! - **Handler**: Either derives the next action from the payload, or performs
//!   effects through the middleware context ([`Handler`], [`attach`])
//! - **Chain**: Ordered registry of rules, run once per dispatched action ([`ActionChain`])
//! - **Middleware context**: The host's dispatch and state access ([`MiddlewareApi`])
//!
//! The host store, its reducers and its dispatch loop live outside this crate.
//! `action-chain-runtime` adapts a chain into a pipeline stage.
//!
//! ## Example
//!
//! ```
//! use action_chain_core::{attach, ActionChain, ActionCreator, FluxAction, NextAction};
//! use serde_json::Value;
//!
//! const LOGIN: ActionCreator<String> = ActionCreator::new("LOGIN");
//!
//! let chain = ActionChain::<FluxAction, ()>::new()
//!     .chain(&LOGIN, |user: &Value, _: &FluxAction| {
//!         FluxAction::new("LOAD_PROFILE").with_payload(user.clone())
//!     })
//!     .chain("LOAD_PROFILE", |user: &Value, _: &FluxAction| {
//!         let user = user.clone();
//!         NextAction::pending(async move { FluxAction::new("PROFILE_LOADED").with_payload(user) })
//!     })
//!     .chain("LOGOUT", attach(|_: &FluxAction, _: &()| {}));
//!
//! let action = LOGIN.create("ada".to_string()).unwrap();
//! assert_eq!(chain.get(&action).len(), 1);
//! ```

/// Actions and chain targets
pub mod action;

/// The chain registry
pub mod chain;

/// Error types
pub mod error;

/// Handler wrappers
pub mod handler;

/// Host pipeline traits
pub mod middleware;

pub use action::{resolve_type, Action, ActionCreator, ChainTarget, FluxAction};
pub use chain::{combine_action_chains, settle_all, ActionChain, Case, EmptyResultPolicy, Forward};
pub use error::ChainError;
pub use handler::{attach, derive, AttachFn, DeriveFn, Handler, HandlerKind, IntoHandler, NextAction};
pub use middleware::{Middleware, MiddlewareApi};

// Re-export commonly used types
pub use futures::future::BoxFuture;
pub use smallvec::{smallvec, SmallVec};
