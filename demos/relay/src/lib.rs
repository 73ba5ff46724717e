//! Relay example
//!
//! A minimal host dispatch pipeline with an action chain installed as
//! middleware. The host "reducer" only appends each action type to a log, which
//! makes the order in which the chain forwards actions easy to observe.

use action_chain_core::{
    attach, ActionChain, ActionCreator, FluxAction, Middleware, MiddlewareApi, NextAction,
};
use action_chain_runtime::{create_action_chain_middleware, ActionChainMiddleware, MiddlewareError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Request a record by id
pub const FETCH: ActionCreator<u32> = ActionCreator::new("FETCH");

/// Host state: the types of all reduced actions, in order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayState {
    /// Reduced action types
    pub log: Vec<String>,
}

struct Inner {
    state: Mutex<RelayState>,
    middleware: ActionChainMiddleware<FluxAction, Relay>,
}

/// The host pipeline and the context handed to chain handlers
///
/// Every dispatch, including those issued by handlers, runs the full pipeline:
/// the reducer first, then the chain.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<Inner>,
}

impl Relay {
    /// Create a pipeline with `chain` installed
    #[must_use]
    pub fn new(chain: ActionChain<FluxAction, Self>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RelayState::default()),
                middleware: create_action_chain_middleware(chain),
            }),
        }
    }

    /// Current reduced log
    #[must_use]
    pub fn log(&self) -> Vec<String> {
        self.state().log.clone()
    }

    fn state(&self) -> MutexGuard<'_, RelayState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reduce(&self, action: &FluxAction) -> usize {
        let mut state = self.state();
        state.log.push(action.action_type.clone());
        tracing::info!(action_type = %action.action_type, payload = %action.payload, "Reduced");
        state.log.len()
    }
}

impl MiddlewareApi<FluxAction> for Relay {
    type State = RelayState;
    type Output = Result<usize, MiddlewareError>;

    fn dispatch(&self, action: FluxAction) -> Self::Output {
        self.inner
            .middleware
            .handle(self, action, |action| Ok(self.reduce(&action)))?
    }

    fn get_state(&self) -> RelayState {
        self.state().clone()
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay").field("state", &*self.state()).finish()
    }
}

/// The chain used by the relay binary
///
/// - `PING` answers with `PONG`, carrying the same payload
/// - `PONG` is audited by a side-effect handler
/// - [`FETCH`] resolves asynchronously into `FETCHED`
#[must_use]
pub fn relay_chain() -> ActionChain<FluxAction, Relay> {
    ActionChain::new()
        .chain("PING", |payload: &Value, _: &FluxAction| {
            FluxAction::new("PONG").with_payload(payload.clone())
        })
        .chain(
            "PONG",
            attach(|action: &FluxAction, relay: &Relay| {
                let seen = relay.get_state().log.len();
                if let Err(error) = relay.dispatch(FluxAction::new("AUDIT").with_meta(json!({ "seen": seen }))) {
                    tracing::warn!(%error, action_type = %action.action_type, "Audit failed");
                }
            }),
        )
        .chain(&FETCH, |payload: &Value, _: &FluxAction| {
            let id = payload.clone();
            NextAction::pending(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                FluxAction::new("FETCHED").with_payload(json!({ "id": id, "name": "record" }))
            })
        })
}
