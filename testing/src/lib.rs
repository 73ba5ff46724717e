//! # Action Chain Testing
//!
//! Testing utilities and helpers for Action Chain.
//!
//! This crate provides:
//! - [`RecordingApi`]: a middleware context that records every dispatched action
//! - [`ChainTest`]: a Given-When-Then harness for chains
//! - [`init_test_tracing`]: tracing output for tests
//!
//! ## Example
//!
//! ```ignore
//! use action_chain_testing::{ChainTest, RecordingApi};
//!
//! #[test]
//! fn test_ping_pong() {
//!     ChainTest::new(ActionChain::new().chain("PING", |_: &Value, _: &FluxAction| FluxAction::new("PONG")))
//!         .when_action(FluxAction::new("PING"))
//!         .then_dispatched(|actions| assert_eq!(actions[0].action_type, "PONG"))
//!         .run();
//! }
//! ```

use action_chain_core::{Action, MiddlewareApi};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::EnvFilter;

/// Given-When-Then harness for chains
pub mod chain_test;

pub use chain_test::ChainTest;

/// Mock middleware contexts
pub mod mocks {
    use super::{lock, Action, Arc, MiddlewareApi, Mutex};

    /// Middleware context that records dispatched actions
    ///
    /// Clones share the same record and state, so a clone captured by a handler
    /// observes everything dispatched through the original.
    ///
    /// # Example
    ///
    /// ```
    /// use action_chain_core::{FluxAction, MiddlewareApi};
    /// use action_chain_testing::RecordingApi;
    ///
    /// let api: RecordingApi<FluxAction> = RecordingApi::new();
    /// api.dispatch(FluxAction::new("PING"));
    ///
    /// assert_eq!(api.count(), 1);
    /// assert_eq!(api.dispatched_types(), vec!["PING"]);
    /// ```
    #[derive(Debug)]
    pub struct RecordingApi<A, S = ()> {
        dispatched: Arc<Mutex<Vec<A>>>,
        state: Arc<Mutex<S>>,
    }

    impl<A, S: Default> RecordingApi<A, S> {
        /// Create a context with default state
        #[must_use]
        pub fn new() -> Self {
            Self::with_state(S::default())
        }
    }

    impl<A, S> RecordingApi<A, S> {
        /// Create a context with the given state
        #[must_use]
        pub fn with_state(state: S) -> Self {
            Self {
                dispatched: Arc::new(Mutex::new(Vec::new())),
                state: Arc::new(Mutex::new(state)),
            }
        }

        /// Replace the state returned by `get_state`
        pub fn set_state(&self, state: S) {
            *lock(&self.state) = state;
        }

        /// Number of dispatched actions
        #[must_use]
        pub fn count(&self) -> usize {
            lock(&self.dispatched).len()
        }

        /// Forget every recorded action
        pub fn clear(&self) {
            lock(&self.dispatched).clear();
        }
    }

    impl<A: Clone, S> RecordingApi<A, S> {
        /// All dispatched actions, in dispatch order
        #[must_use]
        pub fn dispatched(&self) -> Vec<A> {
            lock(&self.dispatched).clone()
        }

        /// The most recently dispatched action
        #[must_use]
        pub fn last(&self) -> Option<A> {
            lock(&self.dispatched).last().cloned()
        }
    }

    impl<A: Action, S> RecordingApi<A, S> {
        /// Types of all dispatched actions, in dispatch order
        #[must_use]
        pub fn dispatched_types(&self) -> Vec<String> {
            lock(&self.dispatched)
                .iter()
                .map(|action| action.action_type().to_owned())
                .collect()
        }
    }

    impl<A, S: Clone> MiddlewareApi<A> for RecordingApi<A, S> {
        type State = S;
        type Output = ();

        fn dispatch(&self, action: A) {
            lock(&self.dispatched).push(action);
        }

        fn get_state(&self) -> S {
            lock(&self.state).clone()
        }
    }

    impl<A, S> Clone for RecordingApi<A, S> {
        fn clone(&self) -> Self {
            Self {
                dispatched: Arc::clone(&self.dispatched),
                state: Arc::clone(&self.state),
            }
        }
    }

    impl<A, S: Default> Default for RecordingApi<A, S> {
        fn default() -> Self {
            Self::new()
        }
    }
}

// A panicking handler must not hide what was recorded before it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install a tracing subscriber writing to the test output.
///
/// Honors `RUST_LOG`, defaulting to debug output for the action chain crates.
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "action_chain_core=debug,action_chain_runtime=debug".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::RecordingApi;
