//! Ergonomic testing utilities for action chains
//!
//! This module provides a fluent API for testing chains with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ChainTest is the natural name

use crate::RecordingApi;
use action_chain_core::{settle_all, Action, ActionChain, ChainError};

/// Type alias for dispatch assertion functions
type DispatchAssertion<A> = Box<dyn FnOnce(&[A])>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&ChainError)>;

/// Fluent API for testing chains with Given-When-Then syntax
///
/// The chain is dispatched against a [`RecordingApi`]; assertions inspect the
/// actions it recorded.
///
/// # Example
///
/// ```ignore
/// use action_chain_testing::ChainTest;
///
/// ChainTest::new(chain)
///     .given_state(3)
///     .when_action(FluxAction::new("PING"))
///     .then_dispatched(|actions| {
///         assert_eq!(actions.len(), 1);
///     })
///     .then_forward_count(1)
///     .run();
/// ```
pub struct ChainTest<A: Action, S = ()> {
    chain: ActionChain<A, RecordingApi<A, S>>,
    api: Option<RecordingApi<A, S>>,
    action: Option<A>,
    dispatch_assertions: Vec<DispatchAssertion<A>>,
    forward_count: Option<usize>,
    error_assertion: Option<ErrorAssertion>,
}

impl<A, S> ChainTest<A, S>
where
    A: Action + Clone + Send + 'static,
    S: Clone + Default + Send + 'static,
{
    /// Create a new chain test with the given chain
    #[must_use]
    pub const fn new(chain: ActionChain<A, RecordingApi<A, S>>) -> Self {
        Self {
            chain,
            api: None,
            action: None,
            dispatch_assertions: Vec::new(),
            forward_count: None,
            error_assertion: None,
        }
    }

    /// Use an existing context, e.g. one the test keeps a clone of
    #[must_use]
    pub fn with_api(mut self, api: RecordingApi<A, S>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the state handlers observe through `get_state` (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.api = Some(RecordingApi::with_state(state));
        self
    }

    /// Set the action to dispatch (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the dispatched actions (Then)
    #[must_use]
    pub fn then_dispatched<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[A]) + 'static,
    {
        self.dispatch_assertions.push(Box::new(assertion));
        self
    }

    /// Expect this many forwarded results, concrete and pending together (Then)
    #[must_use]
    pub fn then_forward_count(mut self, expected: usize) -> Self {
        self.forward_count = Some(expected);
        self
    }

    /// Expect dispatch to fail, and inspect the error (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&ChainError) + 'static,
    {
        self.error_assertion = Some(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// Pending forwards are dropped without being polled, so only concrete
    /// results reach the dispatch assertions. Use [`run_async`](Self::run_async)
    /// to settle them first.
    ///
    /// # Panics
    ///
    /// Panics if the action is not set, if dispatch fails without an error
    /// assertion (or succeeds with one), or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let action = self.action.expect("Action must be set with when_action()");
        let api = self.api.unwrap_or_default();

        match self.chain.dispatch(&action, &api) {
            Ok(forwards) => {
                Self::check_forwards(self.error_assertion.is_some(), self.forward_count, forwards.len());
                drop(forwards);
                Self::check_dispatched(&api, self.dispatch_assertions);
            },
            Err(error) => Self::check_error(self.error_assertion, &error, &api, self.dispatch_assertions),
        }
    }

    /// Run the test, settling pending forwards before the dispatch assertions
    ///
    /// # Panics
    ///
    /// Same as [`run`](Self::run).
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run_async(self) {
        let action = self.action.expect("Action must be set with when_action()");
        let api = self.api.unwrap_or_default();

        match self.chain.dispatch(&action, &api) {
            Ok(forwards) => {
                Self::check_forwards(self.error_assertion.is_some(), self.forward_count, forwards.len());
                settle_all(forwards).await;
                Self::check_dispatched(&api, self.dispatch_assertions);
            },
            Err(error) => Self::check_error(self.error_assertion, &error, &api, self.dispatch_assertions),
        }
    }

    #[allow(clippy::panic)] // Test assertion
    fn check_forwards(expected_error: bool, expected: Option<usize>, actual: usize) {
        assert!(!expected_error, "Expected dispatch to fail, but it produced {actual} forwards");
        if let Some(expected) = expected {
            assert_eq!(actual, expected, "Expected {expected} forwards, but found {actual}");
        }
    }

    #[allow(clippy::panic)] // Test assertion
    fn check_error(
        assertion: Option<ErrorAssertion>,
        error: &ChainError,
        api: &RecordingApi<A, S>,
        dispatch_assertions: Vec<DispatchAssertion<A>>,
    ) {
        let Some(assertion) = assertion else {
            panic!("Unexpected chain error: {error}");
        };
        assertion(error);
        // Handlers that ran before the failure keep their effects
        Self::check_dispatched(api, dispatch_assertions);
    }

    fn check_dispatched(api: &RecordingApi<A, S>, assertions: Vec<DispatchAssertion<A>>) {
        let dispatched = api.dispatched();
        for assertion in assertions {
            assertion(&dispatched);
        }
    }
}

/// Helper assertions for dispatched actions
pub mod assertions {
    use action_chain_core::Action;

    /// Assert that nothing was dispatched
    ///
    /// # Panics
    ///
    /// Panics if actions is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_dispatch<A: std::fmt::Debug>(actions: &[A]) {
        assert!(
            actions.is_empty(),
            "Expected no dispatched actions, but found {}: {:?}",
            actions.len(),
            actions
        );
    }

    /// Assert the types of the dispatched actions, in order
    ///
    /// # Panics
    ///
    /// Panics if the types don't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_dispatched_types<A: Action>(actions: &[A], expected: &[&str]) {
        let actual: Vec<&str> = actions.iter().map(Action::action_type).collect();
        assert_eq!(actual, expected, "Dispatched types differ");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use action_chain_core::{attach, FluxAction, MiddlewareApi, NextAction};
    use serde_json::{json, Value};

    type Api = RecordingApi<FluxAction, i64>;

    fn chain() -> ActionChain<FluxAction, Api> {
        ActionChain::new()
            .chain("PING", |payload: &Value, _: &FluxAction| {
                FluxAction::new("PONG").with_payload(payload.clone())
            })
            .chain("LATER", |_: &Value, _: &FluxAction| {
                NextAction::pending(async { FluxAction::new("NOW") })
            })
            .chain(
                "COUNT",
                attach(|_: &FluxAction, api: &Api| {
                    api.dispatch(FluxAction::new("COUNTED").with_payload(api.get_state()));
                }),
            )
            .chain("EMPTY", |_: &Value, _: &FluxAction| None::<FluxAction>)
    }

    #[test]
    fn test_chain_test_concrete_forward() {
        ChainTest::new(chain())
            .when_action(FluxAction::new("PING").with_payload(5))
            .then_forward_count(1)
            .then_dispatched(|actions| {
                assertions::assert_dispatched_types(actions, &["PONG"]);
                assert_eq!(actions[0].payload, json!(5));
            })
            .run();
    }

    #[test]
    fn test_chain_test_given_state() {
        ChainTest::new(chain())
            .given_state(42)
            .when_action(FluxAction::new("COUNT"))
            .then_forward_count(0)
            .then_dispatched(|actions| {
                assert_eq!(actions[0].payload, json!(42));
            })
            .run();
    }

    #[test]
    fn test_chain_test_pending_is_not_settled_by_run() {
        ChainTest::new(chain())
            .when_action(FluxAction::new("LATER"))
            .then_forward_count(1)
            .then_dispatched(assertions::assert_no_dispatch::<FluxAction>)
            .run();
    }

    #[tokio::test]
    async fn test_chain_test_run_async_settles_pending() {
        ChainTest::new(chain())
            .when_action(FluxAction::new("LATER"))
            .then_dispatched(|actions| assertions::assert_dispatched_types(actions, &["NOW"]))
            .run_async()
            .await;
    }

    #[test]
    fn test_chain_test_error() {
        ChainTest::new(chain())
            .when_action(FluxAction::new("EMPTY"))
            .then_error(|error| assert!(error.is_invalid_handler_result()))
            .then_dispatched(assertions::assert_no_dispatch::<FluxAction>)
            .run();
    }

    #[test]
    fn test_chain_test_with_shared_api() {
        let api = Api::new();
        ChainTest::new(chain())
            .with_api(api.clone())
            .when_action(FluxAction::new("PING"))
            .run();

        assert_eq!(api.dispatched_types(), vec!["PONG"]);
    }

    #[test]
    #[should_panic(expected = "Unexpected chain error")]
    fn test_chain_test_unexpected_error_panics() {
        ChainTest::new(chain())
            .when_action(FluxAction::new("EMPTY"))
            .run();
    }
}
