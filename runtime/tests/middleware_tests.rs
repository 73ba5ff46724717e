//! Integration tests for the action chain middleware
//!
//! A small host pipeline is simulated with a `RecordingApi` as the context and
//! a closure as the host's `next` dispatcher.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use action_chain_core::{attach, ActionChain, ChainError, FluxAction, Middleware, MiddlewareApi, NextAction};
use action_chain_runtime::{create_action_chain_middleware, MiddlewareError};
use action_chain_testing::{init_test_tracing, RecordingApi};
use serde_json::{json, Value};
use std::time::Duration;

type Api = RecordingApi<FluxAction, u32>;

fn chain() -> ActionChain<FluxAction, Api> {
    ActionChain::new()
        .chain("TARGET", |payload: &Value, _: &FluxAction| {
            FluxAction::new("NEXT").with_payload(payload.clone())
        })
        .chain("ASYNC", |payload: &Value, _: &FluxAction| {
            let payload = payload.clone();
            NextAction::pending(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                FluxAction::new("ASYNC_DONE").with_payload(payload)
            })
        })
        .chain(
            "STATEFUL",
            attach(|_: &FluxAction, api: &Api| {
                let state = api.get_state();
                api.dispatch(FluxAction::new("STATE_SEEN").with_payload(state));
            }),
        )
        .chain("BROKEN", |_: &Value, _: &FluxAction| None::<FluxAction>)
        .chain("FANOUT", |_: &Value, _: &FluxAction| FluxAction::new("SYNC"))
        .chain("FANOUT", |_: &Value, _: &FluxAction| {
            NextAction::pending(async { FluxAction::new("LATER") })
        })
}

#[tokio::test]
async fn test_next_runs_before_chain() {
    init_test_tracing();
    let api = Api::new();
    let host_api = api.clone();
    let mut host_saw = Vec::new();

    let middleware = create_action_chain_middleware(chain());
    let () = middleware
        .handle(&api, FluxAction::new("TARGET").with_payload(1), |action| {
            // Chain output is not visible while the host handles the action
            assert!(host_api.dispatched().is_empty());
            host_saw.push(action.action_type);
        })
        .unwrap();

    assert_eq!(host_saw, vec!["TARGET"]);
    assert_eq!(api.dispatched_types(), vec!["NEXT"]);
    assert_eq!(api.last().unwrap().payload, json!(1));
}

#[tokio::test]
async fn test_unmatched_action_passes_through() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    let mut seen = None;
    middleware
        .handle(&api, FluxAction::new("UNRELATED"), |action| seen = Some(action))
        .unwrap();

    assert_eq!(seen.unwrap().action_type, "UNRELATED");
    assert!(api.dispatched().is_empty());
}

#[tokio::test]
async fn test_pending_forward_is_spawned() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    middleware
        .handle(&api, FluxAction::new("ASYNC").with_payload("x"), |_| ())
        .unwrap();
    assert!(api.dispatched().is_empty());

    // Give the spawned task time to complete
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(api.dispatched_types(), vec!["ASYNC_DONE"]);
    assert_eq!(api.last().unwrap().payload, json!("x"));
}

#[tokio::test]
async fn test_tracked_forward_can_be_awaited() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    let (_, handle) = middleware
        .handle_tracked(&api, FluxAction::new("ASYNC"), |_| ())
        .unwrap();
    assert_eq!(handle.len(), 1);

    handle.wait().await.unwrap();

    assert_eq!(api.dispatched_types(), vec!["ASYNC_DONE"]);
}

#[tokio::test]
async fn test_mixed_forwards_all_arrive() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    let (_, handle) = middleware
        .handle_tracked(&api, FluxAction::new("FANOUT"), |_| ())
        .unwrap();
    assert_eq!(api.dispatched_types(), vec!["SYNC"]);

    handle.wait().await.unwrap();
    assert_eq!(api.dispatched_types(), vec!["SYNC", "LATER"]);
}

#[tokio::test]
async fn test_collect_leaves_pending_to_caller() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    let (_, pending) = middleware
        .handle_collect(&api, FluxAction::new("ASYNC"), |_| ())
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(api.dispatched().is_empty());

    futures::future::join_all(pending).await;
    assert_eq!(api.dispatched_types(), vec!["ASYNC_DONE"]);
}

#[tokio::test]
async fn test_side_effect_handler_reads_state() {
    let api = Api::with_state(7);
    let middleware = create_action_chain_middleware(chain());

    middleware
        .handle(&api, FluxAction::new("STATEFUL"), |_| ())
        .unwrap();

    assert_eq!(api.dispatched_types(), vec!["STATE_SEEN"]);
    assert_eq!(api.last().unwrap().payload, json!(7));
}

#[tokio::test]
async fn test_invalid_result_surfaces_after_next() {
    let api = Api::new();
    let middleware = create_action_chain_middleware(chain());

    let mut host_ran = false;
    let result = middleware.handle(&api, FluxAction::new("BROKEN"), |_| host_ran = true);

    assert!(host_ran);
    assert!(matches!(
        result,
        Err(MiddlewareError::Chain(ChainError::InvalidHandlerResult { .. }))
    ));
}
