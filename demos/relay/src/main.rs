//! Relay example binary
//!
//! Demonstrates an action chain forwarding actions through a host pipeline.

use action_chain_core::{FluxAction, MiddlewareApi};
use relay::{relay_chain, Relay, FETCH};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,action_chain_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Relay Example: Action Chain Middleware ===\n");

    let relay = Relay::new(relay_chain());

    println!(">>> Dispatching: PING");
    relay.dispatch(FluxAction::new("PING").with_payload("hello"))?;
    println!("Log: {:?}", relay.log());

    println!("\n>>> Dispatching: FETCH(42)");
    relay.dispatch(FETCH.create(42)?)?;
    println!("Log right after dispatch: {:?}", relay.log());

    // Give the pending forward time to resolve
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("Log after the fetch resolved: {:?}", relay.log());

    println!("\n=== Relay Demonstration Complete ===");
    Ok(())
}
