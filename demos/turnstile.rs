//! Coin-Operated Turnstile
//!
//! This example drives a two-state turnstile through a stream of events,
//! interrupts it halfway, and resumes from the checkpoint it left behind.
//!
//! Key concepts:
//! - Declaring states, transitions and actions with `SchemaBuilder`
//! - Periodic checkpoints under the replace policy
//! - Cooperative interruption between events
//! - Resuming a fresh runtime from the last snapshot
//!
//! Run with: RUST_LOG=debug cargo run --example turnstile

use serde_json::{json, Map};
use statecraft::builder::SchemaBuilder;
use statecraft::core::{Context, ContextError};
use statecraft::runtime::{Runtime, RuntimeConfig};
use statecraft::{CheckpointFormat, Schema};
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
enum Event {
    Coin,
    Push,
}

fn bump(ctx: &mut Context, key: &str) -> Result<(), ContextError> {
    let count = ctx.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
    ctx.insert(key, count + 1)?;
    Ok(())
}

fn bump_or_log(ctx: &mut Context, key: &str) {
    if let Err(err) = bump(ctx, key) {
        tracing::warn!(key, error = %err, "counter not updated");
    }
}

fn turnstile() -> Result<Schema<Event>, statecraft::SchemaError> {
    SchemaBuilder::new("Turnstile")
        .start_state("locked")
        .state("unlocked")
        .transition("locked", ["locked", "unlocked"], |event, _| match event {
            Event::Coin => "unlocked",
            Event::Push => "locked",
        })
        .transition("unlocked", ["locked", "unlocked"], |event, _| match event {
            Event::Coin => "unlocked",
            Event::Push => "locked",
        })
        .action("unlocked", |_, ctx| bump_or_log(ctx, "coins"))
        .action("locked", |event, ctx| {
            if matches!(event, Event::Push) {
                bump_or_log(ctx, "passages");
            }
        })
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    println!("=== Turnstile ===\n");

    let schema = Arc::new(turnstile()?);
    let view = schema.graph_view();
    println!("States: {:?}", view.nodes);
    for (from, to) in &view.edges {
        println!("  {from} -> {to}");
    }

    let scratch = tempfile::tempdir()?;
    let config = RuntimeConfig::new()
        .checkpoint_dir(scratch.path())
        .checkpoint_every(NonZeroU64::new(2).ok_or("cadence must be positive")?)
        .format(CheckpointFormat::Json);

    let mut user = Map::new();
    user.insert("site".to_string(), json!("north gate"));
    let mut runtime = Runtime::new(Arc::clone(&schema), user, config)?;

    // Stop after the fifth event, as a signal handler would.
    let handle = runtime.interrupt_handle();
    let script = [
        Event::Coin,
        Event::Push,
        Event::Push,
        Event::Coin,
        Event::Coin,
        Event::Push,
        Event::Coin,
        Event::Push,
    ];
    let source = script.iter().copied().enumerate().map(|(i, event)| {
        if i == 4 {
            handle.interrupt();
        }
        event
    });

    println!("\n1. Running until interrupted...");
    let outcome = runtime.start(source)?;
    println!(
        "  stopped: {:?} after {} events in '{}'",
        outcome.reason,
        outcome.events_processed,
        runtime.context().current_state()
    );

    let Some(path) = outcome.final_checkpoint else {
        return Err("final checkpoint was not written".into());
    };
    println!("  checkpoint: {}", path.display());

    println!("\n2. Resuming from checkpoint...");
    let mut resumed = Runtime::resume(schema, &path)?;
    let remaining = script[outcome.events_processed as usize..].iter().copied();
    let outcome = resumed.start(remaining)?;

    println!(
        "  finished: {:?} after {} events in '{}'",
        outcome.reason,
        outcome.events_processed,
        resumed.context().current_state()
    );
    println!("  context: {}", serde_json::to_string(resumed.context().user_data())?);

    println!("\n=== Example Complete ===");
    Ok(())
}
