//! Statecraft: a declarative finite state machine framework
//!
//! A state machine is declared once as a set of named states, exactly one
//! of them the start, each with one transition and at most one action.
//! The declaration is validated into an immutable schema, and any number
//! of runtimes then drive event sequences through it, checkpointing their
//! progress so a run can resume after a restart.
//!
//! # Core Concepts
//!
//! - **Schema**: validated states, start designation and declared adjacency
//! - **Transition**: `(event, context) -> next state name`
//! - **Action**: `(event, context)` side effect after entering a state
//! - **Context**: runtime-owned `current_state` plus open user data
//! - **Checkpoint**: versioned snapshot of a runtime's resumable fields
//!
//! # Example
//!
//! ```rust
//! use statecraft::builder::SchemaBuilder;
//! use statecraft::runtime::{Runtime, RuntimeConfig};
//! use serde_json::{json, Map};
//!
//! let schema = SchemaBuilder::<()>::new("Blinker")
//!     .start_state("state_one")
//!     .state("state_two")
//!     .action("state_one", |_, ctx| {
//!         ctx.insert("value", 1).unwrap();
//!     })
//!     .transition("state_one", ["state_two"], |_, _| "state_two")
//!     .action("state_two", |_, ctx| {
//!         ctx.insert("value", 2).unwrap();
//!     })
//!     .transition("state_two", ["state_one"], |_, _| "state_one")
//!     .build()
//!     .unwrap();
//!
//! let dir = std::env::temp_dir().join("statecraft-doc-blinker");
//! let config = RuntimeConfig::new().checkpoint_dir(&dir);
//! let mut runtime = Runtime::new(schema, Map::new(), config).unwrap();
//!
//! runtime.start([()]).unwrap();
//! assert_eq!(runtime.current_state().name(), "state_two");
//! assert_eq!(runtime.context().get("value"), Some(&json!(2)));
//! # std::fs::remove_dir_all(&dir).ok();
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use builder::{SchemaBuilder, SchemaError};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointFormat};
pub use core::{Context, GraphView, Schema, State};
pub use runtime::{RunOutcome, Runtime, RuntimeConfig, StopReason};
