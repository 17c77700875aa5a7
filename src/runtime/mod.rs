//! Runtime engine: drives events through a schema and checkpoints progress.
//!
//! # Key Concepts
//!
//! - **Runtime**: one run over a shared `Schema`, owning its `Context`
//! - **Drive loop**: pull an event, transition, enter the state, run its
//!   action, count, maybe checkpoint; repeat until the source ends or an
//!   interrupt is requested
//! - **Outcome**: the loop always writes a final checkpoint, then returns a
//!   `RunOutcome`; terminating the process is left to the caller
//!
//! Execution is single-threaded. An interrupt is observed only between
//! events, never in the middle of one.

mod config;
mod engine;
mod error;
mod interrupt;

pub use config::{RuntimeConfig, DEFAULT_CHECKPOINT_DIR};
pub use engine::{RunOutcome, Runtime, StopReason};
pub use error::{ConstructionError, DispatchError};
pub use interrupt::InterruptHandle;
