//! Core FSM types.
//!
//! This module contains the structural side of a state machine:
//! - `State` descriptors with their bound callables
//! - the immutable `Schema` and its graph view
//! - the `Context` shared by callables during a run
//!
//! Nothing here performs I/O.

mod context;
mod schema;
mod state;

pub use context::{is_reserved, Context, ContextError, RESERVED_KEYS};
pub use schema::{GraphView, Schema};
pub use state::{normalize_name, ActionFn, State, TransitionFn};
