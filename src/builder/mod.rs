//! Schema declaration and validation.
//!
//! Callers register states and tagged callables on a [`SchemaBuilder`];
//! `build()` checks every structural invariant and returns an immutable
//! [`Schema`](crate::core::Schema) or the first failing check. Checks that
//! batch (unknown destinations, missing transitions) report every offending
//! name at once.

pub mod binding;
pub mod error;
pub mod schema;

pub use binding::{ActionBinding, Binding, StateDecl, TransitionBinding};
pub use error::SchemaError;
pub use schema::SchemaBuilder;
