//! Errors raised while validating a schema declaration.

use thiserror::Error;

/// Errors that can occur when building a schema.
///
/// Variants carrying a list report the complete, sorted set of offending
/// names rather than the first one found.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("State '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("No start state declared. Exactly one state must be marked as the start")]
    MissingStartState,

    #[error("Only one start state is allowed, found '{first}' and '{second}'")]
    MultipleStartStates { first: String, second: String },

    #[error("Action bound to undeclared state '{name}'")]
    UnknownActionState { name: String },

    #[error("State '{name}' already has an action bound")]
    DuplicateAction { name: String },

    #[error("Transition bound to undeclared state '{name}'")]
    UnknownTransitionState { name: String },

    #[error("State '{name}' already has a transition bound")]
    DuplicateTransition { name: String },

    #[error(
        "Transition of state '{state}' declares unknown destinations: {}",
        .destinations.join(", ")
    )]
    UnknownDestinations {
        state: String,
        destinations: Vec<String>,
    },

    #[error("The following states have no transition bound: {}", .states.join(", "))]
    MissingTransitions { states: Vec<String> },
}
