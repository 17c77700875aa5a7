//! Runtime error types.

use crate::checkpoint::CheckpointError;
use crate::core::ContextError;
use thiserror::Error;

/// Errors that abort constructing a runtime.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Failed to restore checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that abort a run while dispatching an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A transition returned a name that is not a state of the schema.
    #[error("Transition of state '{from}' returned unknown state '{returned}'")]
    UnknownNextState { from: String, returned: String },
}
