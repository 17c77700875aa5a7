//! Declaration entries collected by the schema builder.
//!
//! Each entry pairs a target state name with a role. Nothing is validated
//! here; [`SchemaBuilder::build`](super::SchemaBuilder::build) does that.

use crate::core::{ActionFn, Context, TransitionFn};
use std::sync::Arc;

/// A state declaration: a name and whether it is the start state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateDecl {
    pub name: String,
    pub is_start: bool,
}

impl StateDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_start: false,
        }
    }

    /// Declare the start state.
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_start: true,
        }
    }
}

/// An action tagged with the state it binds to.
pub struct ActionBinding<E> {
    pub state: String,
    pub action: ActionFn<E>,
}

impl<E> ActionBinding<E> {
    pub fn new<F>(state: impl Into<String>, action: F) -> Self
    where
        F: Fn(&E, &mut Context) + Send + Sync + 'static,
    {
        Self {
            state: state.into(),
            action: Arc::new(action),
        }
    }
}

/// A transition tagged with its state and declared destinations.
pub struct TransitionBinding<E> {
    pub state: String,
    pub destinations: Vec<String>,
    pub transition: TransitionFn<E>,
}

impl<E> TransitionBinding<E> {
    pub fn new<D, F, R>(state: impl Into<String>, destinations: D, transition: F) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: Fn(&E, &mut Context) -> R + Send + Sync + 'static,
        R: Into<String>,
    {
        Self {
            state: state.into(),
            destinations: destinations.into_iter().map(Into::into).collect(),
            transition: Arc::new(move |event: &E, context: &mut Context| -> String {
                transition(event, context).into()
            }),
        }
    }
}

/// Any registration entry, for building a schema from a single list.
pub enum Binding<E> {
    State(StateDecl),
    Action(ActionBinding<E>),
    Transition(TransitionBinding<E>),
}

impl<E> From<StateDecl> for Binding<E> {
    fn from(decl: StateDecl) -> Self {
        Binding::State(decl)
    }
}

impl<E> From<ActionBinding<E>> for Binding<E> {
    fn from(binding: ActionBinding<E>) -> Self {
        Binding::Action(binding)
    }
}

impl<E> From<TransitionBinding<E>> for Binding<E> {
    fn from(binding: TransitionBinding<E>) -> Self {
        Binding::Transition(binding)
    }
}
