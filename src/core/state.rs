//! State entity: a named node owning one transition and at most one action.
//!
//! States are pure descriptors. They hold no per-run data and are shared,
//! read-only, by every runtime built from the same schema.

use super::context::Context;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Side effect run after entering a state.
pub type ActionFn<E> = Arc<dyn Fn(&E, &mut Context) + Send + Sync>;

/// Decides the next state name for an incoming event.
pub type TransitionFn<E> = Arc<dyn Fn(&E, &mut Context) -> String + Send + Sync>;

/// Normalize a state name: surrounding whitespace trimmed, case folded.
///
/// ```rust
/// use statecraft::core::normalize_name;
///
/// assert_eq!(normalize_name("  State_One "), "state_one");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A validated state of a schema.
///
/// Only the schema builder constructs states, which guarantees a bound
/// transition and destinations that exist in the schema.
pub struct State<E> {
    name: String,
    is_start: bool,
    action: Option<ActionFn<E>>,
    transition: TransitionFn<E>,
    declared_destinations: BTreeSet<String>,
}

impl<E> State<E> {
    pub(crate) fn new(
        name: String,
        is_start: bool,
        action: Option<ActionFn<E>>,
        transition: TransitionFn<E>,
        declared_destinations: BTreeSet<String>,
    ) -> Self {
        Self {
            name,
            is_start,
            action,
            transition,
            declared_destinations,
        }
    }

    /// Normalized state name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Destinations declared alongside the transition.
    pub fn declared_destinations(&self) -> &BTreeSet<String> {
        &self.declared_destinations
    }

    /// Run the bound action, if any.
    pub fn invoke_action(&self, event: &E, context: &mut Context) {
        if let Some(action) = &self.action {
            action(event, context);
        }
    }

    /// Run the bound transition and return the normalized next state name.
    ///
    /// The name is not checked against [`declared_destinations`](Self::declared_destinations);
    /// membership in the schema is checked by the runtime.
    pub fn invoke_transition(&self, event: &E, context: &mut Context) -> String {
        normalize_name(&(self.transition)(event, context))
    }
}

impl<E> fmt::Debug for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("is_start", &self.is_start)
            .field("has_action", &self.action.is_some())
            .field("declared_destinations", &self.declared_destinations)
            .finish()
    }
}
