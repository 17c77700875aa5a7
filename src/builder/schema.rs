//! Builder that validates declarations into a [`Schema`].

use crate::builder::binding::{ActionBinding, Binding, StateDecl, TransitionBinding};
use crate::builder::error::SchemaError;
use crate::core::{normalize_name, ActionFn, Context, Schema, State, TransitionFn};
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder collecting state declarations and tagged callables.
///
/// Nothing is checked while entries are added. [`build`](Self::build)
/// validates in a fixed order so diagnostics are reproducible:
///
/// 1. states: unique names, exactly one start
/// 2. actions: known state, at most one per state
/// 3. transitions: known state, at most one per state, known destinations
/// 4. coverage: every state has a transition
///
/// # Example
///
/// ```rust
/// use statecraft::builder::SchemaBuilder;
///
/// let schema = SchemaBuilder::<char>::new("Toggle")
///     .start_state("off")
///     .state("on")
///     .transition("off", ["on"], |_, _| "on")
///     .transition("on", ["off"], |_, _| "off")
///     .action("on", |event, ctx| {
///         ctx.insert("last_event", event.to_string()).unwrap();
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.start_state_name(), "off");
/// ```
pub struct SchemaBuilder<E> {
    name: String,
    states: Vec<StateDecl>,
    actions: Vec<ActionBinding<E>>,
    transitions: Vec<TransitionBinding<E>>,
}

struct PendingState<E> {
    is_start: bool,
    action: Option<ActionFn<E>>,
    transition: Option<TransitionFn<E>>,
    destinations: BTreeSet<String>,
}

impl<E> SchemaBuilder<E> {
    /// Create a builder for the FSM type `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            actions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Declare a regular state.
    pub fn state(self, name: impl Into<String>) -> Self {
        self.declare(StateDecl::new(name))
    }

    /// Declare the start state.
    pub fn start_state(self, name: impl Into<String>) -> Self {
        self.declare(StateDecl::start(name))
    }

    pub fn declare(mut self, decl: StateDecl) -> Self {
        self.states.push(decl);
        self
    }

    /// Bind an action to a state.
    pub fn action<F>(mut self, state: impl Into<String>, action: F) -> Self
    where
        F: Fn(&E, &mut Context) + Send + Sync + 'static,
    {
        self.actions.push(ActionBinding::new(state, action));
        self
    }

    /// Bind a transition and its declared destinations to a state.
    pub fn transition<D, F, R>(
        mut self,
        state: impl Into<String>,
        destinations: D,
        transition: F,
    ) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: Fn(&E, &mut Context) -> R + Send + Sync + 'static,
        R: Into<String>,
    {
        self.transitions
            .push(TransitionBinding::new(state, destinations, transition));
        self
    }

    /// Add any registration entry.
    pub fn bind(mut self, binding: impl Into<Binding<E>>) -> Self {
        match binding.into() {
            Binding::State(decl) => self.states.push(decl),
            Binding::Action(action) => self.actions.push(action),
            Binding::Transition(transition) => self.transitions.push(transition),
        }
        self
    }

    /// Add a list of registration entries.
    pub fn bindings<I>(self, bindings: I) -> Self
    where
        I: IntoIterator<Item = Binding<E>>,
    {
        bindings.into_iter().fold(self, |builder, binding| builder.bind(binding))
    }

    /// Validate every declaration and assemble the schema.
    pub fn build(self) -> Result<Schema<E>, SchemaError> {
        let (mut pending, start) = collect_states(self.states)?;
        bind_actions(&mut pending, self.actions)?;
        bind_transitions(&mut pending, self.transitions)?;
        check_coverage(&pending)?;

        let schema = assemble(self.name, pending, start)?;
        tracing::debug!(fsm = %schema.name(), states = schema.len(), "schema built");
        Ok(schema)
    }
}

fn collect_states<E>(
    decls: Vec<StateDecl>,
) -> Result<(BTreeMap<String, PendingState<E>>, String), SchemaError> {
    let mut pending = BTreeMap::new();
    let mut start: Option<String> = None;

    for decl in decls {
        let name = normalize_name(&decl.name);
        if pending.contains_key(&name) {
            return Err(SchemaError::DuplicateState { name });
        }

        if decl.is_start {
            if let Some(first) = &start {
                return Err(SchemaError::MultipleStartStates {
                    first: first.clone(),
                    second: name,
                });
            }
            start = Some(name.clone());
        }

        pending.insert(
            name,
            PendingState {
                is_start: decl.is_start,
                action: None,
                transition: None,
                destinations: BTreeSet::new(),
            },
        );
    }

    let start = start.ok_or(SchemaError::MissingStartState)?;
    Ok((pending, start))
}

fn bind_actions<E>(
    pending: &mut BTreeMap<String, PendingState<E>>,
    actions: Vec<ActionBinding<E>>,
) -> Result<(), SchemaError> {
    for binding in actions {
        let name = normalize_name(&binding.state);
        let Some(state) = pending.get_mut(&name) else {
            return Err(SchemaError::UnknownActionState { name });
        };
        if state.action.is_some() {
            return Err(SchemaError::DuplicateAction { name });
        }
        state.action = Some(binding.action);
    }
    Ok(())
}

fn bind_transitions<E>(
    pending: &mut BTreeMap<String, PendingState<E>>,
    transitions: Vec<TransitionBinding<E>>,
) -> Result<(), SchemaError> {
    for binding in transitions {
        let name = normalize_name(&binding.state);
        match pending.get(&name) {
            None => return Err(SchemaError::UnknownTransitionState { name }),
            Some(state) if state.transition.is_some() => {
                return Err(SchemaError::DuplicateTransition { name })
            }
            Some(_) => {}
        }

        let destinations: BTreeSet<String> = binding
            .destinations
            .iter()
            .map(|dest| normalize_name(dest))
            .collect();

        if let Validation::Failure(unknown) = known_destinations(pending, &destinations) {
            return Err(SchemaError::UnknownDestinations {
                state: name,
                destinations: unknown.iter().cloned().collect(),
            });
        }

        if let Some(state) = pending.get_mut(&name) {
            state.transition = Some(binding.transition);
            state.destinations = destinations;
        }
    }
    Ok(())
}

/// Accumulates every destination that is not a declared state.
fn known_destinations<E>(
    pending: &BTreeMap<String, PendingState<E>>,
    destinations: &BTreeSet<String>,
) -> Validation<(), NonEmptyVec<String>> {
    let checks: Vec<Validation<(), NonEmptyVec<String>>> = destinations
        .iter()
        .map(|dest| {
            if pending.contains_key(dest) {
                Validation::success(())
            } else {
                Validation::fail(dest.clone())
            }
        })
        .collect();

    Validation::all_vec(checks).map(|_| ())
}

fn check_coverage<E>(pending: &BTreeMap<String, PendingState<E>>) -> Result<(), SchemaError> {
    let checks: Vec<Validation<(), NonEmptyVec<String>>> = pending
        .iter()
        .map(|(name, state)| {
            if state.transition.is_some() {
                Validation::success(())
            } else {
                Validation::fail(name.clone())
            }
        })
        .collect();

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(missing) => Err(SchemaError::MissingTransitions {
            states: missing.iter().cloned().collect(),
        }),
    }
}

fn assemble<E>(
    name: String,
    pending: BTreeMap<String, PendingState<E>>,
    start: String,
) -> Result<Schema<E>, SchemaError> {
    let mut states = BTreeMap::new();
    let mut graph = BTreeMap::new();

    for (state_name, state) in pending {
        let Some(transition) = state.transition else {
            return Err(SchemaError::MissingTransitions {
                states: vec![state_name],
            });
        };

        graph.insert(state_name.clone(), state.destinations.clone());
        states.insert(
            state_name.clone(),
            State::new(
                state_name,
                state.is_start,
                state.action,
                transition,
                state.destinations,
            ),
        );
    }

    Ok(Schema::new(name, states, start, graph))
}
