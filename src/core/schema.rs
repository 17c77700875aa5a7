//! Validated, immutable schema of an FSM type.

use super::state::{normalize_name, State};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

/// The validated collection of states, the start designation and the
/// declared adjacency.
///
/// Schemas are produced by [`SchemaBuilder`](crate::builder::SchemaBuilder)
/// and never change afterwards. Wrap one in an `Arc` to share it across
/// any number of runtimes.
#[derive(Debug)]
pub struct Schema<E> {
    name: String,
    states: BTreeMap<String, State<E>>,
    start_state_name: String,
    graph: BTreeMap<String, BTreeSet<String>>,
}

impl<E> Schema<E> {
    pub(crate) fn new(
        name: String,
        states: BTreeMap<String, State<E>>,
        start_state_name: String,
        graph: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self {
            name,
            states,
            start_state_name,
            graph,
        }
    }

    /// FSM type name, used to derive checkpoint file names.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_state_name(&self) -> &str {
        &self.start_state_name
    }

    pub fn start_state(&self) -> &State<E> {
        &self.states[&self.start_state_name]
    }

    /// Look up a state by name. The name is normalized first.
    pub fn state(&self, name: &str) -> Option<&State<E>> {
        self.states.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state(name).is_some()
    }

    /// States ordered by name.
    pub fn states(&self) -> impl Iterator<Item = &State<E>> {
        self.states.values()
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Adjacency: state name to the set of declared destinations.
    pub fn graph(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.graph
    }

    /// Plain node/edge view for external visualization.
    pub fn graph_view(&self) -> GraphView {
        GraphView {
            nodes: self.states.keys().cloned().collect(),
            edges: self
                .graph
                .iter()
                .flat_map(|(from, dests)| {
                    dests.iter().map(move |to| (from.clone(), to.clone()))
                })
                .collect(),
        }
    }
}

impl<E> Index<&str> for Schema<E> {
    type Output = State<E>;

    /// Panics if no state has this name.
    fn index(&self, name: &str) -> &State<E> {
        match self.state(name) {
            Some(state) => state,
            None => panic!("no state named '{name}' in schema '{}'", self.name),
        }
    }
}

/// Read-only node and edge sets derived from a schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: BTreeSet<String>,
    pub edges: BTreeSet<(String, String)>,
}

impl GraphView {
    /// Destinations reachable in one step from `node`.
    pub fn successors<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(from, _)| from == node)
            .map(|(_, to)| to.as_str())
    }
}
