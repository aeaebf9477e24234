//! The state graph of a nondeterministic automaton, and the builder which guarantees it is well formed.

use std::fmt;

use corral::{Arena, Key};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::closure::epsilon_closure;
use crate::error::BuildError;
use crate::set::StateSet;
use crate::{Symbol, step};

corral::key! {
    /// Handle of a state inside one automaton. Identity is the index, never the name.
    pub struct StateId;
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

type Targets = SmallVec<[StateId; 2]>;

/// A node in the NFA. Most states have one or two targets per symbol, more spill onto the heap.
#[derive(Debug, Clone)]
pub struct State<Σ: Symbol> {
    name: String,
    is_accept: bool,
    transitions: HashMap<Σ, Targets>,
    epsilon: Targets,
}

impl<Σ: Symbol> State<Σ> {
    fn new(name: String) -> Self {
        Self {
            name,
            is_accept: false,
            transitions: HashMap::new(),
            epsilon: SmallVec::new(),
        }
    }

    /// Label given when the state was added, only used for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns if the state is accepting.
    pub fn is_accept(&self) -> bool {
        self.is_accept
    }

    /// Targets of the transitions on `symbol`, empty if there are none.
    pub fn get_transitions(&self, symbol: &Σ) -> &[StateId] {
        self.transitions
            .get(symbol)
            .map(|targets| targets.as_slice())
            .unwrap_or(&[])
    }

    /// Targets of the epsilon transitions.
    pub fn epsilon_transitions(&self) -> &[StateId] {
        &self.epsilon
    }

    /// Symbols this state has at least one transition on.
    pub fn symbols(&self) -> impl Iterator<Item = &Σ> {
        self.transitions.keys()
    }

    fn push_transition(&mut self, symbol: Σ, target: StateId) -> bool {
        push_unique(self.transitions.entry(symbol).or_default(), target)
    }

    fn push_epsilon(&mut self, target: StateId) -> bool {
        push_unique(&mut self.epsilon, target)
    }
}

fn push_unique(targets: &mut Targets, target: StateId) -> bool {
    if targets.contains(&target) {
        false
    } else {
        targets.push(target);
        true
    }
}

// MARK: Builder
/// Incremental construction of a [`StateGraph`]. Every edge is checked against the states owned by the builder
/// when it is added, so a graph coming out of [`GraphBuilder::build`] has no dangling references.
#[derive(Debug, Clone)]
pub struct GraphBuilder<Σ: Symbol> {
    states: Arena<StateId, State<Σ>>,
    start: Option<StateId>,
}

impl<Σ: Symbol> GraphBuilder<Σ> {
    /// Creates a builder with no states.
    pub fn new() -> Self {
        Self {
            states: Arena::new(),
            start: None,
        }
    }

    /// Adds a non accepting state. Names are labels, two states may share one.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        self.states.alloc(State::new(name.into()))
    }

    /// Adds an accepting state.
    pub fn add_accept_state(&mut self, name: impl Into<String>) -> StateId {
        let id = self.add_state(name);
        self.states[id].is_accept = true;
        id
    }

    /// Updates the accept flag of a state.
    pub fn set_accept(&mut self, state: StateId, is_accept: bool) -> Result<(), BuildError> {
        self.check(state)?;
        self.states[state].is_accept = is_accept;
        Ok(())
    }

    /// Designates the start state, replacing any earlier choice.
    pub fn set_start(&mut self, state: StateId) -> Result<(), BuildError> {
        self.check(state)?;
        self.start = Some(state);
        Ok(())
    }

    /// Adds `to` to the successors of `from` on `symbol`. Adding the same edge twice changes nothing.
    pub fn add_transition(&mut self, from: StateId, symbol: Σ, to: StateId) -> Result<(), BuildError> {
        self.check(from)?;
        self.check(to)?;
        self.states[from].push_transition(symbol, to);
        Ok(())
    }

    /// Adds `to` to the epsilon successors of `from`. Adding the same edge twice changes nothing.
    pub fn add_epsilon(&mut self, from: StateId, to: StateId) -> Result<(), BuildError> {
        self.check(from)?;
        self.check(to)?;
        self.states[from].push_epsilon(to);
        Ok(())
    }

    /// Number of states added so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no state was added yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Freezes the builder into a graph. Fails if no start state was designated.
    pub fn build(self) -> Result<StateGraph<Σ>, BuildError> {
        let start = self.start.ok_or(BuildError::MissingStart)?;

        let mut accept = StateSet::with_capacity(self.states.len());
        let mut has_epsilon = false;
        for (id, state) in self.states.iter() {
            if state.is_accept {
                accept.insert(id);
            }
            has_epsilon |= !state.epsilon.is_empty();
        }

        debug!(
            states = self.states.len(),
            accepting = accept.len(),
            has_epsilon,
            "built state graph"
        );

        Ok(StateGraph {
            states: self.states,
            start,
            accept,
            has_epsilon,
        })
    }

    fn check(&self, state: StateId) -> Result<(), BuildError> {
        if self.states.contains(state) {
            Ok(())
        } else {
            Err(BuildError::UnknownState(state))
        }
    }
}

impl<Σ: Symbol> Default for GraphBuilder<Σ> {
    fn default() -> Self {
        Self::new()
    }
}

// MARK: Graph
/// An immutable, well formed automaton: every state, one start state, the accept set, and all edges.
/// Shared borrows of one graph can drive any number of runs.
#[derive(Debug, Clone)]
pub struct StateGraph<Σ: Symbol> {
    states: Arena<StateId, State<Σ>>,
    start: StateId,
    accept: StateSet,
    has_epsilon: bool,
}

impl<Σ: Symbol> StateGraph<Σ> {
    /// Builds a graph from a complete table, states are referred to by name.
    /// `transitions` lists `(from, symbol, targets)`, `epsilons` lists `(from, to)`.
    pub fn from_table(
        names: &[&str],
        start: &str,
        accept: &[&str],
        transitions: &[(&str, Σ, &[&str])],
        epsilons: &[(&str, &str)],
    ) -> Result<Self, BuildError> {
        let mut builder = GraphBuilder::new();
        let mut by_name: HashMap<&str, StateId> = HashMap::with_capacity(names.len());
        for &name in names {
            let id = builder.add_state(name);
            if by_name.insert(name, id).is_some() {
                return Err(BuildError::DuplicateName(name.to_owned()));
            }
        }
        let resolve = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| BuildError::UnknownName(name.to_owned()))
        };

        builder.set_start(resolve(start)?)?;
        for &name in accept {
            builder.set_accept(resolve(name)?, true)?;
        }
        for &(from, symbol, targets) in transitions {
            let from = resolve(from)?;
            for &to in targets {
                builder.add_transition(from, symbol, resolve(to)?)?;
            }
        }
        for &(from, to) in epsilons {
            builder.add_epsilon(resolve(from)?, resolve(to)?)?;
        }
        builder.build()
    }

    /// The start state.
    pub fn start(&self) -> StateId {
        self.start
    }

    /// Every accepting state.
    pub fn accept_states(&self) -> &StateSet {
        &self.accept
    }

    /// Returns if the state is accepting.
    pub fn is_accept(&self, state: StateId) -> bool {
        self.accept.contains(state)
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false for a built graph, it holds at least its start state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns true if the state belongs to this graph.
    pub fn contains(&self, state: StateId) -> bool {
        self.states.contains(state)
    }

    /// The state behind a handle. Panics on a handle from another automaton.
    pub fn state(&self, state: StateId) -> &State<Σ> {
        &self.states[state]
    }

    /// Display name of a state.
    pub fn name(&self, state: StateId) -> &str {
        self.states[state].name()
    }

    /// Successors of `state` on `symbol`, empty if the transition is undefined.
    pub fn successors(&self, state: StateId, symbol: &Σ) -> &[StateId] {
        self.states[state].get_transitions(symbol)
    }

    /// Epsilon successors of `state`.
    pub fn epsilon_successors(&self, state: StateId) -> &[StateId] {
        self.states[state].epsilon_transitions()
    }

    /// False when the graph has no epsilon edge at all, closure is then the identity.
    pub fn has_epsilon_edges(&self) -> bool {
        self.has_epsilon
    }

    /// All symbols with at least one transition somewhere in the graph.
    pub fn alphabet(&self) -> HashSet<Σ> {
        self.states
            .iter()
            .flat_map(|(_, state)| state.symbols().copied())
            .collect()
    }

    /// Every state handle, in the order they were added.
    pub fn state_ids(&self) -> impl ExactSizeIterator<Item = StateId> + use<Σ> {
        self.states.keys()
    }

    /// An empty set sized for this graph.
    pub fn empty_set(&self) -> StateSet {
        StateSet::with_capacity(self.len())
    }

    /// The epsilon closure of the start state, the configuration every run begins in.
    pub fn initial(&self) -> StateSet {
        self.closure(&StateSet::singleton(self.start, self.len()))
    }

    /// See [`epsilon_closure`].
    pub fn closure(&self, states: &StateSet) -> StateSet {
        epsilon_closure(self, states)
    }

    /// See [`step()`](crate::step::step).
    pub fn step(&self, states: &StateSet, symbol: &Σ) -> StateSet {
        step::step(self, states, symbol)
    }

    /// Names of the members of `states`, for display.
    pub fn names<'a>(&'a self, states: &StateSet) -> Vec<&'a str> {
        states.iter().map(|state| self.name(state)).collect()
    }
}
