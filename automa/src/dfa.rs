//! Deterministic automata: one active state, a total transition function, and an absorbing error state
//! standing in for every transition that was not defined.

use corral::Arena;
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::Symbol;
use crate::audit::{AuditSink, StepRecord};
use crate::error::{BuildError, RunError};
use crate::graph::StateId;
use crate::runner::{RunStatus, Verdict};
use crate::set::StateSet;

const ERROR_NAME: &str = "error";

// MARK: State
/// A node in the DFA, at most one target per symbol.
#[derive(Debug, Clone)]
pub struct DfaState<Σ: Symbol> {
    name: String,
    is_accept: bool,
    transitions: HashMap<Σ, StateId>,
}

impl<Σ: Symbol> DfaState<Σ> {
    fn new(name: String) -> Self {
        Self {
            name,
            is_accept: false,
            transitions: HashMap::new(),
        }
    }

    /// Label given when the state was added.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the accept state flag.
    pub fn is_accept(&self) -> bool {
        self.is_accept
    }

    /// Returns the next state given the provided symbol, if one was defined.
    pub fn get_transition(&self, symbol: &Σ) -> Option<StateId> {
        self.transitions.get(symbol).copied()
    }
}

// MARK: Builder
/// Incremental construction of a [`Dfa`]. The absorbing error state exists from the start.
#[derive(Debug, Clone)]
pub struct DfaBuilder<Σ: Symbol> {
    states: Arena<StateId, DfaState<Σ>>,
    start: Option<StateId>,
    error: StateId,
}

impl<Σ: Symbol> DfaBuilder<Σ> {
    /// Creates a builder holding only the error state.
    pub fn new() -> Self {
        let mut states = Arena::new();
        let error = states.alloc(DfaState::new(ERROR_NAME.to_owned()));
        Self {
            states,
            start: None,
            error,
        }
    }

    /// The absorbing error state, valid as a transition target.
    pub fn error_state(&self) -> StateId {
        self.error
    }

    /// Adds a non accepting state.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        self.states.alloc(DfaState::new(name.into()))
    }

    /// Adds an accepting state.
    pub fn add_accept_state(&mut self, name: impl Into<String>) -> StateId {
        let id = self.add_state(name);
        self.states[id].is_accept = true;
        id
    }

    /// Updates the accept flag. The error state can never accept.
    pub fn set_accept(&mut self, state: StateId, is_accept: bool) -> Result<(), BuildError> {
        self.check(state)?;
        if state == self.error && is_accept {
            return Err(BuildError::AcceptingErrorState);
        }
        self.states[state].is_accept = is_accept;
        Ok(())
    }

    /// Designates the start state.
    pub fn set_start(&mut self, state: StateId) -> Result<(), BuildError> {
        self.check(state)?;
        self.start = Some(state);
        Ok(())
    }

    /// Defines `from --symbol--> to`. Repeating an identical transition is fine, redefining it to another
    /// target is a [`BuildError::ConflictingTransition`].
    pub fn add_transition(&mut self, from: StateId, symbol: Σ, to: StateId) -> Result<(), BuildError> {
        self.check(from)?;
        self.check(to)?;
        if from == self.error {
            return Err(BuildError::ErrorStateTransition);
        }
        let existing = self.states[from].get_transition(&symbol);
        match existing {
            Some(existing) if existing != to => Err(BuildError::ConflictingTransition {
                from,
                symbol: format!("{symbol:?}"),
                existing,
                requested: to,
            }),
            _ => {
                self.states[from].transitions.insert(symbol, to);
                Ok(())
            }
        }
    }

    /// Freezes the builder.
    pub fn build(self) -> Result<Dfa<Σ>, BuildError> {
        let start = self.start.ok_or(BuildError::MissingStart)?;
        let alphabet: HashSet<Σ> = self
            .states
            .iter()
            .flat_map(|(_, state)| state.transitions.keys().copied())
            .collect();

        debug!(states = self.states.len(), symbols = alphabet.len(), "built dfa");

        Ok(Dfa {
            states: self.states,
            start,
            error: self.error,
            alphabet,
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

impl<Σ: Symbol> Default for DfaBuilder<Σ> {
    fn default() -> Self {
        Self::new()
    }
}

// MARK: DFA
/// An immutable deterministic automaton. Undefined transitions lead to the error state, which loops on itself.
#[derive(Debug, Clone)]
pub struct Dfa<Σ: Symbol> {
    states: Arena<StateId, DfaState<Σ>>,
    start: StateId,
    error: StateId,
    alphabet: HashSet<Σ>,
}

impl<Σ: Symbol> Dfa<Σ> {
    /// Builds a DFA from a complete table of `(from, symbol, to)` rows, states referred to by name.
    /// The name `"error"` is reserved for the absorbing error state and may be used as a target.
    pub fn from_table(
        names: &[&str],
        start: &str,
        accept: &[&str],
        transitions: &[(&str, Σ, &str)],
    ) -> Result<Self, BuildError> {
        let mut builder = DfaBuilder::new();
        let mut by_name: HashMap<&str, StateId> = HashMap::with_capacity(names.len() + 1);
        by_name.insert(ERROR_NAME, builder.error_state());
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
        for &(from, symbol, to) in transitions {
            builder.add_transition(resolve(from)?, symbol, resolve(to)?)?;
        }
        builder.build()
    }

    /// Strict lookup. Undefined transitions, and anything out of the error state, go to the error state.
    pub fn step(&self, state: StateId, symbol: &Σ) -> StateId {
        if state == self.error {
            return self.error;
        }
        self.states[state].get_transition(symbol).unwrap_or(self.error)
    }

    /// The start state.
    pub fn start(&self) -> StateId {
        self.start
    }

    /// The absorbing error state.
    pub fn error_state(&self) -> StateId {
        self.error
    }

    /// Returns if `state` is the error state.
    pub fn is_error(&self, state: StateId) -> bool {
        state == self.error
    }

    /// Returns if `state` accepts.
    pub fn is_accept(&self, state: StateId) -> bool {
        self.states[state].is_accept
    }

    /// The state behind a handle.
    pub fn state(&self, state: StateId) -> &DfaState<Σ> {
        &self.states[state]
    }

    /// Display name of a state.
    pub fn name(&self, state: StateId) -> &str {
        self.states[state].name()
    }

    /// Number of states, the error state included.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false, the error state is always there.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Every symbol some transition was defined on.
    pub fn alphabet(&self) -> &HashSet<Σ> {
        &self.alphabet
    }

    /// Tests the provided input sequence on an iterator, returning true if the DFA ends at an accept state.
    pub fn simulate_iter(&self, input: impl IntoIterator<Item = Σ>) -> bool {
        let end = input
            .into_iter()
            .fold(self.start, |cur, symbol| self.step(cur, &symbol));
        self.is_accept(end)
    }

    /// Tests the provided input sequence, returning true if the DFA ends at an accept state.
    pub fn simulate_slice(&self, input: &[Σ]) -> bool {
        self.simulate_iter(input.iter().copied())
    }
}

// MARK: Runner
/// Runs a [`Dfa`], keeping the single active state and the step counter.
pub struct DfaRunner<'d, Σ: Symbol, S: AuditSink<Σ> = ()> {
    dfa: &'d Dfa<Σ>,
    current: StateId,
    cursor: usize,
    status: RunStatus,
    sink: S,
}

impl<'d, Σ: Symbol> DfaRunner<'d, Σ> {
    /// Creates an idle runner on the start state.
    pub fn new(dfa: &'d Dfa<Σ>) -> Self {
        Self::with_sink(dfa, ())
    }
}

impl<'d, Σ: Symbol, S: AuditSink<Σ>> DfaRunner<'d, Σ, S> {
    /// Creates an idle runner which reports every transition attempt to `sink`.
    pub fn with_sink(dfa: &'d Dfa<Σ>, sink: S) -> Self {
        Self {
            dfa,
            current: dfa.start,
            cursor: 0,
            status: RunStatus::Idle,
            sink,
        }
    }

    /// Back to the start state, counter cleared.
    pub fn reset(&mut self) {
        debug!(consumed = self.cursor, status = ?self.status, "reset");
        self.current = self.dfa.start;
        self.cursor = 0;
        self.status = RunStatus::Idle;
    }

    /// Attempts one transition and counts it, landing in the error state is not a failure.
    pub fn step(&mut self, symbol: Σ) -> Result<StateId, RunError> {
        self.ensure_live()?;
        let next = self.dfa.step(self.current, &symbol);
        self.cursor += 1;
        self.status = RunStatus::Running;

        let capacity = self.dfa.len();
        self.sink.record(&StepRecord {
            index: self.cursor,
            symbol,
            before: StateSet::singleton(self.current, capacity),
            after: StateSet::singleton(next, capacity),
        });
        self.current = next;
        Ok(next)
    }

    /// Ends the run.
    pub fn finish(&mut self) -> Result<Verdict, RunError> {
        self.ensure_live()?;
        let verdict = if self.is_accepting() { Verdict::Accepted } else { Verdict::Rejected };
        self.status = match verdict {
            Verdict::Accepted => RunStatus::Accepted,
            Verdict::Rejected => RunStatus::Rejected,
        };
        debug!(consumed = self.cursor, ?verdict, state = self.dfa.name(self.current), "finished");
        Ok(verdict)
    }

    /// Consumes the whole input and finishes.
    pub fn run<I: IntoIterator<Item = Σ>>(&mut self, input: I) -> Result<Verdict, RunError> {
        for symbol in input {
            self.step(symbol)?;
        }
        self.finish()
    }

    /// Whether the current state accepts.
    pub fn is_accepting(&self) -> bool {
        self.dfa.is_accept(self.current)
    }

    /// Whether the run fell into the error state.
    pub fn in_error(&self) -> bool {
        self.dfa.is_error(self.current)
    }

    /// The single active state.
    pub fn current(&self) -> StateId {
        self.current
    }

    /// The active state as a set, always of size one.
    pub fn active(&self) -> StateSet {
        StateSet::singleton(self.current, self.dfa.len())
    }

    /// Transition attempts since the last reset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Lifecycle status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The automaton being run.
    pub fn dfa(&self) -> &'d Dfa<Σ> {
        self.dfa
    }

    /// The attached sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drops the runner, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn ensure_live(&self) -> Result<(), RunError> {
        match self.status {
            RunStatus::Accepted => Err(RunError::Terminated(Verdict::Accepted)),
            RunStatus::Rejected => Err(RunError::Terminated(Verdict::Rejected)),
            RunStatus::Idle | RunStatus::Running => Ok(()),
        }
    }
}
