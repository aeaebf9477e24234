//! Driving a [`StateGraph`] over an input, one symbol at a time or all at once.

use tracing::debug;

use crate::Symbol;
use crate::audit::{AuditSink, StepRecord};
use crate::error::{BuildError, RunError};
use crate::graph::StateGraph;
use crate::set::StateSet;

/// Lifecycle of a run. `Accepted` and `Rejected` are terminal until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Fresh, nothing consumed yet.
    Idle,
    /// At least one symbol consumed, not finished.
    Running,
    /// Finished in an accept state.
    Accepted,
    /// Finished without reaching an accept state.
    Rejected,
}

impl RunStatus {
    /// Returns if the run ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Accepted | RunStatus::Rejected)
    }
}

/// Final answer of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The input was accepted.
    Accepted,
    /// The input was rejected.
    Rejected,
}

impl Verdict {
    /// Returns if the input was accepted.
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }

    fn status(self) -> RunStatus {
        match self {
            Verdict::Accepted => RunStatus::Accepted,
            Verdict::Rejected => RunStatus::Rejected,
        }
    }
}

/// Everything needed to pick a suspended run back up, together with the rest of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Active states after the last consumed symbol.
    pub active: StateSet,
    /// Number of symbols consumed so far.
    pub cursor: usize,
}

/// Summary handed back after each symbol by [`Steps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Symbols consumed so far.
    pub cursor: usize,
    /// Number of active states, 0 once every branch died.
    pub active: usize,
    /// Whether the run would be accepted if the input ended here.
    pub accepting: bool,
}

/// Runs a nondeterministic automaton. The graph is only borrowed, any number of runners can share it.
pub struct Runner<'g, Σ: Symbol, S: AuditSink<Σ> = ()> {
    graph: &'g StateGraph<Σ>,
    active: StateSet,
    cursor: usize,
    status: RunStatus,
    sink: S,
}

impl<'g, Σ: Symbol> Runner<'g, Σ> {
    /// Creates an idle runner sitting in the closure of the start state.
    pub fn new(graph: &'g StateGraph<Σ>) -> Self {
        Self::with_sink(graph, ())
    }

    /// Rebuilds a runner from a checkpoint taken on the same graph.
    pub fn resume(graph: &'g StateGraph<Σ>, checkpoint: Checkpoint) -> Result<Self, BuildError> {
        Self::resume_with_sink(graph, checkpoint, ())
    }
}

impl<'g, Σ: Symbol, S: AuditSink<Σ>> Runner<'g, Σ, S> {
    /// Creates an idle runner which reports every step to `sink`.
    pub fn with_sink(graph: &'g StateGraph<Σ>, sink: S) -> Self {
        Self {
            graph,
            active: graph.initial(),
            cursor: 0,
            status: RunStatus::Idle,
            sink,
        }
    }

    /// Same as [`Runner::resume`], reporting to `sink` from here on. The checkpointed states are closed over
    /// epsilon edges again, a hand written checkpoint may list only the states it stepped into.
    pub fn resume_with_sink(graph: &'g StateGraph<Σ>, checkpoint: Checkpoint, sink: S) -> Result<Self, BuildError> {
        if let Some(stray) = checkpoint.active.iter().find(|state| !graph.contains(*state)) {
            return Err(BuildError::UnknownState(stray));
        }
        Ok(Self {
            graph,
            active: graph.closure(&checkpoint.active),
            cursor: checkpoint.cursor,
            status: if checkpoint.cursor == 0 { RunStatus::Idle } else { RunStatus::Running },
            sink,
        })
    }

    /// Throws the current run away and starts over from the closure of the start state.
    pub fn reset(&mut self) {
        debug!(consumed = self.cursor, status = ?self.status, "reset");
        self.active = self.graph.initial();
        self.cursor = 0;
        self.status = RunStatus::Idle;
    }

    /// Consumes one symbol: step every active state, then close over epsilon edges.
    /// Fails only if the run already ended.
    pub fn step(&mut self, symbol: Σ) -> Result<&StateSet, RunError> {
        self.ensure_live()?;

        let raw = self.graph.step(&self.active, &symbol);
        let closed = self.graph.closure(&raw);

        self.cursor += 1;
        self.status = RunStatus::Running;
        let record = StepRecord {
            index: self.cursor,
            symbol,
            before: std::mem::take(&mut self.active),
            after: closed,
        };
        self.sink.record(&record);
        self.active = record.after;
        Ok(&self.active)
    }

    /// Ends the run, the input is over.
    pub fn finish(&mut self) -> Result<Verdict, RunError> {
        self.ensure_live()?;
        let verdict = if self.is_accepting() { Verdict::Accepted } else { Verdict::Rejected };
        self.status = verdict.status();
        debug!(consumed = self.cursor, ?verdict, "finished");
        Ok(verdict)
    }

    /// Consumes the whole input and finishes.
    pub fn run<I: IntoIterator<Item = Σ>>(&mut self, input: I) -> Result<Verdict, RunError> {
        for symbol in input {
            self.step(symbol)?;
        }
        self.finish()
    }

    /// Lazily consumes `input`, one symbol per call to `next`. Control returns to the caller between symbols,
    /// call [`Runner::finish`] once the iterator is exhausted.
    pub fn steps<I: IntoIterator<Item = Σ>>(&mut self, input: I) -> Steps<'_, 'g, Σ, S, I::IntoIter> {
        Steps {
            runner: self,
            input: input.into_iter(),
        }
    }

    /// Whether the active set holds an accept state.
    pub fn is_accepting(&self) -> bool {
        self.active.intersects(self.graph.accept_states())
    }

    /// The active, epsilon closed, states.
    pub fn active(&self) -> &StateSet {
        &self.active
    }

    /// Number of symbols consumed since the last reset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Lifecycle status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The graph being run.
    pub fn graph(&self) -> &'g StateGraph<Σ> {
        self.graph
    }

    /// Snapshot of the configuration.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            active: self.active.clone(),
            cursor: self.cursor,
        }
    }

    /// Summary of the configuration.
    pub fn progress(&self) -> Progress {
        Progress {
            cursor: self.cursor,
            active: self.active.len(),
            accepting: self.is_accepting(),
        }
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

/// Iterator returned by [`Runner::steps`].
pub struct Steps<'r, 'g, Σ: Symbol, S: AuditSink<Σ>, I> {
    runner: &'r mut Runner<'g, Σ, S>,
    input: I,
}

impl<Σ: Symbol, S: AuditSink<Σ>, I: Iterator<Item = Σ>> Iterator for Steps<'_, '_, Σ, S, I> {
    type Item = Result<Progress, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = self.input.next()?;
        if let Err(err) = self.runner.step(symbol) {
            return Some(Err(err));
        }
        Some(Ok(self.runner.progress()))
    }
}
