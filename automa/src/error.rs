//! Error types for automaton construction, runs, and the login protocol.

use thiserror::Error;

use crate::graph::StateId;
use crate::retry::Phase;
use crate::runner::Verdict;

/// Errors raised while building an automaton. A failed build never yields a runnable automaton.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An edge, start or accept designation named a state the builder does not own.
    #[error("{0:?} does not belong to this automaton")]
    UnknownState(StateId),

    /// `build` was called before a start state was designated.
    #[error("no start state was set")]
    MissingStart,

    /// Two states in a table definition share a name.
    #[error("state name '{0}' is defined more than once")]
    DuplicateName(String),

    /// A table definition references a name it never declared.
    #[error("state name '{0}' is not defined")]
    UnknownName(String),

    /// The absorbing error state only ever loops on itself.
    #[error("the error state is absorbing and cannot have outgoing transitions")]
    ErrorStateTransition,

    /// The absorbing error state is never accepting.
    #[error("the error state cannot be an accept state")]
    AcceptingErrorState,

    /// A deterministic state already has a different successor on this symbol.
    #[error("{from:?} already moves to {existing:?} on {symbol}, cannot also move to {requested:?}")]
    ConflictingTransition {
        /// Source state.
        from: StateId,
        /// Debug rendering of the symbol.
        symbol: String,
        /// Successor already recorded.
        existing: StateId,
        /// Successor that was refused.
        requested: StateId,
    },

    /// The retry budget has to allow at least one attempt.
    #[error("retry budget must allow at least one attempt")]
    InvalidRetryBudget,
}

/// Errors raised by a runner used out of order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// The run already ended, `reset` has to be called before stepping again.
    #[error("run already ended as {0:?}, reset before reusing the runner")]
    Terminated(Verdict),
}

/// Errors raised by the bounded-retry login protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The operation is not valid in the current phase.
    #[error("cannot {operation} while in phase {phase:?}")]
    OutOfOrder {
        /// Phase the session was in.
        phase: Phase,
        /// Operation that was refused.
        operation: &'static str,
    },

    /// Validation was requested before a secret was collected.
    #[error("validation requested before a secret was collected")]
    MissingSecret,

    /// The underlying runner refused the step.
    #[error(transparent)]
    Run(#[from] RunError),
}
