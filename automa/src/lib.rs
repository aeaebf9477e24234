#![warn(missing_docs)]

//! Finite automaton construction and simulation.
//!
//! States live in a [`corral::Arena`] and are addressed by [`StateId`] handles, active configurations are
//! bitsets over those handles. Nondeterministic automata (with or without epsilon edges) are built with a
//! [`GraphBuilder`] and driven by a [`Runner`], deterministic ones are built with a [`DfaBuilder`] and driven
//! by a [`DfaRunner`]. The [`retry`] module layers a bounded-retry login protocol on top of a [`Dfa`].
//!
//! The engine does no I/O. Every transition attempt is handed to an [`AuditSink`], which is where logging
//! or telemetry hooks in.

use std::fmt::Debug;
use std::hash::Hash;

pub mod audit;
pub mod closure;
pub mod dfa;
pub mod error;
pub mod graph;
pub mod retry;
pub mod runner;
pub mod set;
pub mod step;

pub use audit::{AuditSink, FnSink, StepRecord, TracingSink};
pub use closure::epsilon_closure;
pub use dfa::{Dfa, DfaBuilder, DfaRunner};
pub use error::{BuildError, ProtocolError, RunError};
pub use graph::{GraphBuilder, State, StateGraph, StateId};
pub use runner::{Checkpoint, Progress, RunStatus, Runner, Steps, Verdict};
pub use set::StateSet;
pub use step::step;

/// Anything usable as an input symbol. Blanket implemented, `char`, `u8` and small `Copy` enums all qualify.
pub trait Symbol: Eq + Hash + Copy + Debug {}

impl<T: Eq + Hash + Copy + Debug> Symbol for T {}
