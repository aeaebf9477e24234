//! One symbol worth of nondeterministic transition, before closure.

use crate::Symbol;
use crate::graph::StateGraph;
use crate::set::StateSet;

/// Union of the successors of every state in `states` on `symbol`.
/// An empty result is a normal outcome, every branch died on this symbol.
pub fn step<Σ: Symbol>(graph: &StateGraph<Σ>, states: &StateSet, symbol: &Σ) -> StateSet {
    let mut next = graph.empty_set();
    for state in states.iter() {
        next.extend(graph.successors(state, symbol).iter().copied());
    }
    next
}
