//! Epsilon closure.

use smallvec::SmallVec;
use tracing::trace;

use crate::Symbol;
use crate::graph::{StateGraph, StateId};
use crate::set::StateSet;

/// Expands `states` with every state reachable through epsilon edges only.
///
/// A state is queued at most once per call, so epsilon cycles terminate. The input is left untouched and the
/// result owns its own storage.
pub fn epsilon_closure<Σ: Symbol>(graph: &StateGraph<Σ>, states: &StateSet) -> StateSet {
    let mut closure = states.clone();
    if !graph.has_epsilon_edges() {
        return closure;
    }

    let mut work: SmallVec<[StateId; 32]> = states.iter().collect();
    while let Some(state) = work.pop() {
        for &next in graph.epsilon_successors(state) {
            if closure.insert(next) {
                trace!(from = %state, to = %next, "epsilon");
                work.push(next);
            }
        }
    }
    closure
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphBuilder;

    /// All subsets of the graph's states, fine for the handful of states used here.
    fn subsets(graph: &StateGraph<char>) -> Vec<StateSet> {
        let ids: Vec<StateId> = graph.state_ids().collect();
        (0..1u32 << ids.len())
            .map(|mask| {
                ids.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .collect()
    }

    fn cycle_graph() -> (StateGraph<char>, Vec<StateId>) {
        // 0 -ε-> 1 -ε-> 2 -ε-> 0, 2 -ε-> 3, 3 -a-> 4, 4 -ε-> 5
        let mut builder = GraphBuilder::new();
        let s: Vec<StateId> = (0..6).map(|i| builder.add_state(format!("s{i}"))).collect();
        builder.add_epsilon(s[0], s[1]).unwrap();
        builder.add_epsilon(s[1], s[2]).unwrap();
        builder.add_epsilon(s[2], s[0]).unwrap();
        builder.add_epsilon(s[2], s[3]).unwrap();
        builder.add_transition(s[3], 'a', s[4]).unwrap();
        builder.add_epsilon(s[4], s[5]).unwrap();
        builder.set_start(s[0]).unwrap();
        (builder.build().unwrap(), s)
    }

    #[test]
    fn test_epsilon_free_closure_is_identity() {
        let mut builder = GraphBuilder::new();
        let s: Vec<StateId> = (0..4).map(|i| builder.add_state(format!("s{i}"))).collect();
        builder.add_transition(s[0], 'a', s[1]).unwrap();
        builder.add_transition(s[1], 'b', s[2]).unwrap();
        builder.add_transition(s[2], 'a', s[3]).unwrap();
        builder.set_start(s[0]).unwrap();
        let graph = builder.build().unwrap();

        for set in subsets(&graph) {
            assert_eq!(epsilon_closure(&graph, &set), set);
        }
    }

    #[test]
    fn test_closure_is_idempotent() {
        let (graph, _) = cycle_graph();
        for set in subsets(&graph) {
            let once = epsilon_closure(&graph, &set);
            assert!(set.is_subset(&once));
            assert_eq!(epsilon_closure(&graph, &once), once);
        }
    }

    #[test]
    fn test_epsilon_cycle_terminates() {
        let (graph, s) = cycle_graph();
        let closed = epsilon_closure(&graph, &StateSet::singleton(s[1], graph.len()));
        // the cycle plus what hangs off it, but nothing behind the 'a' edge
        assert_eq!(closed, [s[0], s[1], s[2], s[3]].into_iter().collect());

        let downstream = epsilon_closure(&graph, &StateSet::singleton(s[4], graph.len()));
        assert_eq!(downstream, [s[4], s[5]].into_iter().collect());
    }

    #[test]
    fn test_input_is_not_aliased() {
        let (graph, s) = cycle_graph();
        let input = StateSet::singleton(s[0], graph.len());
        let mut closed = epsilon_closure(&graph, &input);
        closed.insert(s[5]);
        assert_eq!(input.len(), 1);
        assert!(input.contains(s[0]));
    }

    #[test]
    fn test_self_loop() {
        let mut builder = GraphBuilder::<char>::new();
        let q0 = builder.add_state("q0");
        builder.add_epsilon(q0, q0).unwrap();
        builder.set_start(q0).unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.initial(), StateSet::singleton(q0, 1));
    }
}
