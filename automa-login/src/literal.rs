//! Automata accepting exactly one string.

use automa::{BuildError, GraphBuilder, StateGraph};

/// Builds `q0 -c0-> q1 -c1-> ... qn` for the characters of `target`, with only `qn` accepting.
/// The empty target gives a single accepting start state.
pub fn literal(target: &str) -> Result<StateGraph<char>, BuildError> {
    let mut builder = GraphBuilder::new();
    let mut cur = builder.add_state("q0");
    builder.set_start(cur)?;
    for (i, c) in target.chars().enumerate() {
        let next = builder.add_state(format!("q{}", i + 1));
        builder.add_transition(cur, c, next)?;
        cur = next;
    }
    builder.set_accept(cur, true)?;
    builder.build()
}

#[cfg(test)]
mod test {
    use automa::Runner;

    use super::*;

    fn accepts(graph: &StateGraph<char>, input: &str) -> bool {
        Runner::new(graph).run(input.chars()).unwrap().is_accepted()
    }

    #[test]
    fn test_admin() {
        let graph = literal("admin").unwrap();
        assert_eq!(graph.len(), 6);
        assert!(accepts(&graph, "admin"));
        assert!(!accepts(&graph, "admi"));
        assert!(!accepts(&graph, "adminx"));
        assert!(!accepts(&graph, ""));
    }

    #[test]
    fn test_empty_target() {
        let graph = literal("").unwrap();
        assert!(accepts(&graph, ""));
        assert!(!accepts(&graph, "a"));
    }

    #[test]
    fn test_multibyte() {
        let graph = literal("café").unwrap();
        assert_eq!(graph.len(), 5);
        assert!(accepts(&graph, "café"));
        assert!(!accepts(&graph, "cafe"));
    }
}
