//! Property-based tests for the parser and dependency graph, the two
//! pipeline stages whose correctness is most naturally stated as a
//! quantified invariant rather than a handful of fixed examples.

use formula_engine::parser::parse;
use proptest::prelude::*;

mod test_support;

fn arithmetic_expr_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        Just("$x".to_string()),
        Just("$y".to_string()),
        Just("true".to_string()),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} + {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} * {b})")),
            (inner.clone(), inner).prop_map(|(a, b)| format!("(({a}) > ({b}) ? ({a}) : ({b}))")),
        ]
    })
}

proptest! {
    /// Property 1: every expression generated by this well-formed-by-construction
    /// grammar parses successfully (the parser is never "surprised" by valid
    /// input it should accept).
    #[test]
    fn prop_well_formed_expressions_always_parse(expr in arithmetic_expr_strategy()) {
        prop_assert!(parse(&expr).is_ok(), "failed to parse well-formed expression: {expr}");
    }

    /// Property 1 (negative direction): truncating a well-formed expression by
    /// one trailing character never silently parses into a *different*
    /// complete expression — it either still parses the same prefix error-free
    /// only when that prefix is itself complete, or raises an error. We assert
    /// the weaker, still-meaningful half: a bare trailing operator never parses.
    #[test]
    fn prop_dangling_operator_is_a_parse_error(op in prop_oneof![Just("+"), Just("*"), Just("-"), Just("/")]) {
        let expr = format!("1 {op}");
        prop_assert!(parse(&expr).is_err());
    }
}

mod graph_properties {
    use formula_engine::Engine;
    use formula_engine::{EngineConfig, FormulaDefinition};
    use proptest::prelude::*;

    /// Builds a DAG over ids `0..n`: raw picks are generated independently of
    /// `n` and then reduced modulo each node's own index, so every edge
    /// necessarily points to a strictly-lower id and the graph is acyclic by
    /// construction regardless of which picks proptest draws.
    fn dag_strategy(n: usize) -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
        proptest::collection::vec(proptest::collection::vec(any::<u16>(), 0..4), n).prop_map(move |picks| {
            picks
                .into_iter()
                .enumerate()
                .map(|(i, raw)| {
                    let deps = if i == 0 {
                        Vec::new()
                    } else {
                        raw.into_iter().map(|v| v as usize % i).collect()
                    };
                    (i, deps)
                })
                .collect()
        })
    }

    proptest! {
        /// Property 3: topological correctness — for every edge a depends-on b,
        /// b's position in the returned order precedes a's.
        #[test]
        fn prop_topological_order_respects_all_edges(graph in dag_strategy(12)) {
            let formulas: Vec<FormulaDefinition> = graph
                .iter()
                .map(|(id, deps)| {
                    let expr = if deps.is_empty() {
                        "1".to_string()
                    } else {
                        deps.iter().map(|d| format!("${d}")).collect::<Vec<_>>().join(" + ")
                    };
                    let mut def = FormulaDefinition::new(id.to_string(), expr);
                    def.explicit_deps = Some(deps.iter().map(|d| d.to_string()).collect());
                    def
                })
                .collect();

            let mut engine = Engine::new(EngineConfig::default());
            let order = engine.get_evaluation_order(&formulas).expect("constructed graph is acyclic");
            let position = |id: &str| order.iter().position(|x| x == id).expect("every node appears in the order");

            for (id, deps) in &graph {
                for dep in deps {
                    prop_assert!(position(&dep.to_string()) < position(&id.to_string()));
                }
            }
        }
    }
}
