//! Property tests for [`Layers`].
//!
//! Random acyclic graphs are generated by only allowing a node to depend on
//! nodes with a smaller index, plus a few dangling dependencies that point
//! outside the graph.

use addons_layers::Layers;
use proptest::prelude::*;

/// Dependencies per node, as indices. Index `n` and above are outside the graph.
fn dag(max_nodes: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..max_nodes).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                let in_graph = prop::collection::vec(0..i.max(1), 0..4)
                    .prop_map(move |deps| deps.into_iter().filter(|d| *d < i).collect::<Vec<_>>());
                let dangling = prop::collection::vec(n..n + 3, 0..2);
                (in_graph, dangling).prop_map(|(mut deps, dangling)| {
                    deps.extend(dangling);
                    deps
                })
            })
            .collect::<Vec<_>>()
    })
}

fn build(deps: &[Vec<usize>]) -> Layers<usize> {
    Layers::from_fn(0..deps.len(), |node| deps[*node].clone())
}

fn layer_of(layers: &[Vec<usize>], node: usize) -> usize {
    layers
        .iter()
        .position(|layer| layer.contains(&node))
        .expect("every node is layered")
}

proptest! {
    #[test]
    fn every_node_appears_exactly_once(deps in dag(24)) {
        let layers = build(&deps).layered().unwrap();
        let mut seen: Vec<usize> = layers.iter().flatten().copied().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..deps.len()).collect::<Vec<_>>());
    }

    #[test]
    fn dependencies_sit_in_strictly_earlier_layers(deps in dag(24)) {
        let layers = build(&deps).layered().unwrap();
        for (node, node_deps) in deps.iter().enumerate() {
            for dep in node_deps.iter().filter(|d| **d < deps.len()) {
                prop_assert!(layer_of(&layers, *dep) < layer_of(&layers, node));
            }
        }
    }

    #[test]
    fn layer_index_is_one_past_deepest_dependency(deps in dag(24)) {
        let layers = build(&deps).layered().unwrap();
        for (node, node_deps) in deps.iter().enumerate() {
            let expected = node_deps
                .iter()
                .filter(|d| **d < deps.len())
                .map(|d| layer_of(&layers, *d) + 1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(layer_of(&layers, node), expected);
        }
    }

    #[test]
    fn layers_are_sorted_and_independent_of_insertion_order(deps in dag(24)) {
        let forward = build(&deps).layered().unwrap();
        let reversed = Layers::from_fn((0..deps.len()).rev(), |node| deps[*node].clone())
            .layered()
            .unwrap();

        for layer in &forward {
            prop_assert!(layer.windows(2).all(|pair| pair[0] < pair[1]));
        }
        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn closing_a_loop_is_reported(deps in dag(24)) {
        // Node 0 and the last node depend on each other.
        let mut deps = deps;
        let last = deps.len() - 1;
        deps[0].push(last);
        deps[last].push(0);

        let err = build(&deps).layered().unwrap_err();
        prop_assert!(err.nodes.contains(&0));
        prop_assert!(err.nodes.contains(&last));
    }
}
