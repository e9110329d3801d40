//! Layered topological ordering.
//!
//! [`Layers`] groups the nodes of a dependency graph into *layers*. A node
//! without in-graph dependencies lands in layer 0; every other node lands
//! exactly one layer above the deepest of its dependencies. Nodes that share a
//! layer never depend on each other, so once every earlier layer has been
//! processed the members of a layer can be handled in any order.
//!
//! Dependencies on nodes that were never added are ignored. This lets callers
//! layer a partially discovered graph without first pruning edges that point
//! outside of it.
//!
//! # Example
//!
//! ```
//! use addons_layers::Layers;
//!
//! let mut layers = Layers::new();
//! layers.add("app", ["db", "log", "metrics"]);
//! layers.add("db", ["log"]);
//! layers.add("log", []);
//!
//! // "metrics" was never added, so it does not constrain "app".
//! assert_eq!(
//!     layers.layered().unwrap(),
//!     vec![vec!["log"], vec!["db"], vec!["app"]],
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};

use core::hash::Hash;
use hashbrown::HashMap;

/// Error returned when the dependency graph contains a cycle.
///
/// `nodes` lists, in ascending order, every node that could not be placed in a
/// layer. That is the nodes on a cycle plus anything depending on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circular dependency detected among {nodes:?}")]
pub struct CycleError<K> {
    /// Nodes that could not be layered.
    pub nodes: Vec<K>,
}

/// A dependency graph that can be split into layers.
///
/// Nodes are kept in a sorted map so that the output never depends on the
/// order in which nodes were added. Within a layer, nodes are returned in
/// ascending order.
#[derive(Debug, Clone)]
pub struct Layers<K> {
    deps: BTreeMap<K, BTreeSet<K>>,
}

impl<K> Default for Layers<K> {
    fn default() -> Self {
        Self {
            deps: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + Hash> Layers<K> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a node set and a "dependencies of" relation.
    ///
    /// # Example
    ///
    /// ```
    /// use addons_layers::Layers;
    ///
    /// let layers = Layers::from_fn([1, 2, 3], |n| if *n > 1 { vec![n - 1] } else { vec![] });
    /// assert_eq!(layers.layered().unwrap(), vec![vec![1], vec![2], vec![3]]);
    /// ```
    pub fn from_fn<I, F, D>(nodes: I, mut deps: F) -> Self
    where
        I: IntoIterator<Item = K>,
        F: FnMut(&K) -> D,
        D: IntoIterator<Item = K>,
    {
        let mut layers = Self::new();
        for node in nodes {
            let node_deps = deps(&node);
            layers.add(node, node_deps);
        }
        layers
    }

    /// Adds a node with its dependencies.
    ///
    /// Adding the same node again merges the new dependencies into the
    /// existing ones.
    pub fn add<I>(&mut self, node: K, deps: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
    {
        self.deps.entry(node).or_default().extend(deps);
        self
    }

    /// Returns true if `node` was added.
    #[must_use]
    pub fn contains(&self, node: &K) -> bool {
        self.deps.contains_key(node)
    }

    /// Returns the declared dependencies of `node`, including ones outside the graph.
    #[must_use]
    pub fn dependencies(&self, node: &K) -> Option<&BTreeSet<K>> {
        self.deps.get(node)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Returns true if no node was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Splits the graph into layers.
    ///
    /// The result is the minimal layering: each node's layer index is
    /// `1 + max(layer of its in-graph dependencies)`, or `0` when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] if the in-graph dependencies contain a cycle
    /// (a node depending on itself counts).
    pub fn layered(&self) -> Result<Vec<Vec<K>>, CycleError<K>> {
        // Remaining in-graph dependency count per node, and the reverse edges.
        let mut pending: HashMap<&K, usize> = HashMap::with_capacity(self.deps.len());
        let mut dependents: HashMap<&K, Vec<&K>> = HashMap::new();

        for (node, deps) in &self.deps {
            let mut count = 0;
            for dep in deps.iter().filter(|dep| self.deps.contains_key(*dep)) {
                dependents.entry(dep).or_default().push(node);
                count += 1;
            }
            pending.insert(node, count);
        }

        let mut current: Vec<&K> = self
            .deps
            .keys()
            .filter(|node| pending.get(node).copied() == Some(0))
            .collect();

        let mut layers = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            current.sort_unstable();
            placed += current.len();

            let mut next = Vec::new();
            for node in &current {
                let Some(children) = dependents.get(node) else {
                    continue;
                };
                for child in children {
                    if let Some(count) = pending.get_mut(child) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(*child);
                        }
                    }
                }
            }

            layers.push(current.into_iter().cloned().collect());
            current = next;
        }

        if placed != self.deps.len() {
            let nodes = self
                .deps
                .keys()
                .filter(|node| pending.get(node).is_some_and(|count| *count > 0))
                .cloned()
                .collect();
            return Err(CycleError { nodes });
        }

        Ok(layers)
    }
}
