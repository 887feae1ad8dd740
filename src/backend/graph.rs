//! Component dependency graph.
//!
//! Components depend on each other through `$components.NAME` tokens. The
//! graph answers one question: which components does a requested set pull in
//! transitively. Cycles are legal here (two components may include each
//! other) and simply end the walk.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

/// Directed graph of component names; an edge `a → b` means `a` includes `b`.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Register a component with no dependencies yet.
    pub fn add_component(&mut self, name: &str) {
        self.ensure_node(name);
    }

    /// `from` includes `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Transitive closure of `roots`.
    ///
    /// Roots come first in request order, followed by their dependencies in
    /// depth-first discovery order. Each name appears once. Roots unknown to
    /// the graph are returned as-is so the caller can report them.
    pub fn closure(&self, roots: &[String]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered: Vec<String> = Vec::new();

        for root in roots {
            if seen.insert(root.as_str()) {
                ordered.push(root.clone());
            }
        }

        for root in roots {
            let Some(&start) = self.node_map.get(root) else {
                continue;
            };
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(index) = dfs.next(&self.graph) {
                let name = self.graph[index].as_str();
                if seen.insert(name) {
                    ordered.push(name.to_string());
                }
            }
        }

        ordered
    }
}
