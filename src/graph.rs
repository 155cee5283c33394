//! Directed dependency graph over formula ids, with topological sort and
//! cycle detection.

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// `nodes`: the formula ids. `edges[a]` is the set of ids `a` depends on
/// (`a -> b` means "a depends on b"). Invariant: every edge endpoint also
/// appears in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str) {
        if self.nodes.insert(id.to_string()) {
            self.edges.entry(id.to_string()).or_default();
        }
    }

    /// `src` depends on `dst`.
    pub fn add_edge(&mut self, src: &str, dst: &str) {
        self.add_node(src);
        self.add_node(dst);
        self.edges.entry(src.to_string()).or_default().insert(dst.to_string());
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn dependencies(&self, id: &str) -> Vec<String> {
        self.edges
            .get(id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn dependents(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(id))
            .map(|(node, _)| node.clone())
            .collect()
    }

    /// All dependencies reachable transitively, excluding `id` itself.
    pub fn transitive_dependencies(&self, id: &str) -> IndexSet<String> {
        let mut seen = IndexSet::new();
        let mut stack: Vec<String> = self.dependencies(id);
        while let Some(current) = stack.pop() {
            if seen.insert(current.clone()) {
                stack.extend(self.dependencies(&current));
            }
        }
        seen
    }

    /// Kahn's algorithm, seeded in insertion order so the result is
    /// deterministic and reproducible across runs for the same input.
    /// In-degree counts only dependencies that are themselves graph nodes
    /// (spec's chosen resolution of the in-degree open question).
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut in_degree: IndexMap<String, usize> = self
            .nodes
            .iter()
            .map(|n| {
                let count = self
                    .edges
                    .get(n)
                    .map(|deps| deps.iter().filter(|d| self.nodes.contains(*d)).count())
                    .unwrap_or(0);
                (n.clone(), count)
            })
            .collect();

        let mut queue: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| in_degree[*n] == 0)
            .cloned()
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cursor = 0;
        while cursor < queue.len() {
            let node = queue[cursor].clone();
            cursor += 1;
            order.push(node.clone());
            for dependent in self.dependents_among_nodes(&node) {
                let entry = in_degree.get_mut(&dependent).expect("dependent is a node");
                *entry -= 1;
                if *entry == 0 {
                    queue.push(dependent);
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let (cycle, involved) = self.find_cycle();
        Err(Error::CircularDependency { cycle, involved })
    }

    /// Dependents of `node` restricted to edges where both ends are nodes.
    fn dependents_among_nodes(&self, node: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|candidate| {
                self.edges
                    .get(*candidate)
                    .map(|deps| deps.contains(node))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// DFS with an explicit recursion stack over the subgraph of unvisited
    /// nodes; the first back-edge yields the cycle as the path slice from the
    /// revisited node, closed by appending that node again.
    fn find_cycle(&self) -> (Vec<String>, Vec<String>) {
        let mut mark: IndexMap<String, Mark> =
            self.nodes.iter().map(|n| (n.clone(), Mark::Unvisited)).collect();
        let mut stack: Vec<String> = Vec::new();

        for start in self.nodes.iter() {
            if mark[start] != Mark::Unvisited {
                continue;
            }
            if let Some(cycle) = self.dfs(start, &mut mark, &mut stack) {
                let involved: Vec<String> = self
                    .nodes
                    .iter()
                    .filter(|n| mark[n.as_str()] != Mark::Done)
                    .cloned()
                    .collect();
                return (cycle, involved);
            }
        }
        (Vec::new(), Vec::new())
    }

    fn dfs(&self, node: &str, mark: &mut IndexMap<String, Mark>, stack: &mut Vec<String>) -> Option<Vec<String>> {
        mark.insert(node.to_string(), Mark::InStack);
        stack.push(node.to_string());

        for dep in self.dependencies(node) {
            if !self.nodes.contains(&dep) {
                continue;
            }
            match mark.get(&dep).copied().unwrap_or(Mark::Unvisited) {
                Mark::InStack => {
                    let start = stack.iter().position(|n| n == &dep).expect("dep is on the stack");
                    let mut cycle: Vec<String> = stack[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = self.dfs(&dep, mark, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        mark.insert(node.to_string(), Mark::Done);
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InStack,
    Done,
}
