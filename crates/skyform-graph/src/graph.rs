//! Dependency graph construction and topological ordering
//!
//! `Graph::build` turns a flat list of declarations into a DAG by scanning
//! each node's inputs for output references and adding the explicit
//! `depends_on` hints. Construction is pure; every structural error (cycle,
//! unknown reference, duplicate name) is reported here, before any resource
//! is touched.

use crate::error::{GraphError, Result};
use crate::node::ResourceNode;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Immutable dependency graph over resource nodes
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<ResourceNode>,
    index: HashMap<String, usize>,
    /// Edges into each node (its predecessors)
    predecessors: Vec<Vec<usize>>,
    /// Edges out of each node (its dependents)
    dependents: Vec<Vec<usize>>,
    /// Topological order, declaration order breaking ties
    order: Vec<usize>,
}

impl Graph {
    /// Build a graph from declarations
    pub fn build(nodes: Vec<ResourceNode>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.name.clone()));
            }
        }

        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

        for (i, node) in nodes.iter().enumerate() {
            let mut preds: Vec<usize> = Vec::new();

            for reference in node.references() {
                let target =
                    *index
                        .get(&reference.node)
                        .ok_or_else(|| GraphError::UnknownReference {
                            node: node.name.clone(),
                            reference: reference.node.clone(),
                        })?;
                preds.push(target);
            }

            for dep in &node.depends_on {
                let target = *index.get(dep).ok_or_else(|| GraphError::UnknownReference {
                    node: node.name.clone(),
                    reference: dep.clone(),
                })?;
                preds.push(target);
            }

            preds.sort_unstable();
            preds.dedup();
            for &p in &preds {
                dependents[p].push(i);
            }
            predecessors[i] = preds;
        }

        let order = topological_order(&nodes, &predecessors, &dependents)?;

        Ok(Self {
            nodes,
            index,
            predecessors,
            dependents,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &ResourceNode {
        &self.nodes[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Node indices in apply order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Nodes in apply order
    pub fn ordered_nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    pub fn predecessors_of(&self, idx: usize) -> &[usize] {
        &self.predecessors[idx]
    }

    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.dependents[idx]
    }
}

/// Kahn's algorithm with an index min-heap so independent nodes come out in
/// declaration order
fn topological_order(
    nodes: &[ResourceNode],
    predecessors: &[Vec<usize>],
    dependents: &[Vec<usize>],
) -> Result<Vec<usize>> {
    let mut indegree: Vec<usize> = predecessors.iter().map(|p| p.len()).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &d in &dependents[i] {
            indegree[d] -= 1;
            if indegree[d] == 0 {
                ready.push(Reverse(d));
            }
        }
    }

    if order.len() < nodes.len() {
        // Everything with remaining indegree sits on or below a cycle
        let stuck: Vec<&str> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d > 0)
            .map(|(i, _)| nodes[i].name.as_str())
            .collect();
        return Err(GraphError::Cycle(stuck.join(", ")));
    }

    Ok(order)
}
