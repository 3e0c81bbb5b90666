//! Restrict a dependence graph to the statements of a slice.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use crate::sdg::{Dependence, Sdg, Slice, Statement};

/// Violation of the pruned graph's post-conditions. Always a defect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphIntegrityError {
    #[error("Slice statement {0} is not part of the dependence graph")]
    MissingStatement(String),

    #[error("Pruned graph has {nodes} nodes but the slice has {slice} statements")]
    NodeCountMismatch { nodes: usize, slice: usize },

    #[error("Statement {0} appears more than once in the pruned graph")]
    DuplicateNode(String),

    #[error("Edge {from} -> {to} has an endpoint outside the pruned graph")]
    DanglingEdge { from: String, to: String },
}

/// Owned subgraph of a [`Sdg`] induced by a slice.
#[derive(Debug, Clone, Default)]
pub struct PrunedGraph {
    graph: DiGraph<Statement, Dependence>,
    index: HashMap<Statement, NodeIndex>,
}

impl PrunedGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.index.contains_key(statement)
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> + '_ {
        self.graph.node_weights()
    }

    pub fn graph(&self) -> &DiGraph<Statement, Dependence> {
        &self.graph
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Statement, &Statement, Dependence)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], *e.weight()))
    }
}

/// Keep exactly the slice statements and the SDG edges between them, then
/// verify the result.
pub fn prune(sdg: &Sdg, slice: &Slice) -> Result<PrunedGraph, GraphIntegrityError> {
    let mut pruned = PrunedGraph::default();
    let mut mapping: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(slice.len());

    for statement in slice {
        let old = sdg
            .node_index(statement)
            .ok_or_else(|| GraphIntegrityError::MissingStatement(statement.to_string()))?;
        let new = pruned.graph.add_node(statement.clone());
        pruned.index.insert(statement.clone(), new);
        mapping.insert(old, new);
    }

    for statement in slice {
        let Some(old) = sdg.node_index(statement) else { continue };
        for edge in sdg.graph().edges_directed(old, Direction::Outgoing) {
            if let (Some(&from), Some(&to)) = (mapping.get(&edge.source()), mapping.get(&edge.target())) {
                pruned.graph.add_edge(from, to, *edge.weight());
            }
        }
    }

    check_integrity(&pruned, slice)?;
    Ok(pruned)
}

/// Node count equals the slice size, no statement appears twice and every
/// edge joins two nodes of the graph.
pub fn check_integrity(pruned: &PrunedGraph, slice: &Slice) -> Result<(), GraphIntegrityError> {
    let graph = &pruned.graph;
    let mut seen = HashSet::with_capacity(graph.node_count());
    for statement in graph.node_weights() {
        if !seen.insert(statement) {
            return Err(GraphIntegrityError::DuplicateNode(statement.to_string()));
        }
    }
    for edge in graph.edge_references() {
        let (from, to) = (graph.node_weight(edge.source()), graph.node_weight(edge.target()));
        if from.is_none() || to.is_none() {
            return Err(GraphIntegrityError::DanglingEdge {
                from: edge.source().index().to_string(),
                to: edge.target().index().to_string(),
            });
        }
    }
    if graph.node_count() != slice.len() {
        return Err(GraphIntegrityError::NodeCountMismatch {
            nodes: graph.node_count(),
            slice: slice.len(),
        });
    }
    if let Some(missing) = slice.iter().find(|s| !pruned.contains(s)) {
        return Err(GraphIntegrityError::MissingStatement(missing.to_string()));
    }
    Ok(())
}
