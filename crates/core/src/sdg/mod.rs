//! System dependence graph.
//!
//! Vertices are [`Statement`]s, edges point from the dependee to the dependent
//! and carry a [`Dependence`] tag. A graph is built once per run by
//! [`SdgBuilder`] and is read-only afterwards.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use crate::callgraph::CgNodeId;
use crate::model::MethodRef;

mod builder;
pub mod control;
mod options;
mod statement;

pub use builder::{build_sdg, SdgBuilder};
pub use options::{
    ControlDependenceOptions, DataDependenceOptions, DataFlavor, Dependence, DependenceFilter,
    OptionParseError,
};
pub use statement::{Slice, Statement, StatementKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SdgError {
    /// Call graph, points-to result and program model disagree.
    #[error("Model inconsistency: {0}")]
    ModelInconsistency(String),

    #[error("Dependence graph construction was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Sdg {
    graph: DiGraph<Statement, Dependence>,
    index: HashMap<Statement, NodeIndex>,
    data_options: DataDependenceOptions,
    control_options: ControlDependenceOptions,
    /// Declared target of each call site, keyed by (node, instruction index).
    declared_targets: HashMap<(CgNodeId, usize), MethodRef>,
}

impl Sdg {
    pub fn data_options(&self) -> DataDependenceOptions {
        self.data_options
    }

    pub fn control_options(&self) -> ControlDependenceOptions {
        self.control_options
    }

    pub fn statement_count(&self) -> usize {
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

    /// All edges as (dependee, dependent, tag).
    pub fn edges(&self) -> impl Iterator<Item = (&Statement, &Statement, Dependence)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], *e.weight()))
    }

    /// Statements depending on `statement`, with the edge tag.
    pub fn successors(&self, statement: &Statement) -> Vec<(&Statement, Dependence)> {
        self.neighbors(statement, Direction::Outgoing)
    }

    /// Statements `statement` depends on, with the edge tag.
    pub fn predecessors(&self, statement: &Statement) -> Vec<(&Statement, Dependence)> {
        self.neighbors(statement, Direction::Incoming)
    }

    fn neighbors(&self, statement: &Statement, dir: Direction) -> Vec<(&Statement, Dependence)> {
        let Some(&idx) = self.index.get(statement) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = if dir == Direction::Outgoing { e.target() } else { e.source() };
                (&self.graph[other], *e.weight())
            })
            .collect()
    }

    pub fn declared_target(&self, node: CgNodeId, call: usize) -> Option<&MethodRef> {
        self.declared_targets.get(&(node, call))
    }

    /// Statements owned by one call graph node.
    pub fn statements_of(&self, node: CgNodeId) -> Vec<&Statement> {
        let mut out: Vec<&Statement> = self.statements().filter(|s| s.node() == node).collect();
        out.sort();
        out
    }

    pub(crate) fn graph(&self) -> &DiGraph<Statement, Dependence> {
        &self.graph
    }

    pub(crate) fn node_index(&self, statement: &Statement) -> Option<NodeIndex> {
        self.index.get(statement).copied()
    }
}
