//! Human-readable views of slices: labels, dumps, source line tables and DOT.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::callgraph::{CallGraph, CgNodeId};
use crate::model::{Method, ProgramModel};
use crate::prune::PrunedGraph;
use crate::sdg::{Slice, Statement};

/// `{class -> {method signature -> {line}}}`
pub type SourceLineTable = BTreeMap<String, BTreeMap<String, BTreeSet<u32>>>;

/// Resolves statements back to the methods and instructions they came from.
pub struct StatementLabeler<'a> {
    program: &'a dyn ProgramModel,
    call_graph: &'a CallGraph,
}

impl<'a> StatementLabeler<'a> {
    pub fn new(program: &'a dyn ProgramModel, call_graph: &'a CallGraph) -> Self {
        Self { program, call_graph }
    }

    fn method(&self, node: CgNodeId) -> Option<&'a Method> {
        let cg_node = self.call_graph.node(node)?;
        self.program.method(&cg_node.method)
    }

    fn signature(&self, node: CgNodeId) -> String {
        self.method(node)
            .map(|m| m.signature.signature())
            .unwrap_or_else(|| node.to_string())
    }

    fn method_name(&self, node: CgNodeId) -> String {
        self.method(node).map(|m| m.signature.name.clone()).unwrap_or_else(|| node.to_string())
    }

    /// Multi-line label for a statement; lines are separated by `\n`.
    pub fn label(&self, statement: &Statement) -> String {
        let kind = statement.kind();
        match statement {
            Statement::HeapParamCallee { node, location }
            | Statement::HeapParamCaller { node, location, .. }
            | Statement::HeapReturnCallee { node, location }
            | Statement::HeapReturnCaller { node, location, .. } => {
                format!("{kind}\n{}\n{location}", self.signature(*node))
            }
            Statement::Normal { node, index } => {
                let instruction = self
                    .method(*node)
                    .and_then(|m| m.instruction(*index))
                    .map(|inst| inst.to_string())
                    .unwrap_or_else(|| format!("#{index}"));
                format!("{instruction}\n{}", self.signature(*node))
            }
            Statement::ParamCallee { node, position } => {
                format!("{kind} {position}\n{}", self.method_name(*node))
            }
            Statement::ParamCaller { node, call, position } => {
                let callee = self
                    .method(*node)
                    .and_then(|m| m.instruction(*call))
                    .and_then(|inst| inst.kind.declared_target())
                    .map(|target| target.name.clone())
                    .unwrap_or_default();
                format!("{kind} {position}\n{}\n{callee}", self.method_name(*node))
            }
            other => other.to_string(),
        }
    }

    /// One line per statement, in slice order.
    pub fn dump_slice(&self, slice: &Slice) -> Vec<String> {
        slice.iter().map(|s| format!("{s} | {}", self.label(s).replace('\n', " | "))).collect()
    }

    /// Source lines covered by the `Normal` statements of a slice.
    pub fn source_line_table(&self, slice: &Slice) -> SourceLineTable {
        let mut table = SourceLineTable::new();
        for statement in slice {
            let Statement::Normal { node, index } = statement else { continue };
            let Some(method) = self.method(*node) else {
                debug!(%statement, "statement has no method body");
                continue;
            };
            let Some(line) = method.line_number(*index) else {
                debug!(%statement, method = %method.signature, "no source line recorded");
                continue;
            };
            table
                .entry(method.signature.class.clone())
                .or_default()
                .entry(method.signature.signature())
                .or_default()
                .insert(line);
        }
        table
    }
}

/// DOT text for a pruned graph, one box per statement.
pub fn render_dot(pruned: &PrunedGraph, labeler: &StatementLabeler<'_>) -> String {
    let graph = pruned.graph();
    let mut out = String::from("digraph Slice {\n  node [shape=box, fontname=\"Helvetica\"];\n");
    for idx in graph.node_indices() {
        let label = escape(&labeler.label(&graph[idx]));
        let _ = writeln!(out, "  s{} [label=\"{label}\"];", idx.index());
    }
    for edge in graph.edge_references() {
        let _ = writeln!(
            out,
            "  s{} -> s{} [label=\"{}\"];",
            edge.source().index(),
            edge.target().index(),
            edge.weight().label()
        );
    }
    out.push_str("}\n");
    out
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_keeps_dot_labels_on_one_line() {
        assert_eq!(escape("a \"b\"\nc"), "a \\\"b\\\"\\nc");
    }
}
