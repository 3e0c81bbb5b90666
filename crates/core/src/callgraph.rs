//! Context-insensitive call graph: one node per reachable method.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{InstructionKind, ProgramModel};

/// Identifier of a call graph node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CgNodeId(pub u32);

impl fmt::Display for CgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A statically resolved method context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub id: CgNodeId,
    /// Fully qualified signature of the method this node analyzes.
    pub method: String,
    /// Call sites keyed by instruction index, with the nodes each may dispatch to.
    pub call_sites: BTreeMap<usize, Vec<CgNodeId>>,
}

impl CallGraphNode {
    pub fn new(id: u32, method: impl Into<String>) -> Self {
        Self { id: CgNodeId(id), method: method.into(), call_sites: BTreeMap::new() }
    }

    pub fn with_call(mut self, index: usize, targets: Vec<CgNodeId>) -> Self {
        self.call_sites.insert(index, targets);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallGraphError {
    #[error("No main entrypoint found in class {0}")]
    NoEntrypoint(String),

    #[error("Entrypoint {0} is not a method of the program")]
    UnknownEntrypoint(String),
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
    entrypoints: Vec<CgNodeId>,
    by_method: HashMap<String, CgNodeId>,
    predecessors: HashMap<CgNodeId, BTreeSet<CgNodeId>>,
}

impl CallGraph {
    /// Build the call graph reachable from `entrypoints` (method signatures).
    pub fn build(program: &dyn ProgramModel, entrypoints: &[String]) -> Result<Self, CallGraphError> {
        let mut nodes: Vec<CallGraphNode> = Vec::new();
        let mut by_method: HashMap<String, CgNodeId> = HashMap::new();
        let mut queue = VecDeque::new();

        let mut intern = |sig: &str, nodes: &mut Vec<CallGraphNode>, queue: &mut VecDeque<CgNodeId>| {
            if let Some(id) = by_method.get(sig) {
                return *id;
            }
            let id = CgNodeId(nodes.len() as u32);
            nodes.push(CallGraphNode { id, method: sig.to_string(), call_sites: BTreeMap::new() });
            by_method.insert(sig.to_string(), id);
            queue.push_back(id);
            id
        };

        let mut roots = Vec::new();
        for sig in entrypoints {
            if program.method(sig).is_none() {
                return Err(CallGraphError::UnknownEntrypoint(sig.clone()));
            }
            roots.push(intern(sig, &mut nodes, &mut queue));
        }

        while let Some(id) = queue.pop_front() {
            let sig = nodes[id.0 as usize].method.clone();
            let Some(method) = program.method(&sig) else { continue };
            let mut sites = BTreeMap::new();
            for (index, inst) in method.instructions.iter().enumerate() {
                if let InstructionKind::Invoke { target, kind, .. } = &inst.kind {
                    let callees: Vec<CgNodeId> = program
                        .resolve_targets(*kind, target)
                        .into_iter()
                        .map(|m| intern(&m.signature.signature(), &mut nodes, &mut queue))
                        .collect();
                    if callees.is_empty() {
                        debug!(call = %target, caller = %sig, "call has no resolved target");
                    }
                    sites.insert(index, callees);
                }
            }
            nodes[id.0 as usize].call_sites = sites;
        }

        debug!(nodes = nodes.len(), "call graph built");
        Ok(Self::from_parts(nodes, roots))
    }

    /// Build the call graph rooted at the `main` methods of `main_class`.
    pub fn for_main_class(
        program: &crate::model::Program,
        main_class: &str,
    ) -> Result<Self, CallGraphError> {
        let entrypoints = program.main_entrypoints(main_class);
        if entrypoints.is_empty() {
            return Err(CallGraphError::NoEntrypoint(main_class.to_string()));
        }
        Self::build(program, &entrypoints)
    }

    /// Assemble a call graph from explicit nodes. Node ids must equal their
    /// position in `nodes`; targets are not validated here.
    pub fn from_parts(nodes: Vec<CallGraphNode>, entrypoints: Vec<CgNodeId>) -> Self {
        let mut predecessors: HashMap<CgNodeId, BTreeSet<CgNodeId>> = HashMap::new();
        for node in &nodes {
            for target in node.call_sites.values().flatten() {
                predecessors.entry(*target).or_default().insert(node.id);
            }
        }
        let by_method = nodes.iter().map(|n| (n.method.clone(), n.id)).collect();
        Self { nodes, entrypoints, by_method, predecessors }
    }

    pub fn nodes(&self) -> &[CallGraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: CgNodeId) -> Option<&CallGraphNode> {
        self.nodes.get(id.0 as usize).filter(|n| n.id == id)
    }

    pub fn entrypoints(&self) -> &[CgNodeId] {
        &self.entrypoints
    }

    pub fn node_for_method(&self, signature: &str) -> Option<CgNodeId> {
        self.by_method.get(signature).copied()
    }

    /// Nodes that `id` may call, from any call site.
    pub fn successors(&self, id: CgNodeId) -> BTreeSet<CgNodeId> {
        self.node(id)
            .map(|n| n.call_sites.values().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn predecessors(&self, id: CgNodeId) -> BTreeSet<CgNodeId> {
        self.predecessors.get(&id).cloned().unwrap_or_default()
    }

    /// Targets of the call at instruction `index` of `id`.
    pub fn targets(&self, id: CgNodeId, index: usize) -> &[CgNodeId] {
        self.node(id)
            .and_then(|n| n.call_sites.get(&index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
