use thiserror::Error;

use crate::callgraph::{CallGraph, CgNodeId};
use crate::model::{InstructionKind, ProgramModel};
use crate::sdg::Statement;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("No reachable method named '{0}' in the call graph")]
    MethodNotFound(String),

    #[error("No call to '{callee}' in {caller}")]
    CallNotFound { caller: String, callee: String },
}

/// First call graph node whose method is named `name`.
pub fn find_method(
    cg: &CallGraph,
    program: &dyn ProgramModel,
    name: &str,
) -> Result<CgNodeId, SeedError> {
    cg.nodes()
        .iter()
        .find(|node| program.method(&node.method).is_some_and(|m| m.signature.name == name))
        .map(|node| node.id)
        .ok_or_else(|| SeedError::MethodNotFound(name.to_string()))
}

/// The first call in `node` whose declared target is named `callee`.
pub fn find_call_to(
    cg: &CallGraph,
    program: &dyn ProgramModel,
    node: CgNodeId,
    callee: &str,
) -> Result<Statement, SeedError> {
    let caller = cg.node(node).map(|n| n.method.clone()).unwrap_or_else(|| node.to_string());
    let not_found = || SeedError::CallNotFound { caller: caller.clone(), callee: callee.to_string() };
    let method = program.method(&caller).ok_or_else(not_found)?;
    method
        .instructions
        .iter()
        .position(|inst| {
            matches!(&inst.kind, InstructionKind::Invoke { target, .. } if target.name == callee)
        })
        .map(|index| Statement::Normal { node, index })
        .ok_or_else(not_found)
}
