use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::callgraph::CgNodeId;
use crate::pointsto::HeapLocation;

/// A vertex of the system dependence graph.
///
/// Every statement belongs to one call graph node. `call` fields hold the
/// instruction index of the invoke a caller-side statement belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Normal { node: CgNodeId, index: usize },
    Phi { node: CgNodeId, index: usize },
    MethodEntry { node: CgNodeId },
    ParamCallee { node: CgNodeId, position: usize },
    ParamCaller { node: CgNodeId, call: usize, position: usize },
    NormalReturnCallee { node: CgNodeId },
    NormalReturnCaller { node: CgNodeId, call: usize },
    ExceptionReturnCallee { node: CgNodeId },
    ExceptionReturnCaller { node: CgNodeId, call: usize },
    HeapParamCallee { node: CgNodeId, location: HeapLocation },
    HeapParamCaller { node: CgNodeId, call: usize, location: HeapLocation },
    HeapReturnCallee { node: CgNodeId, location: HeapLocation },
    HeapReturnCaller { node: CgNodeId, call: usize, location: HeapLocation },
}

/// Fieldless tag of a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    Normal,
    Phi,
    MethodEntry,
    ParamCallee,
    ParamCaller,
    NormalRetCallee,
    NormalRetCaller,
    ExcRetCallee,
    ExcRetCaller,
    HeapParamCallee,
    HeapParamCaller,
    HeapRetCallee,
    HeapRetCaller,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Normal => "NORMAL",
            StatementKind::Phi => "PHI",
            StatementKind::MethodEntry => "METHOD_ENTRY",
            StatementKind::ParamCallee => "PARAM_CALLEE",
            StatementKind::ParamCaller => "PARAM_CALLER",
            StatementKind::NormalRetCallee => "NORMAL_RET_CALLEE",
            StatementKind::NormalRetCaller => "NORMAL_RET_CALLER",
            StatementKind::ExcRetCallee => "EXC_RET_CALLEE",
            StatementKind::ExcRetCaller => "EXC_RET_CALLER",
            StatementKind::HeapParamCallee => "HEAP_PARAM_CALLEE",
            StatementKind::HeapParamCaller => "HEAP_PARAM_CALLER",
            StatementKind::HeapRetCallee => "HEAP_RET_CALLEE",
            StatementKind::HeapRetCaller => "HEAP_RET_CALLER",
        };
        f.write_str(name)
    }
}

impl Statement {
    pub fn node(&self) -> CgNodeId {
        use Statement::*;
        match self {
            Normal { node, .. }
            | Phi { node, .. }
            | MethodEntry { node }
            | ParamCallee { node, .. }
            | ParamCaller { node, .. }
            | NormalReturnCallee { node }
            | NormalReturnCaller { node, .. }
            | ExceptionReturnCallee { node }
            | ExceptionReturnCaller { node, .. }
            | HeapParamCallee { node, .. }
            | HeapParamCaller { node, .. }
            | HeapReturnCallee { node, .. }
            | HeapReturnCaller { node, .. } => *node,
        }
    }

    pub fn kind(&self) -> StatementKind {
        use Statement::*;
        match self {
            Normal { .. } => StatementKind::Normal,
            Phi { .. } => StatementKind::Phi,
            MethodEntry { .. } => StatementKind::MethodEntry,
            ParamCallee { .. } => StatementKind::ParamCallee,
            ParamCaller { .. } => StatementKind::ParamCaller,
            NormalReturnCallee { .. } => StatementKind::NormalRetCallee,
            NormalReturnCaller { .. } => StatementKind::NormalRetCaller,
            ExceptionReturnCallee { .. } => StatementKind::ExcRetCallee,
            ExceptionReturnCaller { .. } => StatementKind::ExcRetCaller,
            HeapParamCallee { .. } => StatementKind::HeapParamCallee,
            HeapParamCaller { .. } => StatementKind::HeapParamCaller,
            HeapReturnCallee { .. } => StatementKind::HeapRetCallee,
            HeapReturnCaller { .. } => StatementKind::HeapRetCaller,
        }
    }

    /// Instruction index of the call this caller-side statement belongs to.
    pub fn call_index(&self) -> Option<usize> {
        use Statement::*;
        match self {
            ParamCaller { call, .. }
            | NormalReturnCaller { call, .. }
            | ExceptionReturnCaller { call, .. }
            | HeapParamCaller { call, .. }
            | HeapReturnCaller { call, .. } => Some(*call),
            _ => None,
        }
    }

    pub fn heap_location(&self) -> Option<&HeapLocation> {
        use Statement::*;
        match self {
            HeapParamCallee { location, .. }
            | HeapParamCaller { location, .. }
            | HeapReturnCallee { location, .. }
            | HeapReturnCaller { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn is_heap(&self) -> bool {
        self.heap_location().is_some()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Statement::*;
        let kind = self.kind();
        match self {
            Normal { node, index } | Phi { node, index } => write!(f, "{kind} {node}:{index}"),
            MethodEntry { node } | NormalReturnCallee { node } | ExceptionReturnCallee { node } => {
                write!(f, "{kind} {node}")
            }
            ParamCallee { node, position } => write!(f, "{kind} {node} #{position}"),
            ParamCaller { node, call, position } => write!(f, "{kind} {node}:{call} #{position}"),
            NormalReturnCaller { node, call } | ExceptionReturnCaller { node, call } => {
                write!(f, "{kind} {node}:{call}")
            }
            HeapParamCallee { node, location } | HeapReturnCallee { node, location } => {
                write!(f, "{kind} {node} {location}")
            }
            HeapParamCaller { node, call, location } | HeapReturnCaller { node, call, location } => {
                write!(f, "{kind} {node}:{call} {location}")
            }
        }
    }
}

/// A slice: a set of statements with deterministic iteration order.
pub type Slice = BTreeSet<Statement>;
