use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{FieldRef, MethodRef, ValueId};

/// Dispatch mode of a call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    #[default]
    Static,
    Special,
    Virtual,
    Interface,
}

/// How an instruction consumes one of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseRole {
    /// Ordinary value flow (arithmetic operands, stored values, indices, conditions).
    Value,
    /// Base reference of a field or array access.
    BasePointer,
    /// Operand of a checked cast.
    CastSource,
    /// Actual argument at the given position of a call.
    Argument(usize),
}

/// Abstract heap access performed by a single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapAccess<'a> {
    Read(HeapRef<'a>),
    Write(HeapRef<'a>),
}

/// What a heap access names before points-to resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapRef<'a> {
    Static(&'a FieldRef),
    Instance { base: ValueId, field: &'a FieldRef },
    Array { array: ValueId },
}

/// One SSA instruction. Every `def` names a value defined exactly once per method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "inst", rename_all = "snake_case")]
pub enum InstructionKind {
    Const {
        def: ValueId,
        #[serde(default)]
        literal: Option<String>,
    },
    Binary {
        def: ValueId,
        operator: String,
        lhs: ValueId,
        rhs: ValueId,
    },
    Unary {
        def: ValueId,
        operator: String,
        operand: ValueId,
    },
    New {
        def: ValueId,
        class: String,
    },
    NewArray {
        def: ValueId,
        element: String,
        length: ValueId,
    },
    GetField {
        def: ValueId,
        base: ValueId,
        field: FieldRef,
    },
    PutField {
        base: ValueId,
        field: FieldRef,
        value: ValueId,
    },
    GetStatic {
        def: ValueId,
        field: FieldRef,
    },
    PutStatic {
        field: FieldRef,
        value: ValueId,
    },
    ArrayLoad {
        def: ValueId,
        array: ValueId,
        index: ValueId,
    },
    ArrayStore {
        array: ValueId,
        index: ValueId,
        value: ValueId,
    },
    Cast {
        def: ValueId,
        value: ValueId,
        target: String,
    },
    Invoke {
        #[serde(default)]
        def: Option<ValueId>,
        #[serde(default)]
        exception: Option<ValueId>,
        target: MethodRef,
        #[serde(default)]
        args: Vec<ValueId>,
        #[serde(default)]
        kind: InvokeKind,
    },
    /// Conditional jump to `target`; falls through otherwise.
    Branch {
        #[serde(default)]
        uses: Vec<ValueId>,
        target: usize,
    },
    Goto {
        target: usize,
    },
    Return {
        #[serde(default)]
        value: Option<ValueId>,
    },
    Throw {
        exception: ValueId,
    },
}

/// An instruction plus its (optional) source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(flatten)]
    pub kind: InstructionKind,
}

impl Instruction {
    pub fn new(kind: InstructionKind) -> Self {
        Self { line: None, kind }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl From<InstructionKind> for Instruction {
    fn from(kind: InstructionKind) -> Self {
        Self::new(kind)
    }
}

impl InstructionKind {
    /// Values defined by this instruction (an invoke defines its result and exception values).
    pub fn defs(&self) -> Vec<ValueId> {
        use InstructionKind::*;
        match self {
            Const { def, .. }
            | Binary { def, .. }
            | Unary { def, .. }
            | New { def, .. }
            | NewArray { def, .. }
            | GetField { def, .. }
            | GetStatic { def, .. }
            | ArrayLoad { def, .. }
            | Cast { def, .. } => vec![*def],
            Invoke { def, exception, .. } => def.iter().chain(exception.iter()).copied().collect(),
            PutField { .. }
            | PutStatic { .. }
            | ArrayStore { .. }
            | Branch { .. }
            | Goto { .. }
            | Return { .. }
            | Throw { .. } => Vec::new(),
        }
    }

    /// Operands consumed by this instruction, tagged with how they are consumed.
    pub fn uses(&self) -> Vec<(ValueId, UseRole)> {
        use InstructionKind::*;
        match self {
            Const { .. } | New { .. } | GetStatic { .. } | Goto { .. } => Vec::new(),
            Binary { lhs, rhs, .. } => vec![(*lhs, UseRole::Value), (*rhs, UseRole::Value)],
            Unary { operand, .. } => vec![(*operand, UseRole::Value)],
            NewArray { length, .. } => vec![(*length, UseRole::Value)],
            GetField { base, .. } => vec![(*base, UseRole::BasePointer)],
            PutField { base, value, .. } => {
                vec![(*base, UseRole::BasePointer), (*value, UseRole::Value)]
            }
            PutStatic { value, .. } => vec![(*value, UseRole::Value)],
            ArrayLoad { array, index, .. } => {
                vec![(*array, UseRole::BasePointer), (*index, UseRole::Value)]
            }
            ArrayStore { array, index, value } => vec![
                (*array, UseRole::BasePointer),
                (*index, UseRole::Value),
                (*value, UseRole::Value),
            ],
            Cast { value, .. } => vec![(*value, UseRole::CastSource)],
            Invoke { args, .. } => {
                args.iter().enumerate().map(|(pos, v)| (*v, UseRole::Argument(pos))).collect()
            }
            Branch { uses, .. } => uses.iter().map(|v| (*v, UseRole::Value)).collect(),
            Return { value } => value.iter().map(|v| (*v, UseRole::Value)).collect(),
            Throw { exception } => vec![(*exception, UseRole::Value)],
        }
    }

    /// Control-flow successors of the instruction at `index` in a body of `len`
    /// instructions. The value `len` denotes the method exit.
    pub fn successors(&self, index: usize, len: usize) -> Vec<usize> {
        let next = (index + 1).min(len);
        match self {
            InstructionKind::Goto { target } => vec![*target],
            InstructionKind::Branch { target, .. } => {
                if *target == next {
                    vec![next]
                } else {
                    vec![next, *target]
                }
            }
            InstructionKind::Return { .. } | InstructionKind::Throw { .. } => vec![len],
            _ => vec![next],
        }
    }

    /// Jump targets named explicitly by the instruction.
    pub fn jump_targets(&self) -> Vec<usize> {
        match self {
            InstructionKind::Goto { target } | InstructionKind::Branch { target, .. } => {
                vec![*target]
            }
            _ => Vec::new(),
        }
    }

    /// Declared target of a call instruction.
    pub fn declared_target(&self) -> Option<&MethodRef> {
        match self {
            InstructionKind::Invoke { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn heap_access(&self) -> Option<HeapAccess<'_>> {
        use InstructionKind::*;
        match self {
            GetField { base, field, .. } => {
                Some(HeapAccess::Read(HeapRef::Instance { base: *base, field }))
            }
            PutField { base, field, .. } => {
                Some(HeapAccess::Write(HeapRef::Instance { base: *base, field }))
            }
            GetStatic { field, .. } => Some(HeapAccess::Read(HeapRef::Static(field))),
            PutStatic { field, .. } => Some(HeapAccess::Write(HeapRef::Static(field))),
            ArrayLoad { array, .. } => Some(HeapAccess::Read(HeapRef::Array { array: *array })),
            ArrayStore { array, .. } => Some(HeapAccess::Write(HeapRef::Array { array: *array })),
            _ => None,
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InstructionKind::*;
        match self {
            Const { def, literal } => match literal {
                Some(lit) => write!(f, "v{def} = const {lit}"),
                None => write!(f, "v{def} = const"),
            },
            Binary { def, operator, lhs, rhs } => write!(f, "v{def} = v{lhs} {operator} v{rhs}"),
            Unary { def, operator, operand } => write!(f, "v{def} = {operator} v{operand}"),
            New { def, class } => write!(f, "v{def} = new {class}"),
            NewArray { def, element, length } => write!(f, "v{def} = new {element}[v{length}]"),
            GetField { def, base, field } => write!(f, "v{def} = getfield v{base}.{field}"),
            PutField { base, field, value } => write!(f, "putfield v{base}.{field} = v{value}"),
            GetStatic { def, field } => write!(f, "v{def} = getstatic {field}"),
            PutStatic { field, value } => write!(f, "putstatic {field} = v{value}"),
            ArrayLoad { def, array, index } => write!(f, "v{def} = arrayload v{array}[v{index}]"),
            ArrayStore { array, index, value } => {
                write!(f, "arraystore v{array}[v{index}] = v{value}")
            }
            Cast { def, value, target } => write!(f, "v{def} = checkcast {target} v{value}"),
            Invoke { def, target, args, kind, .. } => {
                let args: Vec<String> = args.iter().map(|a| format!("v{a}")).collect();
                let kind = match kind {
                    InvokeKind::Static => "invokestatic",
                    InvokeKind::Special => "invokespecial",
                    InvokeKind::Virtual => "invokevirtual",
                    InvokeKind::Interface => "invokeinterface",
                };
                match def {
                    Some(d) => write!(f, "v{d} = {kind} {target}({})", args.join(", ")),
                    None => write!(f, "{kind} {target}({})", args.join(", ")),
                }
            }
            Branch { uses, target } => {
                let uses: Vec<String> = uses.iter().map(|u| format!("v{u}")).collect();
                write!(f, "if ({}) goto {target}", uses.join(", "))
            }
            Goto { target } => write!(f, "goto {target}"),
            Return { value: Some(v) } => write!(f, "return v{v}"),
            Return { value: None } => write!(f, "return"),
            Throw { exception } => write!(f, "throw v{exception}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_has_fallthrough_and_target_successors() {
        let branch = InstructionKind::Branch { uses: vec![1], target: 4 };
        assert_eq!(branch.successors(1, 6), vec![2, 4]);
        let ret = InstructionKind::Return { value: None };
        assert_eq!(ret.successors(5, 6), vec![6]);
    }

    #[test]
    fn invoke_defines_result_and_exception() {
        let call = InstructionKind::Invoke {
            def: Some(3),
            exception: Some(4),
            target: MethodRef::new("A", "f", Vec::<String>::new(), "int"),
            args: vec![1, 2],
            kind: InvokeKind::Static,
        };
        assert_eq!(call.defs(), vec![3, 4]);
        assert_eq!(call.uses(), vec![(1, UseRole::Argument(0)), (2, UseRole::Argument(1))]);
    }

    #[test]
    fn instruction_deserializes_with_flattened_kind() {
        let json = r#"{ "line": 7, "inst": "put_field", "base": 1, "field": { "class": "C", "name": "x" }, "value": 2 }"#;
        let inst: Instruction = serde_json::from_str(json).expect("instruction");
        assert_eq!(inst.line, Some(7));
        assert!(matches!(inst.kind, InstructionKind::PutField { base: 1, value: 2, .. }));
    }
}
