#![allow(dead_code)]

use sdg_core::callgraph::{CallGraph, CgNodeId};
use sdg_core::model::{
    ClassDef, FieldRef, Instruction, InstructionKind, InvokeKind, Method, MethodRef, Program,
    ValueId, VOID,
};
use sdg_core::pointsto::AndersenPointsTo;
use sdg_core::sdg::{build_sdg, ControlDependenceOptions, DataDependenceOptions, Sdg};

pub fn sig(class: &str, name: &str, params: &[&str], returns: &str) -> MethodRef {
    MethodRef::new(class, name, params.iter().copied(), returns)
}

pub fn at(line: u32, kind: InstructionKind) -> Instruction {
    Instruction::new(kind).at_line(line)
}

pub fn call(def: Option<ValueId>, target: MethodRef, args: Vec<ValueId>) -> InstructionKind {
    InstructionKind::Invoke { def, exception: None, target, args, kind: InvokeKind::Static }
}

pub fn print_sig() -> MethodRef {
    sig("Demo", "print", &["int"], VOID)
}

pub fn counter_value() -> FieldRef {
    FieldRef::new("Counter", "value")
}

/// `main` calls `compute`, which calls `helper`; `helper` writes
/// `Counter.value` and `main` reads it back after `compute` returns.
///
/// main:    0 v2 = new Counter | 1 compute(v2) | 2 v3 = v2.value | 3 v4 = 5
///          4 print(v4) | 5 print(v3) | 6 return
/// compute: 0 helper(v1) | 1 return
/// helper:  0 v2 = 42 | 1 v1.value = v2 | 2 return
pub fn demo_program() -> Program {
    let main = Method::new(sig("Demo", "main", &["String[]"], VOID), vec![1])
        .with(at(5, InstructionKind::New { def: 2, class: "Counter".into() }))
        .with(at(6, call(None, sig("Demo", "compute", &["Counter"], VOID), vec![2])))
        .with(at(7, InstructionKind::GetField { def: 3, base: 2, field: counter_value() }))
        .with(at(8, InstructionKind::Const { def: 4, literal: Some("5".into()) }))
        .with(at(9, call(None, print_sig(), vec![4])))
        .with(at(10, call(None, print_sig(), vec![3])))
        .with(at(11, InstructionKind::Return { value: None }));
    let compute = Method::new(sig("Demo", "compute", &["Counter"], VOID), vec![1])
        .with(at(14, call(None, sig("Demo", "helper", &["Counter"], VOID), vec![1])))
        .with(at(15, InstructionKind::Return { value: None }));
    let helper = Method::new(sig("Demo", "helper", &["Counter"], VOID), vec![1])
        .with(at(18, InstructionKind::Const { def: 2, literal: Some("42".into()) }))
        .with(at(19, InstructionKind::PutField { base: 1, field: counter_value(), value: 2 }))
        .with(at(20, InstructionKind::Return { value: None }));
    Program::from_parts(vec![ClassDef::new("Demo"), ClassDef::new("Counter")], vec![main, compute, helper])
}

/// `main` passes a constant to `twice` and prints the result.
///
/// main:  0 v2 = 21 | 1 v3 = twice(v2) | 2 print(v3) | 3 v4 = 1 | 4 return
/// twice: 0 v2 = v1 + v1 | 1 return v2
pub fn calc_program() -> Program {
    let main = Method::new(sig("Calc", "main", &["String[]"], VOID), vec![1])
        .with(at(3, InstructionKind::Const { def: 2, literal: Some("21".into()) }))
        .with(at(4, call(Some(3), sig("Calc", "twice", &["int"], "int"), vec![2])))
        .with(at(5, call(None, sig("Calc", "print", &["int"], VOID), vec![3])))
        .with(at(6, InstructionKind::Const { def: 4, literal: Some("1".into()) }))
        .with(at(7, InstructionKind::Return { value: None }));
    let twice = Method::new(sig("Calc", "twice", &["int"], "int"), vec![1])
        .with(at(10, InstructionKind::Binary { def: 2, operator: "+".into(), lhs: 1, rhs: 1 }))
        .with(at(11, InstructionKind::Return { value: Some(2) }));
    Program::from_parts(vec![ClassDef::new("Calc")], vec![main, twice])
}

/// Program, call graph and points-to result for one main class.
pub struct Analysis {
    pub program: Program,
    pub cg: CallGraph,
    pub pts: AndersenPointsTo,
}

impl Analysis {
    pub fn new(program: Program, main_class: &str) -> Self {
        let cg = CallGraph::for_main_class(&program, main_class).expect("call graph");
        let pts = AndersenPointsTo::analyze(&program, &cg);
        Self { program, cg, pts }
    }

    pub fn sdg(&self, data: DataDependenceOptions, control: ControlDependenceOptions) -> Sdg {
        build_sdg(&self.program, &self.cg, &self.pts, data, control, None).expect("sdg")
    }

    pub fn full_sdg(&self) -> Sdg {
        self.sdg(DataDependenceOptions::Full, ControlDependenceOptions::Full)
    }

    pub fn node(&self, signature: &str) -> CgNodeId {
        self.cg.node_for_method(signature).expect("node for method")
    }
}
