//! Points-to collaborator.
//!
//! The dependence graph builder only asks two questions of a pointer analysis:
//! which allocation sites a local may point to, and whether two abstract heap
//! locations may alias. [`AndersenPointsTo`] answers them with a
//! flow-insensitive, inclusion-based analysis over the call graph.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::callgraph::{CallGraph, CgNodeId};
use crate::model::{FieldRef, InstructionKind, ProgramModel, ValueId};

/// Abstract object: an allocation site in some call graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceKey {
    pub node: CgNodeId,
    pub index: usize,
    pub class: String,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "new {}@{}:{}", self.class, self.node, self.index)
    }
}

/// Abstract heap location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HeapLocation {
    StaticField(FieldRef),
    InstanceField { key: InstanceKey, field: FieldRef },
    ArrayContents(InstanceKey),
}

impl fmt::Display for HeapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapLocation::StaticField(field) => write!(f, "static {field}"),
            HeapLocation::InstanceField { key, field } => write!(f, "[{key}].{}", field.name),
            HeapLocation::ArrayContents(key) => write!(f, "[{key}][]"),
        }
    }
}

/// Queries the dependence graph builder needs from a pointer analysis.
pub trait PointsToResult: Sync {
    /// Allocation sites value `value` of node `node` may refer to.
    fn points_to(&self, node: CgNodeId, value: ValueId) -> BTreeSet<InstanceKey>;

    /// Whether two heap locations may denote the same storage.
    fn may_alias(&self, a: &HeapLocation, b: &HeapLocation) -> bool {
        a == b
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PointerKey {
    Local(CgNodeId, ValueId),
    Heap(HeapLocation),
}

#[derive(Debug)]
enum Constraint {
    Alloc { dst: PointerKey, key: InstanceKey },
    Copy { dst: PointerKey, src: PointerKey },
    /// `dst = base.field`, or `dst = base[*]` when `field` is `None`.
    Load { dst: PointerKey, base: PointerKey, field: Option<FieldRef> },
    Store { base: PointerKey, field: Option<FieldRef>, src: PointerKey },
}

/// Inclusion-based, field-sensitive, context-insensitive points-to sets.
#[derive(Debug, Default)]
pub struct AndersenPointsTo {
    sets: HashMap<PointerKey, BTreeSet<InstanceKey>>,
}

impl AndersenPointsTo {
    pub fn analyze(program: &dyn ProgramModel, cg: &CallGraph) -> Self {
        let constraints = collect_constraints(program, cg);
        let mut sets: HashMap<PointerKey, BTreeSet<InstanceKey>> = HashMap::new();

        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let mut changed = false;
            for constraint in &constraints {
                match constraint {
                    Constraint::Alloc { dst, key } => {
                        changed |= sets.entry(dst.clone()).or_default().insert(key.clone());
                    }
                    Constraint::Copy { dst, src } => {
                        changed |= propagate(&mut sets, src, dst);
                    }
                    Constraint::Load { dst, base, field } => {
                        for key in sets.get(base).cloned().unwrap_or_default() {
                            let src = PointerKey::Heap(location(key, field));
                            changed |= propagate(&mut sets, &src, dst);
                        }
                    }
                    Constraint::Store { base, field, src } => {
                        for key in sets.get(base).cloned().unwrap_or_default() {
                            let dst = PointerKey::Heap(location(key, field));
                            changed |= propagate(&mut sets, src, &dst);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        debug!(constraints = constraints.len(), rounds, "points-to fixpoint reached");
        Self { sets }
    }

    /// Objects possibly stored at a heap location.
    pub fn heap_contents(&self, location: &HeapLocation) -> BTreeSet<InstanceKey> {
        self.sets.get(&PointerKey::Heap(location.clone())).cloned().unwrap_or_default()
    }
}

impl PointsToResult for AndersenPointsTo {
    fn points_to(&self, node: CgNodeId, value: ValueId) -> BTreeSet<InstanceKey> {
        self.sets.get(&PointerKey::Local(node, value)).cloned().unwrap_or_default()
    }
}

fn location(key: InstanceKey, field: &Option<FieldRef>) -> HeapLocation {
    match field {
        Some(field) => HeapLocation::InstanceField { key, field: field.clone() },
        None => HeapLocation::ArrayContents(key),
    }
}

fn propagate(
    sets: &mut HashMap<PointerKey, BTreeSet<InstanceKey>>,
    src: &PointerKey,
    dst: &PointerKey,
) -> bool {
    let Some(incoming) = sets.get(src).cloned() else { return false };
    let target = sets.entry(dst.clone()).or_default();
    let before = target.len();
    target.extend(incoming);
    target.len() != before
}

fn collect_constraints(program: &dyn ProgramModel, cg: &CallGraph) -> Vec<Constraint> {
    let mut out = Vec::new();
    for node in cg.nodes() {
        let Some(method) = program.method(&node.method) else {
            warn!(method = %node.method, "call graph node has no method body; skipped in points-to");
            continue;
        };
        let local = |v: ValueId| PointerKey::Local(node.id, v);

        for phi in &method.phis {
            for used in &phi.uses {
                out.push(Constraint::Copy { dst: local(phi.def), src: local(*used) });
            }
        }

        for (index, inst) in method.instructions.iter().enumerate() {
            use InstructionKind::*;
            match &inst.kind {
                New { def, class } => out.push(Constraint::Alloc {
                    dst: local(*def),
                    key: InstanceKey { node: node.id, index, class: class.clone() },
                }),
                NewArray { def, element, .. } => out.push(Constraint::Alloc {
                    dst: local(*def),
                    key: InstanceKey { node: node.id, index, class: format!("{element}[]") },
                }),
                Cast { def, value, .. } => {
                    out.push(Constraint::Copy { dst: local(*def), src: local(*value) })
                }
                GetField { def, base, field } => out.push(Constraint::Load {
                    dst: local(*def),
                    base: local(*base),
                    field: Some(field.clone()),
                }),
                PutField { base, field, value } => out.push(Constraint::Store {
                    base: local(*base),
                    field: Some(field.clone()),
                    src: local(*value),
                }),
                GetStatic { def, field } => out.push(Constraint::Copy {
                    dst: local(*def),
                    src: PointerKey::Heap(HeapLocation::StaticField(field.clone())),
                }),
                PutStatic { field, value } => out.push(Constraint::Copy {
                    dst: PointerKey::Heap(HeapLocation::StaticField(field.clone())),
                    src: local(*value),
                }),
                ArrayLoad { def, array, .. } => out.push(Constraint::Load {
                    dst: local(*def),
                    base: local(*array),
                    field: None,
                }),
                ArrayStore { array, value, .. } => out.push(Constraint::Store {
                    base: local(*array),
                    field: None,
                    src: local(*value),
                }),
                Invoke { def, exception, args, .. } => {
                    for target in cg.targets(node.id, index) {
                        let Some(callee) = cg.node(*target).and_then(|n| program.method(&n.method))
                        else {
                            continue;
                        };
                        for (arg, param) in args.iter().zip(&callee.params) {
                            out.push(Constraint::Copy {
                                dst: PointerKey::Local(*target, *param),
                                src: local(*arg),
                            });
                        }
                        for callee_inst in &callee.instructions {
                            match (&callee_inst.kind, def, exception) {
                                (Return { value: Some(v) }, Some(d), _) => {
                                    out.push(Constraint::Copy {
                                        dst: local(*d),
                                        src: PointerKey::Local(*target, *v),
                                    })
                                }
                                (Throw { exception: e }, _, Some(x)) => {
                                    out.push(Constraint::Copy {
                                        dst: local(*x),
                                        src: PointerKey::Local(*target, *e),
                                    })
                                }
                                _ => {}
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvokeKind, Method, MethodRef, Program, VOID};

    #[test]
    fn field_store_flows_through_parameters_and_loads() {
        // main: v1 = new Box; v2 = new Item; call put(v1, v2); v3 = getfield v1.Box.item
        let box_item = FieldRef::new("Box", "item");
        let main = Method::new(MethodRef::new("App", "main", Vec::<String>::new(), VOID), vec![])
            .with(InstructionKind::New { def: 1, class: "Box".into() })
            .with(InstructionKind::New { def: 2, class: "Item".into() })
            .with(InstructionKind::Invoke {
                def: None,
                exception: None,
                target: MethodRef::new("App", "put", vec!["Box", "Item"], VOID),
                args: vec![1, 2],
                kind: InvokeKind::Static,
            })
            .with(InstructionKind::GetField { def: 3, base: 1, field: box_item.clone() })
            .with(InstructionKind::Return { value: None });
        let put = Method::new(MethodRef::new("App", "put", vec!["Box", "Item"], VOID), vec![1, 2])
            .with(InstructionKind::PutField { base: 1, field: box_item.clone(), value: 2 })
            .with(InstructionKind::Return { value: None });
        let program = Program::from_parts(vec![], vec![main, put]);
        let cg = CallGraph::build(&program, &["App.main()void".to_string()]).expect("cg");
        let pts = AndersenPointsTo::analyze(&program, &cg);

        let main_node = cg.node_for_method("App.main()void").expect("main");
        let put_node = cg.node_for_method("App.put(Box,Item)void").expect("put");
        let item = InstanceKey { node: main_node, index: 1, class: "Item".into() };
        assert_eq!(pts.points_to(main_node, 3), BTreeSet::from([item.clone()]));
        assert_eq!(pts.points_to(put_node, 2), BTreeSet::from([item.clone()]));
        let boxed = InstanceKey { node: main_node, index: 0, class: "Box".into() };
        let slot = HeapLocation::InstanceField { key: boxed, field: box_item };
        assert_eq!(pts.heap_contents(&slot), BTreeSet::from([item]));
        assert!(pts.points_to(main_node, 9).is_empty());
    }
}
