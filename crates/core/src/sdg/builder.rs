use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use petgraph::graph::DiGraph;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::callgraph::{CallGraph, CallGraphNode, CgNodeId};
use crate::cancel::CancellationToken;
use crate::model::{HeapAccess, HeapRef, InstructionKind, Method, MethodRef, ProgramModel, UseRole, ValueId};
use crate::pointsto::{HeapLocation, InstanceKey, PointsToResult};
use crate::sdg::control::{cfg_successors, control_dependences, reachability};
use crate::sdg::{
    ControlDependenceOptions, DataDependenceOptions, DataFlavor, Dependence, Sdg, SdgError,
    Statement,
};

type Locations = BTreeSet<HeapLocation>;
type Edge = (Statement, Statement, Dependence);

#[derive(Debug, Clone)]
enum HeapEffect {
    Read(Locations),
    Write(Locations),
}

/// Per-method facts gathered before any statement is created.
struct NodeFacts<'a> {
    node: &'a CallGraphNode,
    method: &'a Method,
    reach: Vec<Vec<bool>>,
    heap: Vec<Option<HeapEffect>>,
    local_mod: Locations,
    local_ref: Locations,
    control: BTreeSet<(usize, usize)>,
}

impl NodeFacts<'_> {
    /// Whether control may flow from `from` (`None` = method entry) to
    /// position `to` (`len` = exit).
    fn flows(&self, from: Option<usize>, to: usize) -> bool {
        match from {
            None => to == 0 || self.reach[0][to],
            Some(p) => self.reach[p][to],
        }
    }
}

/// Statements and intraprocedural edges of one call graph node.
#[derive(Default)]
struct NodeGraph {
    statements: Vec<Statement>,
    edges: Vec<Edge>,
    declared: Vec<((CgNodeId, usize), MethodRef)>,
}

/// Builds a [`Sdg`] from a program model, its call graph and a points-to result.
pub struct SdgBuilder<'a> {
    program: &'a dyn ProgramModel,
    call_graph: &'a CallGraph,
    points_to: &'a dyn PointsToResult,
    data: DataDependenceOptions,
    control: ControlDependenceOptions,
    cancel: Option<CancellationToken>,
}

impl<'a> SdgBuilder<'a> {
    pub fn new(
        program: &'a dyn ProgramModel,
        call_graph: &'a CallGraph,
        points_to: &'a dyn PointsToResult,
    ) -> Self {
        Self {
            program,
            call_graph,
            points_to,
            data: DataDependenceOptions::Full,
            control: ControlDependenceOptions::Full,
            cancel: None,
        }
    }

    pub fn with_options(mut self, data: DataDependenceOptions, control: ControlDependenceOptions) -> Self {
        self.data = data;
        self.control = control;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(&self) -> Result<Sdg, SdgError> {
        let heap = self.data.admits(DataFlavor::Heap);

        let facts: Vec<NodeFacts<'a>> = self
            .call_graph
            .nodes()
            .par_iter()
            .map(|node| self.analyze_node(node, heap))
            .collect::<Result<_, _>>()?;

        self.check_cancelled()?;
        let (mods, refs) = if heap {
            transitive_mod_ref(self.call_graph, &facts)
        } else {
            (HashMap::new(), HashMap::new())
        };

        let parts: Vec<NodeGraph> = facts
            .par_iter()
            .map(|f| self.node_graph(f, &mods, &refs))
            .collect::<Result<_, _>>()?;

        self.check_cancelled()?;
        let by_node: HashMap<CgNodeId, &NodeFacts<'a>> =
            facts.iter().map(|f| (f.node.id, f)).collect();
        let mut statements: BTreeSet<Statement> = BTreeSet::new();
        let mut edges: BTreeSet<Edge> = BTreeSet::new();
        let mut declared_targets = HashMap::new();
        for part in parts {
            statements.extend(part.statements);
            edges.extend(part.edges);
            declared_targets.extend(part.declared);
        }
        for f in &facts {
            self.interprocedural_edges(f, &by_node, &mods, &refs, &mut edges)?;
        }

        let mut graph = DiGraph::with_capacity(statements.len(), edges.len());
        let mut index = HashMap::with_capacity(statements.len());
        for statement in statements {
            let idx = graph.add_node(statement.clone());
            index.insert(statement, idx);
        }
        for (from, to, dep) in edges {
            let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) else {
                return Err(SdgError::ModelInconsistency(format!(
                    "dependence edge {from} -> {to} references a statement that was never created"
                )));
            };
            graph.add_edge(a, b, dep);
        }

        info!(
            statements = graph.node_count(),
            edges = graph.edge_count(),
            data = %self.data,
            control = %self.control,
            "system dependence graph built"
        );
        Ok(Sdg {
            graph,
            index,
            data_options: self.data,
            control_options: self.control,
            declared_targets,
        })
    }

    fn check_cancelled(&self) -> Result<(), SdgError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SdgError::Cancelled),
            _ => Ok(()),
        }
    }

    fn analyze_node(&self, node: &'a CallGraphNode, heap: bool) -> Result<NodeFacts<'a>, SdgError> {
        self.check_cancelled()?;
        let method = self
            .program
            .method(&node.method)
            .ok_or_else(|| inconsistency(node, "method is not part of the program"))?;
        validate_ssa(node, method)?;

        for (&index, targets) in &node.call_sites {
            let inst = method
                .instruction(index)
                .ok_or_else(|| inconsistency(node, format!("call site {index} is out of range")))?;
            let InstructionKind::Invoke { args, .. } = &inst.kind else {
                return Err(inconsistency(node, format!("call site {index} is not an invoke: {inst}")));
            };
            for target in targets {
                let callee_node = self.call_graph.node(*target).ok_or_else(|| {
                    inconsistency(node, format!("call site {index} targets unknown node {target}"))
                })?;
                if let Some(callee) = self.program.method(&callee_node.method) {
                    if callee.params.len() != args.len() {
                        return Err(inconsistency(
                            node,
                            format!(
                                "call site {index} passes {} arguments but {} takes {}",
                                args.len(),
                                callee_node.method,
                                callee.params.len()
                            ),
                        ));
                    }
                }
            }
        }

        // Only heap edges ask whether one position reaches another.
        let reach = if heap { reachability(&cfg_successors(method)) } else { Vec::new() };
        let control =
            if self.control.is_enabled() { control_dependences(method) } else { BTreeSet::new() };

        let mut local_mod = Locations::new();
        let mut local_ref = Locations::new();
        let mut heap_effects: Vec<Option<HeapEffect>> = Vec::with_capacity(method.instructions.len());
        for inst in &method.instructions {
            let access = if heap { inst.kind.heap_access() } else { None };
            let effect = match access {
                None => None,
                Some(HeapAccess::Read(r)) => {
                    let locations = self.resolve(node, &r)?;
                    local_ref.extend(locations.iter().cloned());
                    Some(HeapEffect::Read(locations))
                }
                Some(HeapAccess::Write(r)) => {
                    let locations = self.resolve(node, &r)?;
                    local_mod.extend(locations.iter().cloned());
                    Some(HeapEffect::Write(locations))
                }
            };
            heap_effects.push(effect);
        }

        debug!(method = %node.method, node = %node.id, instructions = method.instructions.len(), "analyzed method");
        Ok(NodeFacts { node, method, reach, heap: heap_effects, local_mod, local_ref, control })
    }

    fn resolve(&self, node: &CallGraphNode, access: &HeapRef<'_>) -> Result<Locations, SdgError> {
        let (base, field) = match access {
            HeapRef::Static(field) => {
                return Ok(Locations::from([HeapLocation::StaticField((*field).clone())]));
            }
            HeapRef::Instance { base, field } => (*base, Some(*field)),
            HeapRef::Array { array } => (*array, None),
        };
        let mut locations = Locations::new();
        for key in self.points_to.points_to(node.id, base) {
            self.check_allocation_site(node, &key)?;
            locations.insert(match field {
                Some(field) => HeapLocation::InstanceField { key, field: field.clone() },
                None => HeapLocation::ArrayContents(key),
            });
        }
        Ok(locations)
    }

    /// An instance key must name an allocation in a call graph node.
    fn check_allocation_site(&self, node: &CallGraphNode, key: &InstanceKey) -> Result<(), SdgError> {
        let allocates = self
            .call_graph
            .node(key.node)
            .and_then(|owner| self.program.method(&owner.method))
            .and_then(|method| method.instruction(key.index))
            .is_some_and(|inst| {
                matches!(inst.kind, InstructionKind::New { .. } | InstructionKind::NewArray { .. })
            });
        if allocates {
            Ok(())
        } else {
            Err(inconsistency(
                node,
                format!("points-to result names {key}, which is not an allocation site"),
            ))
        }
    }

    fn node_graph(
        &self,
        f: &NodeFacts<'a>,
        mods: &HashMap<CgNodeId, Locations>,
        refs: &HashMap<CgNodeId, Locations>,
    ) -> Result<NodeGraph, SdgError> {
        self.check_cancelled()?;
        let n = f.node.id;
        let method = f.method;
        let len = method.instructions.len();
        let heap = self.data.admits(DataFlavor::Heap);
        let empty = Locations::new();
        let mut g = NodeGraph::default();

        // Callee side: entry, formals, returns and heap parameters.
        let entry = Statement::MethodEntry { node: n };
        g.statements.push(entry.clone());
        let normal_return =
            (!method.signature.returns_void()).then_some(Statement::NormalReturnCallee { node: n });
        let exception_return = Statement::ExceptionReturnCallee { node: n };
        let mut callee_side: Vec<Statement> = (0..method.params.len())
            .map(|position| Statement::ParamCallee { node: n, position })
            .collect();
        callee_side.extend(normal_return.clone());
        callee_side.push(exception_return.clone());
        if heap {
            for location in refs.get(&n).unwrap_or(&empty) {
                callee_side.push(Statement::HeapParamCallee { node: n, location: location.clone() });
            }
            for location in mods.get(&n).unwrap_or(&empty) {
                callee_side.push(Statement::HeapReturnCallee { node: n, location: location.clone() });
            }
        }
        for statement in callee_side {
            self.control_edge(&mut g, &entry, &statement);
            g.statements.push(statement);
        }

        // Statements for instructions and phis, and the SSA def map.
        let mut defs: HashMap<ValueId, Statement> = HashMap::new();
        for (position, value) in method.params.iter().enumerate() {
            defs.insert(*value, Statement::ParamCallee { node: n, position });
        }
        for (index, phi) in method.phis.iter().enumerate() {
            defs.insert(phi.def, Statement::Phi { node: n, index });
            g.statements.push(Statement::Phi { node: n, index });
        }
        for (index, inst) in method.instructions.iter().enumerate() {
            let normal = Statement::Normal { node: n, index };
            g.statements.push(normal.clone());
            let InstructionKind::Invoke { def, exception, target, args, .. } = &inst.kind else {
                for value in inst.kind.defs() {
                    defs.insert(value, normal.clone());
                }
                continue;
            };

            g.declared.push(((n, index), target.clone()));
            let mut caller_side: Vec<Statement> = (0..args.len())
                .map(|position| Statement::ParamCaller { node: n, call: index, position })
                .collect();
            if target.returns_void() {
                if let Some(value) = def {
                    return Err(inconsistency(
                        f.node,
                        format!("call at {index} assigns v{value} from void method {target}"),
                    ));
                }
            } else {
                let result = Statement::NormalReturnCaller { node: n, call: index };
                if let Some(value) = def {
                    defs.insert(*value, result.clone());
                }
                caller_side.push(result);
            }
            let thrown = Statement::ExceptionReturnCaller { node: n, call: index };
            if let Some(value) = exception {
                defs.insert(*value, thrown.clone());
            }
            caller_side.push(thrown);
            if heap {
                let (callee_ref, callee_mod) = callee_effects(self.call_graph, n, index, mods, refs);
                caller_side.extend(callee_ref.into_iter().map(|location| {
                    Statement::HeapParamCaller { node: n, call: index, location }
                }));
                caller_side.extend(callee_mod.into_iter().map(|location| {
                    Statement::HeapReturnCaller { node: n, call: index, location }
                }));
            }
            for statement in caller_side {
                self.control_edge(&mut g, &normal, &statement);
                g.statements.push(statement);
            }
        }

        // Scalar, base-pointer and cast data dependences.
        let def_of = |value: ValueId| {
            defs.get(&value)
                .cloned()
                .ok_or_else(|| inconsistency(f.node, format!("value v{value} has no defining statement")))
        };
        for (index, inst) in method.instructions.iter().enumerate() {
            let normal = Statement::Normal { node: n, index };
            for (value, role) in inst.kind.uses() {
                let (user, flavor) = match role {
                    UseRole::Value => (normal.clone(), DataFlavor::Scalar),
                    UseRole::BasePointer => (normal.clone(), DataFlavor::BasePointer),
                    UseRole::CastSource => (normal.clone(), DataFlavor::Cast),
                    UseRole::Argument(position) => {
                        (Statement::ParamCaller { node: n, call: index, position }, DataFlavor::Scalar)
                    }
                };
                self.data_edge(&mut g, def_of(value)?, user, flavor);
            }
            match &inst.kind {
                InstructionKind::Invoke { args, .. } => {
                    for position in 0..args.len() {
                        let param = Statement::ParamCaller { node: n, call: index, position };
                        self.data_edge(&mut g, param, normal.clone(), DataFlavor::Scalar);
                    }
                    let thrown = Statement::ExceptionReturnCaller { node: n, call: index };
                    self.data_edge(&mut g, thrown, exception_return.clone(), DataFlavor::Scalar);
                }
                InstructionKind::Return { value: Some(_) } => {
                    let returned = normal_return.clone().ok_or_else(|| {
                        inconsistency(f.node, format!("instruction {index} returns a value from a void method"))
                    })?;
                    self.data_edge(&mut g, normal.clone(), returned, DataFlavor::Scalar);
                }
                InstructionKind::Throw { .. } => {
                    self.data_edge(&mut g, normal.clone(), exception_return.clone(), DataFlavor::Scalar);
                }
                _ => {}
            }
        }
        for (index, phi) in method.phis.iter().enumerate() {
            for value in &phi.uses {
                self.data_edge(&mut g, def_of(*value)?, Statement::Phi { node: n, index }, DataFlavor::Scalar);
            }
        }

        if heap {
            self.heap_edges(&mut g, f, mods, refs);
        }

        // Intraprocedural control dependence; uncontrolled statements hang off the entry.
        if self.control.is_enabled() {
            let controlled: HashSet<usize> = f.control.iter().map(|(_, y)| *y).collect();
            for (branch, dependent) in &f.control {
                g.edges.push((
                    Statement::Normal { node: n, index: *branch },
                    Statement::Normal { node: n, index: *dependent },
                    Dependence::Control,
                ));
            }
            for index in (0..len).filter(|i| !controlled.contains(i)) {
                g.edges.push((entry.clone(), Statement::Normal { node: n, index }, Dependence::Control));
            }
            for (index, phi) in method.phis.iter().enumerate() {
                let phi_statement = Statement::Phi { node: n, index };
                let mut governed = false;
                for (branch, _) in f.control.iter().filter(|(_, y)| *y == phi.at) {
                    governed = true;
                    g.edges.push((
                        Statement::Normal { node: n, index: *branch },
                        phi_statement.clone(),
                        Dependence::Control,
                    ));
                }
                if !governed {
                    g.edges.push((entry.clone(), phi_statement, Dependence::Control));
                }
            }
        }

        Ok(g)
    }

    /// Heap definitions reaching heap uses inside one method.
    fn heap_edges(
        &self,
        g: &mut NodeGraph,
        f: &NodeFacts<'a>,
        mods: &HashMap<CgNodeId, Locations>,
        refs: &HashMap<CgNodeId, Locations>,
    ) {
        let n = f.node.id;
        let len = f.method.instructions.len();
        let empty = Locations::new();
        let mut writers: Vec<(Statement, Option<usize>, Locations)> = Vec::new();
        let mut readers: Vec<(Statement, usize, Locations)> = Vec::new();

        for location in refs.get(&n).unwrap_or(&empty) {
            writers.push((
                Statement::HeapParamCallee { node: n, location: location.clone() },
                None,
                Locations::from([location.clone()]),
            ));
        }
        for location in mods.get(&n).unwrap_or(&empty) {
            readers.push((
                Statement::HeapReturnCallee { node: n, location: location.clone() },
                len,
                Locations::from([location.clone()]),
            ));
        }
        for (index, effect) in f.heap.iter().enumerate() {
            let normal = Statement::Normal { node: n, index };
            match effect {
                Some(HeapEffect::Write(locations)) => {
                    writers.push((normal, Some(index), locations.clone()))
                }
                Some(HeapEffect::Read(locations)) => readers.push((normal, index, locations.clone())),
                None => {}
            }
        }
        for &index in f.node.call_sites.keys() {
            let (callee_ref, callee_mod) = callee_effects(self.call_graph, n, index, mods, refs);
            for location in callee_ref {
                readers.push((
                    Statement::HeapParamCaller { node: n, call: index, location: location.clone() },
                    index,
                    Locations::from([location]),
                ));
            }
            for location in callee_mod {
                writers.push((
                    Statement::HeapReturnCaller { node: n, call: index, location: location.clone() },
                    Some(index),
                    Locations::from([location]),
                ));
            }
        }

        for (writer, from, written) in &writers {
            for (reader, to, read) in &readers {
                if !f.flows(*from, *to) {
                    continue;
                }
                let aliased =
                    written.iter().any(|w| read.iter().any(|r| self.points_to.may_alias(w, r)));
                if aliased {
                    g.edges.push((writer.clone(), reader.clone(), Dependence::Data(DataFlavor::Heap)));
                }
            }
        }
    }

    fn interprocedural_edges(
        &self,
        f: &NodeFacts<'a>,
        by_node: &HashMap<CgNodeId, &NodeFacts<'a>>,
        mods: &HashMap<CgNodeId, Locations>,
        refs: &HashMap<CgNodeId, Locations>,
        edges: &mut BTreeSet<Edge>,
    ) -> Result<(), SdgError> {
        let n = f.node.id;
        let scalar = self.data.admits(DataFlavor::Scalar);
        let heap = self.data.admits(DataFlavor::Heap);
        let empty = Locations::new();

        for (&call, targets) in &f.node.call_sites {
            let Some(InstructionKind::Invoke { args, target: declared, .. }) =
                f.method.instruction(call).map(|i| &i.kind)
            else {
                continue;
            };
            for &t in targets {
                let callee = by_node.get(&t).ok_or_else(|| {
                    inconsistency(f.node, format!("call site {call} targets unanalyzed node {t}"))
                })?;
                if self.control.is_enabled() {
                    edges.insert((
                        Statement::Normal { node: n, index: call },
                        Statement::MethodEntry { node: t },
                        Dependence::Control,
                    ));
                }
                if scalar {
                    let flow = Dependence::Data(DataFlavor::Scalar);
                    for position in 0..args.len() {
                        edges.insert((
                            Statement::ParamCaller { node: n, call, position },
                            Statement::ParamCallee { node: t, position },
                            flow,
                        ));
                    }
                    if !declared.returns_void() && !callee.method.signature.returns_void() {
                        edges.insert((
                            Statement::NormalReturnCallee { node: t },
                            Statement::NormalReturnCaller { node: n, call },
                            flow,
                        ));
                    }
                    edges.insert((
                        Statement::ExceptionReturnCallee { node: t },
                        Statement::ExceptionReturnCaller { node: n, call },
                        flow,
                    ));
                }
                if heap {
                    let flow = Dependence::Data(DataFlavor::Heap);
                    for location in refs.get(&t).unwrap_or(&empty) {
                        edges.insert((
                            Statement::HeapParamCaller { node: n, call, location: location.clone() },
                            Statement::HeapParamCallee { node: t, location: location.clone() },
                            flow,
                        ));
                    }
                    for location in mods.get(&t).unwrap_or(&empty) {
                        edges.insert((
                            Statement::HeapReturnCallee { node: t, location: location.clone() },
                            Statement::HeapReturnCaller { node: n, call, location: location.clone() },
                            flow,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn data_edge(&self, g: &mut NodeGraph, from: Statement, to: Statement, flavor: DataFlavor) {
        if self.data.admits(flavor) {
            g.edges.push((from, to, Dependence::Data(flavor)));
        }
    }

    fn control_edge(&self, g: &mut NodeGraph, from: &Statement, to: &Statement) {
        if self.control.is_enabled() {
            g.edges.push((from.clone(), to.clone(), Dependence::Control));
        }
    }
}

/// Build a dependence graph with the given options in one call.
pub fn build_sdg(
    program: &dyn ProgramModel,
    call_graph: &CallGraph,
    points_to: &dyn PointsToResult,
    data: DataDependenceOptions,
    control: ControlDependenceOptions,
    cancel: Option<&CancellationToken>,
) -> Result<Sdg, SdgError> {
    let mut builder = SdgBuilder::new(program, call_graph, points_to).with_options(data, control);
    if let Some(token) = cancel {
        builder = builder.with_cancellation(token.clone());
    }
    builder.build()
}

fn inconsistency(node: &CallGraphNode, detail: impl fmt::Display) -> SdgError {
    SdgError::ModelInconsistency(format!("{} ({}): {detail}", node.method, node.id))
}

fn validate_ssa(node: &CallGraphNode, method: &Method) -> Result<(), SdgError> {
    let len = method.instructions.len();
    let mut defined = HashSet::new();
    let all_defs = method
        .params
        .iter()
        .copied()
        .chain(method.phis.iter().map(|phi| phi.def))
        .chain(method.instructions.iter().flat_map(|inst| inst.kind.defs()));
    for value in all_defs {
        if !defined.insert(value) {
            return Err(inconsistency(node, format!("value v{value} is defined more than once")));
        }
    }

    for (index, inst) in method.instructions.iter().enumerate() {
        if let Some((value, _)) = inst.kind.uses().into_iter().find(|(v, _)| !defined.contains(v)) {
            return Err(inconsistency(
                node,
                format!("instruction {index} ({inst}) uses undefined value v{value}"),
            ));
        }
        if let Some(target) = inst.kind.jump_targets().into_iter().find(|t| *t >= len) {
            return Err(inconsistency(
                node,
                format!("instruction {index} jumps to {target}, outside 0..{len}"),
            ));
        }
    }
    for (index, phi) in method.phis.iter().enumerate() {
        if let Some(value) = phi.uses.iter().find(|v| !defined.contains(*v)) {
            return Err(inconsistency(node, format!("phi {index} uses undefined value v{value}")));
        }
        if phi.at >= len {
            return Err(inconsistency(node, format!("phi {index} is placed at {}, outside 0..{len}", phi.at)));
        }
    }
    Ok(())
}

/// Union of the transitive ref and mod sets of every target of one call.
fn callee_effects(
    cg: &CallGraph,
    node: CgNodeId,
    call: usize,
    mods: &HashMap<CgNodeId, Locations>,
    refs: &HashMap<CgNodeId, Locations>,
) -> (Locations, Locations) {
    let mut callee_ref = Locations::new();
    let mut callee_mod = Locations::new();
    for target in cg.targets(node, call) {
        if let Some(locations) = refs.get(target) {
            callee_ref.extend(locations.iter().cloned());
        }
        if let Some(locations) = mods.get(target) {
            callee_mod.extend(locations.iter().cloned());
        }
    }
    (callee_ref, callee_mod)
}

/// Close local mod/ref sets over the call graph. Recursion converges because
/// the sets only grow and the location universe is finite.
fn transitive_mod_ref(
    cg: &CallGraph,
    facts: &[NodeFacts<'_>],
) -> (HashMap<CgNodeId, Locations>, HashMap<CgNodeId, Locations>) {
    let mut mods: HashMap<CgNodeId, Locations> =
        facts.iter().map(|f| (f.node.id, f.local_mod.clone())).collect();
    let mut refs: HashMap<CgNodeId, Locations> =
        facts.iter().map(|f| (f.node.id, f.local_ref.clone())).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for f in facts {
            for callee in cg.successors(f.node.id) {
                changed |= absorb(&mut mods, f.node.id, callee);
                changed |= absorb(&mut refs, f.node.id, callee);
            }
        }
    }
    (mods, refs)
}

fn absorb(table: &mut HashMap<CgNodeId, Locations>, into: CgNodeId, from: CgNodeId) -> bool {
    if into == from {
        return false;
    }
    let incoming = table.get(&from).cloned().unwrap_or_default();
    let target = table.entry(into).or_default();
    let before = target.len();
    target.extend(incoming);
    target.len() != before
}
