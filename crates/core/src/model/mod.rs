//! Program model consumed by the dependence graph builder.
//!
//! A program is a set of classes (for call resolution) and methods in SSA
//! form. Programs are loaded from JSON or YAML files; the builder only ever
//! talks to the [`ProgramModel`] trait so another front end can be plugged in.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

mod hierarchy;
mod instruction;

pub use hierarchy::ClassHierarchy;
pub use instruction::{
    HeapAccess, HeapRef, Instruction, InstructionKind, InvokeKind, UseRole,
};

/// SSA value number, local to one method.
pub type ValueId = u32;

/// Name of the type returned by methods that produce no value.
pub const VOID: &str = "void";

fn void_type() -> String {
    VOID.to_string()
}

/// Reference to a field declared in some class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub class: String,
    pub name: String,
}

impl FieldRef {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self { class: class.into(), name: name.into() }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// Reference to a method: declaring class, name, parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "void_type")]
    pub returns: String,
}

impl MethodRef {
    pub fn new<S: Into<String>>(
        class: impl Into<String>,
        name: impl Into<String>,
        params: impl IntoIterator<Item = S>,
        returns: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            returns: returns.into(),
        }
    }

    /// Name plus descriptor, used to match overriding methods across classes.
    pub fn selector(&self) -> String {
        format!("{}({}){}", self.name, self.params.join(","), self.returns)
    }

    /// Fully qualified signature; unique key of a method in a program.
    pub fn signature(&self) -> String {
        format!("{}.{}", self.class, self.selector())
    }

    pub fn returns_void(&self) -> bool {
        self.returns == VOID || self.returns == "V"
    }

    /// Same selector, declared in another class.
    pub fn in_class(&self, class: &str) -> Self {
        Self { class: class.to_string(), ..self.clone() }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// SSA merge of several values at the instruction index `at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phi {
    pub def: ValueId,
    pub uses: Vec<ValueId>,
    #[serde(default)]
    pub at: usize,
}

/// A method body. `params` lists the value numbers bound to the formal
/// parameters (the receiver first for instance methods).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub signature: MethodRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub params: Vec<ValueId>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub phis: Vec<Phi>,
}

impl Method {
    pub fn new(signature: MethodRef, params: Vec<ValueId>) -> Self {
        Self {
            signature,
            is_static: true,
            is_abstract: false,
            params,
            instructions: Vec::new(),
            phis: Vec::new(),
        }
    }

    /// Builder-style helper to append an instruction.
    pub fn with(mut self, instruction: impl Into<Instruction>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn with_phi(mut self, phi: Phi) -> Self {
        self.phis.push(phi);
        self
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Source line of the instruction at `index`, if recorded.
    pub fn line_number(&self, index: usize) -> Option<u32> {
        self.instructions.get(index).and_then(|inst| inst.line)
    }
}

/// Class declaration; only the type hierarchy is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub is_interface: bool,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), superclass: None, interfaces: Vec::new(), is_interface: false }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

/// On-disk representation of a program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSource {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

/// Capabilities the dependence graph builder needs from a whole-program model.
pub trait ProgramModel: Sync {
    /// All methods with bodies.
    fn methods(&self) -> Vec<&Method>;

    /// Look up a method by fully qualified signature.
    fn method(&self, signature: &str) -> Option<&Method>;

    /// Resolve the concrete methods a call may dispatch to.
    fn resolve_targets(&self, kind: InvokeKind, declared: &MethodRef) -> Vec<&Method>;
}

/// In-memory program indexed by method signature.
#[derive(Debug, Clone)]
pub struct Program {
    source: ProgramSource,
    by_signature: HashMap<String, usize>,
    hierarchy: ClassHierarchy,
}

impl Program {
    pub fn new(source: ProgramSource) -> Self {
        let by_signature = source
            .methods
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.signature.signature(), idx))
            .collect();
        let hierarchy = ClassHierarchy::new(&source.classes);
        Self { source, by_signature, hierarchy }
    }

    pub fn from_parts(classes: Vec<ClassDef>, methods: Vec<Method>) -> Self {
        Self::new(ProgramSource { classes, methods })
    }

    pub fn from_json_str(body: &str) -> Result<Self> {
        let source: ProgramSource =
            serde_json::from_str(body).context("Failed to parse program model JSON")?;
        Ok(Self::new(source))
    }

    pub fn from_yaml_str(body: &str) -> Result<Self> {
        let source: ProgramSource =
            serde_yaml::from_str(body).context("Failed to parse program model YAML")?;
        Ok(Self::new(source))
    }

    /// Load a program model file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read program model at {}", path.display()))?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::from_json_str(&body)
        } else {
            Self::from_yaml_str(&body)
        }
    }

    pub fn source(&self) -> &ProgramSource {
        &self.source
    }

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    /// Signatures of the `main` methods declared in `main_class`.
    pub fn main_entrypoints(&self, main_class: &str) -> Vec<String> {
        let wanted = match main_class.strip_prefix('L') {
            Some(rest) if rest.contains('/') => rest.trim_end_matches(';').replace('/', "."),
            _ => main_class.replace('/', "."),
        };
        self.source
            .methods
            .iter()
            .filter(|m| m.signature.name == "main" && m.signature.class == wanted)
            .map(|m| m.signature.signature())
            .collect()
    }

    /// Find an implementation of `selector` in `class` or its nearest superclass.
    fn lookup(&self, class: &str, declared: &MethodRef) -> Option<&Method> {
        for candidate in self.hierarchy.superclass_chain(class) {
            let sig = declared.in_class(&candidate).signature();
            if let Some(&idx) = self.by_signature.get(&sig) {
                let method = &self.source.methods[idx];
                if !method.is_abstract {
                    return Some(method);
                }
            }
        }
        None
    }
}

impl ProgramModel for Program {
    fn methods(&self) -> Vec<&Method> {
        self.source.methods.iter().filter(|m| !m.is_abstract).collect()
    }

    fn method(&self, signature: &str) -> Option<&Method> {
        self.by_signature.get(signature).map(|&idx| &self.source.methods[idx])
    }

    fn resolve_targets(&self, kind: InvokeKind, declared: &MethodRef) -> Vec<&Method> {
        match kind {
            InvokeKind::Static | InvokeKind::Special => {
                self.lookup(&declared.class, declared).into_iter().collect()
            }
            InvokeKind::Virtual | InvokeKind::Interface => {
                let mut seen = std::collections::BTreeSet::new();
                let mut out = Vec::new();
                for class in self.hierarchy.subtypes(&declared.class) {
                    if self.hierarchy.is_interface(&class) {
                        continue;
                    }
                    if let Some(method) = self.lookup(&class, declared) {
                        if seen.insert(method.signature.signature()) {
                            out.push(method);
                        }
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn void_method(class: &str, name: &str) -> Method {
        let mut m = Method::new(MethodRef::new(class, name, Vec::<String>::new(), VOID), vec![1]);
        m.is_static = false;
        m.with(InstructionKind::Return { value: None })
    }

    #[test]
    fn virtual_call_resolves_overrides_in_subclasses() {
        let program = Program::from_parts(
            vec![ClassDef::new("Shape"), ClassDef::new("Circle").extends("Shape")],
            vec![void_method("Shape", "draw"), void_method("Circle", "draw")],
        );
        let declared = MethodRef::new("Shape", "draw", Vec::<String>::new(), VOID);
        let mut targets: Vec<String> = program
            .resolve_targets(InvokeKind::Virtual, &declared)
            .iter()
            .map(|m| m.signature.signature())
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["Circle.draw()void", "Shape.draw()void"]);

        let special = program.resolve_targets(InvokeKind::Special, &declared);
        assert_eq!(special.len(), 1);
    }

    #[test]
    fn inherited_method_is_found_through_superclass_chain() {
        let program = Program::from_parts(
            vec![ClassDef::new("Base"), ClassDef::new("Derived").extends("Base")],
            vec![void_method("Base", "run")],
        );
        let declared = MethodRef::new("Derived", "run", Vec::<String>::new(), VOID);
        let targets = program.resolve_targets(InvokeKind::Virtual, &declared);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].signature.class, "Base");
    }

    #[test]
    fn main_entrypoints_accept_bytecode_style_class_names() {
        let program = Program::from_parts(
            vec![],
            vec![Method::new(
                MethodRef::new("slice.Demo", "main", vec!["String[]"], VOID),
                vec![1],
            )],
        );
        assert_eq!(program.main_entrypoints("Lslice/Demo").len(), 1);
        assert!(program.main_entrypoints("Other").is_empty());
    }

    #[test]
    fn program_loads_from_yaml() {
        let yaml = r#"
methods:
  - signature: { class: Demo, name: main, params: ["String[]"] }
    params: [1]
    instructions:
      - { inst: const, def: 2, literal: "1", line: 3 }
      - { inst: return }
"#;
        let program = Program::from_yaml_str(yaml).expect("program");
        let main = program.method("Demo.main(String[])void").expect("main");
        assert_eq!(main.instructions.len(), 2);
        assert_eq!(main.line_number(0), Some(3));
    }
}
