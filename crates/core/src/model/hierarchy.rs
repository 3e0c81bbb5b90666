use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::ClassDef;

/// Class hierarchy built from the declared classes of a program.
///
/// Classes that are referenced but never declared behave as roots with no
/// subtypes, which keeps library calls resolvable to "no target".
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    superclass: BTreeMap<String, String>,
    interfaces: BTreeSet<String>,
    /// Direct subtypes, through `extends` and `implements` edges.
    children: BTreeMap<String, BTreeSet<String>>,
}

impl ClassHierarchy {
    pub fn new(classes: &[ClassDef]) -> Self {
        let mut hierarchy = Self::default();
        for class in classes {
            if class.is_interface {
                hierarchy.interfaces.insert(class.name.clone());
            }
            if let Some(parent) = &class.superclass {
                hierarchy.superclass.insert(class.name.clone(), parent.clone());
                hierarchy.children.entry(parent.clone()).or_default().insert(class.name.clone());
            }
            for iface in &class.interfaces {
                hierarchy.children.entry(iface.clone()).or_default().insert(class.name.clone());
            }
        }
        hierarchy
    }

    pub fn is_interface(&self, class: &str) -> bool {
        self.interfaces.contains(class)
    }

    /// `class` followed by its superclasses, nearest first. Cycles are cut.
    pub fn superclass_chain(&self, class: &str) -> Vec<String> {
        let mut chain = vec![class.to_string()];
        let mut current = class;
        while let Some(parent) = self.superclass.get(current) {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// `class` and every transitive subtype, in breadth-first order.
    pub fn subtypes(&self, class: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&next) {
                queue.extend(children.iter().cloned());
            }
            order.push(next);
        }
        order
    }
}
