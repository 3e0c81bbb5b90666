//! Intraprocedural control dependence from post-dominators.

use std::collections::BTreeSet;

use crate::model::Method;

/// Successor lists of a method body; index `len` is the virtual exit.
pub(crate) fn cfg_successors(method: &Method) -> Vec<Vec<usize>> {
    let len = method.instructions.len();
    let mut succ: Vec<Vec<usize>> = method
        .instructions
        .iter()
        .enumerate()
        .map(|(idx, inst)| inst.kind.successors(idx, len))
        .collect();
    succ.push(Vec::new());
    succ
}

/// `reach[p][q]` holds when `q` is reachable from `p` in one or more steps.
pub(crate) fn reachability(succ: &[Vec<usize>]) -> Vec<Vec<bool>> {
    let n = succ.len();
    let mut reach = vec![vec![false; n]; n];
    for (start, row) in reach.iter_mut().enumerate() {
        let mut stack: Vec<usize> = succ[start].clone();
        while let Some(next) = stack.pop() {
            if next >= n || row[next] {
                continue;
            }
            row[next] = true;
            stack.extend(succ[next].iter().copied());
        }
    }
    reach
}

/// Post-dominator sets, iterated to a fixpoint. Nodes that never reach the
/// exit are post-dominated only by themselves.
pub(crate) fn post_dominators(succ: &[Vec<usize>]) -> Vec<Vec<bool>> {
    let n = succ.len();
    let exit = n - 1;
    let reach = reachability(succ);
    let reaches_exit: Vec<bool> = (0..n).map(|v| v == exit || reach[v][exit]).collect();

    let mut pdom: Vec<Vec<bool>> = (0..n)
        .map(|v| {
            if v == exit || !reaches_exit[v] {
                let mut only_self = vec![false; n];
                only_self[v] = true;
                only_self
            } else {
                vec![true; n]
            }
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for v in (0..n).rev() {
            if v == exit || !reaches_exit[v] {
                continue;
            }
            let mut meet = vec![true; n];
            for &s in succ[v].iter().filter(|&&s| s < n && reaches_exit[s]) {
                for (slot, dominated) in meet.iter_mut().zip(&pdom[s]) {
                    *slot &= *dominated;
                }
            }
            meet[v] = true;
            if meet != pdom[v] {
                pdom[v] = meet;
                changed = true;
            }
        }
    }
    pdom
}

/// Pairs `(branch, dependent)` of instruction indices: `dependent` executes
/// or not depending on the outcome of `branch`.
pub fn control_dependences(method: &Method) -> BTreeSet<(usize, usize)> {
    let succ = cfg_successors(method);
    let exit = succ.len() - 1;
    let pdom = post_dominators(&succ);

    let mut deps = BTreeSet::new();
    for (a, targets) in succ.iter().enumerate().take(exit) {
        if targets.len() < 2 {
            continue;
        }
        for &b in targets {
            if b > exit {
                continue;
            }
            for y in 0..exit {
                if y != a && pdom[b][y] && !pdom[a][y] {
                    deps.insert((a, y));
                }
            }
        }
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstructionKind, MethodRef};

    #[test]
    fn branch_body_depends_on_condition_but_join_does_not() {
        // 0: v1 = const; 1: if (v1) goto 3; 2: v2 = const; 3: return
        let method = Method::new(MethodRef::new("A", "m", Vec::<String>::new(), "void"), vec![])
            .with(InstructionKind::Const { def: 1, literal: None })
            .with(InstructionKind::Branch { uses: vec![1], target: 3 })
            .with(InstructionKind::Const { def: 2, literal: None })
            .with(InstructionKind::Return { value: None });
        let deps = control_dependences(&method);
        assert_eq!(deps, BTreeSet::from([(1, 2)]));
    }

    #[test]
    fn loop_body_depends_on_header_and_exit_does_not() {
        // 0: const; 1: if (v1) goto 4; 2: const; 3: goto 1; 4: return
        let method = Method::new(MethodRef::new("A", "m", Vec::<String>::new(), "void"), vec![])
            .with(InstructionKind::Const { def: 1, literal: None })
            .with(InstructionKind::Branch { uses: vec![1], target: 4 })
            .with(InstructionKind::Const { def: 2, literal: None })
            .with(InstructionKind::Goto { target: 1 })
            .with(InstructionKind::Return { value: None });
        let deps = control_dependences(&method);
        assert!(deps.contains(&(1, 2)));
        assert!(deps.contains(&(1, 3)));
        assert!(!deps.contains(&(1, 4)));
        assert!(!deps.iter().any(|(_, y)| *y == 0));
    }
}
