//! Dead code detection.
//!
//! Fuses the constant-propagation result with the live-variable result:
//! branches whose conditions are known constants make the untaken side
//! unreachable, and an assignment whose target is not live afterwards is
//! useless unless its right-hand side has an observable effect.
use std::collections::{BTreeSet, VecDeque};

use crate::ir::{ControlFlowGraph, EdgeKind, MethodIr, Node, StmtKind, Var};

use super::{
    constant_propagation::{CpFact, Value, evaluate},
    fixed_point::DataflowResult,
    live_variables::SetFact,
};

/// Finds the dead statements of a method: the unreachable ones and the
/// useless assignments.
///
/// `constants` is the per-node constant-propagation result, consumed via
/// its IN facts; `liveness` is the live-variable result, consumed via its
/// OUT sets. The returned set contains statement indices in source order.
/// Unreachable statements without a source line are considered synthetic
/// and are not reported.
#[must_use]
pub fn find_dead_code(
    method: &MethodIr,
    constants: &DataflowResult<Node, CpFact>,
    liveness: &DataflowResult<Node, SetFact<Var>>,
) -> BTreeSet<u32> {
    let cfg = method.cfg();
    let mut dead = BTreeSet::new();
    let mut visited = BTreeSet::from([Node::Entry]);
    let mut queue = VecDeque::from([Node::Entry]);
    while let Some(node) = queue.pop_front() {
        if let Node::Stmt(index) = node {
            let stmt = method.stmt(index);
            if let StmtKind::Assign { lhs, rhs } = &stmt.kind {
                let dead_store = liveness
                    .out_fact(&node)
                    .is_some_and(|live_out| !live_out.contains(lhs));
                if dead_store && !rhs.has_side_effect() {
                    dead.insert(index);
                }
            }
        }
        for succ in live_successors(node, method, cfg, constants) {
            if visited.insert(succ) {
                queue.push_back(succ);
            }
        }
    }
    for stmt in method.stmts() {
        if !visited.contains(&Node::Stmt(stmt.index)) && stmt.line.is_some() {
            dead.insert(stmt.index);
        }
    }
    dead
}

/// The successors actually reachable from a node under the constant facts.
///
/// An `if` whose condition folds to a constant takes only the matching
/// branch; a `switch` whose key folds to a constant takes the matching case
/// or the default. A bottom (`undef`) condition forces no successor at all:
/// the branch itself is reachable, but no defined execution continues past
/// it.
fn live_successors(
    node: Node,
    method: &MethodIr,
    cfg: &ControlFlowGraph,
    constants: &DataflowResult<Node, CpFact>,
) -> Vec<Node> {
    let all = || cfg.successors(node).map(|(succ, _)| succ).collect();
    let Node::Stmt(index) = node else {
        return all();
    };
    let Some(in_fact) = constants.in_fact(&node) else {
        return all();
    };
    match &method.stmt(index).kind {
        StmtKind::If { condition, .. } => {
            let taken = match evaluate(condition, in_fact, method) {
                Value::Const(0) => EdgeKind::IfFalse,
                Value::Const(_) => EdgeKind::IfTrue,
                Value::Nac => return all(),
                Value::Undef => return Vec::new(),
            };
            cfg.successors(node)
                .filter(|(_, kind)| *kind == taken)
                .map(|(succ, _)| succ)
                .collect()
        }
        StmtKind::Switch { key, cases, .. } => {
            let taken = match in_fact.get(*key) {
                Value::Const(label) => {
                    if cases.iter().any(|(case, _)| *case == label) {
                        EdgeKind::SwitchCase(label)
                    } else {
                        EdgeKind::SwitchDefault
                    }
                }
                Value::Nac => return all(),
                Value::Undef => return Vec::new(),
            };
            cfg.successors(node)
                .filter(|(_, kind)| *kind == taken)
                .map(|(succ, _)| succ)
                .collect()
        }
        _ => all(),
    }
}
