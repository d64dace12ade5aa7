//! Intraprocedural constant propagation scenarios.
mod common;

use common::*;
use latte::{
    analysis::{
        constant_propagation::{ConstantPropagation, CpFact, Value},
        fixed_point::{DataflowAnalysis, Solver},
    },
    ir::{BinaryOp, Expression, MethodIr, Node, Var},
};

fn solve(method: &MethodIr) -> latte::analysis::fixed_point::DataflowResult<Node, CpFact> {
    Solver::Worklist
        .solve(method.cfg(), &ConstantPropagation::new(method))
        .expect("worklist supports forward analyses")
}

#[test]
fn folds_straight_line_constants() {
    // a = 1; b = 2; c = a + b; z = 0; d = c * z;
    let vars = int_vars(&["a", "b", "c", "z", "d"]);
    let (a, b, c, z, d) = (Var(0), Var(1), Var(2), Var(3), Var(4));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, a, 1),
            assign_const(1, b, 2),
            binary(2, c, BinaryOp::Add, a, b),
            assign_const(3, z, 0),
            binary(4, d, BinaryOp::Mul, c, z),
        ],
    );
    let result = solve(&method);
    let at_exit = result.in_fact(&Node::Exit).unwrap();
    assert_eq!(at_exit.get(a), Value::Const(1));
    assert_eq!(at_exit.get(b), Value::Const(2));
    assert_eq!(at_exit.get(c), Value::Const(3));
    assert_eq!(at_exit.get(d), Value::Const(0));
}

#[test]
fn join_of_distinct_constants_is_nac() {
    // if (p) { x = 1; } else { x = 2; } y = x;
    let vars = int_vars(&["p", "x", "y"]);
    let (p, x, y) = (Var(0), Var(1), Var(2));
    let method = MethodIr::new(
        vars,
        vec![p],
        vec![
            if_goto(0, Expression::Var(p), 3),
            assign_const(1, x, 2),
            goto(2, 4),
            assign_const(3, x, 1),
            binary(4, y, BinaryOp::Add, x, x),
            ret(5, Some(y)),
        ],
    );
    let result = solve(&method);
    let at_join = result.in_fact(&Node::Stmt(4)).unwrap();
    assert_eq!(at_join.get(x), Value::Nac);
    let after_join = result.out_fact(&Node::Stmt(4)).unwrap();
    assert_eq!(after_join.get(y), Value::Nac);
}

#[test]
fn division_by_constant_zero_is_undef() {
    // a = 10; b = 0; c = a / b;
    let vars = int_vars(&["a", "b", "c"]);
    let (a, b, c) = (Var(0), Var(1), Var(2));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, a, 10),
            assign_const(1, b, 0),
            binary(2, c, BinaryOp::Div, a, b),
        ],
    );
    let result = solve(&method);
    let at_exit = result.in_fact(&Node::Exit).unwrap();
    assert_eq!(at_exit.get(c), Value::Undef);
}

#[test]
fn zero_divisor_beats_nac_dividend() {
    // p is a parameter (NAC); b = 0; c = p % b;
    let vars = int_vars(&["p", "b", "c"]);
    let (p, b, c) = (Var(0), Var(1), Var(2));
    let method = MethodIr::new(
        vars,
        vec![p],
        vec![
            assign_const(0, b, 0),
            binary(1, c, BinaryOp::Rem, p, b),
        ],
    );
    let result = solve(&method);
    let at_exit = result.in_fact(&Node::Exit).unwrap();
    assert_eq!(at_exit.get(p), Value::Nac);
    assert_eq!(at_exit.get(c), Value::Undef);
}

#[test]
fn parameters_enter_as_nac() {
    let vars = int_vars(&["p", "x"]);
    let (p, x) = (Var(0), Var(1));
    let method = MethodIr::new(
        vars,
        vec![p],
        vec![binary(0, x, BinaryOp::Add, p, p), ret(1, Some(x))],
    );
    let result = solve(&method);
    let at_entry = result.in_fact(&Node::Stmt(0)).unwrap();
    assert_eq!(at_entry.get(p), Value::Nac);
    assert_eq!(result.in_fact(&Node::Exit).unwrap().get(x), Value::Nac);
}

#[test]
fn call_results_are_not_constants() {
    // x = 3; x = unknown(); y = x + x;
    let vars = int_vars(&["x", "y"]);
    let (x, y) = (Var(0), Var(1));
    let callee = method_ref("Lib", "unknown", "()I");
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, x, 3),
            invoke(1, Some(x), latte::ir::DispatchKind::Static, callee, vec![]),
            binary(2, y, BinaryOp::Add, x, x),
        ],
    );
    let result = solve(&method);
    let at_exit = result.in_fact(&Node::Exit).unwrap();
    assert_eq!(at_exit.get(x), Value::Nac);
    assert_eq!(at_exit.get(y), Value::Nac);
}

#[test]
fn transfer_is_monotone_on_raised_inputs() {
    // y = x + x under x=Const(1) versus x=NAC.
    let vars = int_vars(&["x", "y"]);
    let (x, y) = (Var(0), Var(1));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![binary(0, y, BinaryOp::Add, x, x)],
    );
    let analysis = ConstantPropagation::new(&method);

    let mut lower = CpFact::new();
    lower.update(x, Value::Const(1));
    let mut raised = CpFact::new();
    raised.update(x, Value::Nac);

    let mut out_lower = CpFact::new();
    analysis.transfer(Node::Stmt(0), &lower, &mut out_lower);
    let mut out_raised = CpFact::new();
    analysis.transfer(Node::Stmt(0), &raised, &mut out_raised);

    // Raising the input must not lower any output entry.
    for (var, value) in out_lower.iter() {
        assert_eq!(out_raised.get(var).meet(value), out_raised.get(var));
    }
}
