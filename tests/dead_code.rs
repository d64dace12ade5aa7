//! Dead code detection scenarios.
mod common;

use std::collections::BTreeSet;

use common::*;
use latte::{
    analysis::{
        constant_propagation::ConstantPropagation,
        dead_code::find_dead_code,
        fixed_point::Solver,
        live_variables::LiveVariables,
    },
    ir::{BinaryOp, DispatchKind, Expression, MethodIr, Var},
};

fn detect(method: &MethodIr) -> BTreeSet<u32> {
    let constants = Solver::Worklist
        .solve(method.cfg(), &ConstantPropagation::new(method))
        .unwrap();
    let liveness = Solver::Iterative
        .solve(method.cfg(), &LiveVariables::new(method))
        .unwrap();
    find_dead_code(method, &constants, &liveness)
}

#[test]
fn constant_condition_kills_the_untaken_branch() {
    // x = 1; one = 1; c = (x == one); if (c) { y = 2; } else { y = 3; } return y;
    let vars = int_vars(&["x", "one", "c", "y"]);
    let (x, one, c, y) = (Var(0), Var(1), Var(2), Var(3));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, x, 1),
            assign_const(1, one, 1),
            binary(2, c, BinaryOp::Eq, x, one),
            if_goto(3, Expression::Var(c), 6),
            assign_const(4, y, 3),
            goto(5, 7),
            assign_const(6, y, 2),
            ret(7, Some(y)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::from([4, 5]));
}

#[test]
fn overwritten_assignment_is_dead() {
    // x = 1; x = 2; return x;
    let vars = int_vars(&["x"]);
    let x = Var(0);
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, x, 1),
            assign_const(1, x, 2),
            ret(2, Some(x)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::from([0]));
}

#[test]
fn side_effecting_dead_store_is_kept() {
    // x = p / q; x = 1; return x;  the division may trap, so it stays.
    let vars = int_vars(&["p", "q", "x"]);
    let (p, q, x) = (Var(0), Var(1), Var(2));
    let method = MethodIr::new(
        vars,
        vec![p, q],
        vec![
            binary(0, x, BinaryOp::Div, p, q),
            assign_const(1, x, 1),
            ret(2, Some(x)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::new());
}

#[test]
fn unused_call_result_is_not_a_dead_store() {
    // x = f(); x = 1; return x;  the call is observable.
    let vars = int_vars(&["x"]);
    let x = Var(0);
    let callee = method_ref("Lib", "f", "()I");
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            invoke(0, Some(x), DispatchKind::Static, callee, vec![]),
            assign_const(1, x, 1),
            ret(2, Some(x)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::new());
}

#[test]
fn constant_switch_key_collapses_to_one_case() {
    // x = 2; switch (x) { case 1: s1; case 2: s2; default: s3; }
    let vars = int_vars(&["x", "y"]);
    let (x, y) = (Var(0), Var(1));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, x, 2),
            switch(1, x, vec![(1, 2), (2, 4)], 6),
            assign_const(2, y, 1),
            goto(3, 7),
            assign_const(4, y, 2),
            goto(5, 7),
            assign_const(6, y, 3),
            ret(7, Some(y)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::from([2, 3, 6]));
}

#[test]
fn unmatched_constant_key_takes_the_default() {
    // x = 9; switch (x) { case 1: s1; default: s3; }
    let vars = int_vars(&["x", "y"]);
    let (x, y) = (Var(0), Var(1));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, x, 9),
            switch(1, x, vec![(1, 2)], 4),
            assign_const(2, y, 1),
            goto(3, 5),
            assign_const(4, y, 3),
            ret(5, Some(y)),
        ],
    );
    assert_eq!(detect(&method), BTreeSet::from([2, 3]));
}

#[test]
fn undefined_condition_prunes_everything_beyond_the_branch() {
    // a = 10; b = 0; c = a / b; if (c) { y = 1; } else { y = 2; } return y;
    let vars = int_vars(&["a", "b", "c", "y"]);
    let (a, b, c, y) = (Var(0), Var(1), Var(2), Var(3));
    let method = MethodIr::new(
        vars,
        vec![],
        vec![
            assign_const(0, a, 10),
            assign_const(1, b, 0),
            binary(2, c, BinaryOp::Div, a, b),
            if_goto(3, Expression::Var(c), 6),
            assign_const(4, y, 2),
            goto(5, 7),
            assign_const(6, y, 1),
            ret(7, Some(y)),
        ],
    );
    // The branch itself is reachable; nothing beyond it is.
    assert_eq!(detect(&method), BTreeSet::from([4, 5, 6, 7]));
}

#[test]
fn synthetic_statements_are_not_reported() {
    // Unreachable code without a line number stays out of the result.
    let vars = int_vars(&["x"]);
    let x = Var(0);
    let mut unreachable = assign_const(1, x, 1);
    unreachable.line = None;
    let method = MethodIr::new(
        vars,
        vec![],
        vec![ret(0, None), unreachable],
    );
    assert_eq!(detect(&method), BTreeSet::new());
}
