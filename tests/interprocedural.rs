//! Interprocedural constant propagation scenarios.
mod common;

use common::*;
use latte::{
    analysis::{
        AnalysisError,
        call_graph::CallGraph,
        constant_propagation::Value,
        interprocedural::{Icfg, IcfgNode, InterConstantPropagation},
    },
    ir::{BinaryOp, DispatchKind, MethodIr, Node, Var},
    lang::{ClassHierarchy, Program},
};

fn build_and_solve(
    program: &Program,
) -> Result<
    latte::analysis::fixed_point::DataflowResult<
        IcfgNode,
        latte::analysis::constant_propagation::CpFact,
    >,
    AnalysisError,
> {
    let hierarchy = ClassHierarchy::from_classes(program.classes());
    let call_graph = CallGraph::build(program, &hierarchy);
    let icfg = Icfg::build(program, &call_graph);
    InterConstantPropagation::new(program).solve(&icfg)
}

#[test]
fn constants_flow_through_identity_calls() {
    // main: five = 5; r = id(five); return;  id(p) { return p; }
    let id_body = {
        let p = Var(0);
        MethodIr::new(int_vars(&["p"]), vec![p], vec![ret(0, Some(p))])
    };
    let main_body = {
        let (five, r) = (Var(0), Var(1));
        MethodIr::new(
            int_vars(&["five", "r"]),
            vec![],
            vec![
                assign_const(0, five, 5),
                invoke(
                    1,
                    Some(r),
                    DispatchKind::Static,
                    method_ref("Id", "id", "(I)I"),
                    vec![five],
                ),
                ret(2, None),
            ],
        )
    };
    let program = Program::new(
        vec![
            class(
                "Main",
                None,
                vec![method("Main", "main", "()V", Some(main_body))],
            ),
            class("Id", None, vec![method("Id", "id", "(I)I", Some(id_body))]),
        ],
        vec![method_ref("Main", "main", "()V")],
    );
    let result = build_and_solve(&program).expect("analysis succeeds");

    let at_return = IcfgNode {
        method: method_ref("Main", "main", "()V"),
        node: Node::Stmt(2),
    };
    let fact = result.in_fact(&at_return).unwrap();
    assert_eq!(fact.get(Var(1)), Value::Const(5));
    assert_eq!(fact.get(Var(0)), Value::Const(5));

    // Inside the callee, the bound parameter is the constant argument.
    let callee_entry = IcfgNode {
        method: method_ref("Id", "id", "(I)I"),
        node: Node::Stmt(0),
    };
    assert_eq!(result.in_fact(&callee_entry).unwrap().get(Var(0)), Value::Const(5));
}

#[test]
fn joining_two_call_sites_loses_the_constant() {
    // main: a = id(1); b = id(2);  the callee parameter joins to NAC.
    let id_body = {
        let p = Var(0);
        MethodIr::new(int_vars(&["p"]), vec![p], vec![ret(0, Some(p))])
    };
    let main_body = {
        let (one, two, a, b) = (Var(0), Var(1), Var(2), Var(3));
        MethodIr::new(
            int_vars(&["one", "two", "a", "b"]),
            vec![],
            vec![
                assign_const(0, one, 1),
                assign_const(1, two, 2),
                invoke(
                    2,
                    Some(a),
                    DispatchKind::Static,
                    method_ref("Id", "id", "(I)I"),
                    vec![one],
                ),
                invoke(
                    3,
                    Some(b),
                    DispatchKind::Static,
                    method_ref("Id", "id", "(I)I"),
                    vec![two],
                ),
                ret(4, None),
            ],
        )
    };
    let program = Program::new(
        vec![
            class(
                "Main",
                None,
                vec![method("Main", "main", "()V", Some(main_body))],
            ),
            class("Id", None, vec![method("Id", "id", "(I)I", Some(id_body))]),
        ],
        vec![method_ref("Main", "main", "()V")],
    );
    let result = build_and_solve(&program).expect("analysis succeeds");

    // Context-insensitive: both call sites meet in the callee.
    let callee_entry = IcfgNode {
        method: method_ref("Id", "id", "(I)I"),
        node: Node::Stmt(0),
    };
    assert_eq!(result.in_fact(&callee_entry).unwrap().get(Var(0)), Value::Nac);

    let at_return = IcfgNode {
        method: method_ref("Main", "main", "()V"),
        node: Node::Stmt(4),
    };
    let fact = result.in_fact(&at_return).unwrap();
    assert_eq!(fact.get(Var(2)), Value::Nac);
    assert_eq!(fact.get(Var(3)), Value::Nac);
}

#[test]
fn callee_computation_returns_to_the_caller() {
    // main: r = double(21);  double(p) { d = p + p; return d; }
    let double_body = {
        let (p, d) = (Var(0), Var(1));
        MethodIr::new(
            int_vars(&["p", "d"]),
            vec![p],
            vec![binary(0, d, BinaryOp::Add, p, p), ret(1, Some(d))],
        )
    };
    let main_body = {
        let (arg, r) = (Var(0), Var(1));
        MethodIr::new(
            int_vars(&["arg", "r"]),
            vec![],
            vec![
                assign_const(0, arg, 21),
                invoke(
                    1,
                    Some(r),
                    DispatchKind::Static,
                    method_ref("Math", "double", "(I)I"),
                    vec![arg],
                ),
                ret(2, None),
            ],
        )
    };
    let program = Program::new(
        vec![
            class(
                "Main",
                None,
                vec![method("Main", "main", "()V", Some(main_body))],
            ),
            class(
                "Math",
                None,
                vec![method("Math", "double", "(I)I", Some(double_body))],
            ),
        ],
        vec![method_ref("Main", "main", "()V")],
    );
    let result = build_and_solve(&program).expect("analysis succeeds");

    let at_return = IcfgNode {
        method: method_ref("Main", "main", "()V"),
        node: Node::Stmt(2),
    };
    assert_eq!(result.in_fact(&at_return).unwrap().get(Var(1)), Value::Const(42));
}

#[test]
fn entry_parameters_are_unknown() {
    // Entry methods have no modeled callers, so their parameters are NAC.
    let main_body = {
        let (p, x) = (Var(0), Var(1));
        MethodIr::new(
            int_vars(&["p", "x"]),
            vec![p],
            vec![binary(0, x, BinaryOp::Add, p, p), ret(1, Some(x))],
        )
    };
    let program = Program::new(
        vec![class(
            "Main",
            None,
            vec![method("Main", "main", "(I)I", Some(main_body))],
        )],
        vec![method_ref("Main", "main", "(I)I")],
    );
    let result = build_and_solve(&program).expect("analysis succeeds");
    let at_first = IcfgNode {
        method: method_ref("Main", "main", "(I)I"),
        node: Node::Stmt(0),
    };
    assert_eq!(result.in_fact(&at_first).unwrap().get(Var(0)), Value::Nac);
}

#[test]
fn arity_mismatch_aborts_the_analysis() {
    // The call site passes no argument to a one-parameter callee.
    let id_body = {
        let p = Var(0);
        MethodIr::new(int_vars(&["p"]), vec![p], vec![ret(0, Some(p))])
    };
    let main_body = {
        let r = Var(0);
        MethodIr::new(
            int_vars(&["r"]),
            vec![],
            vec![
                invoke(
                    0,
                    Some(r),
                    DispatchKind::Static,
                    method_ref("Id", "id", "(I)I"),
                    vec![],
                ),
                ret(1, None),
            ],
        )
    };
    let program = Program::new(
        vec![
            class(
                "Main",
                None,
                vec![method("Main", "main", "()V", Some(main_body))],
            ),
            class("Id", None, vec![method("Id", "id", "(I)I", Some(id_body))]),
        ],
        vec![method_ref("Main", "main", "()V")],
    );
    let outcome = build_and_solve(&program);
    assert!(matches!(
        outcome,
        Err(AnalysisError::PreconditionViolated(_))
    ));
}
