//! Helpers for assembling small IR programs in tests.
#![allow(dead_code)]

use latte::{
    ir::{
        DispatchKind, Expression, InvokeExpr, MethodIr, Stmt, StmtKind, Var, VarInfo,
        expression::BinaryOp,
    },
    lang::{Class, ClassAccessFlags, Method, MethodAccessFlags, references::*},
    types::{FieldType, MethodDescriptor, PrimitiveType},
};

pub fn int_type() -> FieldType {
    FieldType::Base(PrimitiveType::Int)
}

pub fn int_vars(names: &[&str]) -> Vec<VarInfo> {
    names
        .iter()
        .map(|name| VarInfo::new(*name, int_type()))
        .collect()
}

pub fn stmt(index: u32, kind: StmtKind) -> Stmt {
    Stmt {
        index,
        line: Some(index + 1),
        kind,
    }
}

pub fn assign(index: u32, lhs: Var, rhs: Expression) -> Stmt {
    stmt(index, StmtKind::Assign { lhs, rhs })
}

pub fn assign_const(index: u32, lhs: Var, literal: i32) -> Stmt {
    assign(index, lhs, Expression::IntLiteral(literal))
}

pub fn binary(index: u32, lhs: Var, op: BinaryOp, a: Var, b: Var) -> Stmt {
    assign(index, lhs, Expression::Binary { op, lhs: a, rhs: b })
}

pub fn if_goto(index: u32, condition: Expression, target: u32) -> Stmt {
    stmt(index, StmtKind::If { condition, target })
}

pub fn goto(index: u32, target: u32) -> Stmt {
    stmt(index, StmtKind::Goto { target })
}

pub fn switch(index: u32, key: Var, cases: Vec<(i32, u32)>, default: u32) -> Stmt {
    stmt(
        index,
        StmtKind::Switch {
            key,
            cases,
            default,
        },
    )
}

pub fn ret(index: u32, var: Option<Var>) -> Stmt {
    stmt(index, StmtKind::Return(var))
}

pub fn invoke(
    index: u32,
    result: Option<Var>,
    kind: DispatchKind,
    method: MethodRef,
    args: Vec<Var>,
) -> Stmt {
    stmt(
        index,
        StmtKind::Invoke {
            result,
            call: InvokeExpr {
                kind,
                method,
                receiver: None,
                args,
            },
        },
    )
}

pub fn method_ref(owner: &str, name: &str, descriptor: &str) -> MethodRef {
    MethodRef {
        owner: ClassRef::new(owner),
        name: name.to_owned(),
        descriptor: descriptor.parse().expect("invalid descriptor"),
    }
}

pub fn method(owner: &str, name: &str, descriptor: &str, body: Option<MethodIr>) -> Method {
    let flags = if body.is_some() {
        MethodAccessFlags::PUBLIC
    } else {
        MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT
    };
    method_with_flags(owner, name, descriptor, flags, body)
}

pub fn method_with_flags(
    owner: &str,
    name: &str,
    descriptor: &str,
    access_flags: MethodAccessFlags,
    body: Option<MethodIr>,
) -> Method {
    let descriptor: MethodDescriptor = descriptor.parse().expect("invalid descriptor");
    Method {
        access_flags,
        name: name.to_owned(),
        descriptor,
        owner: ClassRef::new(owner),
        body,
    }
}

pub fn class(name: &str, super_class: Option<&str>, methods: Vec<Method>) -> Class {
    class_with_flags(
        name,
        super_class,
        &[],
        ClassAccessFlags::PUBLIC,
        methods,
    )
}

pub fn class_with_flags(
    name: &str,
    super_class: Option<&str>,
    interfaces: &[&str],
    access_flags: ClassAccessFlags,
    methods: Vec<Method>,
) -> Class {
    Class {
        binary_name: name.to_owned(),
        access_flags,
        super_class: super_class.map(ClassRef::new),
        interfaces: interfaces.iter().map(|s| ClassRef::new(*s)).collect(),
        methods,
    }
}
