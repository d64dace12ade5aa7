//! Statements of the three-address IR.
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::lang::references::MethodRef;

use super::{Expression, Var};

/// A single statement, carrying its dense index within the method and the
/// source line it was compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    /// The dense index of the statement within its method.
    pub index: u32,
    /// The source line number, absent for synthetic statements.
    pub line: Option<u32>,
    /// The statement form.
    pub kind: StmtKind,
}

/// The forms a statement can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    /// A no-op.
    Nop,
    /// Assigns `rhs` to `lhs`.
    Assign {
        /// The defined variable.
        lhs: Var,
        /// The computed expression.
        rhs: Expression,
    },
    /// Calls a method, optionally assigning the return value.
    Invoke {
        /// The variable receiving the return value, if any.
        result: Option<Var>,
        /// The call expression.
        call: InvokeExpr,
    },
    /// Branches to `target` if `condition` holds, falls through otherwise.
    If {
        /// The branch condition.
        condition: Expression,
        /// The statement index jumped to when the condition holds.
        target: u32,
    },
    /// Unconditionally jumps to `target`.
    Goto {
        /// The statement index jumped to.
        target: u32,
    },
    /// Jumps to the case whose label equals `key`, or to `default`.
    Switch {
        /// The scrutinized variable.
        key: Var,
        /// The `(label, target)` pairs of the cases.
        cases: Vec<(i32, u32)>,
        /// The default target.
        default: u32,
    },
    /// Returns from the method, with a value if it is [`Some`].
    Return(Option<Var>),
}

impl Stmt {
    /// The variable defined by the statement, if any.
    ///
    /// The IR is in three-address form; a statement defines at most one
    /// variable.
    #[must_use]
    pub const fn def(&self) -> Option<Var> {
        match self.kind {
            StmtKind::Assign { lhs, .. } => Some(lhs),
            StmtKind::Invoke { result, .. } => result,
            _ => None,
        }
    }

    /// The variables read by the statement.
    #[must_use]
    pub fn uses(&self) -> BTreeSet<Var> {
        match &self.kind {
            StmtKind::Nop | StmtKind::Goto { .. } | StmtKind::Return(None) => BTreeSet::new(),
            StmtKind::Assign { rhs, .. } => rhs.uses(),
            StmtKind::Invoke { call, .. } => call.uses(),
            StmtKind::If { condition, .. } => condition.uses(),
            StmtKind::Switch { key, .. } => BTreeSet::from([*key]),
            StmtKind::Return(Some(var)) => BTreeSet::from([*var]),
        }
    }

    /// Whether the statement is a call site.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.kind, StmtKind::Invoke { .. })
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StmtKind::Nop => write!(f, "nop"),
            StmtKind::Assign { lhs, rhs } => write!(f, "{lhs} = {rhs}"),
            StmtKind::Invoke {
                result: Some(result),
                call,
            } => write!(f, "{result} = {call}"),
            StmtKind::Invoke { result: None, call } => call.fmt(f),
            StmtKind::If { condition, target } => write!(f, "if {condition} goto #{target}"),
            StmtKind::Goto { target } => write!(f, "goto #{target}"),
            StmtKind::Switch {
                key,
                cases,
                default,
            } => write!(
                f,
                "switch {key} {{ {}, else => #{default} }}",
                cases
                    .iter()
                    .map(|(label, target)| format!("{label} => #{target}"))
                    .join(", ")
            ),
            StmtKind::Return(Some(var)) => write!(f, "return {var}"),
            StmtKind::Return(None) => write!(f, "return"),
        }
    }
}

/// A call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeExpr {
    /// The dispatch form of the call site.
    pub kind: DispatchKind,
    /// The method named at the call site.
    pub method: MethodRef,
    /// The receiver, absent for static calls.
    pub receiver: Option<Var>,
    /// The arguments, excluding the receiver.
    pub args: Vec<Var>,
}

impl InvokeExpr {
    /// The variables read by the call: the receiver and the arguments.
    #[must_use]
    pub fn uses(&self) -> BTreeSet<Var> {
        self.receiver.iter().chain(&self.args).copied().collect()
    }
}

impl Display for InvokeExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let args = self.args.iter().map(ToString::to_string).join(", ");
        match &self.receiver {
            Some(receiver) => write!(
                f,
                "{} {receiver}.{}({args})",
                self.kind, self.method.name
            ),
            None => write!(f, "{} {}({args})", self.kind, self.method),
        }
    }
}

/// The dispatch form of a call site, carried onto call-graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum DispatchKind {
    /// A static call.
    #[display("invokestatic")]
    Static,
    /// A constructor or private-method call.
    #[display("invokespecial")]
    Special,
    /// A virtual call dispatched on the receiver class.
    #[display("invokevirtual")]
    Virtual,
    /// An interface call dispatched on the receiver class.
    #[display("invokeinterface")]
    Interface,
    /// A dynamically-bound call; unresolvable by class-hierarchy analysis.
    #[display("invokedynamic")]
    Dynamic,
}
