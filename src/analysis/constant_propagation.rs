//! Intraprocedural constant propagation over integer-typed locals.
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::ir::{BinaryOp, ControlFlowGraph, Expression, MethodIr, Node, StmtKind, Var};

use super::fixed_point::DataflowAnalysis;

/// A point of the three-point constant-propagation lattice.
///
/// The component ordering is `Undef ⊑ Const(c) ⊑ Nac`, with distinct
/// constants joined to [`Nac`](Value::Nac). The lattice has height 3, so
/// every ascending chain of facts terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Value {
    /// Bottom: no information about the variable yet.
    #[display("undef")]
    Undef,
    /// The variable holds exactly this integer.
    #[display("{_0}")]
    Const(i32),
    /// Top: the variable is not a constant.
    #[display("NAC")]
    Nac,
}

impl Value {
    /// Whether the value is the bottom element.
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    /// Whether the value is a known constant.
    #[must_use]
    pub const fn is_constant(self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Whether the value is the top element.
    #[must_use]
    pub const fn is_nac(self) -> bool {
        matches!(self, Self::Nac)
    }

    /// The constant held by the value, if it is one.
    #[must_use]
    pub const fn const_value(self) -> Option<i32> {
        match self {
            Self::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Joins two lattice points at a confluence.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Nac, _) | (_, Self::Nac) => Self::Nac,
            (Self::Undef, v) | (v, Self::Undef) => v,
            (Self::Const(a), Self::Const(b)) if a == b => Self::Const(a),
            _ => Self::Nac,
        }
    }
}

/// A mapping from variables to lattice [`Value`]s.
///
/// Absent keys denote [`Value::Undef`]; the map never materializes bottom
/// entries, which keeps the ascending-chain bound proportional to the set of
/// touched variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpFact(BTreeMap<Var, Value>);

impl CpFact {
    /// Creates the empty (all-`Undef`) fact.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of the given variable.
    #[must_use]
    pub fn get(&self, var: Var) -> Value {
        self.0.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Stores a value for the given variable, reporting whether the fact
    /// changed. Storing [`Value::Undef`] removes the entry.
    pub fn update(&mut self, var: Var, value: Value) -> bool {
        match value {
            Value::Undef => self.0.remove(&var).is_some(),
            _ => self.0.insert(var, value) != Some(value),
        }
    }

    /// Removes the entry for the given variable, returning its former value.
    pub fn remove(&mut self, var: Var) -> Value {
        self.0.remove(&var).unwrap_or(Value::Undef)
    }

    /// Meets every entry of `other` into `self`, reporting change.
    pub fn meet_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (var, value) in other.iter() {
            let met = self.get(var).meet(value);
            changed |= self.update(var, met);
        }
        changed
    }

    /// Returns an iterator over the present entries.
    pub fn iter(&self) -> impl Iterator<Item = (Var, Value)> + '_ {
        self.0.iter().map(|(var, value)| (*var, *value))
    }

    /// Whether no variable is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CpFact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.0
                .iter()
                .map(|(var, value)| format!("{var} -> {value}"))
                .join(", ")
        )
    }
}

/// Forward constant propagation over a single method.
#[derive(Debug)]
pub struct ConstantPropagation<'a> {
    method: &'a MethodIr,
}

impl<'a> ConstantPropagation<'a> {
    /// Creates the analysis for the given method body.
    #[must_use]
    pub fn new(method: &'a MethodIr) -> Self {
        Self { method }
    }
}

impl DataflowAnalysis for ConstantPropagation<'_> {
    type Fact = CpFact;

    fn is_forward(&self) -> bool {
        true
    }

    /// Callers are unknown intraprocedurally, so every int-like formal
    /// parameter enters as [`Value::Nac`].
    fn boundary_fact(&self, _cfg: &ControlFlowGraph) -> CpFact {
        let mut fact = CpFact::new();
        for &param in self.method.params() {
            if self.method.var_type(param).is_int_like() {
                fact.update(param, Value::Nac);
            }
        }
        fact
    }

    fn initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, src: &CpFact, dst: &mut CpFact) -> bool {
        dst.meet_with(src)
    }

    fn transfer(&self, node: Node, incoming: &CpFact, outgoing: &mut CpFact) -> bool {
        let mut new_out = incoming.clone();
        if let Node::Stmt(index) = node {
            let stmt = self.method.stmt(index);
            match &stmt.kind {
                StmtKind::Assign { lhs, rhs } if self.method.var_type(*lhs).is_int_like() => {
                    new_out.update(*lhs, evaluate(rhs, incoming, self.method));
                }
                StmtKind::Invoke {
                    result: Some(lhs), ..
                } if self.method.var_type(*lhs).is_int_like() => {
                    new_out.update(*lhs, Value::Nac);
                }
                _ => {}
            }
        }
        let changed = *outgoing != new_out;
        *outgoing = new_out;
        changed
    }
}

/// Resolves an expression to a lattice [`Value`] under the given fact.
///
/// Variables and literals are looked up directly. A binary operation over
/// constants is folded with two's-complement 32-bit semantics; a division
/// whose divisor is known to be zero produces [`Value::Undef`] (the
/// operation traps and defines no value), even under a [`Value::Nac`]
/// dividend. Every other expression form is opaque and yields
/// [`Value::Nac`].
#[must_use]
pub fn evaluate(exp: &Expression, fact: &CpFact, method: &MethodIr) -> Value {
    match exp {
        Expression::Var(var) => fact.get(*var),
        Expression::IntLiteral(literal) => Value::Const(*literal),
        Expression::Binary { op, lhs, rhs } => {
            if !method.var_type(*lhs).is_int_like() || !method.var_type(*rhs).is_int_like() {
                return Value::Undef;
            }
            let a = fact.get(*lhs);
            let b = fact.get(*rhs);
            if op.is_division() && b == Value::Const(0) {
                return Value::Undef;
            }
            if a.is_nac() || b.is_nac() {
                return Value::Nac;
            }
            match (a, b) {
                (Value::Const(a), Value::Const(b)) => Value::Const(fold(*op, a, b)),
                _ => Value::Undef,
            }
        }
        _ => Value::Nac,
    }
}

/// Folds a binary operation over two known constants.
///
/// The divisor is non-zero here; division by a known zero is filtered in
/// [`evaluate`]. Shift amounts are taken mod 32.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
const fn fold(op: BinaryOp, a: i32, b: i32) -> i32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::Ushr => ((a as u32).wrapping_shr(b as u32)) as i32,
        BinaryOp::Eq => (a == b) as i32,
        BinaryOp::Ne => (a != b) as i32,
        BinaryOp::Lt => (a < b) as i32,
        BinaryOp::Le => (a <= b) as i32,
        BinaryOp::Gt => (a > b) as i32,
        BinaryOp::Ge => (a >= b) as i32,
    }
}
