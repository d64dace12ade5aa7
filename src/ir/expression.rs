//! Expressions appearing on the right-hand side of assignments.
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::{
    lang::references::{ClassRef, FieldRef},
    types::field_type::FieldType,
};

use super::{InvokeExpr, Var};

/// An expression in the IR.
///
/// The constant-propagation evaluator folds variables, literals, and binary
/// operations; every other form is opaque to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A reference to a local variable.
    Var(Var),
    /// An integer literal.
    IntLiteral(i32),
    /// A binary operation over two locals.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        lhs: Var,
        /// The right operand.
        rhs: Var,
    },
    /// A field load; `object` is absent for static fields.
    FieldLoad {
        /// The accessed field.
        field: FieldRef,
        /// The receiver object, absent for static fields.
        object: Option<Var>,
    },
    /// An array element load.
    ArrayLoad {
        /// The array.
        array: Var,
        /// The element index.
        index: Var,
    },
    /// A checked cast.
    Cast {
        /// The target type.
        target: FieldType,
        /// The operand.
        operand: Var,
    },
    /// An `instanceof` check.
    InstanceOf {
        /// The operand.
        operand: Var,
        /// The type checked against.
        check_type: ClassRef,
    },
    /// An object allocation.
    New(ClassRef),
    /// A call expression.
    Invoke(InvokeExpr),
}

impl Expression {
    /// The variables read by the expression.
    #[must_use]
    pub fn uses(&self) -> BTreeSet<Var> {
        match self {
            Self::Var(v) => BTreeSet::from([*v]),
            Self::IntLiteral(_) | Self::New(_) => BTreeSet::new(),
            Self::Binary { lhs, rhs, .. } => BTreeSet::from([*lhs, *rhs]),
            Self::FieldLoad { object, .. } => object.iter().copied().collect(),
            Self::ArrayLoad { array, index } => BTreeSet::from([*array, *index]),
            Self::Cast { operand, .. } | Self::InstanceOf { operand, .. } => {
                BTreeSet::from([*operand])
            }
            Self::Invoke(call) => call.uses(),
        }
    }

    /// Whether evaluating the expression has an observable effect, so that
    /// an assignment computing it must not be eliminated.
    ///
    /// Allocation and calls are observable; casts, field accesses, array
    /// accesses, and division (`/`, `%`) may throw.
    #[must_use]
    pub const fn has_side_effect(&self) -> bool {
        match self {
            Self::New(_)
            | Self::Cast { .. }
            | Self::FieldLoad { .. }
            | Self::ArrayLoad { .. }
            | Self::Invoke(_) => true,
            Self::Binary { op, .. } => op.is_division(),
            Self::Var(_) | Self::IntLiteral(_) | Self::InstanceOf { .. } => false,
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var(v) => v.fmt(f),
            Self::IntLiteral(i) => i.fmt(f),
            Self::Binary { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Self::FieldLoad {
                field,
                object: Some(object),
            } => write!(f, "{object}.{}", field.name),
            Self::FieldLoad {
                field,
                object: None,
            } => field.fmt(f),
            Self::ArrayLoad { array, index } => write!(f, "{array}[{index}]"),
            Self::Cast { target, operand } => write!(f, "({target}) {operand}"),
            Self::InstanceOf {
                operand,
                check_type,
            } => write!(f, "{operand} instanceof {check_type}"),
            Self::New(class) => write!(f, "new {class}"),
            Self::Invoke(call) => call.fmt(f),
        }
    }
}

/// A binary operator over 32-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinaryOp {
    /// Addition, wrapping on overflow.
    Add,
    /// Subtraction, wrapping on overflow.
    Sub,
    /// Multiplication, wrapping on overflow.
    Mul,
    /// Division, truncating toward zero.
    Div,
    /// Remainder of truncating division.
    Rem,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Left shift; the shift amount is taken mod 32.
    Shl,
    /// Arithmetic right shift; the shift amount is taken mod 32.
    Shr,
    /// Logical right shift; the shift amount is taken mod 32.
    Ushr,
    /// Equality comparison, producing 0 or 1.
    Eq,
    /// Inequality comparison, producing 0 or 1.
    Ne,
    /// Less-than comparison, producing 0 or 1.
    Lt,
    /// Less-or-equal comparison, producing 0 or 1.
    Le,
    /// Greater-than comparison, producing 0 or 1.
    Gt,
    /// Greater-or-equal comparison, producing 0 or 1.
    Ge,
}

impl BinaryOp {
    /// Whether the operator is `/` or `%`, which trap on a zero divisor.
    #[must_use]
    pub const fn is_division(self) -> bool {
        matches!(self, Self::Div | Self::Rem)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Ushr => ">>>",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        f.write_str(symbol)
    }
}
