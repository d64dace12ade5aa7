//! The typed three-address IR consumed by the analyses.

pub mod control_flow;
pub mod expression;
mod petgraph;
pub mod statement;

pub use control_flow::{ControlFlowGraph, EdgeKind, Node};
pub use expression::{BinaryOp, Expression};
pub use statement::{DispatchKind, InvokeExpr, Stmt, StmtKind};

use std::{
    any::Any,
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use crate::{analysis::ids, types::field_type::FieldType};

/// A local variable of a method, identified by its dense per-method index.
///
/// The name and type of the variable live in the owning method's variable
/// table, see [`MethodIr::var_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("%{_0}")]
pub struct Var(pub u32);

/// The name and type of a local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    /// The source-level name of the variable.
    pub name: String,
    /// The declared type of the variable.
    pub ty: FieldType,
}

impl VarInfo {
    /// Creates a new variable entry.
    pub fn new<S: Into<String>>(name: S, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The IR of a single method body.
///
/// Owns the variable table and the statement list; the control-flow graph is
/// derived at construction time and also published in the result map under
/// [`ids::CFG`]. Statements are indexed densely, matching [`Var`] handles
/// and CFG nodes.
#[derive(Debug)]
pub struct MethodIr {
    vars: Vec<VarInfo>,
    params: Vec<Var>,
    stmts: Vec<Stmt>,
    cfg: Rc<ControlFlowGraph>,
    results: ResultMap,
}

impl MethodIr {
    /// Assembles a method body from its variable table, formal parameters,
    /// and statements.
    ///
    /// # Panics
    /// Panics if a parameter handle or a branch target is out of bounds.
    #[must_use]
    pub fn new(vars: Vec<VarInfo>, params: Vec<Var>, stmts: Vec<Stmt>) -> Self {
        assert!(
            params.iter().all(|p| (p.0 as usize) < vars.len()),
            "parameter out of bounds"
        );
        let cfg = Rc::new(ControlFlowGraph::of_statements(&stmts));
        let results = ResultMap::new();
        let shared: Rc<dyn Any> = cfg.clone();
        results.insert_shared(ids::CFG, shared);
        Self {
            vars,
            params,
            stmts,
            cfg,
            results,
        }
    }

    /// The variable table entry for the given variable.
    #[must_use]
    pub fn var_info(&self, var: Var) -> &VarInfo {
        &self.vars[var.0 as usize]
    }

    /// The declared type of the given variable.
    #[must_use]
    pub fn var_type(&self, var: Var) -> &FieldType {
        &self.var_info(var).ty
    }

    /// The formal parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Var] {
        &self.params
    }

    /// The statements of the method, in index order.
    #[must_use]
    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// The statement at the given index.
    #[must_use]
    pub fn stmt(&self, index: u32) -> &Stmt {
        &self.stmts[index as usize]
    }

    /// The control-flow graph of the method.
    #[must_use]
    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    /// The variables carried by the method's `return` statements.
    #[must_use]
    pub fn return_vars(&self) -> BTreeSet<Var> {
        self.stmts
            .iter()
            .filter_map(|stmt| match stmt.kind {
                StmtKind::Return(var) => var,
                _ => None,
            })
            .collect()
    }

    /// The analysis results published for this method, keyed by analysis id.
    #[must_use]
    pub fn results(&self) -> &ResultMap {
        &self.results
    }
}

/// Analysis results keyed by analysis id.
///
/// Results are written once by the owning analysis pass and consumed
/// read-only afterwards; the shared handles keep consumers decoupled from
/// the producing pass.
#[derive(Default)]
pub struct ResultMap {
    inner: RefCell<BTreeMap<String, Rc<dyn Any>>>,
}

impl ResultMap {
    /// Creates an empty result map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a result under the given analysis id, replacing any
    /// previous result with that id.
    pub fn insert<T: 'static>(&self, id: &str, result: T) {
        self.insert_shared(id, Rc::new(result));
    }

    /// Publishes an already-shared result under the given analysis id.
    pub fn insert_shared(&self, id: &str, result: Rc<dyn Any>) {
        self.inner.borrow_mut().insert(id.to_owned(), result);
    }

    /// Fetches the result published under the given analysis id.
    ///
    /// Returns [`None`] when no result with that id exists or when the
    /// stored result is of a different type.
    #[must_use]
    pub fn get<T: 'static>(&self, id: &str) -> Option<Rc<T>> {
        let result = self.inner.borrow().get(id).map(Rc::clone)?;
        result.downcast().ok()
    }

    /// Checks whether a result is published under the given analysis id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().contains_key(id)
    }
}

impl std::fmt::Debug for ResultMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.inner.borrow().keys()).finish()
    }
}
