//! Interprocedural constant propagation over an interprocedural CFG.
//!
//! The ICFG is the union of every reachable method's control-flow graph
//! plus call, return, and call-to-return edges derived from the call graph.
//! Facts flow through edge transfer functions dispatched on the edge kind;
//! the node transfer of a call site is the identity, deferring the kill of
//! its left-hand side to the call-to-return edge so the callee's return
//! value can flow back in through the return edge.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::debug;

use crate::{
    ir::{InvokeExpr, MethodIr, Node, StmtKind, Var},
    lang::{Program, references::MethodRef},
};

use super::{
    AnalysisError,
    call_graph::{CallGraph, CallSite},
    constant_propagation::{ConstantPropagation, CpFact, Value},
    fixed_point::{DataflowAnalysis, DataflowResult},
};

/// A node of the interprocedural control-flow graph: a CFG node qualified
/// by its enclosing method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display("{method}:{node}")]
pub struct IcfgNode {
    /// The enclosing method.
    pub method: MethodRef,
    /// The intraprocedural CFG node.
    pub node: Node,
}

/// An edge of the interprocedural control-flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcfgEdge {
    /// An intraprocedural edge not originating at a call site.
    Normal {
        /// The edge source.
        source: IcfgNode,
        /// The edge target.
        target: IcfgNode,
    },
    /// The intraprocedural edge from a call site to its return site.
    CallToReturn {
        /// The call site.
        source: IcfgNode,
        /// The return site within the same method.
        target: IcfgNode,
    },
    /// An edge from a call site to a callee's entry node.
    Call {
        /// The call site.
        source: IcfgNode,
        /// The callee's entry node.
        target: IcfgNode,
        /// The callee.
        callee: MethodRef,
    },
    /// An edge from a callee's exit node back to a return site.
    Return {
        /// The callee's exit node.
        source: IcfgNode,
        /// The return site in the caller.
        target: IcfgNode,
        /// The call site the edge returns to.
        call_site: IcfgNode,
        /// The variables carried by the callee's `return` statements.
        return_vars: Vec<Var>,
    },
}

impl IcfgEdge {
    /// The source node of the edge.
    #[must_use]
    pub const fn source(&self) -> &IcfgNode {
        match self {
            Self::Normal { source, .. }
            | Self::CallToReturn { source, .. }
            | Self::Call { source, .. }
            | Self::Return { source, .. } => source,
        }
    }

    /// The target node of the edge.
    #[must_use]
    pub const fn target(&self) -> &IcfgNode {
        match self {
            Self::Normal { target, .. }
            | Self::CallToReturn { target, .. }
            | Self::Call { target, .. }
            | Self::Return { target, .. } => target,
        }
    }
}

/// The interprocedural control-flow graph of the reachable methods.
#[derive(Debug, Default)]
pub struct Icfg {
    out_edges: BTreeMap<IcfgNode, Vec<IcfgEdge>>,
    in_edges: BTreeMap<IcfgNode, Vec<IcfgEdge>>,
    entry_nodes: Vec<IcfgNode>,
}

impl Icfg {
    /// Materializes the ICFG from the call graph and the reachable methods'
    /// CFGs.
    ///
    /// Call edges to callees without a body are dropped, like any other
    /// unresolved target.
    #[must_use]
    pub fn build(program: &Program, call_graph: &CallGraph) -> Self {
        let mut icfg = Self::default();
        for method_ref in call_graph.reachable_methods() {
            let Some(body) = program.method(method_ref).and_then(|m| m.body.as_ref()) else {
                continue;
            };
            let cfg = body.cfg();
            for (src, dst, _) in cfg.edges() {
                let source = IcfgNode {
                    method: method_ref.clone(),
                    node: src,
                };
                let target = IcfgNode {
                    method: method_ref.clone(),
                    node: dst,
                };
                let from_call = matches!(src, Node::Stmt(i) if body.stmt(i).is_call());
                let edge = if from_call {
                    IcfgEdge::CallToReturn { source, target }
                } else {
                    IcfgEdge::Normal { source, target }
                };
                icfg.add_edge(edge);
            }
            for stmt in body.stmts() {
                if !stmt.is_call() {
                    continue;
                }
                let call_site = CallSite {
                    caller: method_ref.clone(),
                    stmt: stmt.index,
                };
                let source = IcfgNode {
                    method: method_ref.clone(),
                    node: Node::Stmt(stmt.index),
                };
                for callee in call_graph.callees_of(&call_site) {
                    let Some(callee_body) =
                        program.method(callee).and_then(|m| m.body.as_ref())
                    else {
                        continue;
                    };
                    icfg.add_edge(IcfgEdge::Call {
                        source: source.clone(),
                        target: IcfgNode {
                            method: callee.clone(),
                            node: Node::Entry,
                        },
                        callee: callee.clone(),
                    });
                    let return_vars: Vec<Var> = callee_body.return_vars().into_iter().collect();
                    for (return_site, _) in cfg.successors(Node::Stmt(stmt.index)) {
                        icfg.add_edge(IcfgEdge::Return {
                            source: IcfgNode {
                                method: callee.clone(),
                                node: Node::Exit,
                            },
                            target: IcfgNode {
                                method: method_ref.clone(),
                                node: return_site,
                            },
                            call_site: source.clone(),
                            return_vars: return_vars.clone(),
                        });
                    }
                }
            }
        }
        for entry in call_graph.entry_methods() {
            if program.method(entry).is_some_and(|m| m.body.is_some()) {
                icfg.entry_nodes.push(IcfgNode {
                    method: entry.clone(),
                    node: Node::Entry,
                });
            }
        }
        icfg
    }

    fn add_edge(&mut self, edge: IcfgEdge) {
        let source = edge.source().clone();
        let target = edge.target().clone();
        self.out_edges.entry(target.clone()).or_default();
        self.in_edges.entry(source.clone()).or_default();
        self.in_edges.entry(target).or_default().push(edge.clone());
        self.out_edges.entry(source).or_default().push(edge);
    }

    /// Returns an iterator over the nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &IcfgNode> {
        self.out_edges.keys()
    }

    /// The edges leaving the given node.
    #[must_use]
    pub fn out_edges(&self, node: &IcfgNode) -> &[IcfgEdge] {
        self.out_edges.get(node).map_or(&[], Vec::as_slice)
    }

    /// The edges entering the given node.
    #[must_use]
    pub fn in_edges(&self, node: &IcfgNode) -> &[IcfgEdge] {
        self.in_edges.get(node).map_or(&[], Vec::as_slice)
    }

    /// The entry nodes of the entry methods.
    #[must_use]
    pub fn entry_nodes(&self) -> &[IcfgNode] {
        &self.entry_nodes
    }
}

/// Constant propagation lifted across call edges.
#[derive(Debug)]
pub struct InterConstantPropagation<'a> {
    program: &'a Program,
}

impl<'a> InterConstantPropagation<'a> {
    /// Creates the analysis for the given program.
    #[must_use]
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    fn body(&self, method: &MethodRef) -> Option<&'a MethodIr> {
        self.program.method(method).and_then(|m| m.body.as_ref())
    }

    /// The invoke expression and optional result variable at a call node.
    fn call_at(&self, node: &IcfgNode) -> Option<(&'a InvokeExpr, Option<Var>)> {
        let body = self.body(&node.method)?;
        let Node::Stmt(index) = node.node else {
            return None;
        };
        match &body.stmt(index).kind {
            StmtKind::Invoke { result, call } => Some((call, *result)),
            _ => None,
        }
    }

    /// The boundary fact of an entry method: every int-like formal
    /// parameter is pinned to [`Value::Nac`].
    #[must_use]
    pub fn boundary_fact(&self, method: &MethodRef) -> CpFact {
        self.body(method).map_or_else(CpFact::new, |body| {
            ConstantPropagation::new(body).boundary_fact(body.cfg())
        })
    }

    /// Applies the node transfer function.
    ///
    /// Call nodes only propagate: the kill of their left-hand side is
    /// deferred to the call-to-return edge. Every other node delegates to
    /// the intraprocedural transfer.
    pub fn transfer_node(
        &self,
        node: &IcfgNode,
        incoming: &CpFact,
        outgoing: &mut CpFact,
    ) -> bool {
        let Some(body) = self.body(&node.method) else {
            return false;
        };
        if self.call_at(node).is_some() {
            return outgoing.meet_with(incoming);
        }
        ConstantPropagation::new(body).transfer(node.node, incoming, outgoing)
    }

    /// Applies the edge transfer function to the fact leaving the edge's
    /// source, producing the fact that flows into the edge's target.
    ///
    /// # Errors
    /// [`AnalysisError::PreconditionViolated`] if the argument count at a
    /// call edge does not match the callee's parameter count.
    pub fn transfer_edge(
        &self,
        edge: &IcfgEdge,
        source_out: &CpFact,
    ) -> Result<CpFact, AnalysisError> {
        match edge {
            IcfgEdge::Normal { .. } => Ok(source_out.clone()),
            IcfgEdge::CallToReturn { source, .. } => {
                let mut fact = source_out.clone();
                if let Some((_, Some(result))) = self.call_at(source) {
                    fact.remove(result);
                }
                Ok(fact)
            }
            IcfgEdge::Call { source, callee, .. } => {
                let Some((call, _)) = self.call_at(source) else {
                    return Ok(CpFact::new());
                };
                let Some(callee_body) = self.body(callee) else {
                    return Ok(CpFact::new());
                };
                let params = callee_body.params();
                if call.args.len() != params.len() {
                    return Err(AnalysisError::PreconditionViolated(format!(
                        "call to {callee} passes {} arguments for {} parameters",
                        call.args.len(),
                        params.len(),
                    )));
                }
                let mut fact = CpFact::new();
                for (&param, &arg) in params.iter().zip(&call.args) {
                    fact.update(param, source_out.get(arg));
                }
                Ok(fact)
            }
            IcfgEdge::Return {
                call_site,
                return_vars,
                ..
            } => {
                let mut fact = CpFact::new();
                if let Some((_, Some(result))) = self.call_at(call_site) {
                    let value = return_vars
                        .iter()
                        .fold(Value::Undef, |acc, &ret| acc.meet(source_out.get(ret)));
                    fact.update(result, value);
                }
                Ok(fact)
            }
        }
    }

    /// Runs the worklist solver over the ICFG until no IN fact changes.
    ///
    /// Each step meets the incoming edges' transferred facts into the
    /// node's IN, applies the node transfer, and re-enqueues the out-edge
    /// targets when the OUT changed.
    ///
    /// # Errors
    /// Propagates the first edge-transfer error; no partial result is
    /// produced.
    pub fn solve(&self, icfg: &Icfg) -> Result<DataflowResult<IcfgNode, CpFact>, AnalysisError> {
        let mut result = DataflowResult::new();
        for node in icfg.nodes() {
            result.ins.insert(node.clone(), CpFact::new());
            result.outs.insert(node.clone(), CpFact::new());
        }
        for entry in icfg.entry_nodes() {
            result
                .ins
                .insert(entry.clone(), self.boundary_fact(&entry.method));
        }

        let mut worklist: VecDeque<IcfgNode> = icfg.nodes().cloned().collect();
        let mut queued: BTreeSet<IcfgNode> = worklist.iter().cloned().collect();
        let mut steps = 0_usize;
        while let Some(node) = worklist.pop_front() {
            queued.remove(&node);
            steps += 1;
            let mut incoming = result.ins.remove(&node).unwrap_or_default();
            for edge in icfg.in_edges(&node) {
                if let Some(source_out) = result.outs.get(edge.source()) {
                    let edge_fact = self.transfer_edge(edge, source_out)?;
                    incoming.meet_with(&edge_fact);
                }
            }
            let mut outgoing = result.outs.remove(&node).unwrap_or_default();
            let changed = self.transfer_node(&node, &incoming, &mut outgoing);
            result.ins.insert(node.clone(), incoming);
            result.outs.insert(node.clone(), outgoing);
            if changed {
                for edge in icfg.out_edges(&node) {
                    let target = edge.target();
                    if queued.insert(target.clone()) {
                        worklist.push_back(target.clone());
                    }
                }
            }
        }
        debug!("interprocedural worklist converged after {steps} node visits");
        Ok(result)
    }
}
