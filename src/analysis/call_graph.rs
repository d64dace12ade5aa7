//! Call graphs and their construction via class hierarchy analysis.
use std::collections::{BTreeSet, HashSet, VecDeque};

use log::debug;

use crate::{
    ir::{DispatchKind, InvokeExpr, StmtKind},
    lang::{
        ClassHierarchy, Program,
        references::{ClassRef, MethodRef, Subsignature},
    },
};

/// A call site: an invoke statement within its enclosing method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display("{caller}#{stmt}")]
pub struct CallSite {
    /// The method containing the call site.
    pub caller: MethodRef,
    /// The index of the invoke statement.
    pub stmt: u32,
}

/// A resolved call edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display("{call_site} -[{kind}]-> {callee}")]
pub struct CallEdge {
    /// The dispatch form of the call site.
    pub kind: DispatchKind,
    /// The call site the edge originates from.
    pub call_site: CallSite,
    /// The resolved callee.
    pub callee: MethodRef,
}

/// A call graph over the methods reachable from the entry methods.
///
/// Distinct edges may share endpoints (different call sites or dispatch
/// kinds); re-analysis of an already reachable method is avoided by the
/// reachable-set check, not by edge uniqueness.
#[derive(Debug, Default)]
pub struct CallGraph {
    entries: Vec<MethodRef>,
    reachable: BTreeSet<MethodRef>,
    edges: BTreeSet<CallEdge>,
}

impl CallGraph {
    /// Builds the call graph of the program's entry methods with class
    /// hierarchy analysis.
    ///
    /// The builder runs a breadth-first worklist over the methods it
    /// discovers; every call site of a reachable method is resolved with
    /// [`resolve`], and every resolved callee becomes reachable in turn.
    #[must_use]
    pub fn build(program: &Program, hierarchy: &ClassHierarchy) -> Self {
        let mut graph = Self {
            entries: program.entries().to_vec(),
            ..Self::default()
        };
        let mut worklist: VecDeque<MethodRef> = program.entries().to_vec().into();
        while let Some(method_ref) = worklist.pop_front() {
            if !graph.reachable.insert(method_ref.clone()) {
                continue;
            }
            let Some(body) = program.method(&method_ref).and_then(|m| m.body.as_ref()) else {
                continue;
            };
            for stmt in body.stmts() {
                let StmtKind::Invoke { call, .. } = &stmt.kind else {
                    continue;
                };
                let call_site = CallSite {
                    caller: method_ref.clone(),
                    stmt: stmt.index,
                };
                for callee in resolve(call, program, hierarchy) {
                    worklist.push_back(callee.clone());
                    graph.edges.insert(CallEdge {
                        kind: call.kind,
                        call_site: call_site.clone(),
                        callee,
                    });
                }
            }
        }
        debug!(
            "call graph built: {} reachable methods, {} edges",
            graph.reachable.len(),
            graph.edges.len()
        );
        graph
    }

    /// The entry methods anchoring reachability.
    #[must_use]
    pub fn entry_methods(&self) -> &[MethodRef] {
        &self.entries
    }

    /// Whether the given method is reachable from an entry method.
    #[must_use]
    pub fn contains(&self, method: &MethodRef) -> bool {
        self.reachable.contains(method)
    }

    /// Returns an iterator over the reachable methods.
    pub fn reachable_methods(&self) -> impl Iterator<Item = &MethodRef> {
        self.reachable.iter()
    }

    /// Returns an iterator over the call edges.
    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter()
    }

    /// The callees resolved for the given call site.
    #[must_use]
    pub fn callees_of(&self, call_site: &CallSite) -> BTreeSet<&MethodRef> {
        self.edges
            .iter()
            .filter(|edge| &edge.call_site == call_site)
            .map(|edge| &edge.callee)
            .collect()
    }

    /// Returns an iterator over the edges originating in the given method.
    pub fn calls_from<'a>(
        &'a self,
        caller: &'a MethodRef,
    ) -> impl Iterator<Item = &'a CallEdge> {
        self.edges
            .iter()
            .filter(move |edge| &edge.call_site.caller == caller)
    }

    /// Returns an iterator over the edges targeting the given method.
    pub fn callers_of<'a>(
        &'a self,
        callee: &'a MethodRef,
    ) -> impl Iterator<Item = &'a CallEdge> {
        self.edges.iter().filter(move |edge| &edge.callee == callee)
    }
}

/// Resolves the possible callees of a call site.
///
/// Static calls bind to the declaration in the named class; special calls
/// dispatch from the declaring class; virtual and interface calls dispatch
/// at every class in the receiver cone. Unresolved targets are dropped: an
/// absent declaration, an all-abstract chain, or a dynamically-bound call
/// contributes no callee.
#[must_use]
pub fn resolve(
    call: &InvokeExpr,
    program: &Program,
    hierarchy: &ClassHierarchy,
) -> BTreeSet<MethodRef> {
    let subsignature = call.method.subsignature();
    let declared = &call.method.owner;
    match call.kind {
        DispatchKind::Static => program
            .class(declared)
            .and_then(|class| class.declared_method(&subsignature))
            .map(crate::lang::Method::make_ref)
            .into_iter()
            .collect(),
        DispatchKind::Special => dispatch(declared, &subsignature, program, hierarchy)
            .into_iter()
            .collect(),
        DispatchKind::Virtual | DispatchKind::Interface => {
            receiver_cone(declared, hierarchy)
                .iter()
                .filter_map(|class| dispatch(class, &subsignature, program, hierarchy))
                .collect()
        }
        DispatchKind::Dynamic => BTreeSet::new(),
    }
}

/// The classes a receiver declared as `root` may be an instance of.
///
/// For a class this is the class plus its transitive subclasses; for an
/// interface, its transitive subinterfaces plus every implementor and the
/// implementors' subclasses.
fn receiver_cone(root: &ClassRef, hierarchy: &ClassHierarchy) -> Vec<ClassRef> {
    if !hierarchy.is_interface(root) {
        return std::iter::once(root.clone())
            .chain(hierarchy.subclasses(root))
            .collect();
    }
    let mut seen = HashSet::from([root.clone()]);
    let mut queue = VecDeque::from([root.clone()]);
    let mut cone = Vec::new();
    while let Some(current) = queue.pop_front() {
        let expansion: Vec<ClassRef> = if hierarchy.is_interface(&current) {
            hierarchy
                .direct_subinterfaces(&current)
                .into_iter()
                .chain(hierarchy.direct_implementors(&current))
                .collect()
        } else {
            hierarchy.direct_subclasses(&current).into_iter().collect()
        };
        for next in expansion {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
        cone.push(current);
    }
    cone
}

/// Finds the method actually invoked when a receiver of class `class` is
/// dispatched on `subsignature`.
///
/// Walks from `class` up the superclass chain and returns the first
/// non-abstract declaration, or [`None`] when the chain is exhausted (or
/// leaves the loaded program).
#[must_use]
pub fn dispatch(
    class: &ClassRef,
    subsignature: &Subsignature,
    program: &Program,
    hierarchy: &ClassHierarchy,
) -> Option<MethodRef> {
    let mut current = Some(class.clone());
    while let Some(class_ref) = current {
        let class = program.class(&class_ref)?;
        if let Some(method) = class.declared_method(subsignature) {
            if !method.is_abstract() {
                return Some(method.make_ref());
            }
        }
        current = hierarchy.super_class(&class_ref).cloned();
    }
    None
}
