//! Backward live-variable analysis.
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::ir::{ControlFlowGraph, MethodIr, Node, Var};

use super::fixed_point::DataflowAnalysis;

/// An unordered set used as a dataflow fact; the meet is set union.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetFact<T: Ord>(BTreeSet<T>);

impl<T: Ord + Clone> SetFact<T> {
    /// Creates an empty set fact.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.0.contains(element)
    }

    /// Adds an element, reporting whether the set changed.
    pub fn insert(&mut self, element: T) -> bool {
        self.0.insert(element)
    }

    /// Removes an element, reporting whether the set changed.
    pub fn remove(&mut self, element: &T) -> bool {
        self.0.remove(element)
    }

    /// Unions `other` into `self`, reporting whether the set changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.0.len();
        self.0.extend(other.0.iter().cloned());
        self.0.len() != before
    }

    /// The elements of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Ord> FromIterator<T> for SetFact<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Ord + Display> Display for SetFact<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

/// Backward may-analysis computing the variables live at each point.
///
/// A variable is live when some path to the exit reads it before writing
/// it: `in(s) = use(s) ∪ (out(s) ∖ def(s))`.
#[derive(Debug)]
pub struct LiveVariables<'a> {
    method: &'a MethodIr,
}

impl<'a> LiveVariables<'a> {
    /// Creates the analysis for the given method body.
    #[must_use]
    pub fn new(method: &'a MethodIr) -> Self {
        Self { method }
    }
}

impl DataflowAnalysis for LiveVariables<'_> {
    type Fact = SetFact<Var>;

    fn is_forward(&self) -> bool {
        false
    }

    fn boundary_fact(&self, _cfg: &ControlFlowGraph) -> SetFact<Var> {
        SetFact::new()
    }

    fn initial_fact(&self) -> SetFact<Var> {
        SetFact::new()
    }

    fn meet_into(&self, src: &SetFact<Var>, dst: &mut SetFact<Var>) -> bool {
        dst.union_with(src)
    }

    fn transfer(&self, node: Node, incoming: &SetFact<Var>, outgoing: &mut SetFact<Var>) -> bool {
        let mut live_before = incoming.clone();
        if let Node::Stmt(index) = node {
            let stmt = self.method.stmt(index);
            if let Some(def) = stmt.def() {
                live_before.remove(&def);
            }
            for used in stmt.uses() {
                live_before.insert(used);
            }
        }
        let changed = *outgoing != live_before;
        *outgoing = live_before;
        changed
    }
}
