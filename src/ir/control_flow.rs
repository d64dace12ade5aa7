//! Control flow graphs over statement-indexed nodes.
use std::collections::{BTreeMap, BTreeSet};

use super::{Stmt, StmtKind};

/// A node of a method's control-flow graph.
///
/// `Entry` and `Exit` are synthetic boundary nodes; every other node wraps
/// the index of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Node {
    /// The synthetic entry node.
    #[display("entry")]
    Entry,
    /// The node of the statement with the given index.
    #[display("#{_0}")]
    Stmt(u32),
    /// The synthetic exit node.
    #[display("exit")]
    Exit,
}

/// The kind of a control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// Fall-through or unconditional transfer.
    Normal,
    /// The branch taken when an `if` condition holds.
    IfTrue,
    /// The branch taken when an `if` condition does not hold.
    IfFalse,
    /// The branch taken when a `switch` key equals the label.
    SwitchCase(i32),
    /// The branch taken when no `switch` case matches.
    SwitchDefault,
}

/// A directed control-flow graph with kind-tagged edges.
///
/// Parallel edges between the same pair of nodes are permitted as long as
/// their kinds differ (e.g. both branches of an `if` reaching the same
/// statement).
#[derive(Debug, Clone, Default)]
pub struct ControlFlowGraph {
    succs: BTreeMap<Node, BTreeSet<(Node, EdgeKind)>>,
    preds: BTreeMap<Node, BTreeSet<Node>>,
}

impl ControlFlowGraph {
    /// Returns the entry node of the control-flow graph.
    #[must_use]
    pub const fn entry_point(&self) -> Node {
        Node::Entry
    }

    /// Returns the exit node of the control-flow graph.
    #[must_use]
    pub const fn exit_point(&self) -> Node {
        Node::Exit
    }

    /// Constructs a control-flow graph from a set of edges.
    ///
    /// # Panics
    /// Panics if there are duplicate edges.
    pub fn from_edges(edges: impl IntoIterator<Item = (Node, Node, EdgeKind)>) -> Self {
        let mut graph = Self::default();
        graph.succs.entry(Node::Entry).or_default();
        graph.succs.entry(Node::Exit).or_default();
        for (src, dst, kind) in edges {
            let inserted = graph.succs.entry(src).or_default().insert((dst, kind));
            assert!(inserted, "Duplicate edge");
            graph.succs.entry(dst).or_default();
            graph.preds.entry(dst).or_default().insert(src);
        }
        graph
    }

    /// Derives the control-flow graph of a statement list.
    ///
    /// Statements flow into their index successor unless they branch;
    /// `return` statements and the final fall-through connect to the exit
    /// node.
    ///
    /// # Panics
    /// Panics if a branch target is out of bounds.
    #[must_use]
    pub fn of_statements(stmts: &[Stmt]) -> Self {
        let len = u32::try_from(stmts.len()).expect("statement index overflow");
        let target_node = |target: u32| {
            assert!(target < len, "branch target out of bounds");
            Node::Stmt(target)
        };
        let mut edges = Vec::new();
        let first = if stmts.is_empty() {
            Node::Exit
        } else {
            Node::Stmt(0)
        };
        edges.push((Node::Entry, first, EdgeKind::Normal));
        for (i, stmt) in stmts.iter().enumerate() {
            let index = i as u32;
            let node = Node::Stmt(index);
            let fall_through = if index + 1 < len {
                Node::Stmt(index + 1)
            } else {
                Node::Exit
            };
            match &stmt.kind {
                StmtKind::Nop | StmtKind::Assign { .. } | StmtKind::Invoke { .. } => {
                    edges.push((node, fall_through, EdgeKind::Normal));
                }
                StmtKind::Goto { target } => {
                    edges.push((node, target_node(*target), EdgeKind::Normal));
                }
                StmtKind::If { target, .. } => {
                    edges.push((node, target_node(*target), EdgeKind::IfTrue));
                    edges.push((node, fall_through, EdgeKind::IfFalse));
                }
                StmtKind::Switch {
                    cases, default, ..
                } => {
                    for (label, target) in cases {
                        edges.push((node, target_node(*target), EdgeKind::SwitchCase(*label)));
                    }
                    edges.push((node, target_node(*default), EdgeKind::SwitchDefault));
                }
                StmtKind::Return(_) => {
                    edges.push((node, Node::Exit, EdgeKind::Normal));
                }
            }
        }
        Self::from_edges(edges)
    }

    /// Returns an iterator over the nodes.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.succs.keys().copied()
    }

    /// Returns an iterator over the edges.
    pub fn edges(&self) -> impl Iterator<Item = (Node, Node, EdgeKind)> + '_ {
        self.succs.iter().flat_map(|(src, outgoing)| {
            outgoing.iter().map(|(dst, kind)| (*src, *dst, *kind))
        })
    }

    /// Returns an iterator over the out-edges of the given node.
    pub fn successors(&self, node: Node) -> impl Iterator<Item = (Node, EdgeKind)> + '_ {
        self.succs.get(&node).into_iter().flatten().copied()
    }

    /// Returns an iterator over the predecessors of the given node.
    pub fn predecessors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.preds.get(&node).into_iter().flatten().copied()
    }

    /// Checks whether the graph contains the given node.
    #[must_use]
    pub fn contains(&self, node: Node) -> bool {
        self.succs.contains_key(&node)
    }
}
