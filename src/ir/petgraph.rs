//! Implementations for the traits in the `petgraph` crate.

use std::collections::BTreeSet;

use petgraph::visit::{Data, GraphBase, IntoNeighbors, VisitMap, Visitable};

use super::{ControlFlowGraph, EdgeKind, Node};

impl Data for ControlFlowGraph {
    type NodeWeight = ();
    type EdgeWeight = EdgeKind;
}

impl GraphBase for ControlFlowGraph {
    type NodeId = Node;
    type EdgeId = (Node, Node);
}

impl IntoNeighbors for &ControlFlowGraph {
    type Neighbors = <BTreeSet<Node> as IntoIterator>::IntoIter;

    fn neighbors(self, a: Self::NodeId) -> Self::Neighbors {
        self.successors(a)
            .map(|(dst, _)| dst)
            .collect::<BTreeSet<_>>()
            .into_iter()
    }
}

/// A visit map for the control flow graph.
pub type Visited = BTreeSet<Node>;

impl VisitMap<Node> for Visited {
    fn visit(&mut self, a: Node) -> bool {
        self.insert(a)
    }

    fn is_visited(&self, a: &Node) -> bool {
        self.contains(a)
    }

    fn unvisit(&mut self, a: Node) -> bool {
        self.remove(&a)
    }
}

impl Visitable for ControlFlowGraph {
    type Map = Visited;

    fn visit_map(&self) -> Self::Map {
        Visited::default()
    }

    fn reset_map(&self, map: &mut Self::Map) {
        map.clear();
    }
}
