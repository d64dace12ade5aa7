//! Class hierarchy graph implementations.
use std::collections::HashSet;

use petgraph::visit::{GraphBase, GraphRef, IntoNeighbors, Visitable};

use super::{hierarchy::ClassHierarchy, references::ClassRef};

impl<'a> GraphBase for &'a ClassHierarchy {
    type EdgeId = (&'a ClassRef, &'a ClassRef);

    type NodeId = &'a ClassRef;
}

impl GraphRef for &ClassHierarchy {}

impl<'a> IntoNeighbors for &'a ClassHierarchy {
    type Neighbors = <HashSet<&'a ClassRef> as IntoIterator>::IntoIter;

    fn neighbors(self, a: Self::NodeId) -> Self::Neighbors {
        self.subclasses
            .get(a)
            .into_iter()
            .flatten()
            .collect::<HashSet<_>>()
            .into_iter()
    }
}

/// A visit map for the class hierarchy.
pub type Visited<'a> = HashSet<&'a ClassRef>;

impl<'a> Visitable for &'a ClassHierarchy {
    type Map = Visited<'a>;

    fn visit_map(&self) -> Self::Map {
        HashSet::default()
    }

    fn reset_map(&self, map: &mut Self::Map) {
        map.clear();
    }
}
