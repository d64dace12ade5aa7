//! Generic fixed-point dataflow solvers.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::debug;

use crate::ir::{ControlFlowGraph, Node};

use super::AnalysisError;

/// The capabilities a dataflow analysis exposes to the solvers.
///
/// The solver never inspects facts; it only creates, meets, and transfers
/// them through these five operations. Termination relies on the analysis
/// being monotone over a finite-height lattice.
pub trait DataflowAnalysis {
    /// The fact attached to each CFG node.
    type Fact: Clone + PartialEq;

    /// Whether the analysis propagates facts along the direction of control
    /// flow.
    fn is_forward(&self) -> bool;

    /// The fact injected at the boundary node: the entry for a forward
    /// analysis, the exit for a backward one.
    fn boundary_fact(&self, cfg: &ControlFlowGraph) -> Self::Fact;

    /// The fact every non-boundary node starts from.
    fn initial_fact(&self) -> Self::Fact;

    /// Meets `src` into `dst`, returning whether `dst` changed.
    fn meet_into(&self, src: &Self::Fact, dst: &mut Self::Fact) -> bool;

    /// Applies the node's transfer function.
    ///
    /// `incoming` is the fact flowing into the node in analysis direction
    /// (IN for a forward analysis, OUT for a backward one); `outgoing` is the
    /// produced fact. Returns whether `outgoing` changed.
    fn transfer(&self, node: Node, incoming: &Self::Fact, outgoing: &mut Self::Fact) -> bool;
}

/// The IN and OUT fact per CFG node at the fixed point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataflowResult<N, F> {
    pub(crate) ins: BTreeMap<N, F>,
    pub(crate) outs: BTreeMap<N, F>,
}

impl<N: Ord, F> DataflowResult<N, F> {
    pub(crate) fn new() -> Self {
        Self {
            ins: BTreeMap::new(),
            outs: BTreeMap::new(),
        }
    }

    /// The fact flowing into the given node.
    #[must_use]
    pub fn in_fact(&self, node: &N) -> Option<&F> {
        self.ins.get(node)
    }

    /// The fact flowing out of the given node.
    #[must_use]
    pub fn out_fact(&self, node: &N) -> Option<&F> {
        self.outs.get(node)
    }

    /// Returns an iterator over the per-node IN facts.
    pub fn in_facts(&self) -> impl Iterator<Item = (&N, &F)> {
        self.ins.iter()
    }

    /// Returns an iterator over the per-node OUT facts.
    pub fn out_facts(&self) -> impl Iterator<Item = (&N, &F)> {
        self.outs.iter()
    }
}

/// A fixed-point solution strategy.
///
/// Both strategies reach the same fixed point; they differ in how nodes are
/// revisited. The iterative strategy sweeps all nodes until a full pass
/// changes nothing and is implemented for backward analyses only; the
/// worklist strategy revisits exactly the nodes whose inputs changed and
/// supports both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Round-robin sweeps until stabilization; backward only.
    Iterative,
    /// FIFO worklist with membership deduplication.
    Worklist,
}

impl Solver {
    /// Solves the analysis over the given control-flow graph.
    ///
    /// # Errors
    /// [`AnalysisError::UnsupportedStrategy`] if the strategy does not
    /// implement the analysis direction. The check happens before any fact
    /// is allocated.
    pub fn solve<A: DataflowAnalysis>(
        self,
        cfg: &ControlFlowGraph,
        analysis: &A,
    ) -> Result<DataflowResult<Node, A::Fact>, AnalysisError> {
        match (self, analysis.is_forward()) {
            (Self::Iterative, true) => Err(AnalysisError::UnsupportedStrategy {
                strategy: "iterative",
                direction: "forward",
            }),
            (Self::Iterative, false) => Ok(iterate_backward(cfg, analysis)),
            (Self::Worklist, true) => Ok(worklist_forward(cfg, analysis)),
            (Self::Worklist, false) => Ok(worklist_backward(cfg, analysis)),
        }
    }
}

fn worklist_forward<A: DataflowAnalysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
) -> DataflowResult<Node, A::Fact> {
    let entry = cfg.entry_point();
    let mut result = DataflowResult::new();
    for node in cfg.nodes() {
        let (in_fact, out_fact) = if node == entry {
            (analysis.boundary_fact(cfg), analysis.boundary_fact(cfg))
        } else {
            (analysis.initial_fact(), analysis.initial_fact())
        };
        result.ins.insert(node, in_fact);
        result.outs.insert(node, out_fact);
    }

    let mut worklist: VecDeque<Node> = cfg.nodes().filter(|n| *n != entry).collect();
    let mut queued: BTreeSet<Node> = worklist.iter().copied().collect();
    let mut steps = 0_usize;
    while let Some(node) = worklist.pop_front() {
        queued.remove(&node);
        steps += 1;
        let mut incoming = analysis.initial_fact();
        for pred in cfg.predecessors(node) {
            if let Some(out) = result.outs.get(&pred) {
                analysis.meet_into(out, &mut incoming);
            }
        }
        let mut outgoing = result
            .outs
            .remove(&node)
            .unwrap_or_else(|| analysis.initial_fact());
        let changed = analysis.transfer(node, &incoming, &mut outgoing);
        result.ins.insert(node, incoming);
        result.outs.insert(node, outgoing);
        if changed {
            for (succ, _) in cfg.successors(node) {
                if succ != entry && queued.insert(succ) {
                    worklist.push_back(succ);
                }
            }
        }
    }
    debug!("forward worklist converged after {steps} node visits");
    result
}

fn worklist_backward<A: DataflowAnalysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
) -> DataflowResult<Node, A::Fact> {
    let exit = cfg.exit_point();
    let mut result = DataflowResult::new();
    for node in cfg.nodes() {
        let (in_fact, out_fact) = if node == exit {
            (analysis.boundary_fact(cfg), analysis.boundary_fact(cfg))
        } else {
            (analysis.initial_fact(), analysis.initial_fact())
        };
        result.ins.insert(node, in_fact);
        result.outs.insert(node, out_fact);
    }

    let mut worklist: VecDeque<Node> = cfg.nodes().filter(|n| *n != exit).collect();
    let mut queued: BTreeSet<Node> = worklist.iter().copied().collect();
    let mut steps = 0_usize;
    while let Some(node) = worklist.pop_front() {
        queued.remove(&node);
        steps += 1;
        let mut outgoing = analysis.initial_fact();
        for (succ, _) in cfg.successors(node) {
            if let Some(in_fact) = result.ins.get(&succ) {
                analysis.meet_into(in_fact, &mut outgoing);
            }
        }
        let mut incoming = result
            .ins
            .remove(&node)
            .unwrap_or_else(|| analysis.initial_fact());
        let changed = analysis.transfer(node, &outgoing, &mut incoming);
        result.outs.insert(node, outgoing);
        result.ins.insert(node, incoming);
        if changed {
            for pred in cfg.predecessors(node) {
                if pred != exit && queued.insert(pred) {
                    worklist.push_back(pred);
                }
            }
        }
    }
    debug!("backward worklist converged after {steps} node visits");
    result
}

fn iterate_backward<A: DataflowAnalysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
) -> DataflowResult<Node, A::Fact> {
    let exit = cfg.exit_point();
    let mut result = DataflowResult::new();
    for node in cfg.nodes() {
        result.ins.insert(node, analysis.initial_fact());
        result.outs.insert(node, analysis.initial_fact());
    }
    result.ins.insert(exit, analysis.boundary_fact(cfg));
    result.outs.insert(exit, analysis.boundary_fact(cfg));

    // All nodes except the exit, in reverse order, so that a pass visits
    // successors before their predecessors on straight-line code.
    let mut order: Vec<Node> = cfg.nodes().filter(|n| *n != exit).collect();
    order.reverse();
    let mut passes = 0_usize;
    loop {
        passes += 1;
        let mut changed = false;
        for &node in &order {
            let mut outgoing = result
                .outs
                .remove(&node)
                .unwrap_or_else(|| analysis.initial_fact());
            for (succ, _) in cfg.successors(node) {
                if let Some(in_fact) = result.ins.get(&succ) {
                    analysis.meet_into(in_fact, &mut outgoing);
                }
            }
            let mut incoming = result
                .ins
                .remove(&node)
                .unwrap_or_else(|| analysis.initial_fact());
            changed |= analysis.transfer(node, &outgoing, &mut incoming);
            result.outs.insert(node, outgoing);
            result.ins.insert(node, incoming);
        }
        if !changed {
            break;
        }
    }
    debug!("backward iterative converged after {passes} passes");
    result
}
