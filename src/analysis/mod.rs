//! APIs for the dataflow analyses.
//!
//! Each analysis is keyed by a string id; [`run_analysis`] resolves an id
//! and a configuration record to a pass, runs it, and publishes its result
//! into the owning result map: per-method results (constant propagation,
//! live variables, dead code) land in the method's
//! [`results`](crate::ir::MethodIr::results), program-level results (the
//! call graph, interprocedural constants) in the program's.

pub mod call_graph;
pub mod constant_propagation;
pub mod dead_code;
pub mod fixed_point;
pub mod interprocedural;
pub mod live_variables;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::{
    ir::{MethodIr, Node, Var},
    lang::{ClassHierarchy, Program},
};

use call_graph::CallGraph;
use constant_propagation::{ConstantPropagation, CpFact};
use fixed_point::{DataflowResult, Solver};
use interprocedural::{Icfg, InterConstantPropagation};
use live_variables::{LiveVariables, SetFact};

/// The well-known analysis ids.
pub mod ids {
    /// The control-flow graph stored by the IR builder.
    pub const CFG: &str = "cfg";
    /// Intraprocedural constant propagation.
    pub const CONSTANT_PROPAGATION: &str = "constprop";
    /// Interprocedural constant propagation.
    pub const INTER_CONSTANT_PROPAGATION: &str = "inter-constprop";
    /// Live-variable analysis.
    pub const LIVE_VARIABLES: &str = "livevar";
    /// Dead-code detection.
    pub const DEAD_CODE: &str = "deadcode";
    /// Class-hierarchy-analysis call-graph construction.
    pub const CALL_GRAPH: &str = "cha";
}

/// The configuration record an analysis pass is constructed from.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// The analysis id.
    pub id: String,
    /// Free-form options interpreted by the pass.
    pub options: BTreeMap<String, String>,
}

impl AnalysisConfig {
    /// Creates a configuration for the given analysis id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds an option to the configuration.
    #[must_use]
    pub fn with_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    fn solver(&self, default: Solver) -> Result<Solver, AnalysisError> {
        match self.options.get("solver").map(String::as_str) {
            None => Ok(default),
            Some("worklist") => Ok(Solver::Worklist),
            Some("iterative") => Ok(Solver::Iterative),
            Some(other) => Err(AnalysisError::InvalidOption {
                key: "solver".to_owned(),
                value: other.to_owned(),
            }),
        }
    }
}

/// The ways an analysis can fail.
///
/// The engine operates on well-typed inputs; every variant is a programming
/// error on the host's side, fatal to the current analysis. Results already
/// published for other methods are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// An input violated a precondition, e.g. a call edge whose argument
    /// count does not match the callee's parameter count.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
    /// The selected solver strategy does not implement the analysis
    /// direction.
    #[error("the {strategy} solver does not support {direction} analyses")]
    UnsupportedStrategy {
        /// The rejected strategy.
        strategy: &'static str,
        /// The requested direction.
        direction: &'static str,
    },
    /// A configuration option had an unrecognized value.
    #[error("invalid option {key}={value}")]
    InvalidOption {
        /// The option key.
        key: String,
        /// The rejected value.
        value: String,
    },
    /// The analysis id is not registered.
    #[error("unknown analysis id: {0}")]
    UnknownAnalysis(String),
}

/// Runs the analysis selected by the configuration and publishes its
/// result under the configuration's id.
///
/// Dependencies are computed on demand: dead-code detection solves constant
/// propagation and liveness for methods missing them, and interprocedural
/// constant propagation builds the call graph if none is published yet.
///
/// # Errors
/// [`AnalysisError::UnknownAnalysis`] for an unregistered id, or whatever
/// error the selected pass reports.
pub fn run_analysis(
    program: &Program,
    hierarchy: &ClassHierarchy,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError> {
    match config.id.as_str() {
        ids::CONSTANT_PROPAGATION => {
            let solver = config.solver(Solver::Worklist)?;
            for body in method_bodies(program) {
                constants_of(body, solver)?;
            }
            Ok(())
        }
        ids::LIVE_VARIABLES => {
            let solver = config.solver(Solver::Iterative)?;
            for body in method_bodies(program) {
                liveness_of(body, solver)?;
            }
            Ok(())
        }
        ids::DEAD_CODE => {
            for body in method_bodies(program) {
                let constants = constants_of(body, Solver::Worklist)?;
                let liveness = liveness_of(body, Solver::Iterative)?;
                let dead = dead_code::find_dead_code(body, &constants, &liveness);
                body.results().insert(ids::DEAD_CODE, dead);
            }
            Ok(())
        }
        ids::CALL_GRAPH => {
            call_graph_of(program, hierarchy);
            Ok(())
        }
        ids::INTER_CONSTANT_PROPAGATION => {
            let call_graph = call_graph_of(program, hierarchy);
            let icfg = Icfg::build(program, &call_graph);
            let result = InterConstantPropagation::new(program).solve(&icfg)?;
            program
                .results()
                .insert(ids::INTER_CONSTANT_PROPAGATION, result);
            Ok(())
        }
        other => Err(AnalysisError::UnknownAnalysis(other.to_owned())),
    }
}

fn method_bodies(program: &Program) -> impl Iterator<Item = &MethodIr> {
    program
        .classes()
        .flat_map(|class| &class.methods)
        .filter_map(|method| method.body.as_ref())
}

fn constants_of(
    body: &MethodIr,
    solver: Solver,
) -> Result<Rc<DataflowResult<Node, CpFact>>, AnalysisError> {
    if let Some(result) = body.results().get(ids::CONSTANT_PROPAGATION) {
        return Ok(result);
    }
    let result = solver.solve(body.cfg(), &ConstantPropagation::new(body))?;
    let result = Rc::new(result);
    let shared: Rc<dyn std::any::Any> = result.clone();
    body.results().insert_shared(ids::CONSTANT_PROPAGATION, shared);
    Ok(result)
}

fn liveness_of(
    body: &MethodIr,
    solver: Solver,
) -> Result<Rc<DataflowResult<Node, SetFact<Var>>>, AnalysisError> {
    if let Some(result) = body.results().get(ids::LIVE_VARIABLES) {
        return Ok(result);
    }
    let result = solver.solve(body.cfg(), &LiveVariables::new(body))?;
    let result = Rc::new(result);
    let shared: Rc<dyn std::any::Any> = result.clone();
    body.results().insert_shared(ids::LIVE_VARIABLES, shared);
    Ok(result)
}

fn call_graph_of(program: &Program, hierarchy: &ClassHierarchy) -> Rc<CallGraph> {
    if let Some(call_graph) = program.results().get(ids::CALL_GRAPH) {
        return call_graph;
    }
    let call_graph = Rc::new(CallGraph::build(program, hierarchy));
    let shared: Rc<dyn std::any::Any> = call_graph.clone();
    program.results().insert_shared(ids::CALL_GRAPH, shared);
    call_graph
}
