#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms
)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Welcome to `latte`, a lattice-based dataflow analysis engine for a
//! JVM-like, typed, three-address intermediate representation.
//!
//! The engine ships the classical intraprocedural analyses (constant
//! propagation, live variables), a class-hierarchy-analysis call-graph
//! builder, an interprocedural extension of constant propagation over an
//! interprocedural control-flow graph, and a dead-code detector fusing the
//! constant-propagation and liveness results. All of them are driven by the
//! generic fixed-point solvers in [`analysis::fixed_point`].

pub mod analysis;
pub mod ir;
pub mod lang;
pub mod types;
