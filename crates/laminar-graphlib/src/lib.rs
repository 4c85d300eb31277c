//! Graph container APIs used by `laminar`.
//!
//! This crate contains the core `DiGraph` arena plus a small set of helper algorithms
//! re-exported as `laminar_graphlib::alg`.

mod graph;

pub use graph::alg;
pub use graph::{DiGraph, EdgeId, GraphError, NodeId};
