//! The core `DiGraph` container and its helper algorithms.

pub mod alg;
mod core;
mod error;

pub use core::{DiGraph, EdgeId, NodeId};
pub use error::GraphError;
