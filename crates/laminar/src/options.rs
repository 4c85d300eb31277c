//! The engine options record.

use serde::{Deserialize, Serialize};

/// Options for a single `layout` run. Read-only while the run is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Unit of vertical separation and ideal edge length.
    pub target_edge_length: f64,
    /// Let edge label sizes constrain routing and emit a label position per edge.
    pub with_labels: bool,
    /// Detect and route edge bundles.
    pub bundle: bool,
    /// Run the post-routing crossing-angle optimizer.
    pub optimize_angles: bool,
    /// Number of restart attempts during ordering.
    pub shuffles: usize,
    /// Shuffle at the whole-graph outer level rather than per ordering component.
    pub shuffle_global: bool,
    /// Perform a flat connector-level pre-ordering before hierarchical ordering.
    pub preorder_connectors: bool,
    /// Angle-optimizer cost weight for bend avoidance.
    pub weight_bends: f64,
    /// Angle-optimizer cost weight for crossing angles.
    pub weight_crossings: f64,
    /// Angle-optimizer cost weight for edge-length deviation.
    pub weight_lengths: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            target_edge_length: 50.0,
            with_labels: false,
            bundle: false,
            optimize_angles: false,
            shuffles: 0,
            shuffle_global: false,
            preorder_connectors: false,
            weight_bends: 0.2,
            weight_crossings: 1.0,
            weight_lengths: 0.1,
        }
    }
}

/// The cost weights, exported so external quality tooling can score a layout with the
/// same numbers the angle optimizer used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWeights {
    pub bends: f64,
    pub crossings: f64,
    pub lengths: f64,
}

impl LayoutOptions {
    pub fn analysis_weights(&self) -> AnalysisWeights {
        AnalysisWeights {
            bends: self.weight_bends,
            crossings: self.weight_crossings,
            lengths: self.weight_lengths,
        }
    }
}
