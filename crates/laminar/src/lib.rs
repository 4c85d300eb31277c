//! Hierarchical (Sugiyama-style) layout for layered, scoped, ported dataflow graphs.
//!
//! The engine is a pure function from an annotated input graph to a coordinate-annotated
//! output graph: cycles are removed per subgraph, nodes are ranked by weighted longest
//! path, long edges are split over virtual nodes, ranks are ordered by barycentric
//! sweeps with heavy-edge conflict resolution, x comes from Brandes-Köpf median
//! alignment, connectors are placed along the node borders, and edges are routed as
//! poly-lines before the removed cycles are restored.
//!
//! ```
//! use laminar::{LayoutGraph, LayoutNode, LayoutOptions, layout};
//!
//! let mut g = LayoutGraph::new();
//! let a = g.add_node(LayoutNode::sized(40.0, 20.0));
//! let b = g.add_node(LayoutNode::sized(40.0, 20.0));
//! g.add_edge_between(a, b).unwrap();
//!
//! let out = layout(g, &LayoutOptions::default()).unwrap();
//! assert!(out.node(b).unwrap().y > out.node(a).unwrap().y);
//! ```

pub use laminar_graphlib as graphlib;

pub mod acyclic;
pub mod connectors;
mod error;
pub mod geom;
pub mod level;
mod model;
pub mod normalize;
mod options;
pub mod order;
mod pipeline;
pub mod position;
pub mod rank;
pub mod rng;
pub mod route;

pub use error::{Error, Result};
pub use geom::{EPSILON, Point, Rect, line_intersection, segments_intersect};
pub use level::{LevelEdge, LevelGraph, LevelId, LevelNode};
pub use model::{
    CONNECTOR_SIZE, CONNECTOR_SPACING, ConnectorSide, EdgeId, INVERTED_IN_CONNECTOR,
    INVERTED_OUT_CONNECTOR, LayoutBundle, LayoutConnector, LayoutEdge, LayoutGraph, LayoutNode,
    NodeId, SCOPED_IN_PREFIX, SCOPED_OUT_PREFIX,
};
pub use options::{AnalysisWeights, LayoutOptions};
pub use pipeline::layout;
pub use rank::{RankGraph, RankNode};
pub use rng::Rng;
